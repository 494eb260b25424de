//! Notification events
//!
//! Structured payloads handed to the notification collaborator. The core
//! only enqueues these; delivery mechanics (email, formatting, retries)
//! live behind the delivery sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event kinds produced by the core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A parking lot was created
    LotAdded(LotAddedEvent),
    /// A parking lot was removed
    LotRemoved(LotRemovedEvent),
    /// A spot transitioned to Occupied
    SpotOccupied(SpotOccupiedEvent),
    /// A spot was released and billed
    SpotReleased(SpotReleasedEvent),
    /// Periodic reminder for a user
    ReminderDue(ReminderDueEvent),
    /// A usage report finished generating
    ReportReady(ReportReadyEvent),
}

impl Event {
    /// Stable name of the event kind
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::LotAdded(_) => "lot_added",
            Event::LotRemoved(_) => "lot_removed",
            Event::SpotOccupied(_) => "spot_occupied",
            Event::SpotReleased(_) => "spot_released",
            Event::ReminderDue(_) => "reminder_due",
            Event::ReportReady(_) => "report_ready",
        }
    }

    /// The user this event concerns, if any
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Event::LotAdded(_) | Event::LotRemoved(_) => None,
            Event::SpotOccupied(e) => Some(&e.user_id),
            Event::SpotReleased(e) => Some(&e.user_id),
            Event::ReminderDue(e) => Some(&e.user_id),
            Event::ReportReady(e) => Some(&e.user_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotAddedEvent {
    pub lot_id: i64,
    pub name: String,
    pub capacity: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotRemovedEvent {
    pub lot_id: i64,
    pub name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotOccupiedEvent {
    pub lot_id: i64,
    pub spot_id: i64,
    pub slot_number: i32,
    pub user_id: String,
    pub vehicle_id: String,
    pub reservation_id: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotReleasedEvent {
    pub lot_id: i64,
    pub spot_id: i64,
    pub slot_number: i32,
    pub user_id: String,
    pub duration_hours: f64,
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderDueEvent {
    pub user_id: String,
    pub email: String,
    pub reminder_type: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportReadyEvent {
    pub user_id: String,
    pub task_id: i64,
    pub download_link: String,
    pub timestamp: DateTime<Utc>,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
