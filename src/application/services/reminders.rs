//! Daily reminder scheduler.
//!
//! Background task in a tokio loop that fires the daily reminder once the
//! configured time of day (UTC) has passed. Sent reminders are recorded
//! in the reminder log, so a restart within the same day does not
//! re-send. Delivery itself is the notification collaborator's job; this
//! task only enqueues `ReminderDue` events.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{info, warn};

use crate::domain::{DomainResult, ReminderLog, Storage};
use crate::notifications::events::ReminderDueEvent;
use crate::notifications::{Dispatcher, Event};
use crate::shared::ShutdownSignal;

const REMINDER_TYPE_DAILY: &str = "daily";

/// True when the daily reminder scheduled at `hour:minute` (UTC) is due:
/// the scheduled time has passed today and nothing was sent since.
pub fn is_due(now: DateTime<Utc>, last_sent: Option<DateTime<Utc>>, hour: u32, minute: u32) -> bool {
    let Some(scheduled) = now
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
    else {
        return false;
    };
    if now < scheduled {
        return false;
    }
    last_sent.map_or(true, |sent| sent < scheduled)
}

pub struct ReminderScheduler {
    storage: Arc<dyn Storage>,
    dispatcher: Dispatcher,
    hour: u32,
    minute: u32,
}

impl ReminderScheduler {
    pub fn new(storage: Arc<dyn Storage>, dispatcher: Dispatcher, hour: u32, minute: u32) -> Self {
        Self {
            storage,
            dispatcher,
            hour,
            minute,
        }
    }

    /// Run one scheduling check; returns how many reminders were sent.
    pub async fn run_once(&self) -> DomainResult<usize> {
        let now = Utc::now();
        let last_sent = self.storage.last_reminder_sent(REMINDER_TYPE_DAILY).await?;
        if !is_due(now, last_sent, self.hour, self.minute) {
            return Ok(0);
        }

        let mut sent = 0;
        for user in self.storage.list_users().await? {
            // admins and banned accounts get no reminders
            if user.is_admin() || user.banned {
                continue;
            }
            self.storage
                .insert_reminder_log(ReminderLog {
                    id: 0,
                    user_id: user.id.clone(),
                    reminder_type: REMINDER_TYPE_DAILY.to_string(),
                    sent_at: now,
                })
                .await?;
            self.dispatcher.enqueue(
                Event::ReminderDue(ReminderDueEvent {
                    user_id: user.id,
                    email: user.email,
                    reminder_type: REMINDER_TYPE_DAILY.to_string(),
                    timestamp: now,
                }),
                Duration::ZERO,
            );
            sent += 1;
        }

        info!(sent, "daily reminders enqueued");
        Ok(sent)
    }

    /// Start the scheduler loop, checking every `check_interval_secs`.
    pub fn start(self: Arc<Self>, shutdown: ShutdownSignal, check_interval_secs: u64) {
        tokio::spawn(async move {
            info!(
                hour = self.hour,
                minute = self.minute,
                "📅 Reminder scheduler started"
            );
            let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs));

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.run_once().await {
                            warn!(error = %e, "reminder check failed");
                        }
                    }
                    _ = shutdown.notified().wait() => {
                        info!("📅 Reminder scheduler shutting down");
                        break;
                    }
                }
            }
        });
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, User};
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::notifications::create_event_bus;
    use chrono::Duration as ChronoDuration;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).unwrap()
    }

    #[test]
    fn not_due_before_scheduled_time() {
        assert!(!is_due(at(21, 0), None, 22, 10));
    }

    #[test]
    fn due_after_scheduled_time_with_no_prior_send() {
        assert!(is_due(at(22, 30), None, 22, 10));
    }

    #[test]
    fn not_due_when_already_sent_today() {
        assert!(!is_due(at(23, 0), Some(at(22, 11)), 22, 10));
    }

    #[test]
    fn due_again_next_day() {
        let yesterday = at(22, 30) - ChronoDuration::days(1);
        assert!(is_due(at(22, 30), Some(yesterday), 22, 10));
    }

    #[tokio::test]
    async fn run_once_skips_admins_and_banned() {
        let storage = Arc::new(InMemoryStorage::new());
        storage
            .insert_user(User::new("alice", "alice@example.com", "h", Role::User))
            .await
            .unwrap();
        storage
            .insert_user(User::new("root", "root@example.com", "h", Role::Admin))
            .await
            .unwrap();
        let mut banned = User::new("bob", "bob@example.com", "h", Role::User);
        banned.banned = true;
        storage.insert_user(banned).await.unwrap();

        let bus = create_event_bus();
        let mut subscriber = bus.subscribe();
        // schedule at midnight so any `now` is past it
        let scheduler =
            ReminderScheduler::new(storage.clone(), Dispatcher::new(bus), 0, 0);

        let sent = scheduler.run_once().await.unwrap();
        assert_eq!(sent, 1);

        let message = tokio::time::timeout(Duration::from_millis(100), subscriber.recv())
            .await
            .expect("Timeout")
            .expect("No message");
        assert_eq!(message.event.event_type(), "reminder_due");

        // second check in the same day sends nothing
        assert_eq!(scheduler.run_once().await.unwrap(), 0);
    }
}
