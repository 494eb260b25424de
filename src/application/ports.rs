//! Outbound collaborator ports.

use async_trait::async_trait;

use crate::domain::UsageLogEntry;

/// Report generation collaborator.
///
/// Consumes usage-ledger read views only and renders a binary document;
/// rendering mechanics (PDF, styling) are its responsibility.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, entries: &[UsageLogEntry]) -> Result<Vec<u8>, String>;
}

/// Minimal plain-text renderer used when no richer generator is plugged
/// in.
pub struct PlainTextReportGenerator;

#[async_trait]
impl ReportGenerator for PlainTextReportGenerator {
    async fn generate(&self, entries: &[UsageLogEntry]) -> Result<Vec<u8>, String> {
        let mut out = String::new();
        out.push_str("Parking usage report\n");
        out.push_str("====================\n\n");

        for entry in entries {
            out.push_str(&format!(
                "{} | lot {} spot {} | {} -> {} | {:.2} h | {:.2}\n",
                entry.user_id,
                entry.lot_id,
                entry.spot_id,
                entry.entered_at.format("%Y-%m-%d %H:%M"),
                entry.exited_at.format("%Y-%m-%d %H:%M"),
                entry.duration_hours,
                entry.cost,
            ));
        }

        let total_cost: f64 = entries.iter().map(|e| e.cost).sum();
        let total_hours: f64 = entries.iter().map(|e| e.duration_hours).sum();
        out.push_str(&format!(
            "\nSessions: {}  Hours: {:.2}  Total: {:.2}\n",
            entries.len(),
            total_hours,
            total_cost
        ));

        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn plain_text_report_includes_totals() {
        let entry = UsageLogEntry {
            id: 1,
            user_id: "u1".into(),
            spot_id: 2,
            lot_id: 3,
            vehicle_id: "V-1".into(),
            entered_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
            exited_at: Utc.with_ymd_and_hms(2024, 6, 1, 13, 15, 0).unwrap(),
            duration_hours: 3.25,
            cost: 13.0,
            remarks: "auto-logged on release".into(),
        };

        let bytes = PlainTextReportGenerator
            .generate(&[entry])
            .await
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Sessions: 1"));
        assert!(text.contains("Total: 13.00"));
        assert!(text.contains("lot 3 spot 2"));
    }
}
