//! Batch aggregation of access events into daily rollups.
//!
//! A batch is parsed, grouped by (code, UTC day), deduplicated and applied
//! group by group. Only groups whose write failed are reported back; their
//! messages stay pending and come back on a later read.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::entities::{AccessEvent, DailyGroup};
use crate::domain::repositories::{MetricsRepository, UpsertOutcome};
use crate::infrastructure::queue::QueueMessage;

/// Outcome of one [`MetricsAggregator::process_batch`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Messages to leave unacknowledged for redelivery.
    pub failed_message_ids: Vec<String>,
    pub inserted: usize,
    pub merged: usize,
    pub already_applied: usize,
    pub failed_groups: usize,
    /// Messages whose body could not be turned into an event.
    pub malformed: usize,
    /// Deliveries dropped as duplicates inside the batch.
    pub duplicates: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed_message_ids.is_empty()
    }

    fn record(&mut self, outcome: &UpsertOutcome, group: &DailyGroup) {
        metrics::counter!("metrics_groups_total", "outcome" => outcome.label()).increment(1);
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Merged => self.merged += 1,
            UpsertOutcome::AlreadyApplied => self.already_applied += 1,
            UpsertOutcome::Failed(_) => {
                self.failed_groups += 1;
                self.failed_message_ids
                    .extend(group.message_ids().iter().cloned());
            }
        }
    }
}

pub struct MetricsAggregator {
    repository: Arc<dyn MetricsRepository>,
}

impl MetricsAggregator {
    pub fn new(repository: Arc<dyn MetricsRepository>) -> Self {
        Self { repository }
    }

    /// Applies a batch and returns the message ids to redeliver.
    ///
    /// Never returns an error: malformed messages are logged and counted but
    /// not reported, since redelivery cannot fix them.
    pub async fn process_batch(&self, messages: Vec<QueueMessage>) -> BatchReport {
        let mut report = BatchReport::default();
        let groups = group_messages(messages, &mut report);

        for group in groups.values() {
            let outcome = self.repository.upsert_daily(group).await;
            if let UpsertOutcome::Failed(reason) = &outcome {
                tracing::warn!(
                    code = %group.code,
                    day = %group.day,
                    messages = group.message_ids().len(),
                    reason = %reason,
                    "Daily rollup write failed, leaving group for redelivery"
                );
            } else {
                tracing::debug!(
                    code = %group.code,
                    day = %group.day,
                    events = group.event_count(),
                    outcome = outcome.label(),
                    "Daily rollup applied"
                );
            }
            report.record(&outcome, group);
        }

        report
    }
}

/// Parses and groups a batch, keeping message ids with their events.
fn group_messages(
    messages: Vec<QueueMessage>,
    report: &mut BatchReport,
) -> BTreeMap<(String, NaiveDate), DailyGroup> {
    let mut groups: BTreeMap<(String, NaiveDate), DailyGroup> = BTreeMap::new();

    for message in messages {
        let event = match serde_json::from_str::<AccessEvent>(&message.body) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(message_id = %message.message_id, error = %e, "Malformed access event");
                metrics::counter!("metrics_messages_malformed_total").increment(1);
                report.malformed += 1;
                continue;
            }
        };

        let Some(day) = event.day() else {
            tracing::error!(
                message_id = %message.message_id,
                timestamp = event.timestamp,
                "Access event timestamp out of range"
            );
            metrics::counter!("metrics_messages_malformed_total").increment(1);
            report.malformed += 1;
            continue;
        };

        let group = groups
            .entry((event.code.clone(), day))
            .or_insert_with(|| DailyGroup::new(event.code.clone(), day));
        if !group.push(message.message_id, event) {
            report.duplicates += 1;
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DeviceClass;
    use crate::domain::repositories::MockMetricsRepository;
    use uuid::Uuid;

    fn message(id: &str, code: &str, timestamp: i64, country: &str) -> QueueMessage {
        let event = AccessEvent {
            code: code.to_string(),
            client_ip: "198.51.100.1".to_string(),
            timestamp,
            referrer: None,
            user_agent: "ua".to_string(),
            country: country.to_string(),
            device_class: DeviceClass::Mobile,
            event_id: Some(Uuid::new_v4()),
        };
        QueueMessage::new(id, serde_json::to_string(&event).unwrap())
    }

    const JAN_1: i64 = 1_672_531_200;
    const JAN_2: i64 = JAN_1 + 86_400;

    #[tokio::test]
    async fn test_groups_by_code_and_day() {
        let mut repo = MockMetricsRepository::new();
        repo.expect_upsert_daily()
            .times(3)
            .returning(|_| UpsertOutcome::Inserted);

        let aggregator = MetricsAggregator::new(Arc::new(repo));
        let report = aggregator
            .process_batch(vec![
                message("1-0", "abc", JAN_1, "IN"),
                message("2-0", "abc", JAN_1 + 10, "US"),
                message("3-0", "abc", JAN_2, "US"),
                message("4-0", "xyz", JAN_1, "US"),
            ])
            .await;

        assert!(report.is_success());
        assert_eq!(report.inserted, 3);
    }

    #[tokio::test]
    async fn test_failed_group_reports_all_its_message_ids() {
        let mut repo = MockMetricsRepository::new();
        repo.expect_upsert_daily()
            .withf(|group| group.code == "abc")
            .returning(|_| UpsertOutcome::Failed("store down".to_string()));
        repo.expect_upsert_daily()
            .withf(|group| group.code == "xyz")
            .returning(|_| UpsertOutcome::Merged);

        let aggregator = MetricsAggregator::new(Arc::new(repo));
        let report = aggregator
            .process_batch(vec![
                message("1-0", "abc", JAN_1, "IN"),
                message("2-0", "xyz", JAN_1, "US"),
                message("3-0", "abc", JAN_1, "US"),
            ])
            .await;

        assert_eq!(report.failed_message_ids, vec!["1-0", "3-0"]);
        assert_eq!(report.failed_groups, 1);
        assert_eq!(report.merged, 1);
    }

    #[tokio::test]
    async fn test_malformed_messages_are_counted_not_reported() {
        let mut repo = MockMetricsRepository::new();
        repo.expect_upsert_daily()
            .times(1)
            .returning(|_| UpsertOutcome::Inserted);

        let aggregator = MetricsAggregator::new(Arc::new(repo));
        let out_of_range = message("3-0", "abc", i64::MAX, "US");
        let report = aggregator
            .process_batch(vec![
                QueueMessage::new("1-0", "{not json"),
                message("2-0", "abc", JAN_1, "US"),
                out_of_range,
            ])
            .await;

        assert!(report.is_success());
        assert_eq!(report.malformed, 2);
        assert_eq!(report.inserted, 1);
    }

    #[tokio::test]
    async fn test_duplicate_deliveries_collapse_within_batch() {
        let mut repo = MockMetricsRepository::new();
        repo.expect_upsert_daily()
            .withf(|group| group.event_count() == 1 && group.message_ids().len() == 2)
            .times(1)
            .returning(|_| UpsertOutcome::Inserted);

        let aggregator = MetricsAggregator::new(Arc::new(repo));
        let original = message("1-0", "abc", JAN_1, "US");
        let redelivered = QueueMessage::new("9-0", original.body.clone());
        let report = aggregator.process_batch(vec![original, redelivered]).await;

        assert_eq!(report.duplicates, 1);
    }

    #[tokio::test]
    async fn test_empty_batch_touches_nothing() {
        let mut repo = MockMetricsRepository::new();
        repo.expect_upsert_daily().times(0);

        let aggregator = MetricsAggregator::new(Arc::new(repo));
        assert_eq!(aggregator.process_batch(Vec::new()).await, BatchReport::default());
    }
}
