//! PostgreSQL implementation of the daily rollup repository.

use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::keys;
use crate::domain::entities::{DailyGroup, DailyMetric, MetricCounts};
use crate::domain::repositories::{MetricsRepository, UpsertOutcome};
use crate::error::AppError;

/// Daily rollups and applied-event markers in the `entities` table.
///
/// A group is applied in one transaction:
///
/// 1. claim the group's event keys as `EVENT#` markers (`ON CONFLICT DO NOTHING`);
///    only keys this transaction inserted count as fresh
/// 2. try to insert the `DAY#` rollup built from the fresh events
/// 3. if it already exists, add the fresh counters onto it
///
/// A concurrent writer for the same rollup blocks on the primary key until
/// the first one commits, then takes the increment path.
pub struct PgMetricsRepository {
    pool: Arc<PgPool>,
    marker_retention: TimeDelta,
}

impl PgMetricsRepository {
    pub fn new(pool: Arc<PgPool>, marker_retention_hours: u64) -> Self {
        let hours = i64::try_from(marker_retention_hours).unwrap_or(i64::MAX);
        Self {
            pool,
            marker_retention: TimeDelta::try_hours(hours).unwrap_or(TimeDelta::MAX),
        }
    }

    async fn apply(&self, group: &DailyGroup) -> Result<UpsertOutcome, AppError> {
        let pk = keys::short_url_pk(&group.code);
        let day_sk = keys::day_sk(group.day);
        // Sorted so concurrent claims on overlapping batches lock rows in one order.
        let mut marker_keys: Vec<String> = group.event_keys().map(keys::event_sk).collect();
        marker_keys.sort_unstable();
        marker_keys.dedup();
        let expires_at = Utc::now()
            .checked_add_signed(self.marker_retention)
            .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);

        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO entities (pk, sk, expires_at)
            SELECT $1, marker.sk, $3
            FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS marker(sk, position)
            ORDER BY marker.position
            ON CONFLICT (pk, sk) DO NOTHING
            RETURNING sk
            "#,
        )
        .bind(&pk)
        .bind(&marker_keys)
        .bind(expires_at)
        .fetch_all(&mut *tx)
        .await?;

        let fresh: HashSet<&str> = claimed
            .iter()
            .filter_map(|sk| sk.strip_prefix(keys::EVENT_PREFIX))
            .collect();

        if fresh.is_empty() {
            tx.rollback().await?;
            return Ok(UpsertOutcome::AlreadyApplied);
        }

        let counts = group.counts_where(|key| fresh.contains(key));

        let inserted = sqlx::query(
            r#"
            INSERT INTO entities (pk, sk, attrs)
            VALUES ($1, $2, $3)
            ON CONFLICT (pk, sk) DO NOTHING
            "#,
        )
        .bind(&pk)
        .bind(&day_sk)
        .bind(Json(&counts))
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        let outcome = if inserted {
            UpsertOutcome::Inserted
        } else {
            sqlx::query(
                r#"
                UPDATE entities
                SET attrs = jsonb_build_object(
                    'total_hits', COALESCE((attrs->>'total_hits')::BIGINT, 0) + $3,
                    'by_country', merge_counts(attrs->'by_country', $4),
                    'by_device_type', merge_counts(attrs->'by_device_type', $5),
                    'by_referrer', merge_counts(attrs->'by_referrer', $6)
                )
                WHERE pk = $1 AND sk = $2
                "#,
            )
            .bind(&pk)
            .bind(&day_sk)
            .bind(i64::try_from(counts.total_hits).unwrap_or(i64::MAX))
            .bind(Json(&counts.by_country))
            .bind(Json(&counts.by_device_type))
            .bind(Json(&counts.by_referrer))
            .execute(&mut *tx)
            .await?;
            UpsertOutcome::Merged
        };

        tx.commit().await?;

        debug!(
            code = %group.code,
            day = %group.day,
            fresh = fresh.len(),
            outcome = outcome.label(),
            "Daily rollup applied"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl MetricsRepository for PgMetricsRepository {
    async fn upsert_daily(&self, group: &DailyGroup) -> UpsertOutcome {
        match self.apply(group).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(code = %group.code, day = %group.day, "Daily rollup failed: {}", e);
                UpsertOutcome::Failed(e.to_string())
            }
        }
    }

    async fn daily_range(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyMetric>, AppError> {
        let rows = sqlx::query_as::<_, (String, Json<MetricCounts>)>(
            r#"
            SELECT sk, attrs
            FROM entities
            WHERE pk = $1 AND sk COLLATE "C" BETWEEN $2 AND $3
            ORDER BY sk COLLATE "C"
            "#,
        )
        .bind(keys::short_url_pk(code))
        .bind(keys::day_sk(from))
        .bind(keys::day_sk(to))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(sk, Json(counts))| {
                keys::parse_day_sk(&sk).map(|day| DailyMetric {
                    code: code.to_string(),
                    day,
                    counts,
                })
            })
            .collect())
    }

    async fn purge_expired_markers(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM entities
            WHERE expires_at IS NOT NULL AND expires_at < NOW()
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}
