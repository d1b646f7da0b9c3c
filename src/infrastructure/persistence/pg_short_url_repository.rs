//! PostgreSQL implementation of the short URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use sqlx::types::Json;
use std::sync::Arc;

use super::keys;
use crate::domain::entities::{NewShortUrl, ShortUrlRecord};
use crate::domain::repositories::ShortUrlRepository;
use crate::error::{AppError, map_sqlx_error};

/// JSON attributes of a `DETAILS` item.
#[derive(Debug, Serialize, Deserialize)]
struct ShortUrlAttrs {
    target_url: String,
    owner_id: String,
}

/// Short URL records and owner index in the `entities` table.
pub struct PgShortUrlRepository {
    pool: Arc<PgPool>,
}

impl PgShortUrlRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShortUrlRepository for PgShortUrlRepository {
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrlRecord, AppError> {
        let created_at = Utc::now();
        let record_pk = keys::short_url_pk(&new_url.code);

        let on_duplicate = |e: sqlx::Error| match map_sqlx_error(e) {
            AppError::DuplicateCode { .. } => AppError::duplicate_code(
                "Short code already exists",
                json!({ "code": new_url.code }),
            ),
            other => other,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO entities (pk, sk, attrs, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&record_pk)
        .bind(keys::DETAILS_SK)
        .bind(Json(ShortUrlAttrs {
            target_url: new_url.target_url.clone(),
            owner_id: new_url.owner_id.clone(),
        }))
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(on_duplicate)?;

        sqlx::query(
            r#"
            INSERT INTO entities (pk, sk, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(keys::owner_pk(&new_url.owner_id))
        .bind(&record_pk)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(on_duplicate)?;

        tx.commit().await?;

        Ok(new_url.into_record(created_at))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortUrlRecord>, AppError> {
        let row = sqlx::query_as::<_, (Json<ShortUrlAttrs>, DateTime<Utc>)>(
            r#"
            SELECT attrs, created_at
            FROM entities
            WHERE pk = $1 AND sk = $2
            "#,
        )
        .bind(keys::short_url_pk(code))
        .bind(keys::DETAILS_SK)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|(Json(attrs), created_at)| ShortUrlRecord {
            code: code.to_string(),
            target_url: attrs.target_url,
            owner_id: attrs.owner_id,
            created_at,
        }))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<String>, AppError> {
        let sort_keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT sk
            FROM entities
            WHERE pk = $1 AND sk LIKE 'SHORTURL#%'
            ORDER BY sk COLLATE "C"
            "#,
        )
        .bind(keys::owner_pk(owner_id))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(sort_keys
            .into_iter()
            .filter_map(|sk| sk.strip_prefix(keys::SHORT_URL_PREFIX).map(str::to_owned))
            .collect())
    }

    async fn next_counter(&self) -> Result<u64, AppError> {
        let value = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO entities (pk, sk, attrs)
            VALUES ($1, $2, jsonb_build_object('value', 1))
            ON CONFLICT (pk, sk) DO UPDATE
                SET attrs = jsonb_build_object(
                    'value', COALESCE((entities.attrs->>'value')::BIGINT, 0) + 1
                )
            RETURNING (attrs->>'value')::BIGINT
            "#,
        )
        .bind(keys::COUNTER_PK)
        .bind(keys::COUNTER_SK)
        .fetch_one(self.pool.as_ref())
        .await?;

        u64::try_from(value)
            .map_err(|_| AppError::fatal("Counter out of range", json!({ "value": value })))
    }

    async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await
            .is_ok()
    }
}
