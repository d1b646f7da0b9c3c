//! Short URL creation and resolution service.

use std::sync::Arc;

use serde_json::json;

use crate::application::services::CounterAllocator;
use crate::domain::entities::{NewShortUrl, ShortUrlRecord};
use crate::domain::repositories::ShortUrlRepository;
use crate::domain::tier::Tier;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_encoder::CodeEncoder;
use crate::utils::url_normalizer::validate_target_url;

/// Re-allocations attempted when a freshly built code already exists.
const MAX_CREATE_ATTEMPTS: usize = 5;

/// Creates short URLs and resolves them through a read-through cache.
pub struct LinkService {
    repository: Arc<dyn ShortUrlRepository>,
    cache: Arc<dyn CacheService>,
    allocator: CounterAllocator,
    encoder: Arc<CodeEncoder>,
    cache_ttl_seconds: u64,
}

impl LinkService {
    pub fn new(
        repository: Arc<dyn ShortUrlRepository>,
        cache: Arc<dyn CacheService>,
        allocator: CounterAllocator,
        encoder: Arc<CodeEncoder>,
        cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            repository,
            cache,
            allocator,
            encoder,
            cache_ttl_seconds,
        }
    }

    /// Allocates a code for `target_url` and stores it for `owner_id`.
    ///
    /// The target is stored trimmed, otherwise as submitted. A collision with
    /// an existing code (possible only across counter backings) triggers a
    /// new allocation.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the target is unusable
    /// - [`AppError::TransientIo`] if no counter value could be allocated
    /// - [`AppError::DuplicateCode`] if every attempt collided
    pub async fn create_short_url(
        &self,
        target_url: &str,
        owner_id: &str,
        tier: Tier,
    ) -> Result<ShortUrlRecord, AppError> {
        let target_url = target_url.trim();
        validate_target_url(target_url).map_err(|e| {
            AppError::validation(
                "Invalid target URL",
                json!({ "fields": { "url": [e.to_string()] } }),
            )
        })?;

        let mut last_err = None;
        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            let counter = self.allocator.next().await?;
            let code = self.encoder.short_code(tier, counter).map_err(|e| {
                AppError::fatal("Short code allocation failed", json!({ "reason": e.to_string() }))
            })?;

            let new_url = NewShortUrl {
                code,
                target_url: target_url.to_string(),
                owner_id: owner_id.to_string(),
            };

            match self.repository.create(new_url).await {
                Ok(record) => {
                    tracing::info!(code = %record.code, owner = owner_id, %tier, "Short URL created");
                    return Ok(record);
                }
                Err(err @ AppError::DuplicateCode { .. }) => {
                    tracing::warn!(attempt, counter, "Allocated code already exists, retrying");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            AppError::duplicate_code("Could not allocate a unique code", json!({}))
        }))
    }

    /// Target URL for `code`.
    ///
    /// Checks the cache first; on a miss reads the store and populates the
    /// cache. Cache failures are logged and the store answers alone.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record exists.
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        match self.cache.get_url(code).await {
            Ok(Some(target)) => {
                tracing::debug!(code, "Cache hit");
                return Ok(target);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(code, error = %e, "Cache read failed, using store"),
        }

        let record = self.repository.find_by_code(code).await?.ok_or_else(|| {
            AppError::not_found("Short URL not found", json!({ "code": code }))
        })?;

        if let Err(e) = self
            .cache
            .set_url(code, &record.target_url, self.cache_ttl_seconds)
            .await
        {
            tracing::warn!(code, error = %e, "Cache write failed");
        }

        Ok(record.target_url)
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<String>, AppError> {
        self.repository.list_by_owner(owner_id).await
    }
}
