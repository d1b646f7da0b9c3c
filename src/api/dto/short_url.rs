//! DTOs for short URL creation and listing.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::url_normalizer::validate_target_url_field;

/// Request to shorten one URL.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShortUrlRequest {
    /// Target URL; a missing scheme is accepted and resolved as https.
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    #[validate(custom(function = "validate_target_url_field"))]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateShortUrlResponse {
    pub code: String,
}
