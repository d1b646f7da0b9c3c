//! Helpers shared by the service and API layers.
//!
//! - [`code_encoder`] - Hashids short codes with tier tags
//! - [`url_normalizer`] - target URL validation and redirect scheme handling
//! - [`request_meta`] - access event metadata from request headers

pub mod code_encoder;
pub mod request_meta;
pub mod url_normalizer;
