//! Target URL checks and redirect scheme handling.
//!
//! Targets are stored trimmed but otherwise as submitted (`example.com`
//! stays `example.com`). A scheme is only added when building the
//! `Location` header.

use std::borrow::Cow;
use url::Url;

pub const MAX_TARGET_URL_LENGTH: usize = 2048;

const DEFAULT_SCHEME: &str = "https://";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UrlValidationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("URL must be at most {MAX_TARGET_URL_LENGTH} characters")]
    TooLong,

    #[error("URL must not contain control characters")]
    ControlCharacter,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,
}

/// Returns `input` unchanged if it already carries a `scheme://` prefix,
/// otherwise prefixes `https://`.
///
/// ```ignore
/// assert_eq!(ensure_scheme("example.com/a"), "https://example.com/a");
/// assert_eq!(ensure_scheme("http://example.com"), "http://example.com");
/// ```
pub fn ensure_scheme(input: &str) -> Cow<'_, str> {
    if has_scheme(input) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{DEFAULT_SCHEME}{input}"))
    }
}

fn has_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Checks that a submitted target will produce a usable redirect.
///
/// # Errors
///
/// Returns the first rule the trimmed input breaks: length, control
/// characters, URL syntax after scheme normalisation, http(s) scheme, or
/// presence of a host.
pub fn validate_target_url(input: &str) -> Result<(), UrlValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }
    if trimmed.chars().count() > MAX_TARGET_URL_LENGTH {
        return Err(UrlValidationError::TooLong);
    }
    // The URL parser strips tabs and newlines, so check before parsing.
    if trimmed.chars().any(char::is_control) {
        return Err(UrlValidationError::ControlCharacter);
    }

    let url = Url::parse(&ensure_scheme(trimmed))
        .map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(UrlValidationError::MissingHost),
    }
}

/// `validator` adapter for request DTOs.
pub fn validate_target_url_field(input: &str) -> Result<(), validator::ValidationError> {
    validate_target_url(input).map_err(|e| {
        let mut error = validator::ValidationError::new("target_url");
        error.message = Some(e.to_string().into());
        error
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_scheme_adds_https_to_bare_host() {
        assert_eq!(ensure_scheme("example.com"), "https://example.com");
        assert_eq!(
            ensure_scheme("example.com/path?q=1"),
            "https://example.com/path?q=1"
        );
    }

    #[test]
    fn test_ensure_scheme_keeps_existing_scheme() {
        assert!(matches!(
            ensure_scheme("http://example.com"),
            Cow::Borrowed("http://example.com")
        ));
        assert_eq!(ensure_scheme("https://example.com"), "https://example.com");
        assert_eq!(ensure_scheme("ftp://files.test"), "ftp://files.test");
    }

    #[test]
    fn test_ensure_scheme_ignores_scheme_like_text_in_path() {
        assert_eq!(
            ensure_scheme("example.com/?next=http://other"),
            "https://example.com/?next=http://other"
        );
    }

    #[test]
    fn test_validate_accepts_bare_and_full_urls() {
        assert_eq!(validate_target_url("example.com"), Ok(()));
        assert_eq!(validate_target_url("https://example.com/a?b=c"), Ok(()));
        assert_eq!(validate_target_url("http://localhost:3000/test"), Ok(()));
        assert_eq!(validate_target_url("http://192.168.1.1:8080/api"), Ok(()));
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert_eq!(validate_target_url(""), Err(UrlValidationError::Empty));
        assert_eq!(validate_target_url("   "), Err(UrlValidationError::Empty));
    }

    #[test]
    fn test_validate_rejects_too_long() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_TARGET_URL_LENGTH));
        assert_eq!(validate_target_url(&url), Err(UrlValidationError::TooLong));
    }

    #[test]
    fn test_validate_rejects_other_protocols() {
        assert_eq!(
            validate_target_url("ftp://example.com/file.txt"),
            Err(UrlValidationError::UnsupportedProtocol)
        );
        assert_eq!(
            validate_target_url("file:///etc/passwd"),
            Err(UrlValidationError::UnsupportedProtocol)
        );
    }

    #[test]
    fn test_validate_ignores_surrounding_whitespace() {
        assert_eq!(validate_target_url(" example.com"), Ok(()));
        assert_eq!(validate_target_url("example.com\n"), Ok(()));
        assert_eq!(validate_target_url("\thttps://example.com/a "), Ok(()));
    }

    #[test]
    fn test_validate_rejects_inner_control_characters() {
        for input in ["exam\nple.com", "example.com/a\tb", "example.com/\u{7f}", "a\r\nb.com"] {
            assert_eq!(
                validate_target_url(input),
                Err(UrlValidationError::ControlCharacter),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(matches!(
            validate_target_url("not a valid url"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_field_adapter_carries_message() {
        let err = validate_target_url_field("ftp://x.test").unwrap_err();
        assert_eq!(err.code, "target_url");
        assert!(err.message.unwrap().contains("HTTP"));
    }
}
