mod common;

use common::{OWNER_HEADER, TIER_HEADER};
use serde_json::json;
use tierlink::domain::repositories::ShortUrlRepository;
use tierlink::domain::tier::Tier;

#[tokio::test]
async fn test_create_short_url_success() {
    let app = common::create_test_app();
    let server = app.server();

    let response = server
        .post("/api/short-urls")
        .add_header(OWNER_HEADER, "user-1")
        .add_header(TIER_HEADER, "std")
        .json(&json!({ "url": "example.com/landing" }))
        .await;

    assert_eq!(response.status_code(), 201);

    let body = response.json::<serde_json::Value>();
    let code = body["code"].as_str().unwrap();
    assert!(code.starts_with("std"));

    let parsed = app.encoder.parse_short_code(code).unwrap();
    assert_eq!(parsed.tier, Tier::Standard);

    let record = app.store.find_by_code(code).await.unwrap().unwrap();
    assert_eq!(record.target_url, "example.com/landing");
    assert_eq!(record.owner_id, "user-1");
}

#[tokio::test]
async fn test_create_short_url_premium_prefix() {
    let app = common::create_test_app();
    let server = app.server();

    let response = server
        .post("/api/short-urls")
        .add_header(OWNER_HEADER, "user-1")
        .add_header(TIER_HEADER, "pro")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    assert_eq!(response.status_code(), 201);
    let body = response.json::<serde_json::Value>();
    assert!(body["code"].as_str().unwrap().starts_with("pro"));
}

#[tokio::test]
async fn test_create_short_url_requires_caller() {
    let app = common::create_test_app();
    let server = app.server();

    let response = server
        .post("/api/short-urls")
        .json(&json!({ "url": "example.com" }))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = server
        .post("/api/short-urls")
        .add_header(OWNER_HEADER, "user-1")
        .add_header(TIER_HEADER, "gold")
        .json(&json!({ "url": "example.com" }))
        .await;
    assert_eq!(response.status_code(), 401);

    assert_eq!(app.store.record_count(), 0);
}

#[tokio::test]
async fn test_create_short_url_rejects_invalid_targets() {
    let app = common::create_test_app();
    let server = app.server();
    let too_long = format!("https://example.com/{}", "a".repeat(2100));

    for url in ["", "ftp://example.com/file", "http://", "not a url", too_long.as_str()] {
        let response = server
            .post("/api/short-urls")
            .add_header(OWNER_HEADER, "user-1")
            .add_header(TIER_HEADER, "std")
            .json(&json!({ "url": url }))
            .await;

        assert_eq!(response.status_code(), 422, "url {url:?} should be rejected");
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["error"]["code"], "validation_error");
    }

    assert_eq!(app.store.record_count(), 0);
}

#[tokio::test]
async fn test_create_short_url_trims_surrounding_whitespace() {
    let app = common::create_test_app();
    let server = app.server();

    for (submitted, location) in [
        ("example.com\n", "https://example.com"),
        (" example.com", "https://example.com"),
        ("example.com\t", "https://example.com"),
        ("  http://example.com/a?b=c \r\n", "http://example.com/a?b=c"),
    ] {
        let response = server
            .post("/api/short-urls")
            .add_header(OWNER_HEADER, "user-1")
            .add_header(TIER_HEADER, "std")
            .json(&json!({ "url": submitted }))
            .await;
        assert_eq!(response.status_code(), 201, "url {submitted:?}");

        let code = response.json::<serde_json::Value>()["code"]
            .as_str()
            .unwrap()
            .to_string();
        let record = app.store.find_by_code(&code).await.unwrap().unwrap();
        assert_eq!(record.target_url, submitted.trim());

        let redirect = server.get(&format!("/{code}")).await;
        assert_eq!(redirect.status_code(), 302);
        assert_eq!(redirect.header("location"), location);
    }
}

#[tokio::test]
async fn test_create_short_url_rejects_inner_control_characters() {
    let app = common::create_test_app();
    let server = app.server();

    for url in ["exam\nple.com", "example.com/a\tb", "example.com/\u{1b}[0m"] {
        let response = server
            .post("/api/short-urls")
            .add_header(OWNER_HEADER, "user-1")
            .add_header(TIER_HEADER, "std")
            .json(&json!({ "url": url }))
            .await;
        assert_eq!(response.status_code(), 422, "url {url:?} should be rejected");
    }

    assert_eq!(app.store.record_count(), 0);
}

#[tokio::test]
async fn test_codes_are_unique_per_creation() {
    let app = common::create_test_app();
    let server = app.server();

    let mut codes = Vec::new();
    for _ in 0..3 {
        let response = server
            .post("/api/short-urls")
            .add_header(OWNER_HEADER, "user-1")
            .add_header(TIER_HEADER, "std")
            .json(&json!({ "url": "example.com" }))
            .await;
        let body = response.json::<serde_json::Value>();
        codes.push(body["code"].as_str().unwrap().to_string());
    }

    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 3);
}

#[tokio::test]
async fn test_list_short_urls_only_returns_own_codes() {
    let app = common::create_test_app();
    let mine_a = app.create("example.com/a", "user-1", Tier::Standard).await;
    let mine_b = app.create("example.com/b", "user-1", Tier::Premium).await;
    let theirs = app.create("example.com/c", "user-2", Tier::Standard).await;

    let server = app.server();
    let response = server
        .get("/api/short-urls")
        .add_header(OWNER_HEADER, "user-1")
        .add_header(TIER_HEADER, "std")
        .await;

    response.assert_status_ok();
    let codes = response.json::<Vec<String>>();
    assert_eq!(codes.len(), 2);
    assert!(codes.contains(&mine_a));
    assert!(codes.contains(&mine_b));
    assert!(!codes.contains(&theirs));
}

#[tokio::test]
async fn test_list_short_urls_empty() {
    let app = common::create_test_app();
    let server = app.server();

    let response = server
        .get("/api/short-urls")
        .add_header(OWNER_HEADER, "nobody")
        .add_header(TIER_HEADER, "pro")
        .await;

    response.assert_status_ok();
    assert!(response.json::<Vec<String>>().is_empty());
}
