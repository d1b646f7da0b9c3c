mod common;

use chrono::{NaiveDate, Utc};
use common::{OWNER_HEADER, TIER_HEADER};
use tierlink::domain::entities::{AccessEvent, DailyGroup, DeviceClass};
use tierlink::domain::repositories::MetricsRepository;
use tierlink::domain::tier::Tier;

fn event(code: &str, timestamp: i64, country: &str) -> AccessEvent {
    AccessEvent {
        code: code.to_string(),
        client_ip: "203.0.113.9".to_string(),
        timestamp,
        referrer: None,
        user_agent: "test-agent".to_string(),
        country: country.to_string(),
        device_class: DeviceClass::Desktop,
        event_id: None,
    }
}

async fn seed_day(app: &common::TestApp, code: &str, day: NaiveDate, countries: &[&str]) {
    let midnight = day.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
    let mut group = DailyGroup::new(code, day);
    for (i, country) in countries.iter().enumerate() {
        group.push(format!("{i}-0"), event(code, midnight + i as i64, country));
    }
    app.store.upsert_daily(&group).await;
}

#[tokio::test]
async fn test_metrics_returns_owner_rollups() {
    let app = common::create_test_app();
    let code = app.create("example.com", "user-1", Tier::Standard).await;

    let jan_1 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let jan_2 = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let feb_1 = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
    seed_day(&app, &code, jan_1, &["IN", "IN", "US", "US", "US"]).await;
    seed_day(&app, &code, jan_2, &["DE"]).await;
    seed_day(&app, &code, feb_1, &["FR"]).await;

    let server = app.server();
    let response = server
        .get(&format!("/api/metrics/{code}"))
        .add_query_param("start_date", "2023-01-01")
        .add_query_param("end_date", "2023-01-31")
        .add_header(OWNER_HEADER, "user-1")
        .add_header(TIER_HEADER, "std")
        .await;

    response.assert_status_ok();
    let rows = response.json::<serde_json::Value>();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0]["day"], "2023-01-01");
    assert_eq!(rows[0]["total_hits"], 5);
    assert_eq!(rows[0]["by_country"]["IN"], 2);
    assert_eq!(rows[0]["by_country"]["US"], 3);
    assert_eq!(rows[0]["by_device_type"]["desktop"], 5);
    assert_eq!(rows[0]["by_referrer"]["none"], 5);

    assert_eq!(rows[1]["day"], "2023-01-02");
    assert_eq!(rows[1]["total_hits"], 1);
}

#[tokio::test]
async fn test_metrics_defaults_to_today() {
    let app = common::create_test_app();
    let code = app.create("example.com", "user-1", Tier::Premium).await;

    let today = Utc::now().date_naive();
    seed_day(&app, &code, today, &["US", "US"]).await;
    seed_day(&app, &code, today.pred_opt().unwrap(), &["US"]).await;

    let server = app.server();
    let response = server
        .get(&format!("/api/metrics/{code}"))
        .add_header(OWNER_HEADER, "user-1")
        .add_header(TIER_HEADER, "pro")
        .await;

    response.assert_status_ok();
    let rows = response.json::<serde_json::Value>();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["total_hits"], 2);
}

#[tokio::test]
async fn test_metrics_of_another_owner_forbidden() {
    let app = common::create_test_app();
    let code = app.create("example.com", "user-1", Tier::Standard).await;

    let server = app.server();
    let response = server
        .get(&format!("/api/metrics/{code}"))
        .add_header(OWNER_HEADER, "user-2")
        .add_header(TIER_HEADER, "std")
        .await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_metrics_unknown_code_not_found() {
    let app = common::create_test_app();
    let code = app.encoder.short_code(Tier::Standard, 77).unwrap();

    let server = app.server();
    let response = server
        .get(&format!("/api/metrics/{code}"))
        .add_header(OWNER_HEADER, "user-1")
        .add_header(TIER_HEADER, "std")
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_metrics_inverted_range_rejected() {
    let app = common::create_test_app();
    let code = app.create("example.com", "user-1", Tier::Standard).await;

    let server = app.server();
    let response = server
        .get(&format!("/api/metrics/{code}"))
        .add_query_param("start_date", "2023-02-01")
        .add_query_param("end_date", "2023-01-01")
        .add_header(OWNER_HEADER, "user-1")
        .add_header(TIER_HEADER, "std")
        .await;

    assert_eq!(response.status_code(), 422);
}

#[tokio::test]
async fn test_metrics_requires_caller() {
    let app = common::create_test_app();
    let code = app.create("example.com", "user-1", Tier::Standard).await;

    let server = app.server();
    let response = server.get(&format!("/api/metrics/{code}")).await;

    assert_eq!(response.status_code(), 401);
}
