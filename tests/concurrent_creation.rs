mod common;

use std::collections::HashSet;
use tierlink::domain::tier::Tier;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_creations_get_unique_codes() {
    let app = common::create_test_app();

    let mut handles = Vec::new();
    for i in 0..64 {
        let service = app.state.link_service.clone();
        let tier = if i % 2 == 0 { Tier::Standard } else { Tier::Premium };
        handles.push(tokio::spawn(async move {
            service
                .create_short_url(&format!("example.com/{i}"), &format!("user-{}", i % 5), tier)
                .await
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert!(codes.insert(record.code));
    }

    assert_eq!(codes.len(), 64);
    assert_eq!(app.store.record_count(), 64);
}

#[tokio::test]
async fn test_fallback_counter_skips_taken_codes() {
    let app = common::create_test_app();

    let mut issued = Vec::new();
    for i in 0..3 {
        issued.push(
            app.create(&format!("example.com/{i}"), "user-1", Tier::Standard)
                .await,
        );
    }

    // Primary counter down: the store counter restarts at 1 and collides
    // with the codes already issued.
    app.cache.set_available(false);
    let code = app.create("example.com/fallback", "user-1", Tier::Standard).await;

    assert!(!issued.contains(&code));
    assert_eq!(app.encoder.parse_short_code(&code).unwrap().counter, 4);
    assert_eq!(app.store.record_count(), 4);
}

#[tokio::test]
async fn test_creation_fails_when_both_counters_are_down() {
    let app = common::create_test_app();
    app.cache.set_available(false);
    app.store.set_available(false);

    let err = app
        .state
        .link_service
        .create_short_url("example.com", "user-1", Tier::Standard)
        .await
        .unwrap_err();

    assert!(err.is_transient());
}
