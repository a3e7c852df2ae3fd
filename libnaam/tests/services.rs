//! Service-level behaviour against the mock backend

mod common;

use common::{api_path, logged_in, MockBackend, MockResponse};
use libnaam::service::events::Event;
use libnaam::types::{
    EngagementAction, FeedKind, LocationLevel, NewCollectionEntry, UserProfile, UserRole,
};
use libnaam::NaamError;
use serde_json::json;

#[tokio::test]
async fn test_profile_update_overwrites_cached_profile() {
    let backend = MockBackend::start().await;
    let service = logged_in(&backend, "F1", UserRole::Farmer);
    let mut events = service.subscribe();
    backend
        .enqueue_response(MockResponse::success(json!({
            "id": "F1",
            "name": "Lakshmi Nair",
            "email": "lakshmi@example.com"
        })))
        .await;

    let patch = UserProfile {
        name: Some("Lakshmi Nair".to_string()),
        email: Some("lakshmi@example.com".to_string()),
        ..Default::default()
    };
    let updated = service.profile().update(&patch).await.unwrap();

    assert_eq!(updated.name.as_deref(), Some("Lakshmi Nair"));
    let cached = service.profile().cached().unwrap();
    assert_eq!(cached.name.as_deref(), Some("Lakshmi Nair"));
    assert_eq!(cached.email.as_deref(), Some("lakshmi@example.com"));
    assert_eq!(
        events.recv().await.unwrap(),
        Event::ProfileUpdated {
            user_id: "F1".to_string()
        }
    );

    let request = &backend.captured_requests().await[0];
    assert_eq!(request.method, "PATCH");
    assert_eq!(request.path, api_path("/users/profile"));
    assert_eq!(request.json()["name"], "Lakshmi Nair");
}

#[tokio::test]
async fn test_rejected_profile_update_keeps_cache() {
    let backend = MockBackend::start().await;
    let service = logged_in(&backend, "F1", UserRole::Farmer);
    backend
        .enqueue_response(MockResponse::error(422, "Email already in use"))
        .await;

    let patch = UserProfile {
        name: Some("Someone Else".to_string()),
        ..Default::default()
    };
    let err = service.profile().update(&patch).await.unwrap_err();

    assert!(err.to_string().contains("Email already in use"));
    let cached = service.profile().cached().unwrap();
    assert_eq!(cached.name.as_deref(), Some("Lakshmi"));
}

#[tokio::test]
async fn test_engagement_reconciles_with_server_count() {
    let backend = MockBackend::start().await;
    let service = logged_in(&backend, "F1", UserRole::Farmer);
    backend
        .enqueue_response(MockResponse::success(json!([
            {"id": "n1", "title": "Copra prices rise", "likes": 10, "views": 200}
        ])))
        .await;
    backend
        .enqueue_response(MockResponse::success(json!({"likes": 12})))
        .await;

    service.feed().news().await;
    let before = service
        .feed()
        .counter(FeedKind::News, "n1", EngagementAction::Like);
    assert_eq!(before.displayed(), 10);

    let after = service
        .feed()
        .engage(FeedKind::News, "n1", EngagementAction::Like)
        .await;
    assert_eq!(after.displayed(), 12);
    assert_eq!(after.pending(), 0);

    let request = &backend.captured_requests().await[1];
    assert_eq!(request.method, "PATCH");
    assert_eq!(request.path, api_path("/news/n1/engagement"));
    assert_eq!(request.json(), json!({"action": "like"}));
}

#[tokio::test]
async fn test_failed_engagement_keeps_optimistic_count() {
    let backend = MockBackend::start().await;
    let service = logged_in(&backend, "F1", UserRole::Farmer);
    backend
        .enqueue_response(MockResponse::success(json!({
            "id": "q1", "text": "Work is worship", "shares": 4
        })))
        .await;
    backend.enqueue_response(MockResponse::error(503, "busy")).await;

    service.feed().quote().await.into_result().unwrap();
    let mut events = service.subscribe();
    let counter = service
        .feed()
        .engage(FeedKind::Quotes, "q1", EngagementAction::Share)
        .await;

    assert_eq!(counter.server(), 4);
    assert_eq!(counter.pending(), 1);
    assert_eq!(counter.displayed(), 5);
    assert_eq!(
        events.recv().await.unwrap(),
        Event::RequestFailed {
            operation: "engage.quotes".to_string(),
            message: "busy".to_string(),
        }
    );
}

#[tokio::test]
async fn test_dashboard_panels_fail_independently() {
    let backend = MockBackend::start().await;
    let service = logged_in(&backend, "F1", UserRole::Farmer);
    backend
        .route(
            "GET",
            &api_path("/users/profile"),
            MockResponse::success(json!({"id": "F1", "name": "Lakshmi"})),
        )
        .await;
    backend
        .route("GET", &api_path("/news"), MockResponse::error(500, "down"))
        .await;
    backend
        .route("GET", &api_path("/polls/active"), MockResponse::success(json!([])))
        .await;
    backend
        .route(
            "GET",
            &api_path("/quotes/today"),
            MockResponse::success(json!({"quote": {"id": "q1", "text": "Sow today"}})),
        )
        .await;
    backend
        .route(
            "GET",
            &api_path("/prices/history"),
            MockResponse::success(json!([
                {"date": "2026-10-02", "commodity": "coconut", "modalPrice": 31.0},
                {"date": "2026-10-01", "commodity": "coconut", "modalPrice": 30.0}
            ])),
        )
        .await;

    let mut events = service.subscribe();
    let dashboard = service.dashboard().load().await;

    assert_eq!(dashboard.failed_panels(), vec!["news"]);
    assert_eq!(
        events.try_recv().unwrap(),
        Event::RequestFailed {
            operation: "dashboard.news".to_string(),
            message: "down".to_string(),
        }
    );
    assert!(events.try_recv().is_err());
    assert_eq!(dashboard.quote.as_ref().ok().unwrap().text, "Sow today");
    let stats = dashboard.price_stats().unwrap();
    assert_eq!(stats.latest, 31.0);
    assert_eq!(backend.captured_requests().await.len(), 5);
}

#[tokio::test]
async fn test_collection_create_emits_event() {
    let backend = MockBackend::start().await;
    let service = logged_in(&backend, "O1", UserRole::Farmer);
    let mut events = service.subscribe();
    backend
        .enqueue_response(MockResponse::success(json!({
            "collection": {"id": 77, "farmerId": "F1", "quantity": 400, "amount": 5800, "status": "pending"}
        })))
        .await;

    let entry = NewCollectionEntry {
        farmer_id: "F1".to_string(),
        collected_on: chrono::NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        quantity: 400,
        weight_kg: Some(520.0),
        rate: 14.5,
    };
    let created = service.collections().create(&entry).await.unwrap();

    assert_eq!(created.id, "77");
    assert_eq!(created.amount, 5800.0);
    assert_eq!(
        events.recv().await.unwrap(),
        Event::CollectionCreated {
            entry_id: "77".to_string()
        }
    );
    let request = &backend.captured_requests().await[0];
    assert_eq!(request.path, api_path("/collections"));
    assert_eq!(request.json()["farmerId"], "F1");
    assert_eq!(request.json()["quantity"], 400);
}

#[tokio::test]
async fn test_collection_create_rejects_zero_quantity() {
    let backend = MockBackend::start().await;
    let service = logged_in(&backend, "O1", UserRole::Farmer);

    let entry = NewCollectionEntry {
        farmer_id: "F1".to_string(),
        collected_on: chrono::NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        quantity: 0,
        weight_kg: None,
        rate: 14.5,
    };
    let err = service.collections().create(&entry).await.unwrap_err();

    assert!(matches!(err, NaamError::InvalidInput(_)));
    assert!(backend.captured_requests().await.is_empty());
}

#[tokio::test]
async fn test_location_cascade_over_http() {
    let backend = MockBackend::start().await;
    let service = logged_in(&backend, "F1", UserRole::Farmer);
    backend
        .enqueue_response(MockResponse::success(json!([{"id": 32, "name": "Kerala"}])))
        .await;
    backend
        .enqueue_response(MockResponse::success(json!({"districts": [{"id": 7, "name": "Alappuzha"}]})))
        .await;
    backend
        .enqueue_response(MockResponse::error(500, "taluk table missing"))
        .await;

    let mut selector = service.locations();
    selector.load_states().await;
    selector.select_state("32").await;
    selector.select_district("7").await;

    assert_eq!(selector.options(LocationLevel::State)[0].name, "Kerala");
    assert_eq!(selector.options(LocationLevel::District)[0].name, "Alappuzha");
    assert!(selector.options(LocationLevel::Taluk).is_empty());
    assert!(selector.error(LocationLevel::Taluk).is_some());
    assert!(selector.selection().is_none());

    let paths: Vec<String> = backend
        .captured_requests()
        .await
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert_eq!(
        paths,
        vec![
            api_path("/locations/states"),
            api_path("/locations/states/32/districts"),
            api_path("/locations/districts/7/taluks"),
        ]
    );
}

#[tokio::test]
async fn test_investor_portfolio_requires_investor_role() {
    let backend = MockBackend::start().await;
    let service = logged_in(&backend, "F1", UserRole::Farmer);

    let err = service.collections().investor_farmers().await.unwrap_err();

    assert_eq!(err.exit_code(), 3);
    assert!(backend.captured_requests().await.is_empty());
}
