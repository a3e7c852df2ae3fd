//! OTP login, session persistence and logout over HTTP

mod common;

use common::{api_path, test_config, MockBackend, MockResponse};
use libnaam::service::auth::OtpState;
use libnaam::service::NaamService;
use libnaam::session::FileStore;
use libnaam::types::UserRole;
use libnaam::{NaamError, Navigation};
use serde_json::json;
use tempfile::TempDir;

fn file_service(backend: &MockBackend, dir: &TempDir) -> NaamService {
    let store = FileStore::new(dir.path().join("session.json"));
    NaamService::with_store(test_config(backend), Box::new(store)).unwrap()
}

#[tokio::test]
async fn test_login_persists_session_across_restarts() {
    let backend = MockBackend::start().await;
    let dir = TempDir::new().unwrap();
    backend
        .enqueue_response(MockResponse::json(
            r#"{"success": true, "message": "OTP sent successfully"}"#,
        ))
        .await;
    backend
        .enqueue_response(MockResponse::success(json!({
            "token": "jwt-abc",
            "user": {"id": 42, "name": "Ravi", "role": "farmer"}
        })))
        .await;

    {
        let service = file_service(&backend, &dir);
        let mut flow = service.auth().start_login(UserRole::Farmer);

        let message = flow.send_otp("9876543210").await.unwrap();
        assert_eq!(message.as_deref(), Some("OTP sent successfully"));
        assert!(matches!(flow.state(), OtpState::Sent { .. }));

        let navigation = flow.verify_otp("123456").await.unwrap();
        assert_eq!(navigation, Navigation::Dashboard(UserRole::Farmer));
        assert!(service.session().is_authenticated());
    }

    let requests = backend.captured_requests().await;
    assert_eq!(requests[0].path, api_path("/auth/send-otp"));
    assert_eq!(
        requests[0].json(),
        json!({"mobile": "9876543210", "role": "farmer"})
    );
    assert_eq!(requests[1].path, api_path("/auth/verify-otp"));
    assert_eq!(requests[1].json()["otp"], "123456");

    // A second process over the same file picks the session up
    let restarted = file_service(&backend, &dir);
    let info = restarted.session().current().unwrap();
    assert_eq!(info.user_id, "42");
    assert_eq!(info.user_role, UserRole::Farmer);
    assert_eq!(info.user_data.name.as_deref(), Some("Ravi"));
    assert_eq!(info.user_data.mobile.as_deref(), Some("9876543210"));

    backend.enqueue_response(MockResponse::success(json!([]))).await;
    restarted.client().get_news().await;
    let last = backend.captured_requests().await.pop().unwrap();
    assert_eq!(last.header("authorization"), Some("Bearer jwt-abc"));
}

#[tokio::test]
async fn test_invalid_mobile_sends_nothing() {
    let backend = MockBackend::start().await;
    let dir = TempDir::new().unwrap();
    let service = file_service(&backend, &dir);
    let mut flow = service.auth().start_login(UserRole::Farmer);

    let err = flow.send_otp("98765").await.unwrap_err();

    assert!(matches!(err, NaamError::Validation(_)));
    assert_eq!(flow.state(), &OtpState::NotSent);
    assert!(backend.captured_requests().await.is_empty());
}

#[tokio::test]
async fn test_wrong_otp_keeps_flow_open() {
    let backend = MockBackend::start().await;
    let dir = TempDir::new().unwrap();
    let service = file_service(&backend, &dir);
    backend
        .enqueue_response(MockResponse::json(r#"{"status": "success"}"#))
        .await;
    backend
        .enqueue_response(MockResponse::json(
            r#"{"status": "error", "message": "Invalid OTP"}"#,
        ))
        .await;

    let mut flow = service.auth().start_login(UserRole::Investor);
    flow.send_otp("9876543210").await.unwrap();
    let err = flow.verify_otp("000000").await.unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert_eq!(flow.last_error(), Some("Invalid OTP"));
    assert!(matches!(flow.state(), OtpState::Sent { .. }));
    assert!(!service.session().is_authenticated());
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test]
async fn test_logout_clears_file_and_tells_backend() {
    let backend = MockBackend::start().await;
    let dir = TempDir::new().unwrap();
    backend
        .enqueue_response(MockResponse::json(r#"{"status": "success"}"#))
        .await;
    backend
        .enqueue_response(MockResponse::success(json!({
            "token": "jwt-xyz",
            "userId": "I9",
            "role": "investor"
        })))
        .await;

    let service = file_service(&backend, &dir);
    let mut flow = service.auth().start_login(UserRole::Investor);
    flow.send_otp("9123456780").await.unwrap();
    flow.verify_otp("654321").await.unwrap();
    assert!(dir.path().join("session.json").exists());

    // The backend call fails but the local session is still cleared
    backend.enqueue_response(MockResponse::error(500, "oops")).await;
    service.auth().logout().await.unwrap();

    assert!(!service.session().is_authenticated());
    assert!(!dir.path().join("session.json").exists());
    let last = backend.captured_requests().await.pop().unwrap();
    assert_eq!(last.path, api_path("/auth/logout"));
    assert_eq!(last.header("authorization"), Some("Bearer jwt-xyz"));

    let restarted = file_service(&backend, &dir);
    assert!(restarted.session().current().is_none());
}
