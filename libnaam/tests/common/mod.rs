//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use std::sync::Arc;

use libnaam::service::NaamService;
use libnaam::session::{MemoryStore, SessionInfo};
use libnaam::types::{UserProfile, UserRole};
use libnaam::Config;

pub use mock_backend::{CapturedRequest, MockBackend, MockResponse};

pub const TOKEN: &str = "test-token";

/// Config pointed at the mock server
pub fn test_config(backend: &MockBackend) -> Config {
    let mut config = Config::default_config();
    config.api.base_url = backend.base_url();
    config.api.timeout_secs = 5;
    config.otp.resend_cooldown_secs = 0;
    config
}

/// A service over an in-memory session store, not logged in
pub fn service(backend: &MockBackend) -> NaamService {
    NaamService::with_store(test_config(backend), Box::new(MemoryStore::new()))
        .expect("Failed to build service")
}

/// A service already logged in as `role` with user id `user_id`
pub fn logged_in(backend: &MockBackend, user_id: &str, role: UserRole) -> NaamService {
    let service = service(backend);
    service
        .session()
        .begin(
            TOKEN.to_string(),
            SessionInfo {
                user_id: user_id.to_string(),
                user_role: role,
                user_data: UserProfile {
                    id: Some(user_id.to_string()),
                    name: Some("Lakshmi".to_string()),
                    ..Default::default()
                },
                profile_images: Vec::new(),
            },
        )
        .expect("Failed to begin session");
    service
}

/// Path under the API root, as the server sees it
pub fn api_path(path: &str) -> String {
    format!("/api/v1{}", path)
}
