//! In-memory backend for tests and offline demos
//!
//! `MockBackend` implements the service-layer seams (`OtpGateway`,
//! `LocationSource`) without a network. Every call is recorded so tests
//! can assert on what was asked for and in which order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use super::{Ack, ApiResult, LoginData};
use crate::error::ApiError;
use crate::service::auth::OtpGateway;
use crate::service::locations::LocationSource;
use crate::types::{Location, LocationLevel, UserProfile, UserRole};

/// Configuration for mock backend behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Whether send-otp is accepted
    pub send_succeeds: bool,

    /// The only OTP verify-otp accepts
    pub valid_otp: String,

    /// Token handed out on a successful verification
    pub token: String,

    pub user_id: String,

    /// Role reported by the server; `None` echoes the requested role
    pub role: Option<UserRole>,

    /// Location lists keyed by level and parent id
    pub locations: HashMap<(LocationLevel, Option<String>), Vec<Location>>,

    /// Levels whose lookups fail with a network error
    pub failing_levels: Vec<LocationLevel>,

    /// Delay before completing operations (simulates network latency)
    pub delay: Duration,

    /// Every call made, as `"operation:argument"`
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            send_succeeds: true,
            valid_otp: "123456".to_string(),
            token: "mock-token".to_string(),
            user_id: "mock-user".to_string(),
            role: None,
            locations: HashMap::new(),
            failing_levels: Vec::new(),
            delay: Duration::from_millis(0),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockConfig {
    /// Add the children of `parent` at `level`
    pub fn with_locations(
        mut self,
        level: LocationLevel,
        parent: Option<&str>,
        names: &[(&str, &str)],
    ) -> Self {
        let items = names
            .iter()
            .map(|(id, name)| Location {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        self.locations
            .insert((level, parent.map(str::to_string)), items);
        self
    }
}

pub struct MockBackend {
    config: MockConfig,
}

impl MockBackend {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// A backend with default behavior
    pub fn success() -> Self {
        Self::new(MockConfig::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.config
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        let prefix = format!("{}:", operation);
        self.calls()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    async fn record(&self, operation: &str, argument: &str) {
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }
        self.config
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{}:{}", operation, argument));
    }
}

#[async_trait]
impl OtpGateway for MockBackend {
    async fn request_otp(&self, mobile: &str, _role: UserRole) -> ApiResult<Ack> {
        self.record("send_otp", mobile).await;
        if self.config.send_succeeds {
            ApiResult::Success(Ack {
                message: Some("OTP sent".to_string()),
            })
        } else {
            ApiResult::Failure(ApiError::Rejected("Unable to send OTP".to_string()))
        }
    }

    async fn confirm_otp(&self, mobile: &str, otp: &str, role: UserRole) -> ApiResult<LoginData> {
        self.record("verify_otp", mobile).await;
        if otp != self.config.valid_otp {
            return ApiResult::Failure(ApiError::Rejected("Invalid OTP".to_string()));
        }
        let role = self.config.role.unwrap_or(role);
        ApiResult::Success(LoginData {
            token: self.config.token.clone(),
            user_id: self.config.user_id.clone(),
            role,
            user: UserProfile {
                id: Some(self.config.user_id.clone()),
                mobile: Some(mobile.to_string()),
                role: Some(role),
                ..Default::default()
            },
        })
    }
}

#[async_trait]
impl LocationSource for MockBackend {
    async fn fetch(&self, level: LocationLevel, parent_id: Option<&str>) -> ApiResult<Vec<Location>> {
        self.record(&level.to_string(), parent_id.unwrap_or("")).await;
        if self.config.failing_levels.contains(&level) {
            return ApiResult::Failure(ApiError::Network(format!("{} lookup failed", level)));
        }
        let key = (level, parent_id.map(str::to_string));
        ApiResult::Success(self.config.locations.get(&key).cloned().unwrap_or_default())
    }
}
