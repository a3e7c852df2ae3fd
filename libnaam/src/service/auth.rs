//! OTP login
//!
//! The login screen is a three-state machine:
//!
//! ```text
//! NotSent --send_otp--> Sent --verify_otp--> Verified
//!                        ^  |
//!                        +--+ verify failure (last_error set)
//! ```
//!
//! `OtpFlow` drives it against any `OtpGateway`; `ApiClient` is the real
//! one. A successful verification persists the session and tells the
//! front end to open the role's dashboard.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::Navigation;
use crate::api::{Ack, ApiClient, ApiResult, LoginData};
use crate::error::{NaamError, Result};
use crate::session::{SessionInfo, SessionManager};
use crate::service::validation::{is_valid_mobile, validate_mobile, validate_otp};
use crate::types::UserRole;

/// Backend calls the OTP flow needs
#[async_trait]
pub trait OtpGateway: Send + Sync {
    async fn request_otp(&self, mobile: &str, role: UserRole) -> ApiResult<Ack>;

    async fn confirm_otp(&self, mobile: &str, otp: &str, role: UserRole) -> ApiResult<LoginData>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpState {
    NotSent,
    Sent { mobile: String, sent_at: Instant },
    Verified { role: UserRole },
}

pub struct OtpFlow<G: OtpGateway> {
    gateway: Arc<G>,
    session: Arc<SessionManager>,
    role: UserRole,
    cooldown: Duration,
    state: OtpState,
    last_error: Option<String>,
}

impl<G: OtpGateway> OtpFlow<G> {
    pub fn new(
        gateway: Arc<G>,
        session: Arc<SessionManager>,
        role: UserRole,
        cooldown: Duration,
    ) -> Self {
        Self {
            gateway,
            session,
            role,
            cooldown,
            state: OtpState::NotSent,
            last_error: None,
        }
    }

    pub fn state(&self) -> &OtpState {
        &self.state
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    /// Message from the last failed send or verify
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether "request OTP" is enabled for this input
    pub fn can_request_otp(mobile: &str) -> bool {
        is_valid_mobile(mobile.trim())
    }

    /// Time until another OTP may be requested; zero when allowed now
    pub fn resend_available_in(&self) -> Duration {
        match &self.state {
            OtpState::Sent { sent_at, .. } => self.cooldown.saturating_sub(sent_at.elapsed()),
            _ => Duration::ZERO,
        }
    }

    /// Request an OTP for `mobile`
    ///
    /// An invalid number is rejected without a request and without
    /// changing state. Returns the server's message, if any.
    pub async fn send_otp(&mut self, mobile: &str) -> Result<Option<String>> {
        let mobile = mobile.trim();
        validate_mobile(mobile).map_err(NaamError::Validation)?;

        match &self.state {
            OtpState::Verified { .. } => {
                return Err(NaamError::InvalidInput("Already logged in".to_string()));
            }
            OtpState::Sent { .. } => {
                let wait = self.resend_available_in();
                if !wait.is_zero() {
                    return Err(NaamError::InvalidInput(format!(
                        "Please wait {} seconds before requesting another OTP",
                        wait.as_secs().max(1)
                    )));
                }
            }
            OtpState::NotSent => {}
        }

        match self.gateway.request_otp(mobile, self.role).await {
            ApiResult::Success(ack) => {
                tracing::info!("OTP sent to {}", mask_mobile(mobile));
                self.state = OtpState::Sent {
                    mobile: mobile.to_string(),
                    sent_at: Instant::now(),
                };
                self.last_error = None;
                Ok(ack.message)
            }
            ApiResult::Failure(e) => {
                tracing::warn!("Sending OTP failed: {}", e);
                self.last_error = Some(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Verify `otp` against the number it was sent to
    ///
    /// On failure the flow stays in `Sent` with `last_error` set.
    pub async fn verify_otp(&mut self, otp: &str) -> Result<Navigation> {
        let OtpState::Sent { mobile, .. } = &self.state else {
            return Err(NaamError::InvalidInput(
                "Request an OTP before verifying".to_string(),
            ));
        };
        let mobile = mobile.clone();
        let otp = otp.trim();

        if let Err(errors) = validate_otp(otp) {
            self.last_error = Some(errors.to_string());
            return Err(NaamError::Validation(errors));
        }

        let login = match self.gateway.confirm_otp(&mobile, otp, self.role).await {
            ApiResult::Success(login) => login,
            ApiResult::Failure(e) => {
                tracing::warn!("OTP verification failed: {}", e);
                self.last_error = Some(e.user_message());
                return Err(e.into());
            }
        };

        let role = login.role;
        let mut user = login.user;
        if user.mobile.is_none() {
            user.mobile = Some(mobile);
        }
        self.session.begin(
            login.token,
            SessionInfo {
                user_id: login.user_id,
                user_role: role,
                user_data: user,
                profile_images: Vec::new(),
            },
        )?;

        self.state = OtpState::Verified { role };
        self.last_error = None;
        Ok(Navigation::Dashboard(role))
    }
}

fn mask_mobile(mobile: &str) -> String {
    let visible = mobile.len().saturating_sub(4);
    format!("{}{}", "*".repeat(visible), &mobile[visible..])
}

/// Login and logout against the real backend
#[derive(Clone)]
pub struct AuthService {
    client: Arc<ApiClient>,
    session: Arc<SessionManager>,
    cooldown: Duration,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>, session: Arc<SessionManager>, cooldown: Duration) -> Self {
        Self {
            client,
            session,
            cooldown,
        }
    }

    /// A fresh OTP flow for `role`
    pub fn start_login(&self, role: UserRole) -> OtpFlow<ApiClient> {
        OtpFlow::new(
            Arc::clone(&self.client),
            Arc::clone(&self.session),
            role,
            self.cooldown,
        )
    }

    /// Tell the backend, then clear the local session
    ///
    /// A failed backend call is logged; the local session is cleared
    /// regardless.
    pub async fn logout(&self) -> Result<()> {
        if self.session.is_authenticated() {
            if let ApiResult::Failure(e) = self.client.logout().await {
                tracing::warn!("Backend logout failed: {}", e);
            }
        }
        self.session.logout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockBackend, MockConfig};
    use crate::service::events::EventBus;
    use crate::session::MemoryStore;

    fn flow(config: MockConfig, cooldown: Duration) -> (OtpFlow<MockBackend>, Arc<MockBackend>, Arc<SessionManager>) {
        let backend = Arc::new(MockBackend::new(config));
        let session = Arc::new(SessionManager::new(Box::new(MemoryStore::new()), EventBus::new(8)));
        let flow = OtpFlow::new(
            Arc::clone(&backend),
            Arc::clone(&session),
            UserRole::Farmer,
            cooldown,
        );
        (flow, backend, session)
    }

    #[test]
    fn test_request_enabled_only_for_ten_digits() {
        assert!(OtpFlow::<MockBackend>::can_request_otp("9876543210"));
        assert!(!OtpFlow::<MockBackend>::can_request_otp("987654321"));
        assert!(!OtpFlow::<MockBackend>::can_request_otp("98765432100"));
    }

    #[tokio::test]
    async fn test_invalid_mobile_sends_nothing() {
        let (mut flow, backend, _) = flow(MockConfig::default(), Duration::ZERO);
        let err = flow.send_otp("12345").await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(flow.state(), &OtpState::NotSent);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_happy_path_reaches_dashboard() {
        let (mut flow, _, session) = flow(MockConfig::default(), Duration::ZERO);

        flow.send_otp("9876543210").await.unwrap();
        assert!(matches!(flow.state(), OtpState::Sent { mobile, .. } if mobile == "9876543210"));

        let nav = flow.verify_otp("123456").await.unwrap();
        assert_eq!(nav, Navigation::Dashboard(UserRole::Farmer));
        assert_eq!(flow.state(), &OtpState::Verified { role: UserRole::Farmer });

        let info = session.current().unwrap();
        assert_eq!(info.user_id, "mock-user");
        assert_eq!(info.user_data.mobile.as_deref(), Some("9876543210"));
    }

    #[tokio::test]
    async fn test_wrong_otp_stays_sent_with_error() {
        let (mut flow, _, session) = flow(MockConfig::default(), Duration::ZERO);
        flow.send_otp("9876543210").await.unwrap();

        assert!(flow.verify_otp("000000").await.is_err());
        assert!(matches!(flow.state(), OtpState::Sent { .. }));
        assert_eq!(flow.last_error(), Some("Invalid OTP"));
        assert!(!session.is_authenticated());

        flow.verify_otp("123456").await.unwrap();
        assert!(flow.last_error().is_none());
    }

    #[tokio::test]
    async fn test_short_otp_rejected_locally() {
        let (mut flow, backend, _) = flow(MockConfig::default(), Duration::ZERO);
        flow.send_otp("9876543210").await.unwrap();

        assert!(flow.verify_otp("1234").await.is_err());
        assert_eq!(backend.call_count("verify_otp"), 0);
        assert!(matches!(flow.state(), OtpState::Sent { .. }));
    }

    #[tokio::test]
    async fn test_verify_before_send_is_rejected() {
        let (mut flow, _, _) = flow(MockConfig::default(), Duration::ZERO);
        assert!(flow.verify_otp("123456").await.is_err());
        assert_eq!(flow.state(), &OtpState::NotSent);
    }

    #[tokio::test]
    async fn test_resend_respects_cooldown() {
        let (mut flow, backend, _) = flow(MockConfig::default(), Duration::from_secs(30));
        flow.send_otp("9876543210").await.unwrap();
        assert!(flow.resend_available_in() > Duration::from_secs(25));

        assert!(flow.send_otp("9876543210").await.is_err());
        assert_eq!(backend.call_count("send_otp"), 1);
    }

    #[tokio::test]
    async fn test_send_failure_keeps_not_sent() {
        let config = MockConfig {
            send_succeeds: false,
            ..Default::default()
        };
        let (mut flow, _, _) = flow(config, Duration::ZERO);
        assert!(flow.send_otp("9876543210").await.is_err());
        assert_eq!(flow.state(), &OtpState::NotSent);
        assert_eq!(flow.last_error(), Some("Unable to send OTP"));
    }

    #[test]
    fn test_mask_mobile() {
        assert_eq!(mask_mobile("9876543210"), "******3210");
    }
}
