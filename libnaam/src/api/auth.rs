//! OTP login endpoints

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use super::{endpoints, Ack, ApiClient, ApiResult, Auth};
use crate::error::ApiError;
use crate::service::auth::OtpGateway;
use crate::types::{UserProfile, UserRole};

/// What a successful OTP verification hands back
#[derive(Clone, PartialEq)]
pub struct LoginData {
    pub token: String,
    pub user_id: String,
    pub role: UserRole,
    pub user: UserProfile,
}

impl std::fmt::Debug for LoginData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginData")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("user", &self.user)
            .finish()
    }
}

impl LoginData {
    /// Pull the token, user and role out of the verify-otp payload
    ///
    /// The user object may sit under `user` or `farmer`; the role may be
    /// top-level or on the user. `requested_role` is used only when the
    /// server names none.
    pub fn from_data(data: &Value, requested_role: Option<UserRole>) -> Result<Self, ApiError> {
        let token = ["token", "accessToken", "authToken"]
            .iter()
            .find_map(|k| data.get(*k).and_then(Value::as_str))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Decode("login response has no token".to_string()))?
            .to_string();

        let user_value = ["user", "farmer"]
            .iter()
            .find_map(|k| data.get(*k))
            .unwrap_or(&Value::Null);
        let user = UserProfile::from_server_payload(user_value);

        let top_level_id = ["userId", "user_id"].iter().find_map(|k| match data.get(*k) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        });
        let user_id = user
            .id
            .clone()
            .or(top_level_id)
            .ok_or_else(|| ApiError::Decode("login response has no user id".to_string()))?;

        let top_level_role = data
            .get("role")
            .and_then(Value::as_str)
            .and_then(|r| r.parse().ok());
        let role = top_level_role
            .or(user.role)
            .or(requested_role)
            .ok_or_else(|| ApiError::Decode("login response has no role".to_string()))?;

        Ok(Self {
            token,
            user_id,
            role,
            user,
        })
    }
}

impl ApiClient {
    pub async fn send_otp(&self, mobile: &str, role: UserRole) -> ApiResult<Ack> {
        let body = json!({ "mobile": mobile, "role": role });
        self.send_json(Method::POST, endpoints::SEND_OTP, Auth::Public, &body)
            .await
            .map(|envelope| envelope.ack())
            .into()
    }

    pub async fn verify_otp(&self, mobile: &str, otp: &str, role: UserRole) -> ApiResult<LoginData> {
        let body = json!({ "mobile": mobile, "otp": otp, "role": role });
        self.send_json(Method::POST, endpoints::VERIFY_OTP, Auth::Public, &body)
            .await
            .and_then(|envelope| LoginData::from_data(&envelope.data, Some(role)))
            .into()
    }

    /// Tell the backend the token is done with
    pub async fn logout(&self) -> ApiResult<Ack> {
        self.send_json(Method::POST, endpoints::LOGOUT, Auth::Bearer, &json!({}))
            .await
            .map(|envelope| envelope.ack())
            .into()
    }
}

#[async_trait]
impl OtpGateway for ApiClient {
    async fn request_otp(&self, mobile: &str, role: UserRole) -> ApiResult<Ack> {
        self.send_otp(mobile, role).await
    }

    async fn confirm_otp(&self, mobile: &str, otp: &str, role: UserRole) -> ApiResult<LoginData> {
        self.verify_otp(mobile, otp, role).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_data_from_nested_user() {
        let data = json!({
            "token": "jwt-abc",
            "user": {"id": 42, "name": "Ravi", "role": "investor"}
        });
        let login = LoginData::from_data(&data, Some(UserRole::Farmer)).unwrap();
        assert_eq!(login.token, "jwt-abc");
        assert_eq!(login.user_id, "42");
        assert_eq!(login.role, UserRole::Investor);
        assert_eq!(login.user.name.as_deref(), Some("Ravi"));
    }

    #[test]
    fn test_login_data_falls_back_to_requested_role() {
        let data = json!({"accessToken": "t", "userId": "u9"});
        let login = LoginData::from_data(&data, Some(UserRole::ServiceProvider)).unwrap();
        assert_eq!(login.user_id, "u9");
        assert_eq!(login.role, UserRole::ServiceProvider);
    }

    #[test]
    fn test_login_data_requires_token() {
        let err = LoginData::from_data(&json!({"userId": "u9"}), Some(UserRole::Farmer)).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_login_data_debug_redacts_token() {
        let login = LoginData::from_data(
            &json!({"token": "super-secret", "userId": "1"}),
            Some(UserRole::Farmer),
        )
        .unwrap();
        assert!(!format!("{:?}", login).contains("super-secret"));
    }
}
