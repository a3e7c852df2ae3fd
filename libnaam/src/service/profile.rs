//! Profile, KYC and bank details

use std::path::Path;
use std::sync::Arc;

use crate::api::profile::KycDocument;
use crate::api::{ActionOutcome, ApiClient, ApiResult};
use crate::error::{NaamError, Result};
use crate::service::validation::{validate_bank_details, validate_profile_patch};
use crate::session::SessionManager;
use crate::types::{Attachment, BankDetails, UserProfile};

/// Fields counted by the completion heuristic, by wire name
pub const PROFILE_CHECKLIST: [&str; 10] = [
    "name",
    "mobile",
    "email",
    "gender",
    "dateOfBirth",
    "address",
    "village",
    "pincode",
    "aadhaarNumber",
    "profileImage",
];

fn field_value<'a>(profile: &'a UserProfile, field: &str) -> Option<&'a str> {
    let value = match field {
        "name" => &profile.name,
        "mobile" => &profile.mobile,
        "email" => &profile.email,
        "gender" => &profile.gender,
        "dateOfBirth" => &profile.date_of_birth,
        "address" => &profile.address,
        "village" => &profile.village,
        "pincode" => &profile.pincode,
        "aadhaarNumber" => &profile.aadhaar_number,
        "profileImage" => &profile.profile_image,
        _ => return None,
    };
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Checklist fields that are still empty
pub fn missing_fields(profile: &UserProfile) -> Vec<&'static str> {
    PROFILE_CHECKLIST
        .iter()
        .copied()
        .filter(|field| field_value(profile, field).is_none())
        .collect()
}

/// Completion percentage, 0 to 100
///
/// The server's figure wins when it sent one; otherwise the share of
/// filled checklist fields, rounded.
pub fn profile_completion(profile: &UserProfile) -> u8 {
    if let Some(server) = profile.profile_completion.filter(|v| v.is_finite()) {
        return server.round().clamp(0.0, 100.0) as u8;
    }
    let total = PROFILE_CHECKLIST.len();
    let filled = total - missing_fields(profile).len();
    ((100 * filled) as f64 / total as f64).round() as u8
}

#[derive(Clone)]
pub struct ProfileService {
    client: Arc<ApiClient>,
    session: Arc<SessionManager>,
}

impl ProfileService {
    pub fn new(client: Arc<ApiClient>, session: Arc<SessionManager>) -> Self {
        Self { client, session }
    }

    /// The profile cached in the session
    pub fn cached(&self) -> Option<UserProfile> {
        self.session.current().map(|info| info.user_data)
    }

    /// Fetch the profile and refresh the session's copy
    pub async fn refresh(&self) -> Result<UserProfile> {
        let profile = self.client.get_profile().await.into_result()?;
        self.session.update_user_data(profile.clone())?;
        Ok(profile)
    }

    /// Validate, PATCH, then overwrite the cached profile
    ///
    /// Nothing is sent when validation fails, and the cache is only
    /// touched after the server accepted the edit.
    pub async fn update(&self, patch: &UserProfile) -> Result<UserProfile> {
        validate_profile_patch(patch).map_err(NaamError::Validation)?;

        let accepted = self.client.update_profile(patch).await.into_result()?;
        let mut merged = self.cached().unwrap_or_default();
        merged.merge(&accepted);
        self.session.update_user_data(merged.clone())?;
        tracing::info!("Profile updated");
        Ok(merged)
    }

    pub async fn upload_image(&self, path: &Path) -> Result<Vec<String>> {
        let attachment = Attachment::from_path("profileImage", path)?;
        if !attachment.mime_type.is_image() {
            return Err(NaamError::InvalidInput(format!(
                "'{}' is not an image",
                attachment.file_name
            )));
        }
        let urls = self
            .client
            .upload_profile_image(&attachment)
            .await
            .into_result()?;
        if !urls.is_empty() {
            self.session.set_profile_images(urls.clone())?;
        }
        Ok(urls)
    }

    pub async fn upload_kyc(&self, document: KycDocument, paths: &[&Path]) -> Result<ActionOutcome> {
        if paths.is_empty() {
            return Err(NaamError::InvalidInput(
                "Attach at least one document".to_string(),
            ));
        }
        let attachments = paths
            .iter()
            .map(|path| Attachment::from_path("documents", path))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .client
            .upload_kyc_documents(document, &attachments)
            .await
            .into_outcome())
    }

    pub async fn bank_details(&self) -> ApiResult<BankDetails> {
        self.client.get_bank_details().await
    }

    pub async fn update_bank_details(
        &self,
        details: &BankDetails,
        confirm_account_number: &str,
    ) -> Result<ActionOutcome> {
        validate_bank_details(details, confirm_account_number).map_err(NaamError::Validation)?;

        let mut normalized = details.clone();
        normalized.ifsc_code = normalized.ifsc_code.map(|c| c.trim().to_uppercase());
        Ok(self.client.update_bank_details(&normalized).await.into_outcome())
    }
}
