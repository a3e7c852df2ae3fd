//! Profile, KYC and bank-detail endpoints

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{endpoints, multipart_form, Ack, ApiClient, ApiResult, Auth};
use crate::error::ApiError;
use crate::types::{Attachment, BankDetails, UserProfile};

/// Identity document kinds accepted by the KYC endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycDocument {
    Aadhaar,
    Pan,
}

impl KycDocument {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycDocument::Aadhaar => "aadhaar",
            KycDocument::Pan => "pan",
        }
    }
}

impl std::str::FromStr for KycDocument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aadhaar" | "aadhar" => Ok(KycDocument::Aadhaar),
            "pan" => Ok(KycDocument::Pan),
            _ => Err(format!("Unknown KYC document '{}'. Use aadhaar or pan.", s)),
        }
    }
}

/// JSON body for a profile PATCH: only the fields that are set
fn patch_body(patch: &UserProfile) -> Result<Value, ApiError> {
    let mut value = serde_json::to_value(patch).map_err(|e| ApiError::Decode(e.to_string()))?;
    if let Value::Object(map) = &mut value {
        map.retain(|_, v| !v.is_null());
        map.remove("profileCompletion");
    }
    Ok(value)
}

/// Image URLs from an upload response: `images`, `urls`, a bare array, or
/// a single `imageUrl`
fn image_urls(data: &Value) -> Vec<String> {
    let list = match data {
        Value::Array(items) => Some(items),
        _ => ["images", "urls", "profileImages"]
            .iter()
            .find_map(|k| data.get(*k).and_then(Value::as_array)),
    };
    match list {
        Some(items) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                other => other.get("url").and_then(Value::as_str).map(str::to_string),
            })
            .collect(),
        None => ["imageUrl", "url", "profileImage"]
            .iter()
            .find_map(|k| data.get(*k).and_then(Value::as_str))
            .map(|s| vec![s.to_string()])
            .unwrap_or_default(),
    }
}

impl ApiClient {
    pub async fn get_profile(&self) -> ApiResult<UserProfile> {
        self.get(endpoints::PROFILE, &[])
            .await
            .map(|envelope| UserProfile::from_server_payload(&envelope.data))
            .into()
    }

    /// PATCH the profile and return what the server now holds
    ///
    /// When the server answers without a profile body, the patch itself
    /// is returned.
    pub async fn update_profile(&self, patch: &UserProfile) -> ApiResult<UserProfile> {
        let result = async {
            let body = patch_body(patch)?;
            let envelope = self
                .send_json(Method::PATCH, endpoints::PROFILE, Auth::Bearer, &body)
                .await?;
            let updated = UserProfile::from_server_payload(&envelope.data);
            Ok::<_, ApiError>(if updated == UserProfile::default() {
                patch.clone()
            } else {
                updated
            })
        };
        result.await.into()
    }

    /// Upload one profile image; returns the stored image URLs
    pub async fn upload_profile_image(&self, attachment: &Attachment) -> ApiResult<Vec<String>> {
        let result = async {
            let form = multipart_form(Vec::new(), std::slice::from_ref(attachment)).await?;
            let envelope = self.send_form(endpoints::PROFILE_IMAGES, form).await?;
            Ok::<_, ApiError>(image_urls(&envelope.data))
        };
        result.await.into()
    }

    pub async fn upload_kyc_documents(
        &self,
        document: KycDocument,
        attachments: &[Attachment],
    ) -> ApiResult<Ack> {
        let result = async {
            let fields = vec![("documentType", document.as_str().to_string())];
            let form = multipart_form(fields, attachments).await?;
            Ok::<_, ApiError>(self.send_form(endpoints::KYC, form).await?.ack())
        };
        result.await.into()
    }

    pub async fn get_bank_details(&self) -> ApiResult<BankDetails> {
        self.get(endpoints::BANK_DETAILS, &[])
            .await
            .and_then(|envelope| {
                let data = match envelope.data {
                    Value::Object(mut map) if map.contains_key("bankDetails") => {
                        map.remove("bankDetails").unwrap_or(Value::Null)
                    }
                    other => other,
                };
                if data.is_null() {
                    return Ok(BankDetails::default());
                }
                serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
            })
            .into()
    }

    pub async fn update_bank_details(&self, details: &BankDetails) -> ApiResult<Ack> {
        self.send_json(Method::PUT, endpoints::BANK_DETAILS, Auth::Bearer, details)
            .await
            .map(|envelope| envelope.ack())
            .into()
    }
}
