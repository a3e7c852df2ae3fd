//! Land-detail endpoints

use reqwest::Method;

use super::{endpoints, multipart_form, Ack, ApiClient, ApiResult, Auth};
use crate::error::ApiError;
use crate::types::{Attachment, LandDetails};

impl ApiClient {
    pub async fn get_land_details(&self, farmer_id: &str) -> ApiResult<Vec<LandDetails>> {
        self.get(&endpoints::farmer_land_details(farmer_id), &[])
            .await
            .and_then(|envelope| envelope.decode_list(&["landDetails", "lands"]))
            .into()
    }

    /// One multipart POST carrying the form fields and every attachment
    pub async fn submit_land_details(
        &self,
        farmer_id: &str,
        details: &LandDetails,
        attachments: &[Attachment],
    ) -> ApiResult<Ack> {
        let result = async {
            let form = multipart_form(details.form_fields(), attachments).await?;
            let envelope = self
                .send_form(&endpoints::farmer_land_details(farmer_id), form)
                .await?;
            Ok::<_, ApiError>(envelope.ack())
        };
        result.await.into()
    }

    pub async fn update_land_details(&self, land_id: &str, details: &LandDetails) -> ApiResult<Ack> {
        let path = endpoints::land_details(land_id);
        tracing::debug!(
            "Updating land details {}: {}",
            land_id,
            serde_json::to_string(details).unwrap_or_default()
        );
        let result = self.send_json(Method::PUT, &path, Auth::Bearer, details).await;
        match &result {
            Ok(envelope) => tracing::debug!("Land details {} updated: {}", land_id, envelope.data),
            Err(e) => tracing::debug!("Land details {} update failed: {}", land_id, e),
        }
        result.map(|envelope| envelope.ack()).into()
    }
}
