//! Land-detail registration

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use super::events::{Event, EventBus};
use super::Navigation;
use crate::api::{ApiClient, ApiResult};
use crate::error::{ApiError, NaamError, Result};
use crate::service::validation::validate_land_details;
use crate::session::SessionManager;
use crate::types::{Attachment, LandDetails};

/// A land-details submission: the form plus files to upload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LandForm {
    #[serde(flatten)]
    pub details: LandDetails,
    pub land_documents: Vec<PathBuf>,
    pub geo_tagged_photos: Vec<PathBuf>,
}

impl LandForm {
    /// Read a form from TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| NaamError::InvalidInput(format!("Invalid land form: {}", e)))
    }

    fn attachments(&self) -> Result<Vec<Attachment>> {
        let documents = self
            .land_documents
            .iter()
            .map(|p| Attachment::from_path("landDocuments", p));
        let photos = self
            .geo_tagged_photos
            .iter()
            .map(|p| Attachment::from_path("geoTaggedPhotos", p));
        documents.chain(photos).collect()
    }
}

#[derive(Clone)]
pub struct LandService {
    client: Arc<ApiClient>,
    session: Arc<SessionManager>,
    events: EventBus,
}

impl LandService {
    pub fn new(client: Arc<ApiClient>, session: Arc<SessionManager>, events: EventBus) -> Self {
        Self {
            client,
            session,
            events,
        }
    }

    fn farmer_id(&self) -> Result<String> {
        self.session
            .user_id()
            .ok_or_else(|| ApiError::NotAuthenticated.into())
    }

    pub async fn list(&self) -> Result<ApiResult<Vec<LandDetails>>> {
        let farmer_id = self.farmer_id()?;
        Ok(self.client.get_land_details(&farmer_id).await)
    }

    /// Validate and submit the form as one multipart POST
    ///
    /// Validation failures (including unreadable attachments) return
    /// before any request is made.
    pub async fn submit(&self, form: &LandForm) -> Result<Navigation> {
        validate_land_details(&form.details).map_err(NaamError::Validation)?;
        let attachments = form.attachments()?;
        let farmer_id = self.farmer_id()?;

        let ack = self
            .client
            .submit_land_details(&farmer_id, &form.details, &attachments)
            .await
            .into_result()?;
        tracing::info!(
            "Land details submitted for farmer {} with {} attachment(s)",
            farmer_id,
            attachments.len()
        );
        if let Some(message) = ack.message {
            tracing::debug!("Server said: {}", message);
        }

        self.events.emit(Event::LandDetailsSubmitted { farmer_id });
        Ok(Navigation::Back)
    }

    pub async fn update(&self, land_id: &str, details: &LandDetails) -> Result<Navigation> {
        validate_land_details(details).map_err(NaamError::Validation)?;
        self.client
            .update_land_details(land_id, details)
            .await
            .into_result()?;
        Ok(Navigation::Back)
    }
}
