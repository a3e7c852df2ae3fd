//! Reference geography: states, districts, taluks, villages

use async_trait::async_trait;

use super::{endpoints, ApiClient, ApiResult};
use crate::error::ApiError;
use crate::service::locations::LocationSource;
use crate::types::{Location, LocationLevel};

impl ApiClient {
    async fn get_locations(&self, path: &str, key: &str) -> ApiResult<Vec<Location>> {
        self.get(path, &[])
            .await
            .and_then(|envelope| envelope.decode_list(&[key, "locations"]))
            .into()
    }

    pub async fn get_states(&self) -> ApiResult<Vec<Location>> {
        self.get_locations(endpoints::STATES, "states").await
    }

    pub async fn get_districts(&self, state_id: &str) -> ApiResult<Vec<Location>> {
        self.get_locations(&endpoints::districts(state_id), "districts")
            .await
    }

    pub async fn get_taluks(&self, district_id: &str) -> ApiResult<Vec<Location>> {
        self.get_locations(&endpoints::taluks(district_id), "taluks")
            .await
    }

    pub async fn get_villages(&self, taluk_id: &str) -> ApiResult<Vec<Location>> {
        self.get_locations(&endpoints::villages(taluk_id), "villages")
            .await
    }
}

#[async_trait]
impl LocationSource for ApiClient {
    async fn fetch(&self, level: LocationLevel, parent_id: Option<&str>) -> ApiResult<Vec<Location>> {
        match (level, parent_id) {
            (LocationLevel::State, _) => self.get_states().await,
            (LocationLevel::District, Some(id)) => self.get_districts(id).await,
            (LocationLevel::Taluk, Some(id)) => self.get_taluks(id).await,
            (LocationLevel::Village, Some(id)) => self.get_villages(id).await,
            (level, None) => ApiResult::Failure(ApiError::Decode(format!(
                "a {} lookup needs a parent id",
                level
            ))),
        }
    }
}
