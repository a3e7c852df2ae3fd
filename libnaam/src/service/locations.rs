//! State -> district -> taluk -> village cascade
//!
//! Choosing a level clears every level below it and fetches the next
//! level's options scoped to the chosen id. A fetch that fails leaves
//! that list empty and records the error, so an empty list can still be
//! told apart from a failed request.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ApiResult;
use crate::error::ApiError;
use crate::types::{Location, LocationLevel};

/// Where location options come from
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Options at `level` under `parent_id`; states take no parent
    async fn fetch(&self, level: LocationLevel, parent_id: Option<&str>) -> ApiResult<Vec<Location>>;
}

#[derive(Debug, Clone, Default, PartialEq)]
struct LevelState {
    options: Vec<Location>,
    selected: Option<String>,
    error: Option<ApiError>,
}

impl LevelState {
    fn reset(&mut self) {
        *self = LevelState::default();
    }
}

const LEVELS: [LocationLevel; 4] = [
    LocationLevel::State,
    LocationLevel::District,
    LocationLevel::Taluk,
    LocationLevel::Village,
];

fn index(level: LocationLevel) -> usize {
    match level {
        LocationLevel::State => 0,
        LocationLevel::District => 1,
        LocationLevel::Taluk => 2,
        LocationLevel::Village => 3,
    }
}

pub struct LocationSelector<S: LocationSource> {
    source: Arc<S>,
    levels: [LevelState; 4],
}

impl<S: LocationSource> LocationSelector<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            levels: Default::default(),
        }
    }

    pub fn options(&self, level: LocationLevel) -> &[Location] {
        &self.levels[index(level)].options
    }

    pub fn selected(&self, level: LocationLevel) -> Option<&str> {
        self.levels[index(level)].selected.as_deref()
    }

    /// Error from the last fetch of `level`, if it failed
    pub fn error(&self, level: LocationLevel) -> Option<&ApiError> {
        self.levels[index(level)].error.as_ref()
    }

    /// Ids of all four selections, once the village is chosen
    pub fn selection(&self) -> Option<[String; 4]> {
        let [state, district, taluk, village] = &self.levels;
        Some([
            state.selected.clone()?,
            district.selected.clone()?,
            taluk.selected.clone()?,
            village.selected.clone()?,
        ])
    }

    async fn load(&mut self, level: LocationLevel, parent_id: Option<&str>) {
        let result = self.source.fetch(level, parent_id).await;
        let slot = &mut self.levels[index(level)];
        match result {
            ApiResult::Success(options) => {
                slot.options = options;
                slot.error = None;
            }
            ApiResult::Failure(e) => {
                tracing::warn!("Loading {} options failed: {}", level, e);
                slot.options.clear();
                slot.error = Some(e);
            }
        }
    }

    /// Select `id` at `level`: clear everything below, then fetch the
    /// next level's options for `id`
    async fn select(&mut self, level: LocationLevel, id: &str) {
        let i = index(level);
        self.levels[i].selected = Some(id.to_string());
        for below in &mut self.levels[i + 1..] {
            below.reset();
        }
        if let Some(next) = LEVELS.get(i + 1).copied() {
            self.load(next, Some(id)).await;
        }
    }

    pub async fn load_states(&mut self) {
        for level in &mut self.levels {
            level.reset();
        }
        self.load(LocationLevel::State, None).await;
    }

    pub async fn select_state(&mut self, id: &str) {
        self.select(LocationLevel::State, id).await;
    }

    pub async fn select_district(&mut self, id: &str) {
        self.select(LocationLevel::District, id).await;
    }

    pub async fn select_taluk(&mut self, id: &str) {
        self.select(LocationLevel::Taluk, id).await;
    }

    pub async fn select_village(&mut self, id: &str) {
        self.select(LocationLevel::Village, id).await;
    }
}
