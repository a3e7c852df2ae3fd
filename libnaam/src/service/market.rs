//! Commodity price history

use std::sync::Arc;

use serde::Serialize;

use crate::api::{ApiClient, ApiResult};
use crate::error::{NaamError, Result};
use crate::types::PricePoint;

pub const DEFAULT_COMMODITY: &str = "coconut";
pub const DEFAULT_DAYS: u32 = 30;
const MAX_DAYS: u32 = 365;

/// Summary of a price window, over modal prices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStats {
    pub latest: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    /// Latest minus earliest
    pub change: f64,
    /// `change` relative to the earliest price; `None` when that was zero
    pub change_percent: Option<f64>,
}

impl PriceStats {
    /// `points` must be sorted by date; `None` for an empty window
    pub fn from_points(points: &[PricePoint]) -> Option<Self> {
        let first = points.first()?.modal_price;
        let latest = points.last()?.modal_price;

        let (min, max, sum) = points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), p| (min.min(p.modal_price), max.max(p.modal_price), sum + p.modal_price),
        );
        let change = latest - first;

        Some(Self {
            latest,
            min,
            max,
            average: sum / points.len() as f64,
            change,
            change_percent: (first != 0.0).then(|| change / first * 100.0),
        })
    }
}

#[derive(Clone)]
pub struct MarketService {
    client: Arc<ApiClient>,
}

impl MarketService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Price points for the last `days` days, oldest first
    pub async fn history(&self, commodity: &str, days: u32) -> Result<ApiResult<Vec<PricePoint>>> {
        if days == 0 || days > MAX_DAYS {
            return Err(NaamError::InvalidInput(format!(
                "Days must be between 1 and {}",
                MAX_DAYS
            )));
        }
        let commodity = commodity.trim();
        if commodity.is_empty() {
            return Err(NaamError::InvalidInput("Commodity is required".to_string()));
        }

        Ok(self.fetch_sorted(commodity, days).await)
    }

    /// The home-screen window: the last `DEFAULT_DAYS` of `DEFAULT_COMMODITY`
    pub async fn default_history(&self) -> ApiResult<Vec<PricePoint>> {
        self.fetch_sorted(DEFAULT_COMMODITY, DEFAULT_DAYS).await
    }

    async fn fetch_sorted(&self, commodity: &str, days: u32) -> ApiResult<Vec<PricePoint>> {
        self.client
            .get_price_history(commodity, days)
            .await
            .map(|mut points| {
                points.sort_by_key(|p| p.date);
                points
            })
    }
}
