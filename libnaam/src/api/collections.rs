//! Coconut collections, payments, investor portfolios and market prices

use reqwest::Method;
use serde_json::Value;

use super::{endpoints, ApiClient, ApiResult, Auth, Envelope};
use crate::error::ApiError;
use crate::types::{CollectionEntry, FarmerSummary, NewCollectionEntry, Payment, PricePoint};

/// Decode a single record that may be wrapped under one of `keys`
fn decode_record(envelope: Envelope, keys: &[&str]) -> Result<CollectionEntry, ApiError> {
    let data = match envelope.data {
        Value::Object(mut map) => match keys.iter().find_map(|k| map.remove(*k)) {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        Value::Null => {
            return Err(ApiError::Decode("response has no collection entry".to_string()))
        }
        other => other,
    };
    serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
}

impl ApiClient {
    pub async fn get_collections(&self, farmer_id: &str) -> ApiResult<Vec<CollectionEntry>> {
        self.get(endpoints::COLLECTIONS, &[("farmerId", farmer_id.to_string())])
            .await
            .and_then(|envelope| envelope.decode_list(&["collections", "entries"]))
            .into()
    }

    /// Record a collection; failures are returned, not folded into a fallback
    pub async fn create_collection_entry(
        &self,
        entry: &NewCollectionEntry,
    ) -> Result<CollectionEntry, ApiError> {
        let envelope = self
            .send_json(Method::POST, endpoints::COLLECTIONS, Auth::Bearer, entry)
            .await?;
        decode_record(envelope, &["collection", "entry"])
    }

    pub async fn get_collection_details(&self, id: &str) -> Result<CollectionEntry, ApiError> {
        let envelope = self.get(&endpoints::collection(id), &[]).await?;
        decode_record(envelope, &["collection", "entry"])
    }

    pub async fn get_payments(&self, farmer_id: &str) -> ApiResult<Vec<Payment>> {
        self.get(endpoints::PAYMENTS, &[("farmerId", farmer_id.to_string())])
            .await
            .and_then(|envelope| envelope.decode_list(&["payments"]))
            .into()
    }

    pub async fn get_investor_farmers(
        &self,
        investor_id: &str,
    ) -> Result<Vec<FarmerSummary>, ApiError> {
        self.get(&endpoints::investor_farmers(investor_id), &[])
            .await?
            .decode_list(&["farmers"])
    }

    pub async fn get_price_history(&self, commodity: &str, days: u32) -> ApiResult<Vec<PricePoint>> {
        let query = [("commodity", commodity.to_string()), ("days", days.to_string())];
        self.get(endpoints::PRICE_HISTORY, &query)
            .await
            .and_then(|envelope| envelope.decode_list(&["history", "prices"]))
            .into()
    }
}
