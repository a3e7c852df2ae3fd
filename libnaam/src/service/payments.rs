//! Collections, payments and settlement mode

use std::sync::Arc;

use serde::Serialize;

use super::events::{Event, EventBus};
use crate::api::{ApiClient, ApiResult};
use crate::config::Config;
use crate::error::{ApiError, NaamError, Result};
use crate::session::SessionManager;
use crate::types::{
    CollectionEntry, FarmerSummary, NewCollectionEntry, Payment, PaymentMode, PaymentStatus,
    UserRole,
};

impl PaymentMode {
    /// NEFT up to and including `rtgs_threshold`, RTGS above it
    pub fn for_amount(amount: f64, rtgs_threshold: f64) -> Self {
        if amount <= rtgs_threshold {
            PaymentMode::Neft
        } else {
            PaymentMode::Rtgs
        }
    }
}

/// Totals shown above the collection list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub pending_count: usize,
    pub pending_amount: f64,
    pub paid_count: usize,
    pub paid_amount: f64,
}

impl PaymentSummary {
    /// Entries in any other status are left out of both totals
    pub fn from_collections(entries: &[CollectionEntry]) -> Self {
        entries
            .iter()
            .fold(PaymentSummary::default(), |mut summary, entry| {
                match entry.status {
                    PaymentStatus::Pending => {
                        summary.pending_count += 1;
                        summary.pending_amount += entry.amount;
                    }
                    PaymentStatus::Paid => {
                        summary.paid_count += 1;
                        summary.paid_amount += entry.amount;
                    }
                    PaymentStatus::Other(_) => {}
                }
                summary
            })
    }

    pub fn total_amount(&self) -> f64 {
        self.pending_amount + self.paid_amount
    }
}

#[derive(Clone)]
pub struct CollectionService {
    client: Arc<ApiClient>,
    session: Arc<SessionManager>,
    config: Arc<Config>,
    events: EventBus,
}

impl CollectionService {
    pub fn new(
        client: Arc<ApiClient>,
        session: Arc<SessionManager>,
        config: Arc<Config>,
        events: EventBus,
    ) -> Self {
        Self {
            client,
            session,
            config,
            events,
        }
    }

    fn user_id(&self) -> Result<String> {
        self.session
            .user_id()
            .ok_or_else(|| ApiError::NotAuthenticated.into())
    }

    /// Settlement mode for `amount` under the configured threshold
    pub fn payment_mode(&self, amount: f64) -> PaymentMode {
        PaymentMode::for_amount(amount, self.config.payments.rtgs_threshold)
    }

    /// Collections for `farmer_id`, or for the logged-in user
    pub async fn list(&self, farmer_id: Option<&str>) -> Result<ApiResult<Vec<CollectionEntry>>> {
        let farmer_id = match farmer_id {
            Some(id) => id.to_string(),
            None => self.user_id()?,
        };
        Ok(self.client.get_collections(&farmer_id).await)
    }

    pub async fn details(&self, id: &str) -> Result<CollectionEntry> {
        Ok(self.client.get_collection_details(id).await?)
    }

    /// Record a delivery; errors are propagated to the caller
    pub async fn create(&self, entry: &NewCollectionEntry) -> Result<CollectionEntry> {
        if entry.quantity == 0 {
            return Err(NaamError::InvalidInput(
                "Quantity must be greater than zero".to_string(),
            ));
        }
        if !(entry.rate.is_finite() && entry.rate > 0.0) {
            return Err(NaamError::InvalidInput(
                "Rate must be greater than zero".to_string(),
            ));
        }

        let created = self.client.create_collection_entry(entry).await?;
        tracing::info!(
            "Recorded collection {} for farmer {} ({} nuts)",
            created.id,
            entry.farmer_id,
            entry.quantity
        );
        self.events.emit(Event::CollectionCreated {
            entry_id: created.id.clone(),
        });
        Ok(created)
    }

    pub async fn payments(&self, farmer_id: Option<&str>) -> Result<ApiResult<Vec<Payment>>> {
        let farmer_id = match farmer_id {
            Some(id) => id.to_string(),
            None => self.user_id()?,
        };
        Ok(self.client.get_payments(&farmer_id).await)
    }

    /// Farmers in the logged-in investor's portfolio
    pub async fn investor_farmers(&self) -> Result<Vec<FarmerSummary>> {
        if self.session.role() != Some(UserRole::Investor) {
            return Err(NaamError::InvalidInput(
                "Only investors have a farmer portfolio".to_string(),
            ));
        }
        let investor_id = self.user_id()?;
        Ok(self.client.get_investor_farmers(&investor_id).await?)
    }
}
