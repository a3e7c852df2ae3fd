//! Home screen: every panel fetched at once, each failing on its own

use std::sync::Arc;

use super::events::{Event, EventBus};
use super::feed::FeedService;
use super::market::{MarketService, PriceStats};
use crate::api::{ApiClient, ApiResult};
use crate::error::ApiError;
use crate::types::{NewsItem, Poll, PricePoint, Quote, UserProfile};

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub profile: ApiResult<UserProfile>,
    pub news: ApiResult<Vec<NewsItem>>,
    pub polls: ApiResult<Vec<Poll>>,
    pub quote: ApiResult<Quote>,
    pub prices: ApiResult<Vec<PricePoint>>,
}

impl Dashboard {
    pub fn price_stats(&self) -> Option<PriceStats> {
        match &self.prices {
            ApiResult::Success(points) => PriceStats::from_points(points),
            ApiResult::Failure(_) => None,
        }
    }

    /// Names of the panels that failed to load
    pub fn failed_panels(&self) -> Vec<&'static str> {
        self.failures().into_iter().map(|(name, _)| name).collect()
    }

    /// Each failed panel with its error
    pub fn failures(&self) -> Vec<(&'static str, &ApiError)> {
        [
            ("profile", self.profile.error()),
            ("news", self.news.error()),
            ("polls", self.polls.error()),
            ("quote", self.quote.error()),
            ("prices", self.prices.error()),
        ]
        .into_iter()
        .filter_map(|(name, error)| error.map(|e| (name, e)))
        .collect()
    }
}

#[derive(Clone)]
pub struct DashboardService {
    client: Arc<ApiClient>,
    feed: FeedService,
    market: MarketService,
    events: EventBus,
}

impl DashboardService {
    pub fn new(
        client: Arc<ApiClient>,
        feed: FeedService,
        market: MarketService,
        events: EventBus,
    ) -> Self {
        Self {
            client,
            feed,
            market,
            events,
        }
    }

    /// Fetch all panels concurrently
    pub async fn load(&self) -> Dashboard {
        let (profile, news, polls, quote, prices) = futures::join!(
            self.client.get_profile(),
            self.feed.news(),
            self.feed.polls(),
            self.feed.quote(),
            self.market.default_history(),
        );

        let dashboard = Dashboard {
            profile,
            news,
            polls,
            quote,
            prices,
        };
        let failures = dashboard.failures();
        if !failures.is_empty() {
            let names: Vec<&str> = failures.iter().map(|(name, _)| *name).collect();
            tracing::warn!("Dashboard panels failed to load: {}", names.join(", "));
        }
        for (name, error) in failures {
            self.events.emit(Event::RequestFailed {
                operation: format!("dashboard.{}", name),
                message: error.user_message(),
            });
        }
        dashboard
    }
}
