//! Home-feed widgets: news, ads, daily quote, polls
//!
//! Likes, shares and views update optimistically. Each counter keeps the
//! last server value and the local bumps not yet confirmed; a response or
//! a later fetch that carries the server's count replaces both.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use super::events::{Event, EventBus};
use crate::api::{ActionOutcome, ApiClient, ApiResult};
use crate::error::{NaamError, Result};
use crate::types::{Advertisement, Engagement, EngagementAction, FeedKind, NewsItem, Poll, Quote};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngagementCounter {
    server: u64,
    pending: u64,
}

impl EngagementCounter {
    pub fn new(server: u64) -> Self {
        Self { server, pending: 0 }
    }

    /// Count a local action the server has not confirmed yet
    pub fn bump(&mut self) {
        self.pending += 1;
    }

    /// Adopt the server's count; local bumps are assumed included
    pub fn reconcile(&mut self, server: u64) {
        self.server = server;
        self.pending = 0;
    }

    pub fn displayed(&self) -> u64 {
        self.server + self.pending
    }

    pub fn server(&self) -> u64 {
        self.server
    }

    pub fn pending(&self) -> u64 {
        self.pending
    }
}

type CounterKey = (FeedKind, String, EngagementAction);

#[derive(Clone)]
pub struct FeedService {
    client: Arc<ApiClient>,
    events: EventBus,
    counters: Arc<Mutex<HashMap<CounterKey, EngagementCounter>>>,
}

impl FeedService {
    pub fn new(client: Arc<ApiClient>, events: EventBus) -> Self {
        Self {
            client,
            events,
            counters: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn with_counters<T>(&self, f: impl FnOnce(&mut HashMap<CounterKey, EngagementCounter>) -> T) -> T {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut counters)
    }

    fn reconcile_all<'a>(&self, kind: FeedKind, items: impl Iterator<Item = (&'a str, Engagement)>) {
        self.with_counters(|counters| {
            for (id, engagement) in items {
                for (action, value) in [
                    (EngagementAction::Like, engagement.likes),
                    (EngagementAction::Share, engagement.shares),
                    (EngagementAction::View, engagement.views),
                ] {
                    counters
                        .entry((kind, id.to_string(), action))
                        .or_default()
                        .reconcile(value);
                }
            }
        });
    }

    /// Counter as currently displayed
    pub fn counter(&self, kind: FeedKind, id: &str, action: EngagementAction) -> EngagementCounter {
        self.with_counters(|counters| {
            counters
                .get(&(kind, id.to_string(), action))
                .copied()
                .unwrap_or_default()
        })
    }

    pub async fn news(&self) -> ApiResult<Vec<NewsItem>> {
        let result = self.client.get_news().await;
        if let ApiResult::Success(items) = &result {
            self.reconcile_all(FeedKind::News, items.iter().map(|i| (i.id.as_str(), i.engagement)));
        }
        result
    }

    pub async fn ads(&self) -> ApiResult<Vec<Advertisement>> {
        let result = self.client.get_ads().await;
        if let ApiResult::Success(items) = &result {
            self.reconcile_all(FeedKind::Ads, items.iter().map(|i| (i.id.as_str(), i.engagement)));
        }
        result
    }

    pub async fn quote(&self) -> ApiResult<Quote> {
        let result = self.client.get_daily_quote().await;
        if let ApiResult::Success(quote) = &result {
            self.reconcile_all(
                FeedKind::Quotes,
                std::iter::once((quote.id.as_str(), quote.engagement)),
            );
        }
        result
    }

    pub async fn polls(&self) -> ApiResult<Vec<Poll>> {
        self.client.get_active_polls().await
    }

    pub async fn vote(&self, poll_id: &str, option_id: &str) -> Result<ActionOutcome> {
        if poll_id.trim().is_empty() || option_id.trim().is_empty() {
            return Err(NaamError::InvalidInput(
                "Poll and option are required".to_string(),
            ));
        }
        Ok(self.client.vote_poll(poll_id, option_id).await.into_outcome())
    }

    /// Bump the counter locally, then tell the server
    ///
    /// A failed PATCH is logged and the optimistic value kept; the next
    /// fetch reconciles it. Returns the counter as it now stands.
    pub async fn engage(&self, kind: FeedKind, id: &str, action: EngagementAction) -> EngagementCounter {
        let key = (kind, id.to_string(), action);
        self.with_counters(|counters| counters.entry(key.clone()).or_default().bump());

        match self.client.record_engagement(kind, id, action).await {
            ApiResult::Success(Some(server_count)) => {
                self.with_counters(|counters| {
                    counters.entry(key.clone()).or_default().reconcile(server_count)
                });
                self.events.emit(Event::EngagementReconciled {
                    kind,
                    id: id.to_string(),
                    action,
                    server_count,
                });
            }
            ApiResult::Success(None) => {}
            ApiResult::Failure(e) => {
                tracing::warn!(
                    "Recording {:?} on {} {} failed, keeping local count: {}",
                    action,
                    kind.path_segment(),
                    id,
                    e
                );
                self.events.emit(Event::RequestFailed {
                    operation: format!("engage.{}", kind.path_segment()),
                    message: e.user_message(),
                });
            }
        }

        self.with_counters(|counters| counters.get(&key).copied().unwrap_or_default())
    }
}
