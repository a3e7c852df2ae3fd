//! News, ads, daily quote, polls and engagement counters

use reqwest::Method;
use serde_json::{json, Value};

use super::{endpoints, Ack, ApiClient, ApiResult, Auth};
use crate::error::ApiError;
use crate::types::{Advertisement, EngagementAction, FeedKind, NewsItem, Poll, Quote};

impl EngagementAction {
    /// Counter field the server reports for this action
    pub fn counter_field(&self) -> &'static str {
        match self {
            EngagementAction::Like => "likes",
            EngagementAction::Share => "shares",
            EngagementAction::View => "views",
        }
    }
}

/// Server count after an engagement PATCH, when the response carries one
fn reported_count(data: &Value, action: EngagementAction) -> Option<u64> {
    [action.counter_field(), "count"]
        .iter()
        .find_map(|k| data.get(*k))
        .and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

impl ApiClient {
    pub async fn get_news(&self) -> ApiResult<Vec<NewsItem>> {
        self.get(endpoints::NEWS, &[])
            .await
            .and_then(|envelope| envelope.decode_list(&["news", "articles"]))
            .into()
    }

    pub async fn get_ads(&self) -> ApiResult<Vec<Advertisement>> {
        self.get(endpoints::ADS, &[])
            .await
            .and_then(|envelope| envelope.decode_list(&["ads", "advertisements"]))
            .into()
    }

    pub async fn get_daily_quote(&self) -> ApiResult<Quote> {
        self.get(endpoints::DAILY_QUOTE, &[])
            .await
            .and_then(|envelope| {
                let data = match envelope.data {
                    Value::Object(mut map) if map.contains_key("quote") => {
                        map.remove("quote").unwrap_or(Value::Null)
                    }
                    other => other,
                };
                if data.is_null() {
                    return Err(ApiError::Decode("no quote for today".to_string()));
                }
                serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
            })
            .into()
    }

    pub async fn get_active_polls(&self) -> ApiResult<Vec<Poll>> {
        self.get(endpoints::ACTIVE_POLLS, &[])
            .await
            .and_then(|envelope| envelope.decode_list(&["polls"]))
            .into()
    }

    pub async fn vote_poll(&self, poll_id: &str, option_id: &str) -> ApiResult<Ack> {
        let body = json!({ "optionId": option_id });
        self.send_json(Method::POST, &endpoints::poll_vote(poll_id), Auth::Bearer, &body)
            .await
            .map(|envelope| envelope.ack())
            .into()
    }

    /// PATCH one engagement counter; yields the server's count if reported
    pub async fn record_engagement(
        &self,
        kind: FeedKind,
        id: &str,
        action: EngagementAction,
    ) -> ApiResult<Option<u64>> {
        let body = json!({ "action": action });
        self.send_json(Method::PATCH, &endpoints::engagement(kind, id), Auth::Bearer, &body)
            .await
            .map(|envelope| reported_count(&envelope.data, action))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_count() {
        assert_eq!(reported_count(&json!({"likes": 12}), EngagementAction::Like), Some(12));
        assert_eq!(reported_count(&json!({"count": "7"}), EngagementAction::Share), Some(7));
        assert_eq!(reported_count(&json!({"likes": 3}), EngagementAction::View), None);
        assert_eq!(reported_count(&Value::Null, EngagementAction::View), None);
    }
}
