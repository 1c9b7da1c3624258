//! Where order snapshots come from

use async_trait::async_trait;
use reqwest::header::COOKIE;
use serde_json::Value;
use std::time::Duration;
use crate::{Result, RevenueError};

/// Supplies the raw `GET orders/` payload for one computation.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// `cookie` is the caller's session cookie, forwarded so the backend can authorise the listing.
    async fn fetch_orders(&self, cookie: Option<&str>) -> Result<Value>;
}

/// Storefront REST backend.
#[derive(Clone, Debug)]
pub struct BackendOrderSource {
    client: reqwest::Client,
    endpoint: String,
}

impl BackendOrderSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RevenueError::InvalidConfig(e.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into() })
    }

    pub fn endpoint(&self) -> &str { &self.endpoint }
}

#[async_trait]
impl OrderSource for BackendOrderSource {
    async fn fetch_orders(&self, cookie: Option<&str>) -> Result<Value> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        let response = request.send().await.map_err(|e| RevenueError::BackendUnavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint = %self.endpoint, %status, "order backend rejected request");
            return Err(RevenueError::BackendUnavailable(format!("{} returned {}", self.endpoint, status)));
        }
        response.json().await.map_err(|e| RevenueError::MalformedPayload(e.to_string()))
    }
}

/// Fixed snapshot, for offline runs and tests.
#[derive(Clone, Debug, Default)]
pub struct StaticOrderSource {
    payload: Value,
}

impl StaticOrderSource {
    pub fn new(payload: Value) -> Self { Self { payload } }
}

#[async_trait]
impl OrderSource for StaticOrderSource {
    async fn fetch_orders(&self, _cookie: Option<&str>) -> Result<Value> {
        Ok(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_static_source_returns_snapshot() {
        let source = StaticOrderSource::new(json!([{"id": 1}]));
        assert_eq!(source.fetch_orders(Some("sessionid=abc")).await.unwrap(), json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // port 9 (discard) on localhost is not expected to serve HTTP
        let source = BackendOrderSource::new("http://127.0.0.1:9/api/orders/", Duration::from_millis(500)).unwrap();
        assert!(matches!(source.fetch_orders(None).await, Err(RevenueError::BackendUnavailable(_))));
    }
}
