//! Markets lane adapter.

use super::http_json::HttpJsonAdapter;
use super::LaneAdapter;
use crate::error::ErrorKind;
use crate::evidence::Evidence;
use crate::lane::LaneID;
use async_trait::async_trait;
use secrecy::SecretString;
use std::time::Instant;

pub struct MarketsAdapter {
    inner: HttpJsonAdapter,
}

impl MarketsAdapter {
    pub fn new(endpoint: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            inner: HttpJsonAdapter::new(LaneID::Markets, endpoint, api_key),
        }
    }
}

#[async_trait]
impl LaneAdapter for MarketsAdapter {
    fn lane(&self) -> LaneID {
        LaneID::Markets
    }

    async fn query(&self, text: &str, top_k: usize, deadline: Instant) -> Result<Vec<Evidence>, ErrorKind> {
        self.inner.fetch(text, top_k, deadline).await
    }
}
