//! News lane adapter.

use super::http_json::HttpJsonAdapter;
use super::LaneAdapter;
use crate::error::ErrorKind;
use crate::evidence::Evidence;
use crate::lane::LaneID;
use async_trait::async_trait;
use secrecy::SecretString;
use std::time::Instant;

pub struct NewsAdapter {
    inner: HttpJsonAdapter,
}

impl NewsAdapter {
    pub fn new(endpoint: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            inner: HttpJsonAdapter::new(LaneID::News, endpoint, api_key),
        }
    }
}

#[async_trait]
impl LaneAdapter for NewsAdapter {
    fn lane(&self) -> LaneID {
        LaneID::News
    }

    async fn query(&self, text: &str, top_k: usize, deadline: Instant) -> Result<Vec<Evidence>, ErrorKind> {
        self.inner.fetch(text, top_k, deadline).await
    }
}
