//! Keyword/full-text lane adapter. Backed by a local service URL; no
//! third-party credentials required.

use super::http_json::HttpJsonAdapter;
use super::LaneAdapter;
use crate::error::ErrorKind;
use crate::evidence::Evidence;
use crate::lane::LaneID;
use async_trait::async_trait;
use std::time::Instant;

pub struct KeywordAdapter {
    inner: HttpJsonAdapter,
}

impl KeywordAdapter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            inner: HttpJsonAdapter::new(LaneID::Keyword, endpoint, None),
        }
    }
}

#[async_trait]
impl LaneAdapter for KeywordAdapter {
    fn lane(&self) -> LaneID {
        LaneID::Keyword
    }

    async fn query(&self, text: &str, top_k: usize, deadline: Instant) -> Result<Vec<Evidence>, ErrorKind> {
        self.inner.fetch(text, top_k, deadline).await
    }
}
