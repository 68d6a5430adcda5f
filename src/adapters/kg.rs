//! Knowledge-graph lookup lane adapter. Backed by a local service URL; no
//! third-party credentials required.

use super::http_json::HttpJsonAdapter;
use super::LaneAdapter;
use crate::error::ErrorKind;
use crate::evidence::Evidence;
use crate::lane::LaneID;
use async_trait::async_trait;
use std::time::Instant;

pub struct KgAdapter {
    inner: HttpJsonAdapter,
}

impl KgAdapter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            inner: HttpJsonAdapter::new(LaneID::Kg, endpoint, None),
        }
    }
}

#[async_trait]
impl LaneAdapter for KgAdapter {
    fn lane(&self) -> LaneID {
        LaneID::Kg
    }

    async fn query(&self, text: &str, top_k: usize, deadline: Instant) -> Result<Vec<Evidence>, ErrorKind> {
        self.inner.fetch(text, top_k, deadline).await
    }
}
