//! Shared HTTP JSON transport for lane adapters.
//!
//! Each concrete adapter (web/news/markets/vector/kg/keyword) is a thin
//! wrapper around one of these: a base URL, an optional bearer credential,
//! and a response schema. A single `reqwest::Client` is built once and
//! reused; the credential is carried as a `SecretString` and only exposed
//! at the point a header is built.

use crate::error::ErrorKind;
use crate::evidence::Evidence;
use crate::lane::LaneID;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Instant;

/// Generic shape a backing search/service endpoint is expected to return.
/// Real provider responses are adapted into this shape outside this crate;
/// the orchestrator only ever sees this narrow contract.
#[derive(Debug, Deserialize)]
pub struct RawHit {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub score: f64,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    pub results: Vec<RawHit>,
}

/// A lane backed by a single HTTP JSON endpoint.
pub struct HttpJsonAdapter {
    lane: LaneID,
    endpoint: String,
    bearer: Option<SecretString>,
    client: reqwest::Client,
}

impl HttpJsonAdapter {
    pub fn new(lane: LaneID, endpoint: impl Into<String>, bearer: Option<SecretString>) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("failed to build HTTP client");
        Self {
            lane,
            endpoint: endpoint.into(),
            bearer,
            client,
        }
    }

    pub fn lane(&self) -> LaneID {
        self.lane
    }

    /// Issue the request, bounded by `deadline`. The caller (the Lane
    /// Executor) also enforces the deadline at a higher level; this is the
    /// adapter's own cooperative cancellation point.
    pub async fn fetch(&self, text: &str, top_k: usize, deadline: Instant) -> Result<Vec<Evidence>, ErrorKind> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ErrorKind::Transport);
        }

        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[("q", text), ("top_k", &top_k.to_string())])
            .timeout(remaining);

        if let Some(bearer) = &self.bearer {
            request = request.header("Authorization", format!("Bearer {}", bearer.expose_secret()));
        }

        let response = tokio::time::timeout(remaining, request.send())
            .await
            .map_err(|_| ErrorKind::Transport)?
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ErrorKind::Auth);
        }
        if status.as_u16() == 429 {
            return Err(ErrorKind::RateLimited);
        }
        if status.is_server_error() {
            return Err(ErrorKind::Transport);
        }
        if !status.is_success() {
            return Err(ErrorKind::BadResponse);
        }

        let parsed: RawResponse = response.json().await.map_err(|_| ErrorKind::BadResponse)?;
        let lane = self.lane;
        let now = Utc::now();
        Ok(parsed
            .results
            .into_iter()
            .map(|hit| Evidence {
                lane,
                source_id: hit.id,
                title: hit.title,
                snippet: hit.snippet,
                score: hit.score.clamp(0.0, 1.0),
                url: hit.url,
                fetched_at: now,
            })
            .collect())
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Transport
    } else if err.is_connect() {
        ErrorKind::Transport
    } else if err.is_decode() {
        ErrorKind::BadResponse
    } else if err.status().map(|s| s.as_u16()) == Some(401) || err.status().map(|s| s.as_u16()) == Some(403) {
        ErrorKind::Auth
    } else {
        ErrorKind::Transport
    }
}
