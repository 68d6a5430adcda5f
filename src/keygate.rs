//! Provider Key Gate.
//!
//! Runs once at startup, before the `LaneRegistry` is built, and fails fast
//! with an actionable message when a required lane class has no usable
//! credentials and keyless fallback is disabled.

use crate::config::{CredentialsConfig, OrchestratorConfig};
use crate::lane::LaneID;
use anyhow::{bail, Result};
use std::collections::HashMap;

/// Decide, from configuration, which lanes mount. Mutates a copy of
/// `config.lanes` in place (disabling lanes without credentials) and
/// returns it; `main`/test callers build a `LaneRegistry` from the result.
pub fn gate(config: &OrchestratorConfig) -> Result<HashMap<LaneID, crate::config::LaneConfig>> {
    let creds = &config.credentials;
    let mut lanes = config.lanes.clone();

    let web_ok = has_any(&[&creds.primary_search_key, &creds.secondary_search_key]);
    let news_ok = has_any(&[&creds.news_provider_a, &creds.news_provider_b]);
    let markets_ok = creds.markets_primary_key.is_some();
    let vector_ok = creds.vector_service_url.is_some();
    let kg_ok = creds.kg_service_url.is_some();
    let keyword_ok = creds.keyword_service_url.is_some();

    disable_unless(&mut lanes, LaneID::Web, web_ok, config.keyless_fallbacks_enabled);
    disable_unless(&mut lanes, LaneID::News, news_ok, false);
    disable_unless(&mut lanes, LaneID::Markets, markets_ok, false);
    disable_unless(&mut lanes, LaneID::Vector, vector_ok, false);
    disable_unless(&mut lanes, LaneID::Kg, kg_ok, false);
    disable_unless(&mut lanes, LaneID::Keyword, keyword_ok, false);

    // Fail fast only if an entire credentialed class (web/news) has no
    // lane mounted and keyless fallback is disabled.
    if !web_ok && !config.keyless_fallbacks_enabled {
        bail!("web lane has no credentials and KEYLESS_FALLBACKS_ENABLED is not set");
    }
    if !news_ok {
        bail!("news lane has no credentials (news_provider_a/news_provider_b)");
    }

    Ok(lanes)
}

fn has_any(keys: &[&Option<String>]) -> bool {
    keys.iter().any(|k| k.is_some())
}

fn disable_unless(
    lanes: &mut HashMap<LaneID, crate::config::LaneConfig>,
    lane: LaneID,
    has_credentials: bool,
    keyless_fallback_allowed: bool,
) {
    if let Some(cfg) = lanes.get_mut(&lane) {
        if !has_credentials && !keyless_fallback_allowed {
            cfg.enabled = false;
        }
    }
}

/// Convenience used by tests and the CLI to build credentials without a
/// config file.
pub fn credentials_with(web_key: Option<&str>, news_key: Option<&str>) -> CredentialsConfig {
    CredentialsConfig {
        primary_search_key: web_key.map(str::to_string),
        secondary_search_key: None,
        news_provider_a: news_key.map(str::to_string),
        news_provider_b: None,
        markets_primary_key: Some("markets-demo-key".into()),
        vector_service_url: Some("http://localhost:7000".into()),
        kg_service_url: Some("http://localhost:7001".into()),
        keyword_service_url: Some("http://localhost:7002".into()),
    }
}
