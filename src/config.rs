//! Configuration surface: lane configs, budget profiles, fusion
//! weights, cache capacity, warmup policy. Loaded once at startup from a TOML
//! file (if present) and environment variable overrides, then treated as
//! read-only for the process lifetime.
//!
//! Nested `#[serde(default)]` sub-configs, each with a hand-written
//! `Default` impl, and `${ENV_VAR}`-style credential resolution.

use crate::lane::LaneID;
use crate::query::QueryClass;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Per-lane, process-lifetime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub timeout_ms: u64,
    pub top_k: usize,
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default)]
    pub keyless_fallback: bool,
    /// Cache TTL for this lane's successful results.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_max_failures() -> u32 {
    3
}
fn default_cooldown_ms() -> u64 {
    10_000
}
fn default_ttl_secs() -> u64 {
    600
}

impl LaneConfig {
    fn defaults_for(lane: LaneID) -> Self {
        match lane {
            LaneID::Web => Self {
                enabled: true,
                timeout_ms: 1_000,
                top_k: 10,
                max_failures: 3,
                cooldown_ms: 10_000,
                keyless_fallback: false,
                ttl_secs: 600,
            },
            LaneID::Vector => Self {
                enabled: true,
                timeout_ms: 2_000,
                top_k: 5,
                max_failures: 3,
                cooldown_ms: 10_000,
                keyless_fallback: false,
                ttl_secs: 3_600,
            },
            LaneID::Kg => Self {
                enabled: true,
                timeout_ms: 1_500,
                top_k: 6,
                max_failures: 3,
                cooldown_ms: 10_000,
                keyless_fallback: false,
                ttl_secs: 3_600,
            },
            LaneID::News | LaneID::Markets | LaneID::Keyword => Self {
                enabled: true,
                timeout_ms: 1_000,
                top_k: 10,
                max_failures: 3,
                cooldown_ms: 10_000,
                keyless_fallback: false,
                ttl_secs: 600,
            },
        }
    }
}

/// Cache layer capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub max_entries: usize,
}

fn default_cache_capacity() -> usize {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_cache_capacity(),
        }
    }
}

/// Warmup policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmupConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Re-run warmup on this interval, if set.
    #[serde(default)]
    pub interval_secs: Option<u64>,
    #[serde(default = "default_warmup_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_warmup_timeout_ms() -> u64 {
    2_000
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: None,
            timeout_ms: default_warmup_timeout_ms(),
        }
    }
}

/// Credentials presence, consulted by the Provider Key Gate.
/// Values are never logged; only presence is read by this crate. Adapters
/// resolve the actual secret themselves via `resolve()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub primary_search_key: Option<String>,
    #[serde(default)]
    pub secondary_search_key: Option<String>,
    #[serde(default)]
    pub news_provider_a: Option<String>,
    #[serde(default)]
    pub news_provider_b: Option<String>,
    #[serde(default)]
    pub markets_primary_key: Option<String>,
    #[serde(default)]
    pub vector_service_url: Option<String>,
    #[serde(default)]
    pub kg_service_url: Option<String>,
    #[serde(default)]
    pub keyword_service_url: Option<String>,
}

impl CredentialsConfig {
    /// Load the well-known environment variable for a field if the config
    /// file didn't already set it, the way `resolve_bot_token` falls back
    /// to an env var name embedded in the token string.
    pub fn from_env_and_file(file: CredentialsConfig) -> Self {
        Self {
            primary_search_key: file
                .primary_search_key
                .or_else(|| std::env::var("WEB_SEARCH_PRIMARY_KEY").ok()),
            secondary_search_key: file
                .secondary_search_key
                .or_else(|| std::env::var("WEB_SEARCH_SECONDARY_KEY").ok()),
            news_provider_a: file
                .news_provider_a
                .or_else(|| std::env::var("NEWS_PROVIDER_A_KEY").ok()),
            news_provider_b: file
                .news_provider_b
                .or_else(|| std::env::var("NEWS_PROVIDER_B_KEY").ok()),
            markets_primary_key: file
                .markets_primary_key
                .or_else(|| std::env::var("MARKETS_PRIMARY_KEY").ok()),
            vector_service_url: file
                .vector_service_url
                .or_else(|| std::env::var("VECTOR_SERVICE_URL").ok()),
            kg_service_url: file
                .kg_service_url
                .or_else(|| std::env::var("KG_SERVICE_URL").ok()),
            keyword_service_url: file
                .keyword_service_url
                .or_else(|| std::env::var("KEYWORD_SERVICE_URL").ok()),
        }
    }

    /// Wrap a present key as a `SecretString` for secure in-memory handling,
    /// matching `backend.rs`'s treatment of resolved API keys.
    pub fn secret(value: &Option<String>) -> Option<SecretString> {
        value.clone().map(SecretString::from)
    }
}

/// Root configuration, nesting everything under it. Read-only after boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_lanes")]
    pub lanes: HashMap<LaneID, LaneConfig>,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default = "default_budget_profiles")]
    pub budget_profiles_ms: HashMap<QueryClass, u64>,
    #[serde(default = "default_fusion_weights")]
    pub fusion_weights: HashMap<QueryClass, HashMap<LaneID, f64>>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub warmup: WarmupConfig,
    /// Overall cap on fused evidence.
    #[serde(default = "default_fusion_cap")]
    pub fusion_cap: usize,
    #[serde(default)]
    pub keyless_fallbacks_enabled: bool,
}

fn default_lanes() -> HashMap<LaneID, LaneConfig> {
    LaneID::ALL
        .iter()
        .map(|&lane| (lane, LaneConfig::defaults_for(lane)))
        .collect()
}

fn default_budget_profiles() -> HashMap<QueryClass, u64> {
    [
        QueryClass::Simple,
        QueryClass::Technical,
        QueryClass::Research,
        QueryClass::Multimedia,
    ]
    .into_iter()
    .map(|class| (class, class.default_budget_ms()))
    .collect()
}

fn default_fusion_weights() -> HashMap<QueryClass, HashMap<LaneID, f64>> {
    use LaneID::*;
    let uniform = || LaneID::ALL.iter().map(|&l| (l, 1.0)).collect::<HashMap<_, _>>();

    let mut technical = uniform();
    technical.insert(Vector, 2.0);
    technical.insert(Kg, 2.0);

    let mut news_heavy = uniform();
    news_heavy.insert(Web, 2.0);
    news_heavy.insert(News, 2.0);

    [
        (QueryClass::Simple, uniform()),
        (QueryClass::Technical, technical),
        (QueryClass::Research, news_heavy.clone()),
        (QueryClass::Multimedia, uniform()),
    ]
    .into_iter()
    .collect()
}

fn default_fusion_cap() -> usize {
    20
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            lanes: default_lanes(),
            credentials: CredentialsConfig::default(),
            budget_profiles_ms: default_budget_profiles(),
            fusion_weights: default_fusion_weights(),
            cache: CacheConfig::default(),
            warmup: WarmupConfig::default(),
            fusion_cap: default_fusion_cap(),
            keyless_fallbacks_enabled: false,
        }
    }
}

impl OrchestratorConfig {
    /// Load from a TOML file, then apply environment variable overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut cfg: OrchestratorConfig =
            toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Load from the default location if present, else built-in defaults,
    /// with environment overrides always applied.
    pub fn load() -> Self {
        let mut cfg = dirs::home_dir()
            .map(|home| home.join(".retrieval-orchestrator").join("config.toml"))
            .filter(|p| p.exists())
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default();
        cfg.apply_env_overrides();
        cfg
    }

    /// Apply the stable, canonical environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.credentials = CredentialsConfig::from_env_and_file(self.credentials.clone());

        if let Ok(v) = std::env::var("KEYLESS_FALLBACKS_ENABLED") {
            self.keyless_fallbacks_enabled = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        apply_timeout_override(&mut self.lanes, LaneID::Web, "WEB_TIMEOUT_MS");
        apply_timeout_override(&mut self.lanes, LaneID::Vector, "VECTOR_TIMEOUT_MS");
        apply_timeout_override(&mut self.lanes, LaneID::Kg, "KG_TIMEOUT_MS");
        // RETRIEVAL_TIMEOUT_MS overrides every lane that wasn't individually
        // overridden above, acting as the coarse knob.
        if let Ok(v) = std::env::var("RETRIEVAL_TIMEOUT_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                for lane in LaneID::ALL {
                    if let Some(cfg) = self.lanes.get_mut(&lane) {
                        cfg.timeout_ms = ms;
                    }
                }
            }
        }
    }
}

fn apply_timeout_override(lanes: &mut HashMap<LaneID, LaneConfig>, lane: LaneID, var: &str) {
    if let Ok(v) = std::env::var(var) {
        if let Ok(ms) = v.parse::<u64>() {
            if let Some(cfg) = lanes.get_mut(&lane) {
                cfg.timeout_ms = ms;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lane_configs_match_spec_caps() {
        let cfg = OrchestratorConfig::default();
        assert!(cfg.lanes[&LaneID::Web].timeout_ms <= 1_000);
        assert!(cfg.lanes[&LaneID::Web].top_k <= 10);
        assert!(cfg.lanes[&LaneID::Vector].timeout_ms <= 2_000);
        assert!(cfg.lanes[&LaneID::Vector].top_k <= 5);
        assert!(cfg.lanes[&LaneID::Kg].timeout_ms <= 1_500);
        assert!(cfg.lanes[&LaneID::Kg].top_k <= 6);
    }

    #[test]
    fn global_budget_defaults_match_spec() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.budget_profiles_ms[&QueryClass::Simple], 5_000);
        assert_eq!(cfg.budget_profiles_ms[&QueryClass::Research], 10_000);
    }

    #[test]
    #[serial_test::serial]
    fn retrieval_timeout_ms_overrides_all_lanes() {
        std::env::set_var("RETRIEVAL_TIMEOUT_MS", "850");
        let mut cfg = OrchestratorConfig::default();
        cfg.apply_env_overrides();
        assert_eq!(cfg.lanes[&LaneID::Web].timeout_ms, 850);
        assert_eq!(cfg.lanes[&LaneID::Keyword].timeout_ms, 850);
        std::env::remove_var("RETRIEVAL_TIMEOUT_MS");
    }

    #[test]
    #[serial_test::serial]
    fn vector_timeout_ms_overrides_only_vector() {
        std::env::set_var("VECTOR_TIMEOUT_MS", "2500");
        let mut cfg = OrchestratorConfig::default();
        cfg.apply_env_overrides();
        assert_eq!(cfg.lanes[&LaneID::Vector].timeout_ms, 2500);
        assert_eq!(cfg.lanes[&LaneID::Vector].timeout_ms, 2500);
        std::env::remove_var("VECTOR_TIMEOUT_MS");
    }
}
