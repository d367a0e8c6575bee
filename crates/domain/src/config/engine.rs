use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dialog engine (Watson Assistant v2 REST)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Service instance URL, e.g.
    /// `https://api.us-south.assistant.watson.cloud.ibm.com/instances/<id>`.
    #[serde(default = "d_engine_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is not set inline.
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub assistant_id: String,
    /// API version date sent as the `version` query parameter.
    #[serde(default = "d_version")]
    pub version: String,
    #[serde(default = "d_10000")]
    pub timeout_ms: u64,
    /// JSON file with `apikey`, `url` and `assistant_id`.  Values found in
    /// it override the inline ones.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
}

impl EngineConfig {
    /// The API key from config, falling back to `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: d_engine_url(),
            api_key: None,
            api_key_env: d_api_key_env(),
            assistant_id: String::new(),
            version: d_version(),
            timeout_ms: 10_000,
            credentials_file: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_engine_url() -> String {
    "https://gateway.watsonplatform.net/assistant/api".into()
}
fn d_api_key_env() -> String {
    "SB_ENGINE_API_KEY".into()
}
fn d_version() -> String {
    "2019-02-28".into()
}
fn d_10000() -> u64 {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.version, "2019-02-28");
        assert_eq!(cfg.timeout_ms, 10_000);
        assert_eq!(cfg.api_key_env, "SB_ENGINE_API_KEY");
        assert!(cfg.assistant_id.is_empty());
    }

    #[test]
    fn inline_api_key_wins() {
        let cfg = EngineConfig {
            api_key: Some("inline".into()),
            api_key_env: "SB_TEST_ENGINE_KEY_NEVER_SET".into(),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_api_key().as_deref(), Some("inline"));
    }

    #[test]
    fn empty_inline_key_is_ignored() {
        let cfg = EngineConfig {
            api_key: Some(String::new()),
            api_key_env: "SB_TEST_ENGINE_KEY_NEVER_SET".into(),
            ..Default::default()
        };
        assert!(cfg.resolve_api_key().is_none());
    }
}
