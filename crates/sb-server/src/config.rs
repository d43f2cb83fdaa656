//! Server configuration, loadable from TOML or environment.

use serde::Deserialize;

use sb_dialog::DialogConfig;

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// PostgreSQL connection URL. None runs on the in-memory sample store.
    #[serde(default)]
    pub database_url: Option<String>,
    /// External sentiment service. None uses keyword scoring.
    #[serde(default)]
    pub scorer: Option<ScorerConfig>,
    /// Optional TOML rule table replacing the built-in intent rules.
    #[serde(default)]
    pub rules_file: Option<String>,
    /// Transcript entries buffered before new ones are dropped.
    #[serde(default = "default_log_queue_capacity")]
    pub log_queue_capacity: usize,
    /// How often expired sessions are purged.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
    #[serde(default)]
    pub dialog: DialogConfig,
}

/// HTTP sentiment service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ScorerConfig {
    /// Base URL; the client POSTs to `{url}/sentiment`.
    pub url: String,
    #[serde(default = "default_scorer_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3978
}

fn default_log_queue_capacity() -> usize {
    1024
}

fn default_purge_interval_secs() -> u64 {
    300
}

fn default_scorer_timeout_ms() -> u64 {
    1500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            scorer: None,
            rules_file: None,
            log_queue_capacity: default_log_queue_capacity(),
            purge_interval_secs: default_purge_interval_secs(),
            dialog: DialogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key → value source. Unparseable values keep
    /// the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup("SB_HOST") {
            config.host = host;
        }
        if let Some(port) = parsed(&lookup, "SB_PORT") {
            config.port = port;
        }
        config.database_url = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        config.scorer = lookup("SCORER_URL")
            .filter(|v| !v.is_empty())
            .map(|url| ScorerConfig {
                url,
                timeout_ms: parsed(&lookup, "SCORER_TIMEOUT_MS")
                    .unwrap_or_else(default_scorer_timeout_ms),
            });
        config.rules_file = lookup("SB_RULES_FILE").filter(|v| !v.is_empty());
        if let Some(v) = parsed(&lookup, "SB_MIN_CONFIDENCE") {
            config.dialog.min_confidence = v;
        }
        if let Some(v) = parsed(&lookup, "SB_COLLABORATOR_TIMEOUT_MS") {
            config.dialog.collaborator_timeout_ms = v;
        }
        if let Some(v) = parsed(&lookup, "SB_SESSION_TIMEOUT_SECS") {
            config.dialog.session_timeout_secs = v;
        }
        config
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable config value");
            None
        }
    }
}
