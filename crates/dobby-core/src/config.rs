use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default primary endpoint — Fireworks AI inference, OpenAI-compatible.
pub const DEFAULT_PRIMARY_API_URL: &str = "https://api.fireworks.ai/inference/v1";
/// The persona model served by the primary endpoint.
pub const DEFAULT_PRIMARY_MODEL: &str =
    "accounts/sentientfoundation/models/dobby-unhinged-llama-3-3-70b-new";

/// Top-level config (dobby.toml + DOBBY_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DobbyConfig {
    /// Messaging network selector, passed through to the transport layer.
    #[serde(default)]
    pub network: Network,
    pub wallet: WalletConfig,
    pub primary: PrimaryModelConfig,
    /// Absent when no fallback API key is configured — the failover chain
    /// then goes straight from primary to the emergency responses.
    #[serde(default)]
    pub fallback: Option<FallbackModelConfig>,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub test: TestConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    #[default]
    Dev,
    Production,
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Dev => write!(f, "dev"),
            Network::Production => write!(f, "production"),
        }
    }
}

/// Signing key material for the transport session.
///
/// The key is treated as opaque — the transport collaborator derives the
/// bot's on-network identity from it. We only check it parses as 32 bytes
/// of hex before startup proceeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub private_key: String,
    pub db_encryption_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryModelConfig {
    #[serde(default = "default_primary_api_url")]
    pub api_url: String,
    pub api_key: String,
    #[serde(default = "default_primary_model")]
    pub model: String,
    #[serde(default = "default_primary_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackModelConfig {
    pub api_url: String,
    pub api_key: String,
    #[serde(default = "default_fallback_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_persona")]
    pub persona: String,
    /// Character budget for assembled generation context (system prompt +
    /// retained history + new message).
    #[serde(default = "default_max_context_length")]
    pub max_context_length: usize,
    #[serde(default = "default_max_replies_per_hour")]
    pub max_replies_per_hour: usize,
    /// Timeout for a single generation call, in milliseconds.
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            max_context_length: default_max_context_length(),
            max_replies_per_hour: default_max_replies_per_hour(),
            reply_timeout_ms: default_reply_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, log output goes to this file instead of stderr.
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    /// Diagnostics address logged at startup for manual smoke tests.
    #[serde(default = "default_test_address")]
    pub address: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            address: default_test_address(),
        }
    }
}

fn default_primary_api_url() -> String {
    DEFAULT_PRIMARY_API_URL.to_string()
}
fn default_primary_model() -> String {
    DEFAULT_PRIMARY_MODEL.to_string()
}
fn default_primary_temperature() -> f32 {
    0.3
}
fn default_fallback_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_persona() -> String {
    "dr-dobby".to_string()
}
fn default_max_context_length() -> usize {
    4000
}
fn default_max_replies_per_hour() -> usize {
    50
}
fn default_reply_timeout_ms() -> u64 {
    30_000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_test_address() -> String {
    "0xc329b69836331474d183462ccc5128a492bc0bb7".to_string()
}

impl DobbyConfig {
    /// Load config from a TOML file with DOBBY_* env var overrides
    /// (double underscore separates nesting: DOBBY_PRIMARY__API_KEY).
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: DobbyConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("DOBBY_").split("__"))
            .extract()
            .map_err(|e| crate::error::DobbyError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on missing or malformed required keys.
    ///
    /// The process must not start without the primary API key or a valid
    /// wallet signing key (original startup contract).
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.primary.api_key.trim().is_empty() {
            return Err(crate::error::DobbyError::Config(
                "primary.api_key is required".to_string(),
            ));
        }

        let key = self
            .wallet
            .private_key
            .strip_prefix("0x")
            .unwrap_or(&self.wallet.private_key);
        let decoded = hex::decode(key).map_err(|e| {
            crate::error::DobbyError::Config(format!("wallet.private_key is not valid hex: {e}"))
        })?;
        if decoded.len() != 32 {
            return Err(crate::error::DobbyError::Config(format!(
                "wallet.private_key must be 32 bytes, got {}",
                decoded.len()
            )));
        }

        // A fallback section without a key is a misconfiguration, not a
        // silently-absent fallback.
        if let Some(ref fallback) = self.fallback {
            if fallback.api_key.trim().is_empty() {
                return Err(crate::error::DobbyError::Config(
                    "fallback.api_key is required when [fallback] is present".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.dobby/dobby.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> DobbyConfig {
        DobbyConfig {
            network: Network::Dev,
            wallet: WalletConfig {
                private_key: format!("0x{}", "ab".repeat(32)),
                db_encryption_key: None,
            },
            primary: PrimaryModelConfig {
                api_url: default_primary_api_url(),
                api_key: "fw-test-key".to_string(),
                model: default_primary_model(),
                temperature: 0.3,
            },
            fallback: None,
            bot: BotConfig::default(),
            logging: LoggingConfig::default(),
            test: TestConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn missing_primary_key_fails() {
        let mut config = valid_config();
        config.primary.api_key = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("primary.api_key"));
    }

    #[test]
    fn bare_hex_wallet_key_passes() {
        let mut config = valid_config();
        config.wallet.private_key = "cd".repeat(32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn short_wallet_key_fails() {
        let mut config = valid_config();
        config.wallet.private_key = "0xabcd".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("32 bytes"));
    }

    #[test]
    fn non_hex_wallet_key_fails() {
        let mut config = valid_config();
        config.wallet.private_key = "not-a-key".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn fallback_without_key_fails() {
        let mut config = valid_config();
        config.fallback = Some(FallbackModelConfig {
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: "  ".to_string(),
            model: default_fallback_model(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn bot_defaults_match_contract() {
        let bot = BotConfig::default();
        assert_eq!(bot.max_context_length, 4000);
        assert_eq!(bot.max_replies_per_hour, 50);
        assert_eq!(bot.reply_timeout_ms, 30_000);
        assert_eq!(bot.persona, "dr-dobby");
    }
}
