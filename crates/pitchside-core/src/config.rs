use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PitchsideError, Result};

/// Greeting seeded as the first assistant message of every session.
pub const DEFAULT_GREETING: &str = "Hello! I'm your AI football analyst. Ask me anything about upcoming matches, team form, injury reports, or predictions. For example: 'Will Manchester United beat Liverpool tonight?' or 'Tell me about Chelsea's current form'.";

/// Simulated "thinking" delay before the assistant reply appears.
pub const DEFAULT_RESPONSE_DELAY_MS: u64 = 1500;

/// Top-level configuration for Pitchside.
///
/// Loaded from `~/.pitchside/config.toml` by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PitchsideConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl PitchsideConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed. Does not log:
    /// the binary calls this before tracing is installed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PitchsideConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// What `submit` does while a response is still pending.
///
/// Only rejection is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    #[default]
    Reject,
}

/// One user-defined rule: every keyword must appear in the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Short label used in logs.
    pub name: String,
    pub keywords: Vec<String>,
    pub response: String,
}

/// Chat widget configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether submissions are accepted at all.
    pub enabled: bool,
    /// First assistant message of every session.
    pub greeting: String,
    /// Delay before the assistant reply is appended, in milliseconds.
    pub response_delay_ms: u64,
    pub busy_policy: BusyPolicy,
    /// Suggested prompts offered next to the input box.
    pub quick_questions: Vec<String>,
    /// Replaces the built-in fallback answer when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_response: Option<String>,
    /// Ordered rule table. Empty means "use the built-in football rules".
    pub rules: Vec<RuleConfig>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            greeting: DEFAULT_GREETING.to_string(),
            response_delay_ms: DEFAULT_RESPONSE_DELAY_MS,
            busy_policy: BusyPolicy::Reject,
            quick_questions: vec![
                "Will Galatasaray beat Fenerbahçe tonight?".to_string(),
                "Is there a key player missing from Manchester United?".to_string(),
                "What's Liverpool's current form?".to_string(),
                "Predict the outcome of Chelsea vs Arsenal".to_string(),
            ],
            fallback_response: None,
            rules: Vec::new(),
        }
    }
}

impl ChatConfig {
    /// Reject settings a session cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.greeting.trim().is_empty() {
            return Err(PitchsideError::Config("chat.greeting is empty".to_string()));
        }
        if let Some(index) = self.quick_questions.iter().position(|q| q.trim().is_empty()) {
            return Err(PitchsideError::Config(format!(
                "chat.quick_questions[{}] is empty",
                index
            )));
        }
        Ok(())
    }
}
