use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "dataguard.toml";
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";
pub const SLACK_WEBHOOK_ENV: &str = "SLACK_WEBHOOK_URL";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub ai: AiConfig,
    pub probe: ProbeConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub temperature: f64,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.perplexity.ai/chat/completions".to_string(),
            model: "sonar-pro".to_string(),
            temperature: 0.2,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 5,
        }
    }
}

impl ProbeConfig {
    /// `None` when probing is switched off.
    pub fn timeout(&self) -> Option<Duration> {
        self.enabled.then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub slack_webhook_url: Option<String>,
    pub default_channel: String,
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            default_channel: crate::types::DEFAULT_SLACK_CHANNEL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }

    pub fn discover() -> Option<Self> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Config::load(path).ok()
        } else {
            None
        }
    }

    /// Key from the file, else from the environment. Blank values count as unset.
    pub fn api_key(&self) -> Option<String> {
        non_blank(self.ai.api_key.clone()).or_else(|| non_blank(std::env::var(API_KEY_ENV).ok()))
    }

    pub fn slack_webhook(&self) -> Option<String> {
        non_blank(self.notify.slack_webhook_url.clone())
            .or_else(|| non_blank(std::env::var(SLACK_WEBHOOK_ENV).ok()))
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}
