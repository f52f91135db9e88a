use std::time::Duration;

use anyhow::Context;
use serde::Serialize;

use crate::config::Config;
use crate::types::DEFAULT_SLACK_CHANNEL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub channel: String,
    pub simulated: bool,
}

/// Posts drafted alerts to a chat webhook. Without a webhook, sends are simulated.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    webhook: Option<String>,
    default_channel: String,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(webhook: Option<String>, timeout: Duration) -> Self {
        Self {
            webhook,
            default_channel: DEFAULT_SLACK_CHANNEL.to_string(),
            timeout,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            default_channel: cfg.notify.default_channel.clone(),
            ..Self::new(
                cfg.slack_webhook(),
                Duration::from_secs(cfg.notify.timeout_secs),
            )
        }
    }

    /// Sends to `channel`, or the configured default when the draft names none.
    pub fn post(&self, text: &str, channel: Option<&str>) -> anyhow::Result<Delivery> {
        let channel = channel.unwrap_or(&self.default_channel);
        let Some(url) = &self.webhook else {
            tracing::debug!(%channel, "no webhook configured, simulating chat post");
            return Ok(Delivery {
                channel: channel.to_string(),
                simulated: true,
            });
        };

        let body = serde_json::json!({ "text": text, "channel": channel });
        match ureq::post(url).timeout(self.timeout).send_json(body) {
            Ok(_) => Ok(Delivery {
                channel: channel.to_string(),
                simulated: false,
            }),
            Err(ureq::Error::Status(code, r)) => {
                anyhow::bail!("chat webhook rejected post: status={code} {}", r.status_text())
            }
            Err(e) => Err(e).context("post to chat webhook"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_webhook_simulates_delivery() {
        let n = SlackNotifier::new(None, Duration::from_secs(1));
        let d = n.post("hello", Some("#sec-ops")).unwrap();
        assert!(d.simulated);
        assert_eq!(d.channel, "#sec-ops");
    }

    #[test]
    fn unreachable_webhook_is_an_error() {
        let n = SlackNotifier::new(
            Some("http://127.0.0.1:9/hook".to_string()),
            Duration::from_millis(500),
        );
        assert!(n.post("hello", None).is_err());
    }

    #[test]
    fn draft_without_channel_uses_default() {
        let n = SlackNotifier::new(None, Duration::from_secs(1));
        assert_eq!(n.post("hi", None).unwrap().channel, DEFAULT_SLACK_CHANNEL);
    }
}
