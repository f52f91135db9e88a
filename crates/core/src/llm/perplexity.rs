use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::{Llm, Prompt};
use crate::config::AiConfig;

#[derive(Debug, Clone)]
pub struct PerplexityLlm {
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl PerplexityLlm {
    pub fn new(api_key: impl Into<String>, cfg: &AiConfig) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            api_key: api_key.into(),
            model: cfg.model.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl Llm for PerplexityLlm {
    fn complete(&self, prompt: &Prompt) -> anyhow::Result<String> {
        let req = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: prompt.temperature,
        };

        tracing::debug!(model = %self.model, endpoint = %self.endpoint, "sending completion request");

        let resp = ureq::post(&self.endpoint)
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(serde_json::to_value(&req).context("encode completion request")?);

        let resp = match resp {
            Ok(r) => r,
            Err(ureq::Error::Status(code, r)) => {
                anyhow::bail!("completion request failed: status={code} {}", r.status_text())
            }
            Err(e) => return Err(e).context("call completion endpoint"),
        };

        let body: ChatResponse = resp.into_json().context("decode completion response")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            tracing::debug!(model = %self.model, "completion response had no content");
        }
        Ok(content)
    }
}
