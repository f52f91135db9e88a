pub mod classifier;
pub mod config;
pub mod github;
pub mod llm;
pub mod notify;
pub mod probe;
pub mod report;
pub mod roast;
pub mod rules;
pub mod scoring;
pub mod types;

use serde::Deserialize;

pub use classifier::{AiClassifier, Analyzer, RuleClassifier, TextClassifier};
pub use rules::classify;
pub use scoring::score;

/// Body of a classify request.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRequest {
    pub message: String,
}

impl ClassifyRequest {
    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Self> {
        use anyhow::Context;

        let req: ClassifyRequest = serde_json::from_slice(bytes).context("parse request json")?;
        if req.message.trim().is_empty() {
            anyhow::bail!("message is required");
        }
        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_request_requires_message() {
        assert!(ClassifyRequest::from_json(br#"{"message":"  "}"#).is_err());
        assert!(ClassifyRequest::from_json(br#"{}"#).is_err());
        let req = ClassifyRequest::from_json(br#"{"message":"db slow"}"#).unwrap();
        assert_eq!(req.message, "db slow");
    }
}
