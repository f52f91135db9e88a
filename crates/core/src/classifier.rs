use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::llm::{strip_fences, Llm, PerplexityLlm, Prompt};
use crate::probe::{find_url, probe};
use crate::rules::{base_widgets, is_base_widget};
use crate::types::{Action, IncidentAnalysis, IncidentType, Severity, Widget, WidgetKind};

/// Something that may be able to classify an incident report.
pub trait TextClassifier {
    fn try_classify(&self, message: &str) -> Option<IncidentAnalysis>;
}

/// Keyword rules. Always answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl TextClassifier for RuleClassifier {
    fn try_classify(&self, message: &str) -> Option<IncidentAnalysis> {
        Some(crate::rules::classify(message))
    }
}

/// Optional primary classifier in front of the keyword rules.
#[derive(Default)]
pub struct Analyzer {
    primary: Option<Box<dyn TextClassifier>>,
}

impl Analyzer {
    pub fn rules_only() -> Self {
        Self { primary: None }
    }

    pub fn with_primary(primary: impl TextClassifier + 'static) -> Self {
        Self {
            primary: Some(Box::new(primary)),
        }
    }

    /// AI-backed when an API key resolves, rules only otherwise.
    pub fn from_config(cfg: &Config) -> Self {
        match cfg.api_key() {
            Some(key) => Self::with_primary(
                AiClassifier::new(PerplexityLlm::new(key, &cfg.ai))
                    .temperature(cfg.ai.temperature)
                    .probe_timeout(cfg.probe.timeout()),
            ),
            None => {
                tracing::warn!("no AI API key configured, using keyword rules");
                Self::rules_only()
            }
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn analyze(&self, message: &str) -> IncidentAnalysis {
        if let Some(analysis) = self.primary.as_ref().and_then(|p| p.try_classify(message)) {
            return analysis;
        }
        crate::rules::classify(message)
    }
}

const SYSTEM_PROMPT: &str = r#"You are an advanced SRE Incident Commander AI for Data Guard.
Analyze the reported incident and return a JSON object describing the situation and the best UI widgets to manage it.

Allowed Components:
- ErrorGraph (props: title, color)
- LogStream (props: serviceFilter)
- ActionButton (props: actions=[rollback, restart, scale_up, enable_cache, monitor, block_ip])
- SlackDraft (props: draftText, channel)

Timeline and ServiceHealth are always included automatically, do not include them.

JSON Schema:
{
  "type": "API_FAILURE" | "DATABASE_SLOW" | "TRAFFIC_SPIKE" | "SECURITY_BREACH" | "UNKNOWN",
  "service": string (e.g. "payment-service"),
  "severity": "CRITICAL" | "HIGH" | "MEDIUM" | "LOW",
  "widgets": [ { "componentName": string, "props": object, "reason": string } ],
  "suggestedActions": string[]
}

Return ONLY raw JSON. No markdown formatting."#;

/// Classifies through an [`Llm`], optionally probing a URL from the report first.
pub struct AiClassifier<L> {
    llm: L,
    temperature: f64,
    probe_timeout: Option<Duration>,
}

impl<L: Llm> AiClassifier<L> {
    pub fn new(llm: L) -> Self {
        Self {
            llm,
            temperature: 0.2,
            probe_timeout: None,
        }
    }

    pub fn temperature(mut self, t: f64) -> Self {
        self.temperature = t;
        self
    }

    pub fn probe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout;
        self
    }

    fn prompt(&self, message: &str) -> Prompt {
        let probe_context = match (self.probe_timeout, find_url(message)) {
            (Some(timeout), Some(url)) => probe(url, timeout).context(),
            _ => String::new(),
        };
        Prompt {
            system: SYSTEM_PROMPT.to_string(),
            user: format!("Incident Report: \"{message}\"\n{probe_context}"),
            temperature: self.temperature,
        }
    }

    pub fn classify(&self, message: &str) -> anyhow::Result<IncidentAnalysis> {
        let content = self
            .llm
            .complete(&self.prompt(message))
            .context("AI analysis request")?;
        parse_analysis(&content)
    }
}

impl<L: Llm> TextClassifier for AiClassifier<L> {
    fn try_classify(&self, message: &str) -> Option<IncidentAnalysis> {
        match self.classify(message) {
            Ok(a) => Some(a),
            Err(e) => {
                let error = format!("{e:#}");
                tracing::warn!(%error, "AI analysis failed, falling back to keyword rules");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelAnalysis {
    #[serde(rename = "type", default)]
    kind: Option<IncidentType>,
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    severity: Option<Severity>,
    #[serde(default)]
    widgets: Vec<ModelWidget>,
    #[serde(default)]
    suggested_actions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelWidget {
    component_name: String,
    #[serde(default)]
    props: Option<Map<String, Value>>,
    #[serde(default)]
    reason: String,
}

/// Parse a model reply into an analysis with the base widget pair in front.
///
/// Unknown widget components and action ids are dropped rather than failing
/// the whole reply; a bad enum value for `type` or `severity` is an error.
pub fn parse_analysis(content: &str) -> anyhow::Result<IncidentAnalysis> {
    let raw: ModelAnalysis =
        serde_json::from_str(strip_fences(content)).context("parse AI analysis json")?;

    let mut widgets = base_widgets();
    for w in raw.widgets {
        match w.component_name.parse::<WidgetKind>() {
            Ok(kind) if is_base_widget(kind) => {}
            Ok(kind) => widgets.push(Widget {
                component_name: kind,
                props: w.props,
                reason: w.reason,
            }),
            Err(e) => tracing::debug!(error = %e, "dropping widget from AI analysis"),
        }
    }

    let suggested_actions: Vec<Action> = raw
        .suggested_actions
        .iter()
        .filter_map(|a| a.parse().ok())
        .collect();

    Ok(IncidentAnalysis {
        kind: raw.kind.unwrap_or(IncidentType::Unknown),
        service: raw.service.filter(|s| !s.trim().is_empty()),
        severity: raw.severity.unwrap_or(Severity::Medium),
        widgets,
        suggested_actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Canned(anyhow::Result<String>);

    impl Llm for Canned {
        fn complete(&self, _: &Prompt) -> anyhow::Result<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    struct Recording(RefCell<Vec<Prompt>>);

    impl Llm for Recording {
        fn complete(&self, prompt: &Prompt) -> anyhow::Result<String> {
            self.0.borrow_mut().push(prompt.clone());
            Ok("{}".to_string())
        }
    }

    #[test]
    fn base_widgets_from_model_are_not_duplicated() {
        let a = parse_analysis(
            r#"{"type":"TRAFFIC_SPIKE","widgets":[{"componentName":"ServiceHealth","reason":"x"},{"componentName":"ErrorGraph","props":{"title":"RPS"},"reason":"y"}]}"#,
        )
        .unwrap();
        let kinds: Vec<_> = a.widgets.iter().map(|w| w.component_name).collect();
        assert_eq!(
            kinds,
            vec![
                WidgetKind::IncidentTimeline,
                WidgetKind::ServiceHealth,
                WidgetKind::ErrorGraph
            ]
        );
        assert_eq!(a.severity, Severity::Medium);
    }

    #[test]
    fn unknown_components_and_actions_are_dropped() {
        let a = parse_analysis(
            r#"{"type":"API_FAILURE","severity":"HIGH","widgets":[{"componentName":"Hologram","reason":"z"}],"suggestedActions":["rollback","pray"]}"#,
        )
        .unwrap();
        assert_eq!(a.widgets.len(), 2);
        assert_eq!(a.suggested_actions, vec![Action::Rollback]);
    }

    #[test]
    fn invalid_severity_is_an_error() {
        assert!(parse_analysis(r#"{"type":"API_FAILURE","severity":"SEVERE"}"#).is_err());
    }

    #[test]
    fn llm_error_maps_to_none() {
        let c = AiClassifier::new(Canned(Err(anyhow::anyhow!("status=500"))));
        assert!(c.try_classify("db is slow").is_none());
    }

    #[test]
    fn prompt_quotes_report_without_probe_when_disabled() {
        let llm = Recording(RefCell::new(Vec::new()));
        let c = AiClassifier::new(&llm).temperature(0.4);
        c.try_classify("site https://127.0.0.1:9/ is down").unwrap();
        let prompts = llm.0.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].user.starts_with("Incident Report: \"site https://127.0.0.1:9/ is down\""));
        assert!(!prompts[0].user.contains("LIVE PROBE"));
        assert_eq!(prompts[0].temperature, 0.4);
    }

    #[test]
    fn prompt_includes_unreachable_target_context() {
        let llm = Recording(RefCell::new(Vec::new()));
        let c = AiClassifier::new(&llm).probe_timeout(Some(Duration::from_millis(500)));
        c.try_classify("api at http://127.0.0.1:9/ is not answering")
            .unwrap();
        let prompts = llm.0.borrow();
        assert!(prompts[0].user.contains("LIVE PROBE FAILED"));
        assert!(prompts[0].user.contains("Target: http://127.0.0.1:9/"));
    }

    #[test]
    fn empty_completion_falls_back() {
        let c = AiClassifier::new(Canned(Ok(String::new())));
        assert!(c.try_classify("db is slow").is_none());
    }

    #[test]
    fn analyzer_without_primary_uses_rules() {
        let a = Analyzer::rules_only().analyze("checkout returns 500 error");
        assert_eq!(a.kind, IncidentType::ApiFailure);
        assert_eq!(a.service.as_deref(), Some("payment-service"));
    }
}
