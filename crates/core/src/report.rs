use serde::Serialize;

use crate::roast::RoastReport;
use crate::types::{IncidentAnalysis, ScoreResult, DEFAULT_SLACK_CHANNEL};

/// Response body for a handled request: `{"success": true, ...body}`.
#[derive(Debug, Clone, Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub success: bool,
    pub error: String,
}

impl Failure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl IncidentAnalysis {
    pub fn to_markdown(&self) -> String {
        let mut s = String::new();
        s.push_str("# incident analysis\n\n");
        s.push_str(&format!("- type: `{}`\n", self.kind));
        s.push_str(&format!(
            "- service: `{}`\n",
            self.service.as_deref().unwrap_or("(none)")
        ));
        s.push_str(&format!("- severity: `{}`\n", self.severity));
        s.push_str(&format!(
            "- service_status: `{}`\n",
            self.severity.service_status()
        ));
        s.push('\n');

        s.push_str("## Widgets\n\n");
        for w in &self.widgets {
            s.push_str(&format!("- {}: {}\n", w.component_name.as_str(), w.reason));
        }
        s.push('\n');

        s.push_str("## Suggested actions\n\n");
        if self.suggested_actions.is_empty() {
            s.push_str("- (none)\n");
        } else {
            for a in &self.suggested_actions {
                s.push_str(&format!("- {}\n", a.as_str()));
            }
        }

        if let Some((text, channel)) = self.slack_draft() {
            let channel = channel.unwrap_or(DEFAULT_SLACK_CHANNEL);
            s.push_str(&format!("\n## Draft for {channel}\n\n"));
            for line in text.lines() {
                s.push_str(&format!("> {line}\n"));
            }
        }

        s
    }
}

impl ScoreResult {
    pub fn to_markdown(&self) -> String {
        let mut s = String::new();
        s.push_str("## Score\n\n");
        s.push_str(&format!("- overall: `{}` ({})\n", self.overall, self.grade));
        s.push_str(&format!("- security: `{}`\n", self.security));
        s.push_str(&format!("- performance: `{}`\n", self.performance));
        s.push_str(&format!("- maintainability: `{}`\n", self.maintainability));
        s
    }
}

impl RoastReport {
    pub fn to_markdown(&self) -> String {
        let mut s = String::new();
        s.push_str("# code roast\n\n");
        s.push_str(&self.score.to_markdown());
        s.push('\n');

        s.push_str("## Issues\n\n");
        if self.issues.is_empty() {
            s.push_str("- (none)\n");
        }
        for i in &self.issues {
            s.push_str(&format!("### {}\n", i.title));
            s.push_str(&format!(
                "- severity: `{:?}` / type: `{:?}`\n",
                i.severity, i.issue_type
            ));
            if !i.roast.is_empty() {
                s.push_str(&format!("- roast: {}\n", i.roast));
            }
            if !i.explanation.is_empty() {
                s.push_str(&format!("- explanation: {}\n", i.explanation));
            }
            if let Some(fix) = &i.suggested_fix {
                s.push_str(&format!("- suggested_fix: {fix}\n"));
            }
            s.push('\n');
        }
        s
    }
}
