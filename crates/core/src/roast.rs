use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::llm::{strip_fences, Llm, Prompt};
use crate::scoring::score;
use crate::types::{CodeIssue, IssueSeverity, IssueType, ScoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoastLevel {
    Gentle,
    #[default]
    Medium,
    Savage,
}

impl RoastLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoastLevel::Gentle => "gentle",
            RoastLevel::Medium => "medium",
            RoastLevel::Savage => "savage",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RoastWidget {
    SecurityBomb,
    SpaghettiMeter,
    PerformanceTurtle,
    #[default]
    GenericRoast,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoastIssue {
    pub issue_type: IssueType,
    pub severity: IssueSeverity,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub roast: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    #[serde(default, deserialize_with = "lenient_widget")]
    pub widget_type: RoastWidget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_config: Option<Value>,
}

/// Off-list widget names fall back to the generic card.
fn lenient_widget<'de, D: Deserializer<'de>>(d: D) -> Result<RoastWidget, D::Error> {
    let raw = Value::deserialize(d)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

impl RoastIssue {
    pub fn code_issue(&self) -> CodeIssue {
        CodeIssue {
            severity: self.severity,
            issue_type: self.issue_type,
        }
    }

    fn parse_failure() -> Self {
        Self {
            issue_type: IssueType::Style,
            severity: IssueSeverity::Medium,
            title: "AI Parse Failure".to_string(),
            roast: "My brain hurts trying to read your code. Or maybe I just broke.".to_string(),
            explanation: "The AI returned invalid JSON. Try again.".to_string(),
            code_snippet: None,
            suggested_fix: None,
            widget_type: RoastWidget::GenericRoast,
            widget_config: Some(serde_json::json!({ "emoji": "🤖" })),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoastRequest {
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub roast_level: RoastLevel,
}

fn default_language() -> String {
    "plaintext".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct RoastReport {
    pub issues: Vec<RoastIssue>,
    pub score: ScoreResult,
}

pub fn roast_prompt(code: &str, language: &str, level: RoastLevel) -> String {
    format!(
        r#"You are "Code Critic", a senior developer who is brutally honest, witty, and slightly mean (but helpful).
Your goal is to review the following {language} code and "roast" it.

Roast Level: {level}
- gentle: Constructive feedback with light humor.
- medium: Witty roasts that sting a bit. Sarcastic.
- savage: Full Gordon Ramsay mode. Brutal.

Code to Review:
```{language}
{code}
```

Analyze for:
1. Security vulnerabilities (CRITICAL) - Look for injection, hardcoded keys, etc.
2. Performance issues (HIGH) - N+1 queries, loops, memory leaks.
3. Code smells (MEDIUM) - Spaghetti code, bad naming, huge functions.
4. Logic errors (HIGH).

OUTPUT FORMAT:
Return ONLY valid JSON array with this structure. Do not wrap in markdown code blocks.
[
  {{
    "issue_type": "security" | "performance" | "complexity" | "style" | "logic",
    "severity": "critical" | "high" | "medium" | "low",
    "title": "Short catchy title",
    "roast": "The funny critique based on roast level",
    "explanation": "The serious technical explanation",
    "code_snippet": "The specific bad line or block",
    "suggested_fix": "How to fix it",
    "widget_type": "SecurityBomb" | "SpaghettiMeter" | "PerformanceTurtle" | "GenericRoast",
    "widget_config": {{ ...any specific props for the widget... }}
  }}
]

For "widget_config":
- SecurityBomb: {{ "explosionSize": "big" | "small" }}
- SpaghettiMeter: {{ "complexity": 0-100 }}
- PerformanceTurtle: {{ "speed": "slow" | "crawl" }}
- GenericRoast: {{ "emoji": "🤡" }}
"#,
        level = level.as_str(),
    )
}

/// Never fails. A reply that is not a JSON array becomes a single placeholder
/// issue; items inside the array that do not fit the issue shape are dropped.
pub fn parse_roast(content: &str) -> Vec<RoastIssue> {
    let content = strip_fences(content);
    if content.trim().is_empty() {
        return Vec::new();
    }

    let items = match serde_json::from_str::<Vec<Value>>(content) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "roast reply was not a JSON array");
            return vec![RoastIssue::parse_failure()];
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RoastIssue>(item) {
            Ok(issue) => Some(issue),
            Err(e) => {
                tracing::debug!(error = %e, "dropping roast item");
                None
            }
        })
        .collect()
}

pub struct Roaster<L> {
    llm: L,
    temperature: f64,
}

impl<L: Llm> Roaster<L> {
    pub fn new(llm: L) -> Self {
        Self {
            llm,
            temperature: 0.5,
        }
    }

    pub fn roast(&self, req: &RoastRequest) -> anyhow::Result<RoastReport> {
        if req.code.trim().is_empty() {
            anyhow::bail!("Code is required");
        }

        let prompt = Prompt {
            system: "You are a JSON generator. Always return valid JSON only.".to_string(),
            user: roast_prompt(&req.code, &req.language, req.roast_level),
            temperature: self.temperature,
        };
        let content = self.llm.complete(&prompt).context("AI roast request")?;

        let issues = parse_roast(&content);
        let codes: Vec<CodeIssue> = issues.iter().map(RoastIssue::code_issue).collect();

        Ok(RoastReport {
            score: score(&codes),
            issues,
        })
    }
}
