use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    ApiFailure,
    DatabaseSlow,
    TrafficSpike,
    SecurityBreach,
    Unknown,
}

impl IncidentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::ApiFailure => "API_FAILURE",
            IncidentType::DatabaseSlow => "DATABASE_SLOW",
            IncidentType::TrafficSpike => "TRAFFIC_SPIKE",
            IncidentType::SecurityBreach => "SECURITY_BREACH",
            IncidentType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    /// Status written to the affected service once an incident is recorded.
    pub fn service_status(&self) -> ServiceStatus {
        match self {
            Severity::Critical | Severity::High => ServiceStatus::Down,
            Severity::Medium => ServiceStatus::Degraded,
            Severity::Low => ServiceStatus::Healthy,
        }
    }

    /// Status for a service first seen through an incident report.
    pub fn initial_service_status(&self) -> ServiceStatus {
        match self {
            Severity::Critical => ServiceStatus::Down,
            _ => ServiceStatus::Degraded,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
    Down,
    Unknown,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Degraded => "degraded",
            ServiceStatus::Down => "down",
            ServiceStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    IncidentTimeline,
    ServiceHealth,
    ErrorGraph,
    LogStream,
    SlackDraft,
    ActionButton,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::IncidentTimeline => "IncidentTimeline",
            WidgetKind::ServiceHealth => "ServiceHealth",
            WidgetKind::ErrorGraph => "ErrorGraph",
            WidgetKind::LogStream => "LogStream",
            WidgetKind::SlackDraft => "SlackDraft",
            WidgetKind::ActionButton => "ActionButton",
        }
    }
}

impl FromStr for WidgetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(match s {
            "IncidentTimeline" => WidgetKind::IncidentTimeline,
            "ServiceHealth" => WidgetKind::ServiceHealth,
            "ErrorGraph" => WidgetKind::ErrorGraph,
            "LogStream" => WidgetKind::LogStream,
            "SlackDraft" => WidgetKind::SlackDraft,
            "ActionButton" => WidgetKind::ActionButton,
            other => anyhow::bail!("unknown widget component {other:?}"),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Rollback,
    Restart,
    ScaleUp,
    EnableCache,
    Monitor,
    BlockIp,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Rollback => "rollback",
            Action::Restart => "restart",
            Action::ScaleUp => "scale_up",
            Action::EnableCache => "enable_cache",
            Action::Monitor => "monitor",
            Action::BlockIp => "block_ip",
        }
    }
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(match s {
            "rollback" => Action::Rollback,
            "restart" => Action::Restart,
            "scale_up" => Action::ScaleUp,
            "enable_cache" => Action::EnableCache,
            "monitor" => Action::Monitor,
            "block_ip" => Action::BlockIp,
            other => anyhow::bail!("unknown action {other:?}"),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub component_name: WidgetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    pub reason: String,
}

impl Widget {
    pub fn new(component_name: WidgetKind, reason: impl Into<String>) -> Self {
        Self {
            component_name,
            props: None,
            reason: reason.into(),
        }
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.as_ref()?.get(key)?.as_str()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncidentAnalysis {
    #[serde(rename = "type")]
    pub kind: IncidentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub severity: Severity,
    pub widgets: Vec<Widget>,
    pub suggested_actions: Vec<Action>,
}

pub const DEFAULT_SLACK_CHANNEL: &str = "#new-channel";

impl IncidentAnalysis {
    /// Text and explicit channel (if any) of the first drafted chat message.
    pub fn slack_draft(&self) -> Option<(&str, Option<&str>)> {
        let w = self
            .widgets
            .iter()
            .find(|w| w.component_name == WidgetKind::SlackDraft)?;
        Some((w.prop_str("draftText")?, w.prop_str("channel")))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl IssueSeverity {
    pub fn deduction(&self) -> f64 {
        match self {
            IssueSeverity::Critical => 25.0,
            IssueSeverity::High => 15.0,
            IssueSeverity::Medium => 5.0,
            IssueSeverity::Low => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Security,
    Performance,
    Complexity,
    Logic,
    Style,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeIssue {
    pub severity: IssueSeverity,
    pub issue_type: IssueType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
    #[serde(rename = "💀")]
    Skull,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::Skull => "💀",
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GradeColor {
    Green,
    Blue,
    Yellow,
    Orange,
    Red,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub overall: u8,
    pub grade: Grade,
    pub grade_color: GradeColor,
    pub security: u8,
    pub performance: u8,
    pub maintainability: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_maps_to_service_status() {
        assert_eq!(Severity::Critical.service_status(), ServiceStatus::Down);
        assert_eq!(Severity::High.service_status(), ServiceStatus::Down);
        assert_eq!(Severity::Medium.service_status(), ServiceStatus::Degraded);
        assert_eq!(Severity::Low.service_status(), ServiceStatus::Healthy);
        assert_eq!(Severity::High.initial_service_status(), ServiceStatus::Degraded);
    }

    #[test]
    fn service_status_text_matches_serde() {
        for st in [
            ServiceStatus::Healthy,
            ServiceStatus::Degraded,
            ServiceStatus::Down,
            ServiceStatus::Unknown,
        ] {
            assert_eq!(serde_json::to_value(st).unwrap(), st.to_string());
        }
    }

    #[test]
    fn analysis_serializes_in_camel_case() {
        let analysis = IncidentAnalysis {
            kind: IncidentType::TrafficSpike,
            service: None,
            severity: Severity::Low,
            widgets: vec![Widget::new(WidgetKind::ActionButton, "r").with_prop("actions", vec!["scale_up"])],
            suggested_actions: vec![Action::ScaleUp],
        };
        let v = serde_json::to_value(&analysis).unwrap();
        assert_eq!(v["type"], "TRAFFIC_SPIKE");
        assert_eq!(v["widgets"][0]["componentName"], "ActionButton");
        assert_eq!(v["suggestedActions"][0], "scale_up");
        assert!(v.get("service").is_none());
    }

    #[test]
    fn skull_grade_round_trips_as_emoji() {
        let s = serde_json::to_string(&Grade::Skull).unwrap();
        assert_eq!(s, "\"💀\"");
        assert_eq!(Grade::Skull.to_string(), "💀");
    }
}
