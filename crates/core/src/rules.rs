use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Action, IncidentAnalysis, IncidentType, Severity, Widget, WidgetKind};

/// Ordered `(pattern, value)` table. The first matching pattern wins.
struct Table<T>(Vec<(Regex, T)>);

impl<T: Copy> Table<T> {
    fn new(rows: &[(&str, T)]) -> Self {
        Self(
            rows.iter()
                .map(|(p, v)| (Regex::new(p).expect("valid regex"), *v))
                .collect(),
        )
    }

    fn first_match(&self, text: &str) -> Option<T> {
        self.0.iter().find(|(re, _)| re.is_match(text)).map(|(_, v)| *v)
    }
}

static TYPE_RULES: Lazy<Table<IncidentType>> = Lazy::new(|| {
    Table::new(&[
        ("500 error|failing|down|status code|5xx", IncidentType::ApiFailure),
        ("slow|timeout|latency|queries|stuck", IncidentType::DatabaseSlow),
        ("traffic|spike|overload|capacity|limit", IncidentType::TrafficSpike),
        ("security|breach|ddos|attack|hacker", IncidentType::SecurityBreach),
    ])
});

static SERVICE_RULES: Lazy<Table<&'static str>> = Lazy::new(|| {
    Table::new(&[
        ("payment|checkout|stripe", "payment-service"),
        ("auth|login|user|session", "auth-service"),
        ("db|database|postgres|sql", "postgres-primary"),
        ("frontend|ui|web|cdn", "frontend-cdn"),
    ])
});

static SEVERITY_RULES: Lazy<Table<Severity>> = Lazy::new(|| {
    Table::new(&[
        ("critical|down|outage|all users", Severity::Critical),
        ("intermittent|some users|high", Severity::High),
        ("low|minor|warning", Severity::Low),
    ])
});

pub const SECURITY_CHANNEL: &str = "#sec-ops";

pub fn detect_type(lower: &str) -> IncidentType {
    TYPE_RULES.first_match(lower).unwrap_or(IncidentType::Unknown)
}

pub fn detect_service(lower: &str) -> Option<&'static str> {
    SERVICE_RULES.first_match(lower)
}

pub fn detect_severity(lower: &str) -> Severity {
    SEVERITY_RULES.first_match(lower).unwrap_or(Severity::Medium)
}

/// The pair every analysis starts with, regardless of classification.
pub fn base_widgets() -> Vec<Widget> {
    vec![
        Widget::new(WidgetKind::IncidentTimeline, "Show event history"),
        Widget::new(WidgetKind::ServiceHealth, "Show overall system status"),
    ]
}

pub fn is_base_widget(kind: WidgetKind) -> bool {
    matches!(kind, WidgetKind::IncidentTimeline | WidgetKind::ServiceHealth)
}

/// Deterministic keyword classification. Total over all input.
pub fn classify(message: &str) -> IncidentAnalysis {
    let lower = message.to_lowercase();

    let kind = detect_type(&lower);
    let service = detect_service(&lower);
    let severity = detect_severity(&lower);

    let (mut widgets, actions) = type_widgets(kind, service, severity);
    if !actions.is_empty() {
        let ids: Vec<&str> = actions.iter().map(Action::as_str).collect();
        widgets.push(
            Widget::new(WidgetKind::ActionButton, "Suggested remediation actions")
                .with_prop("actions", ids),
        );
    }

    let mut all = base_widgets();
    all.extend(widgets);

    IncidentAnalysis {
        kind,
        service: service.map(str::to_string),
        severity,
        widgets: all,
        suggested_actions: actions,
    }
}

fn error_graph(title: &str, color: &str, reason: &str) -> Widget {
    Widget::new(WidgetKind::ErrorGraph, reason)
        .with_prop("title", title)
        .with_prop("color", color)
}

fn log_stream(filter: &str, reason: impl Into<String>) -> Widget {
    Widget::new(WidgetKind::LogStream, reason).with_prop("serviceFilter", filter)
}

fn slack_draft(text: String, reason: &str) -> Widget {
    Widget::new(WidgetKind::SlackDraft, reason).with_prop("draftText", text)
}

fn type_widgets(
    kind: IncidentType,
    service: Option<&str>,
    severity: Severity,
) -> (Vec<Widget>, Vec<Action>) {
    let mut widgets = Vec::new();

    let actions = match kind {
        IncidentType::ApiFailure => {
            widgets.push(error_graph("Error Rate (5xx)", "#ef4444", "Visualize error spike"));
            if let Some(svc) = service {
                widgets.push(log_stream(svc, format!("Show logs for {svc}")));
            }
            widgets.push(slack_draft(
                format!(
                    "🚨 *API FAILURE DETECTED*\nService: {}\nSeverity: {severity}\nInvestigating 500 errors.",
                    service.unwrap_or("Unknown")
                ),
                "Draft incident alert",
            ));
            vec![Action::Rollback, Action::Restart]
        }
        IncidentType::DatabaseSlow => {
            widgets.push(error_graph("Query Latency (ms)", "#eab308", "Visualize latency"));
            if let Some(svc) = service {
                widgets.push(log_stream(svc, "Show slow query logs"));
            }
            widgets.push(slack_draft(
                format!(
                    "⚠️ *DATABASE ISSUES*\nService: {}\nSeverity: {severity}\nHigh latency detected in read replicas.",
                    service.unwrap_or("DB")
                ),
                "Draft latency alert",
            ));
            vec![Action::EnableCache, Action::Restart]
        }
        IncidentType::TrafficSpike => {
            widgets.push(error_graph("Requests/sec", "#3b82f6", "Visualize traffic volume"));
            widgets.push(slack_draft(
                format!(
                    "📈 *TRAFFIC SURGE*\nService: {}\nSeverity: {severity}\nAuto-scaling trigger imminent.",
                    service.unwrap_or("Gateway")
                ),
                "Draft scaling alert",
            ));
            vec![Action::ScaleUp, Action::EnableCache]
        }
        IncidentType::SecurityBreach => {
            widgets.push(error_graph(
                "Blocked Requests",
                "#a855f7",
                "Show blocked malicious traffic",
            ));
            widgets.push(log_stream("firewall", "Show security audit logs"));
            widgets.push(
                slack_draft(
                    format!("🛡️ *SECURITY ALERT*\nSuspicious activity detected.\nSeverity: {severity}"),
                    "Notify SecOps",
                )
                .with_prop("channel", SECURITY_CHANNEL),
            );
            vec![Action::Monitor, Action::Restart]
        }
        IncidentType::Unknown => vec![],
    };

    (widgets, actions)
}
