use proptest::prelude::*;

use dataguard_core::types::{CodeIssue, IssueSeverity, IssueType, WidgetKind};
use dataguard_core::{classify, score};

fn any_issue() -> impl Strategy<Value = CodeIssue> {
    let severity = prop_oneof![
        Just(IssueSeverity::Critical),
        Just(IssueSeverity::High),
        Just(IssueSeverity::Medium),
        Just(IssueSeverity::Low),
    ];
    let issue_type = prop_oneof![
        Just(IssueType::Security),
        Just(IssueType::Performance),
        Just(IssueType::Complexity),
        Just(IssueType::Logic),
        Just(IssueType::Style),
    ];
    (severity, issue_type).prop_map(|(severity, issue_type)| CodeIssue {
        severity,
        issue_type,
    })
}

proptest! {
    #[test]
    fn classify_never_panics_and_keeps_base_pair(msg in ".{0,256}") {
        let a = classify(&msg);
        prop_assert!(a.widgets.len() >= 2);
        prop_assert_eq!(a.widgets[0].component_name, WidgetKind::IncidentTimeline);
        prop_assert_eq!(a.widgets[1].component_name, WidgetKind::ServiceHealth);
    }

    #[test]
    fn scores_stay_in_range(issues in prop::collection::vec(any_issue(), 0..64)) {
        let r = score(&issues);
        for v in [r.overall, r.security, r.performance, r.maintainability] {
            prop_assert!(v <= 100);
        }
    }

    #[test]
    fn adding_an_issue_never_raises_a_score(
        issues in prop::collection::vec(any_issue(), 0..32),
        extra in any_issue(),
    ) {
        let before = score(&issues);
        let mut more = issues.clone();
        more.push(extra);
        let after = score(&more);

        prop_assert!(after.overall <= before.overall);
        prop_assert!(after.security <= before.security);
        prop_assert!(after.performance <= before.performance);
        prop_assert!(after.maintainability <= before.maintainability);
        prop_assert!(after.grade >= before.grade);
    }
}
