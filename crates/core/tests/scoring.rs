use dataguard_core::score;
use dataguard_core::types::{CodeIssue, Grade, GradeColor, IssueSeverity, IssueType};

fn issue(severity: IssueSeverity, issue_type: IssueType) -> CodeIssue {
    CodeIssue {
        severity,
        issue_type,
    }
}

#[test]
fn empty_issue_list_is_perfect() {
    let r = score(&[]);
    assert_eq!(r.overall, 100);
    assert_eq!(r.security, 100);
    assert_eq!(r.performance, 100);
    assert_eq!(r.maintainability, 100);
    assert_eq!(r.grade, Grade::A);
    assert_eq!(r.grade_color, GradeColor::Green);
}

#[test]
fn single_critical_security_issue() {
    let r = score(&[issue(IssueSeverity::Critical, IssueType::Security)]);
    assert_eq!(r.overall, 75);
    assert_eq!(r.security, 63);
    assert_eq!(r.performance, 100);
    assert_eq!(r.maintainability, 100);
    assert_eq!(r.grade, Grade::C);
}

#[test]
fn scores_floor_at_zero() {
    let issues = vec![issue(IssueSeverity::Critical, IssueType::Logic); 10];
    let r = score(&issues);
    assert_eq!(r.overall, 0);
    assert_eq!(r.maintainability, 0);
    assert_eq!(r.grade, Grade::Skull);
    assert_eq!(r.grade_color, GradeColor::Red);
}

#[test]
fn issues_parse_from_request_json() {
    let issues: Vec<CodeIssue> = serde_json::from_str(
        r#"[{"severity":"high","issue_type":"performance"},{"severity":"low","issue_type":"complexity"}]"#,
    )
    .unwrap();
    let r = score(&issues);
    assert_eq!(r.overall, 83);
    assert_eq!(r.performance, 78);
    assert_eq!(r.maintainability, 98);
}

#[test]
fn mixed_issue_score_json_is_stable() {
    let r = score(&[
        issue(IssueSeverity::Critical, IssueType::Security),
        issue(IssueSeverity::High, IssueType::Performance),
        issue(IssueSeverity::Medium, IssueType::Logic),
        issue(IssueSeverity::Low, IssueType::Style),
    ]);
    insta::assert_json_snapshot!(r);
}
