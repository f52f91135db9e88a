use crate::types::{CodeIssue, Grade, GradeColor, IssueType, ScoreResult};

/// Category scores take this multiple of the severity deduction.
const CATEGORY_WEIGHT: f64 = 1.5;

pub fn score(issues: &[CodeIssue]) -> ScoreResult {
    let mut overall = 100.0_f64;
    let mut security = 100.0_f64;
    let mut performance = 100.0_f64;
    let mut maintainability = 100.0_f64;

    for issue in issues {
        let d = issue.severity.deduction();
        overall -= d;

        match issue.issue_type {
            IssueType::Security => security -= d * CATEGORY_WEIGHT,
            IssueType::Performance => performance -= d * CATEGORY_WEIGHT,
            IssueType::Complexity | IssueType::Style | IssueType::Logic => maintainability -= d,
        }
    }

    let overall = clamp(overall);

    ScoreResult {
        overall,
        grade: grade_for(overall),
        grade_color: color_for(overall),
        security: clamp(security),
        performance: clamp(performance),
        maintainability: clamp(maintainability),
    }
}

/// Rounds half away from zero, then bounds to `0..=100`.
fn clamp(v: f64) -> u8 {
    v.round().clamp(0.0, 100.0) as u8
}

pub fn grade_for(overall: u8) -> Grade {
    match overall {
        90.. => Grade::A,
        80..=89 => Grade::B,
        70..=79 => Grade::C,
        60..=69 => Grade::D,
        40..=59 => Grade::F,
        _ => Grade::Skull,
    }
}

pub fn color_for(overall: u8) -> GradeColor {
    if overall >= 90 {
        GradeColor::Green
    } else if overall >= 80 {
        GradeColor::Blue
    } else if overall >= 70 {
        GradeColor::Yellow
    } else if overall >= 60 {
        GradeColor::Orange
    } else {
        GradeColor::Red
    }
}
