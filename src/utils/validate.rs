use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::assessments::entities::FieldError;
use crate::models::workshops::entities::Workshop;

static PLUGIN_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]{0,31}$").expect("Invalid plugin id regex"));

/// 插件 ID 只能是小写字母开头的小写字母、数字或下划线
pub fn validate_plugin_id(id: &str) -> Result<(), &'static str> {
    if !PLUGIN_ID_RE.is_match(id) {
        return Err("Plugin id must match ^[a-z][a-z0-9_]{0,31}$");
    }
    Ok(())
}

fn ts(value: Option<chrono::DateTime<chrono::Utc>>) -> i64 {
    value.map(|t| t.timestamp()).unwrap_or(0)
}

/// 校验活动设置，返回逐字段错误
///
/// 时间 0 表示未设置；提交阶段必须早于评审阶段。
pub fn validate_workshop_settings(workshop: &Workshop) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if workshop.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name must not be empty"));
    }
    if !(0..=5).contains(&workshop.grade_decimals) {
        errors.push(FieldError::new(
            "grade_decimals",
            "Decimal places must be between 0 and 5",
        ));
    }
    if !(0.0..=100.0).contains(&workshop.grade) {
        errors.push(FieldError::new("grade", "Maximum grade must be between 0 and 100"));
    }
    if !(0.0..=100.0).contains(&workshop.grading_grade) {
        errors.push(FieldError::new(
            "grading_grade",
            "Maximum grading grade must be between 0 and 100",
        ));
    }
    if let Some(pass) = workshop.submission_grade_pass
        && (pass < 0.0 || pass > workshop.grade)
    {
        errors.push(FieldError::new(
            "submission_grade_pass",
            "Passing grade must not exceed the maximum grade",
        ));
    }
    if let Some(pass) = workshop.grading_grade_pass
        && (pass < 0.0 || pass > workshop.grading_grade)
    {
        errors.push(FieldError::new(
            "grading_grade_pass",
            "Passing grade must not exceed the maximum grading grade",
        ));
    }

    let submission_start = ts(workshop.submission_start);
    let submission_end = ts(workshop.submission_end);
    let assessment_start = ts(workshop.assessment_start);
    let assessment_end = ts(workshop.assessment_end);

    if submission_start > 0 && submission_end > 0 && submission_start >= submission_end {
        errors.push(FieldError::new(
            "submission_end",
            "Submissions deadline must be after the submissions start",
        ));
    }
    if assessment_start > 0 && assessment_end > 0 && assessment_start >= assessment_end {
        errors.push(FieldError::new(
            "assessment_end",
            "Assessment deadline must be after the assessment start",
        ));
    }

    // 提交阶段与评审阶段不能重叠
    let submission_border = submission_start.max(submission_end);
    let assessment_border = match assessment_start.min(assessment_end) {
        0 => assessment_start.max(assessment_end),
        border => border,
    };
    if submission_border > 0 && assessment_border > 0 && assessment_border < submission_border {
        let field = [
            ("submission_end", submission_end),
            ("submission_start", submission_start),
            ("assessment_start", assessment_start),
            ("assessment_end", assessment_end),
        ]
        .into_iter()
        .find(|(_, value)| *value > 0)
        .map(|(field, _)| field)
        .unwrap_or("submission_end");
        errors.push(FieldError::new(
            field,
            "The submissions phase must end before the assessment phase starts",
        ));
    }

    if workshop.phase_switch_assessment && submission_end == 0 {
        errors.push(FieldError::new(
            "phase_switch_assessment",
            "Switching phase automatically requires a submissions deadline",
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::phase::{Phase, tests::sample_workshop};
    use chrono::{DateTime, Utc};

    fn at(ts: i64) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(ts, 0)
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_plugin_id() {
        assert!(validate_plugin_id("accumulative").is_ok());
        assert!(validate_plugin_id("num_errors2").is_ok());
        assert!(validate_plugin_id("Best").is_err());
        assert!(validate_plugin_id("2best").is_err());
        assert!(validate_plugin_id("").is_err());
        assert!(validate_plugin_id("a-b").is_err());
    }

    #[test]
    fn test_default_settings_are_valid() {
        let workshop = sample_workshop(Phase::Setup);
        assert!(validate_workshop_settings(&workshop).is_empty());
    }

    #[test]
    fn test_submission_border_order() {
        let mut workshop = sample_workshop(Phase::Setup);
        workshop.submission_start = at(2_000);
        workshop.submission_end = at(1_000);
        assert_eq!(fields(&validate_workshop_settings(&workshop)), vec!["submission_end"]);
    }

    #[test]
    fn test_assessment_border_order() {
        let mut workshop = sample_workshop(Phase::Setup);
        workshop.assessment_start = at(5_000);
        workshop.assessment_end = at(5_000);
        assert_eq!(fields(&validate_workshop_settings(&workshop)), vec!["assessment_end"]);
    }

    #[test]
    fn test_phase_overlap() {
        let mut workshop = sample_workshop(Phase::Setup);
        workshop.submission_end = at(3_000);
        workshop.assessment_start = at(2_000);
        assert_eq!(fields(&validate_workshop_settings(&workshop)), vec!["submission_end"]);

        // 只有开始时间时错误落在第一个非零字段
        let mut workshop = sample_workshop(Phase::Setup);
        workshop.submission_start = at(3_000);
        workshop.assessment_end = at(2_000);
        assert_eq!(fields(&validate_workshop_settings(&workshop)), vec!["submission_start"]);

        let mut workshop = sample_workshop(Phase::Setup);
        workshop.submission_end = at(1_000);
        workshop.assessment_start = at(2_000);
        workshop.assessment_end = at(3_000);
        assert!(validate_workshop_settings(&workshop).is_empty());
    }

    #[test]
    fn test_grade_bounds() {
        let mut workshop = sample_workshop(Phase::Setup);
        workshop.grade = 120.0;
        workshop.grade_decimals = 6;
        workshop.grading_grade_pass = Some(30.0);
        let errors = validate_workshop_settings(&workshop);
        assert_eq!(
            fields(&errors),
            vec!["grade_decimals", "grade", "grading_grade_pass"]
        );
    }

    #[test]
    fn test_auto_switch_requires_deadline() {
        let mut workshop = sample_workshop(Phase::Setup);
        workshop.phase_switch_assessment = true;
        assert_eq!(
            fields(&validate_workshop_settings(&workshop)),
            vec!["phase_switch_assessment"]
        );
        workshop.submission_end = at(1_000);
        assert!(validate_workshop_settings(&workshop).is_empty());
    }
}
