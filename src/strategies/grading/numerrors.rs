//! 错误计数评分
//!
//! 每个维度是一条断言，1 表示通过、0 表示出错。出错维度的权重之和
//! 按映射表换算成绩，未定义的错误数沿用上一个已定义的值。

use super::{GradingStrategy, dimension_field, index_scores, numeric_grade};
use crate::models::assessments::{entities::FieldError, requests::CriterionScoreInput};
use crate::models::grading::entities::{Dimension, GradingForm, NumErrorsSettings};
use crate::utils::grades::{clamp_grade, round_grade};

pub struct NumErrorsStrategy {
    form: GradingForm,
    settings: NumErrorsSettings,
}

impl NumErrorsStrategy {
    pub const ID: &'static str = "numerrors";

    pub fn new(form: GradingForm) -> Self {
        let settings = serde_json::from_value(form.settings.clone()).unwrap_or_default();
        Self { form, settings }
    }

    /// 错误数换算成绩
    pub fn grade_for_errors(&self, errors: i32) -> f64 {
        if errors <= 0 {
            return 100.0;
        }
        let mut grade = 100.0;
        for i in 1..=errors {
            if let Some(mapping) = self.settings.mappings.iter().find(|m| m.errors == i) {
                grade = mapping.grade;
            }
        }
        clamp_grade(grade)
    }
}

impl GradingStrategy for NumErrorsStrategy {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn form(&self) -> &GradingForm {
        &self.form
    }

    fn validate(&self, scores: &[CriterionScoreInput]) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let indexed = index_scores(&self.form, scores, &mut errors);

        for criterion in &self.form.criteria {
            if !indexed.contains_key(&criterion.id) {
                continue;
            }
            match numeric_grade(criterion, &indexed) {
                Some(grade) if grade == 0.0 || grade == 1.0 => {}
                _ => errors.push(FieldError::new(
                    dimension_field(criterion.id),
                    "Answer must be 1 (pass) or 0 (error)",
                )),
            }
        }
        errors
    }

    fn compute_grade(&self, scores: &[CriterionScoreInput]) -> Option<f64> {
        if !self.form_ready() {
            return None;
        }
        let mut errors = Vec::new();
        let indexed = index_scores(&self.form, scores, &mut errors);

        let mut error_count = 0;
        for criterion in &self.form.criteria {
            let grade = numeric_grade(criterion, &indexed)?;
            if grade < 0.5 {
                error_count += criterion.weight.max(0);
            }
        }
        Some(round_grade(self.grade_for_errors(error_count)))
    }

    fn dimensions(&self) -> Vec<Dimension> {
        self.form
            .criteria
            .iter()
            .map(|c| Dimension {
                dimension_id: c.id,
                min: 0.0,
                max: 1.0,
                weight: f64::from(c.weight),
            })
            .collect()
    }

    fn validate_form(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let mut previous: Option<f64> = None;
        let mut mappings = self.settings.mappings.clone();
        mappings.sort_by_key(|m| m.errors);
        for mapping in &mappings {
            if mapping.errors < 1 || !(0.0..=100.0).contains(&mapping.grade) {
                errors.push(FieldError::new(
                    format!("mapping_{}", mapping.errors),
                    "Mapping needs a positive error count and a grade between 0 and 100",
                ));
            }
            // 错误越多成绩不应越高
            if previous.is_some_and(|p| mapping.grade > p) {
                errors.push(FieldError::new(
                    format!("mapping_{}", mapping.errors),
                    "Grade must not increase with the number of errors",
                ));
            }
            previous = Some(mapping.grade);
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::grading::tests::{criterion, form, score};
    use serde_json::json;

    fn strategy() -> NumErrorsStrategy {
        let mut f = form(
            "numerrors",
            vec![criterion(1, 1.0, 1), criterion(2, 1.0, 2), criterion(3, 1.0, 1)],
        );
        f.settings = json!({ "mappings": [
            { "errors": 1, "grade": 80.0 },
            { "errors": 3, "grade": 40.0 },
        ]});
        NumErrorsStrategy::new(f)
    }

    #[test]
    fn test_no_errors_full_grade() {
        let grade = strategy().compute_grade(&[score(1, 1.0), score(2, 1.0), score(3, 1.0)]);
        assert_eq!(grade, Some(100.0));
    }

    #[test]
    fn test_mapping_carries_forward() {
        let s = strategy();
        assert_eq!(s.grade_for_errors(1), 80.0);
        // 2 没有定义，沿用 1 的映射
        assert_eq!(s.grade_for_errors(2), 80.0);
        assert_eq!(s.grade_for_errors(3), 40.0);
        assert_eq!(s.grade_for_errors(7), 40.0);
    }

    #[test]
    fn test_weighted_error_count() {
        // 维度 2 权重为 2，答错计 2 个错误
        let grade = strategy().compute_grade(&[score(1, 1.0), score(2, 0.0), score(3, 1.0)]);
        assert_eq!(grade, Some(80.0));
        let grade = strategy().compute_grade(&[score(1, 0.0), score(2, 0.0), score(3, 1.0)]);
        assert_eq!(grade, Some(40.0));
    }

    #[test]
    fn test_answers_must_be_binary() {
        let errors = strategy().validate(&[score(1, 0.5), score(2, 1.0), score(3, 0.0)]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "dimension_1");
    }

    #[test]
    fn test_unmapped_errors_default_full() {
        let s = NumErrorsStrategy::new(form("numerrors", vec![criterion(1, 1.0, 1)]));
        assert_eq!(s.compute_grade(&[score(1, 0.0)]), Some(100.0));
    }

    #[test]
    fn test_increasing_mapping_rejected() {
        let mut f = form("numerrors", vec![criterion(1, 1.0, 1)]);
        f.settings = json!({ "mappings": [
            { "errors": 1, "grade": 50.0 },
            { "errors": 2, "grade": 70.0 },
        ]});
        let errors = NumErrorsStrategy::new(f).validate_form();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "mapping_2");
    }
}
