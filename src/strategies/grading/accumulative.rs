//! 累计评分：各维度按满分归一后加权平均

use super::{GradingStrategy, dimension_field, index_scores, numeric_grade};
use crate::models::assessments::{entities::FieldError, requests::CriterionScoreInput};
use crate::models::grading::entities::{Dimension, GradingForm};
use crate::utils::grades::round_grade;

pub struct AccumulativeStrategy {
    form: GradingForm,
}

impl AccumulativeStrategy {
    pub const ID: &'static str = "accumulative";

    pub fn new(form: GradingForm) -> Self {
        Self { form }
    }
}

impl GradingStrategy for AccumulativeStrategy {
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
                None => errors.push(FieldError::new(
                    dimension_field(criterion.id),
                    "A grade is required",
                )),
                Some(grade) if grade < 0.0 || grade > criterion.max_grade => {
                    errors.push(FieldError::new(
                        dimension_field(criterion.id),
                        format!("Grade must be between 0 and {}", criterion.max_grade),
                    ))
                }
                Some(_) => {}
            }
        }
        errors
    }

    fn compute_grade(&self, scores: &[CriterionScoreInput]) -> Option<f64> {
        let mut errors = Vec::new();
        let indexed = index_scores(&self.form, scores, &mut errors);

        let mut sum_weights = 0.0;
        let mut sum_grades = 0.0;
        for criterion in &self.form.criteria {
            let grade = numeric_grade(criterion, &indexed)?;
            if criterion.max_grade <= 0.0 || criterion.weight <= 0 {
                continue;
            }
            let weight = f64::from(criterion.weight);
            sum_grades += grade / criterion.max_grade * weight;
            sum_weights += weight;
        }

        if self.form.criteria.is_empty() {
            return None;
        }
        // 全部维度权重为 0 时仍算已评分
        if sum_weights == 0.0 {
            return Some(0.0);
        }
        Some(round_grade(sum_grades / sum_weights * 100.0))
    }

    fn dimensions(&self) -> Vec<Dimension> {
        self.form
            .criteria
            .iter()
            .map(|c| Dimension {
                dimension_id: c.id,
                min: 0.0,
                max: c.max_grade,
                weight: f64::from(c.weight),
            })
            .collect()
    }

    fn validate_form(&self) -> Vec<FieldError> {
        self.form
            .criteria
            .iter()
            .filter(|c| c.max_grade <= 0.0 || c.weight < 0)
            .map(|c| {
                FieldError::new(
                    dimension_field(c.id),
                    "Maximum grade must be positive and weight must not be negative",
                )
            })
            .collect()
    }
}
