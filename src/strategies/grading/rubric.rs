//! 量规评分：每个维度选择一个等级

use super::{GradingStrategy, dimension_field, index_scores, numeric_grade};
use crate::models::assessments::{entities::FieldError, requests::CriterionScoreInput};
use crate::models::grading::entities::{Criterion, Dimension, GradingForm};
use crate::utils::grades::round_grade;

pub struct RubricStrategy {
    form: GradingForm,
}

impl RubricStrategy {
    pub const ID: &'static str = "rubric";

    pub fn new(form: GradingForm) -> Self {
        Self { form }
    }
}

fn level_range(criterion: &Criterion) -> Option<(f64, f64)> {
    let mut grades = criterion.levels.iter().map(|l| l.grade);
    let first = grades.next()?;
    Some(grades.fold((first, first), |(min, max), g| (min.min(g), max.max(g))))
}

impl GradingStrategy for RubricStrategy {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn form(&self) -> &GradingForm {
        &self.form
    }

    fn form_ready(&self) -> bool {
        !self.form.criteria.is_empty() && self.form.criteria.iter().all(|c| !c.levels.is_empty())
    }

    fn validate(&self, scores: &[CriterionScoreInput]) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let indexed = index_scores(&self.form, scores, &mut errors);

        for criterion in &self.form.criteria {
            if !indexed.contains_key(&criterion.id) {
                continue;
            }
            let chosen = numeric_grade(criterion, &indexed);
            let matches_level = chosen
                .is_some_and(|grade| criterion.levels.iter().any(|l| l.grade == grade));
            if !matches_level {
                errors.push(FieldError::new(
                    dimension_field(criterion.id),
                    "Choose one of the defined levels",
                ));
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

        let (mut sum_chosen, mut sum_min, mut sum_max) = (0.0, 0.0, 0.0);
        for criterion in &self.form.criteria {
            let chosen = numeric_grade(criterion, &indexed)?;
            let (min, max) = level_range(criterion)?;
            sum_chosen += chosen;
            sum_min += min;
            sum_max += max;
        }

        if sum_max - sum_min <= 0.0 {
            return Some(100.0);
        }
        Some(round_grade((sum_chosen - sum_min) / (sum_max - sum_min) * 100.0))
    }

    fn dimensions(&self) -> Vec<Dimension> {
        self.form
            .criteria
            .iter()
            .filter_map(|c| {
                let (min, max) = level_range(c)?;
                Some(Dimension {
                    dimension_id: c.id,
                    min,
                    max,
                    weight: 1.0,
                })
            })
            .collect()
    }

    fn validate_form(&self) -> Vec<FieldError> {
        self.form
            .criteria
            .iter()
            .filter(|c| c.levels.is_empty())
            .map(|c| FieldError::new(dimension_field(c.id), "At least one level is required"))
            .collect()
    }
}
