//! 评语评分：不打分，只要求每个维度都有评语

use super::{GradingStrategy, dimension_field, index_scores};
use crate::models::assessments::{entities::FieldError, requests::CriterionScoreInput};
use crate::models::grading::entities::{Dimension, GradingForm};

pub struct CommentsStrategy {
    form: GradingForm,
}

impl CommentsStrategy {
    pub const ID: &'static str = "comments";

    pub fn new(form: GradingForm) -> Self {
        Self { form }
    }
}

fn has_comment(score: &CriterionScoreInput) -> bool {
    score
        .peer_comment
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty())
}

impl GradingStrategy for CommentsStrategy {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn form(&self) -> &GradingForm {
        &self.form
    }

    fn validate(&self, scores: &[CriterionScoreInput]) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let indexed = index_scores(&self.form, scores, &mut errors);

        for (dimension_id, score) in &indexed {
            if !has_comment(score) {
                errors.push(FieldError::new(
                    dimension_field(*dimension_id),
                    "A comment is required",
                ));
            }
        }
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        errors
    }

    fn compute_grade(&self, scores: &[CriterionScoreInput]) -> Option<f64> {
        if !self.form_ready() {
            return None;
        }
        let mut errors = Vec::new();
        let indexed = index_scores(&self.form, scores, &mut errors);
        let complete = self
            .form
            .criteria
            .iter()
            .all(|c| indexed.get(&c.id).is_some_and(|s| has_comment(s)));
        complete.then_some(100.0)
    }

    // 没有数值维度
    fn dimensions(&self) -> Vec<Dimension> {
        Vec::new()
    }
}
