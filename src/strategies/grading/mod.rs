//! 评分策略
//!
//! 每个策略持有一份评分表单，负责校验维度输入并把它们折算为 0-100 的评审成绩。

pub mod accumulative;
pub mod comments;
pub mod numerrors;
pub mod rubric;

use std::collections::HashMap;

use crate::models::assessments::{entities::FieldError, requests::CriterionScoreInput};
use crate::models::grading::entities::{Criterion, Dimension, GradingForm};

pub use accumulative::AccumulativeStrategy;
pub use comments::CommentsStrategy;
pub use numerrors::NumErrorsStrategy;
pub use rubric::RubricStrategy;

pub trait GradingStrategy: Send + Sync {
    /// 策略 ID
    fn id(&self) -> &'static str;

    fn form(&self) -> &GradingForm;

    /// 至少配置了一个维度才能开始评审
    fn form_ready(&self) -> bool {
        !self.form().criteria.is_empty()
    }

    /// 逐字段校验，返回空表示通过
    fn validate(&self, scores: &[CriterionScoreInput]) -> Vec<FieldError>;

    /// 计算 0-100 的成绩，输入不完整时返回 None
    fn compute_grade(&self, scores: &[CriterionScoreInput]) -> Option<f64>;

    /// 评价策略使用的维度范围与权重
    fn dimensions(&self) -> Vec<Dimension>;

    /// 表单设置是否合法
    fn validate_form(&self) -> Vec<FieldError> {
        Vec::new()
    }
}

/// 字段名
pub(crate) fn dimension_field(dimension_id: i64) -> String {
    format!("dimension_{dimension_id}")
}

/// 把输入按维度 ID 建索引，并检查未知维度、重复维度与缺失维度
pub(crate) fn index_scores<'a>(
    form: &GradingForm,
    scores: &'a [CriterionScoreInput],
    errors: &mut Vec<FieldError>,
) -> HashMap<i64, &'a CriterionScoreInput> {
    let mut indexed = HashMap::with_capacity(scores.len());
    for score in scores {
        if !form.criteria.iter().any(|c| c.id == score.dimension_id) {
            errors.push(FieldError::new(
                dimension_field(score.dimension_id),
                "Unknown dimension",
            ));
            continue;
        }
        if indexed.insert(score.dimension_id, score).is_some() {
            errors.push(FieldError::new(
                dimension_field(score.dimension_id),
                "Dimension answered more than once",
            ));
        }
    }
    for criterion in &form.criteria {
        if !indexed.contains_key(&criterion.id) {
            errors.push(FieldError::new(dimension_field(criterion.id), "Required"));
        }
    }
    indexed
}

/// 取某维度的数值输入
pub(crate) fn numeric_grade(
    criterion: &Criterion,
    indexed: &HashMap<i64, &CriterionScoreInput>,
) -> Option<f64> {
    indexed
        .get(&criterion.id)
        .and_then(|score| score.grade)
        .filter(|grade| grade.is_finite())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn criterion(id: i64, max_grade: f64, weight: i32) -> Criterion {
        Criterion {
            id,
            sort_order: id as i32,
            description: format!("Criterion {id}"),
            max_grade,
            weight,
            levels: vec![],
        }
    }

    pub(crate) fn form(strategy: &str, criteria: Vec<Criterion>) -> GradingForm {
        GradingForm {
            strategy: strategy.to_string(),
            criteria,
            settings: serde_json::Value::Null,
        }
    }

    pub(crate) fn score(dimension_id: i64, grade: f64) -> CriterionScoreInput {
        CriterionScoreInput {
            dimension_id,
            grade: Some(grade),
            peer_comment: None,
        }
    }

    #[test]
    fn test_index_scores_reports_unknown_duplicate_and_missing() {
        let form = form("accumulative", vec![criterion(1, 10.0, 1), criterion(2, 10.0, 1)]);
        let scores = vec![score(1, 5.0), score(1, 6.0), score(9, 1.0)];
        let mut errors = Vec::new();
        let indexed = index_scores(&form, &scores, &mut errors);

        assert_eq!(indexed.len(), 1);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["dimension_1", "dimension_9", "dimension_2"]);
    }
}
