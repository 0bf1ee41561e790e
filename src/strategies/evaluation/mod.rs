//! 评价策略
//!
//! 输入是一个提交的全部评审快照，输出提交成绩与每条已评分评审的评审成绩。
//! 纯函数，相同输入必然得到相同输出。

pub mod best;
pub mod comments;

use std::collections::HashMap;

use crate::models::evaluation::entities::SubmissionEvaluation;
use crate::models::grading::entities::Dimension;
use crate::utils::grades::round_grade;

pub use best::BestEvaluator;
pub use comments::CommentsEvaluator;

/// 参与评价的一条评审
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentSnapshot {
    pub assessment_id: i64,
    pub reviewer_id: i64,
    pub weight: i32,
    pub grade: Option<f64>,
    // 维度 ID -> 原始得分
    pub scores: HashMap<i64, f64>,
}

impl AssessmentSnapshot {
    pub fn is_graded(&self) -> bool {
        self.grade.is_some()
    }
}

pub struct EvaluationInput<'a> {
    pub dimensions: &'a [Dimension],
    pub assessments: &'a [AssessmentSnapshot],
}

pub trait Evaluator: Send + Sync {
    /// 策略 ID
    fn id(&self) -> &'static str;

    fn evaluate(&self, input: &EvaluationInput<'_>) -> SubmissionEvaluation;
}

/// 提交成绩：权重大于 0 的已评分评审的加权平均
pub fn submission_grade(assessments: &[AssessmentSnapshot]) -> Option<f64> {
    let (sum, weights) = assessments
        .iter()
        .filter(|a| a.weight > 0)
        .filter_map(|a| a.grade.map(|g| (g, f64::from(a.weight))))
        .fold((0.0, 0.0), |(sum, weights), (grade, weight)| {
            (sum + grade * weight, weights + weight)
        });
    if weights > 0.0 {
        Some(round_grade(sum / weights))
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn snapshot(
        assessment_id: i64,
        reviewer_id: i64,
        weight: i32,
        scores: &[(i64, f64)],
    ) -> AssessmentSnapshot {
        AssessmentSnapshot {
            assessment_id,
            reviewer_id,
            weight,
            grade: Some(50.0),
            scores: scores.iter().copied().collect(),
        }
    }

    #[test]
    fn test_submission_grade_weighted() {
        let mut a = snapshot(1, 10, 1, &[]);
        a.grade = Some(60.0);
        let mut b = snapshot(2, 11, 3, &[]);
        b.grade = Some(80.0);
        // 权重 0 的示例评审与未评分的分配不计入
        let mut c = snapshot(3, 12, 0, &[]);
        c.grade = Some(0.0);
        let mut d = snapshot(4, 13, 1, &[]);
        d.grade = None;
        assert_eq!(submission_grade(&[a, b, c, d]), Some(75.0));
    }

    #[test]
    fn test_submission_grade_none_without_graded() {
        let mut a = snapshot(1, 10, 1, &[]);
        a.grade = None;
        assert_eq!(submission_grade(&[a]), None);
        assert_eq!(submission_grade(&[]), None);
    }
}
