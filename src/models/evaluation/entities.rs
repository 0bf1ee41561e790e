use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// best 评价策略的设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub struct BestEvaluationSettings {
    /// 比较严格度，取 1/3/5/7/9
    pub comparison: i32,
}

impl BestEvaluationSettings {
    pub const LEVELS: [i32; 5] = [1, 3, 5, 7, 9];
}

impl Default for BestEvaluationSettings {
    fn default() -> Self {
        Self { comparison: 5 }
    }
}

/// 某位评审者在一条评审上的评审成绩
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub struct ReviewerGradingGrade {
    pub assessment_id: i64,
    pub reviewer_id: i64,
    pub grading_grade: f64,
}

/// 单个提交的评价输出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub struct SubmissionEvaluation {
    pub submission_grade: Option<f64>,
    pub grading_grades: Vec<ReviewerGradingGrade>,
}
