use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 单个维度的输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assessment.ts")]
pub struct CriterionScoreInput {
    pub dimension_id: i64,
    // 评语策略不需要分数
    pub grade: Option<f64>,
    pub peer_comment: Option<String>,
}

/// 保存评审
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assessment.ts")]
pub struct SaveAssessmentRequest {
    pub scores: Vec<CriterionScoreInput>,
    pub feedback_author: Option<String>,
}

/// 覆盖评审成绩，为空表示撤销覆盖
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assessment.ts")]
pub struct OverrideGradingGradeRequest {
    pub grading_grade_over: Option<f64>,
    pub feedback_reviewer: Option<String>,
}
