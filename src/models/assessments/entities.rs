use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 评审记录，grade 为空时即为一条尚未评分的分配
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assessment.ts")]
pub struct Assessment {
    pub id: i64,
    pub submission_id: i64,
    pub reviewer_id: i64,
    // 权重，0 表示不计入（示例评审）
    pub weight: i32,
    pub grade: Option<f64>,
    // 评审成绩，衡量评审者的准确度
    pub grading_grade: Option<f64>,
    pub grading_grade_over: Option<f64>,
    pub feedback_author: Option<String>,
    pub feedback_reviewer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Assessment {
    pub fn is_graded(&self) -> bool {
        self.grade.is_some()
    }

    pub fn final_grading_grade(&self) -> Option<f64> {
        self.grading_grade_over.or(self.grading_grade)
    }
}

/// 评分维度得分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assessment.ts")]
pub struct CriterionScore {
    pub id: i64,
    pub assessment_id: i64,
    pub strategy: String,
    pub dimension_id: i64,
    pub grade: f64,
    pub peer_comment: Option<String>,
}

/// 逐字段的校验错误
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assessment.ts")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
