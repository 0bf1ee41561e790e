use serde::Serialize;
use ts_rs::TS;

use super::entities::{Assessment, CriterionScore, FieldError};

/// 保存评审的结果，校验失败时不写入任何数据
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/assessment.ts")]
pub enum SaveAssessmentOutcome {
    Saved {
        assessment: Assessment,
        scores: Vec<CriterionScore>,
    },
    Invalid {
        errors: Vec<FieldError>,
    },
}
