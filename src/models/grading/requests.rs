use serde::Deserialize;
use ts_rs::TS;

use super::entities::RubricLevel;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct CriterionInput {
    pub description: String,
    pub max_grade: Option<f64>,
    pub weight: Option<i32>,
    #[serde(default)]
    pub levels: Vec<RubricLevel>,
}

/// 整体替换当前评分策略的表单
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct UpdateGradingFormRequest {
    pub criteria: Vec<CriterionInput>,
    #[ts(type = "unknown")]
    pub settings: Option<serde_json::Value>,
}
