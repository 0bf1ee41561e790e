use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub struct SetEvaluationMethodRequest {
    pub method: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub struct UpdateEvaluationSettingsRequest {
    #[ts(type = "unknown")]
    pub settings: serde_json::Value,
}

/// 工具箱中的破坏性操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub enum ToolboxAction {
    ClearAggregatedGrades,
    ClearAssessments,
}

impl ToolboxAction {
    /// 调用方必须原样回传的确认口令
    pub fn confirmation_token(self) -> &'static str {
        match self {
            ToolboxAction::ClearAggregatedGrades => "clear_aggregated_grades",
            ToolboxAction::ClearAssessments => "clear_assessments",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub struct ToolboxRequest {
    pub confirm: Option<String>,
}
