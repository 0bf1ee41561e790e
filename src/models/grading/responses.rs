use serde::Serialize;
use ts_rs::TS;

use super::entities::GradingForm;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct GradingFormResponse {
    pub form: GradingForm,
    // 至少配置了一个维度
    pub ready: bool,
}
