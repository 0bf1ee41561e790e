use serde::Deserialize;
use ts_rs::TS;

use super::entities::{AssessmentType, ExamplesMode, GroupMode};
use crate::workflow::phase::Phase;

/// 创建工作坊，未给出的字段取站点默认值
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/workshop.ts")]
pub struct CreateWorkshopRequest {
    pub course_id: i64,
    pub name: String,
    pub assessment_type: Option<AssessmentType>,
    pub strategy: Option<String>,
    pub evaluation: Option<String>,
}

/// 更新活动设置
///
/// 时间字段为 Unix 秒，0 表示不限制。
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/workshop.ts")]
pub struct UpdateWorkshopSettingsRequest {
    pub name: Option<String>,
    pub grade: Option<f64>,
    pub grading_grade: Option<f64>,
    pub grade_decimals: Option<i32>,
    pub strategy: Option<String>,
    pub allow_submission: Option<bool>,
    pub assess_without_submission: Option<bool>,
    pub assess_as_soon_submitted: Option<bool>,
    pub use_examples: Option<bool>,
    pub examples_mode: Option<ExamplesMode>,
    pub submission_start: Option<i64>,
    pub submission_end: Option<i64>,
    pub assessment_start: Option<i64>,
    pub assessment_end: Option<i64>,
    pub phase_switch_assessment: Option<bool>,
    pub late_submissions: Option<bool>,
    pub group_mode: Option<GroupMode>,
    pub submission_grade_pass: Option<f64>,
    pub grading_grade_pass: Option<f64>,
}

/// 切换阶段，目标必须是下一阶段
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/workshop.ts")]
pub struct SwitchPhaseRequest {
    pub phase: Phase,
}

/// 向导第一步：评审方式
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/wizard.ts")]
pub struct AssessmentTypeStepRequest {
    pub assessment_type: AssessmentType,
}
