use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::workshops::entities::{AssessmentType, ExamplesMode, Workshop};
use crate::workflow::phase::Phase;

/// 设置向导的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/wizard.ts")]
pub enum WizardStep {
    AssessmentType,
    GradingMethod,
    SubmissionSettings,
    PeerAllocation,
    AssessmentSettings,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/wizard.ts")]
pub struct WizardStepEntry {
    pub step: WizardStep,
    pub previous: Option<WizardStep>,
    pub next: Option<WizardStep>,
}

/// 当前配置摘要
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/wizard.ts")]
pub struct ConfigurationSummary {
    pub name: String,
    pub phase: Phase,
    pub assessment_type: AssessmentType,
    pub strategy: String,
    pub evaluation: String,
    pub allow_submission: bool,
    pub use_examples: bool,
    pub examples_mode: ExamplesMode,
    pub submission_start: Option<DateTime<Utc>>,
    pub submission_end: Option<DateTime<Utc>>,
    pub assessment_start: Option<DateTime<Utc>>,
    pub assessment_end: Option<DateTime<Utc>>,
    pub phase_switch_assessment: bool,
    pub criteria_count: i64,
    pub participants_count: i64,
    pub submissions_count: i64,
    pub scheduled_allocation_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/wizard.ts")]
pub struct WizardNavigationPage {
    pub steps: Vec<WizardStepEntry>,
    pub summary: ConfigurationSummary,
}

/// 保存向导第一步后的结果
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/wizard.ts")]
pub struct AssessmentTypeStepResponse {
    pub workshop: Workshop,
    pub next: WizardStep,
}
