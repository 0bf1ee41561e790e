use serde::Serialize;
use ts_rs::TS;

use crate::workflow::phase::Phase;

/// 阶段中的一项任务，completed 为空表示无从判断
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/plan.ts")]
pub struct PlanTask {
    pub code: String,
    pub completed: Option<bool>,
}

impl PlanTask {
    pub fn new(code: &str, completed: Option<bool>) -> Self {
        Self {
            code: code.to_string(),
            completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/plan.ts")]
pub struct PhasePlan {
    pub phase: Phase,
    pub active: bool,
    pub tasks: Vec<PlanTask>,
}

/// 示例提交及当前用户对它的评审状态
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/plan.ts")]
pub struct ExampleStatus {
    pub submission_id: i64,
    pub title: String,
    pub assessment_id: Option<i64>,
    pub grade: Option<f64>,
}

/// 分配给当前用户的正式评审
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/plan.ts")]
pub struct AssignedAssessment {
    pub assessment_id: i64,
    pub submission_id: i64,
    pub submission_title: String,
    pub author_id: Option<i64>,
    pub weight: i32,
    pub grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/plan.ts")]
pub struct UserPlan {
    pub user_id: i64,
    pub phases: Vec<PhasePlan>,
    pub examples: Vec<ExampleStatus>,
    pub examples_done: bool,
    pub examples_must: bool,
    pub can_create_submission: bool,
    pub own_submission_id: Option<i64>,
    // 是否可以开始同伴评审
    pub assessments_available: bool,
    pub assigned: Vec<AssignedAssessment>,
}
