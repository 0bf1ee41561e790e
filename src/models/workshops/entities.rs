use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::workflow::phase::Phase;

/// 评审方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/workshop.ts")]
pub enum AssessmentType {
    Peer,
    #[serde(rename = "self")]
    SelfOnly,
    Both,
}

impl AssessmentType {
    pub const PEER: i32 = 1;
    pub const SELF: i32 = 2;
    pub const BOTH: i32 = 3;

    pub fn code(self) -> i32 {
        match self {
            AssessmentType::Peer => Self::PEER,
            AssessmentType::SelfOnly => Self::SELF,
            AssessmentType::Both => Self::BOTH,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::PEER => Some(AssessmentType::Peer),
            Self::SELF => Some(AssessmentType::SelfOnly),
            Self::BOTH => Some(AssessmentType::Both),
            _ => None,
        }
    }

    /// 是否需要同伴分配
    pub fn includes_peers(self) -> bool {
        self != AssessmentType::SelfOnly
    }
}

/// 示例提交的评审模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/workshop.ts")]
pub enum ExamplesMode {
    Voluntary,
    BeforeSubmission,
    BeforeAssessment,
}

impl ExamplesMode {
    pub fn code(self) -> i32 {
        match self {
            ExamplesMode::Voluntary => 0,
            ExamplesMode::BeforeSubmission => 1,
            ExamplesMode::BeforeAssessment => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExamplesMode::Voluntary),
            1 => Some(ExamplesMode::BeforeSubmission),
            2 => Some(ExamplesMode::BeforeAssessment),
            _ => None,
        }
    }
}

/// 分组模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/workshop.ts")]
pub enum GroupMode {
    NoGroups,
    SeparateGroups,
    VisibleGroups,
}

impl GroupMode {
    pub fn code(self) -> i32 {
        match self {
            GroupMode::NoGroups => 0,
            GroupMode::SeparateGroups => 1,
            GroupMode::VisibleGroups => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(GroupMode::NoGroups),
            1 => Some(GroupMode::SeparateGroups),
            2 => Some(GroupMode::VisibleGroups),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/workshop.ts")]
pub struct Workshop {
    // 唯一 ID
    pub id: i64,
    // 所属课程 ID
    pub course_id: i64,
    // 活动名称
    pub name: String,
    // 当前阶段
    pub phase: Phase,
    // 评审方式
    pub assessment_type: AssessmentType,
    // 是否创建自评
    pub use_self_assessment: bool,
    // 是否允许提交作品
    pub allow_submission: bool,
    // 无提交时是否仍可评审
    pub assess_without_submission: bool,
    // 提交阶段内提交后即可评审
    pub assess_as_soon_submitted: bool,
    // 是否启用示例提交
    pub use_examples: bool,
    pub examples_mode: ExamplesMode,
    // 提交成绩满分
    pub grade: f64,
    // 评审成绩满分
    pub grading_grade: f64,
    pub grade_decimals: i32,
    // 评分策略 ID
    pub strategy: String,
    #[ts(type = "unknown")]
    pub strategy_settings: serde_json::Value,
    // 评价策略 ID
    pub evaluation: String,
    #[ts(type = "unknown")]
    pub evaluation_settings: serde_json::Value,
    pub submission_start: Option<DateTime<Utc>>,
    pub submission_end: Option<DateTime<Utc>>,
    pub assessment_start: Option<DateTime<Utc>>,
    pub assessment_end: Option<DateTime<Utc>>,
    // 提交截止后自动切换到评审阶段
    pub phase_switch_assessment: bool,
    pub late_submissions: bool,
    pub group_mode: GroupMode,
    pub submission_grade_pass: Option<f64>,
    pub grading_grade_pass: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workshop {
    /// 当前阶段是否允许评审示例提交
    pub fn assessing_examples_allowed(&self) -> bool {
        if !self.use_examples {
            return false;
        }
        match self.examples_mode {
            ExamplesMode::Voluntary => true,
            ExamplesMode::BeforeSubmission => self.phase == Phase::Submission,
            ExamplesMode::BeforeAssessment => self.phase == Phase::Assessment,
        }
    }

    /// 评审示例是否是当前阶段继续操作的前置条件
    pub fn examples_must(&self) -> bool {
        if !self.use_examples {
            return false;
        }
        match self.examples_mode {
            ExamplesMode::Voluntary => false,
            ExamplesMode::BeforeSubmission => self.phase == Phase::Submission,
            ExamplesMode::BeforeAssessment => self.phase == Phase::Assessment,
        }
    }

    /// 分组隔离是否生效
    pub fn separate_groups(&self) -> bool {
        self.group_mode == GroupMode::SeparateGroups
    }
}
