use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 分配器初始化结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub enum AllocationStatus {
    Ok,
    Error,
    /// 无事可做
    Void,
    /// 需要进一步配置或确认
    NeedSetup,
}

impl AllocationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AllocationStatus::Ok => "ok",
            AllocationStatus::Error => "error",
            AllocationStatus::Void => "void",
            AllocationStatus::NeedSetup => "need_setup",
        }
    }
}

impl std::str::FromStr for AllocationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(AllocationStatus::Ok),
            "error" => Ok(AllocationStatus::Error),
            "void" => Ok(AllocationStatus::Void),
            "need_setup" => Ok(AllocationStatus::NeedSetup),
            _ => Err(format!("Invalid allocation status: {s}")),
        }
    }
}

/// 新建的一条分配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub struct AllocatedPair {
    pub assessment_id: i64,
    pub submission_id: i64,
    pub reviewer_id: i64,
}

/// 单个分配器的结构化结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub struct AllocationResult {
    pub allocator: String,
    pub status: AllocationStatus,
    pub message: Option<String>,
    pub log: Vec<String>,
    pub created: Vec<AllocatedPair>,
}

impl AllocationResult {
    pub fn new(allocator: &str, status: AllocationStatus) -> Self {
        Self {
            allocator: allocator.to_string(),
            status,
            message: None,
            log: vec![],
            created: vec![],
        }
    }

    pub fn void(allocator: &str) -> Self {
        Self::new(allocator, AllocationStatus::Void)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_void(&self) -> bool {
        self.status == AllocationStatus::Void
    }
}

/// 分配表中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub struct AllocationRow {
    pub assessment_id: i64,
    pub submission_id: i64,
    pub author_id: Option<i64>,
    pub reviewer_id: i64,
    pub weight: i32,
    pub grade: Option<f64>,
}

/// 随机分配按谁计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub enum NumPer {
    PerSubmission,
    PerReviewer,
}

/// 随机分配设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub struct RandomAllocationSettings {
    pub num_of_reviews: i32,
    pub num_per: NumPer,
    #[serde(default)]
    pub exclude_same_group: bool,
    #[serde(default)]
    pub remove_current: bool,
    #[serde(default)]
    pub assess_without_submission: bool,
    #[serde(default)]
    pub add_self_assessment: bool,
    // 固定随机种子，便于复现
    #[serde(default)]
    pub seed: Option<u64>,
}

/// 手动分配动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub enum ManualAction {
    Add {
        reviewer_id: i64,
        author_id: i64,
    },
    Delete {
        assessment_id: i64,
        #[serde(default)]
        confirm: bool,
    },
}

/// 定时分配设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub struct ScheduledAllocationSettings {
    pub enabled: bool,
    pub settings: RandomAllocationSettings,
}

/// 已保存的定时分配记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub struct AllocationSchedule {
    pub id: i64,
    pub workshop_id: i64,
    pub enabled: bool,
    pub settings: RandomAllocationSettings,
    pub time_allocated: Option<DateTime<Utc>>,
    pub result_status: Option<AllocationStatus>,
    pub result_message: Option<String>,
}
