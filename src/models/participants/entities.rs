use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 参与者在活动中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/participant.ts")]
pub enum ParticipantRole {
    Student, // 学生
    Manager, // 教师或管理者
}

impl ParticipantRole {
    pub const STUDENT: &'static str = "student";
    pub const MANAGER: &'static str = "manager";
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticipantRole::Student => write!(f, "{}", Self::STUDENT),
            ParticipantRole::Manager => write!(f, "{}", Self::MANAGER),
        }
    }
}

impl std::str::FromStr for ParticipantRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::STUDENT => Ok(ParticipantRole::Student),
            Self::MANAGER => Ok(ParticipantRole::Manager),
            _ => Err(format!("Invalid participant role: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/participant.ts")]
pub struct Participant {
    pub id: i64,
    pub workshop_id: i64,
    pub user_id: i64,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    // 所在分组，未分组为空
    pub group_id: Option<i64>,
    pub role: ParticipantRole,
}
