use serde::Deserialize;
use ts_rs::TS;

use super::entities::ParticipantRole;

/// 单个参与者的同步数据
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/participant.ts")]
pub struct ParticipantInput {
    pub user_id: i64,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub group_id: Option<i64>,
    pub role: ParticipantRole,
}

/// LMS 推送的参与者名单，整体替换
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/participant.ts")]
pub struct SyncParticipantsRequest {
    pub participants: Vec<ParticipantInput>,
}
