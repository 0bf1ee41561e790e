use serde::Serialize;
use ts_rs::TS;

use super::entities::Workshop;
use crate::workflow::phase::{AdvanceOutcome, WorkshopOperation};

/// 工作坊详情
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/workshop.ts")]
pub struct WorkshopResponse {
    pub workshop: Workshop,
    // 当前阶段允许的操作
    pub permitted: Vec<WorkshopOperation>,
    // 本次读取前自动切换的结果
    pub advance: AdvanceOutcome,
}
