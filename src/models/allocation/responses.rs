use serde::Serialize;
use ts_rs::TS;

use super::entities::{AllocationResult, AllocationRow};

/// 手动分配器的展示内容
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub enum ManualView {
    /// 手动分配器无动作时展示当前分配表
    Table { rows: Vec<AllocationRow> },
    /// 手动分配器执行了动作
    Result { result: AllocationResult },
}

/// 一次分配流程的页面数据
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub struct AllocationPage {
    // 其他分配器的非空结果
    pub other_results: Vec<AllocationResult>,
    pub manual: ManualView,
    // 第一个既非 void 也非 ok 的其他分配器消息，优先展示
    pub priority_message: Option<String>,
}
