use serde::Deserialize;
use std::collections::HashMap;
use ts_rs::TS;

/// 一次分配请求，按分配器 ID 提供各自的选项
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/allocation.ts")]
pub struct AllocationRequest {
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub options: HashMap<String, serde_json::Value>,
}

impl AllocationRequest {
    pub fn with_option(mut self, allocator: &str, value: serde_json::Value) -> Self {
        self.options.insert(allocator.to_string(), value);
        self
    }

    pub fn option(&self, allocator: &str) -> Option<&serde_json::Value> {
        self.options.get(allocator)
    }
}
