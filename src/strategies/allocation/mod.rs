//! 分配策略
//!
//! 分配器把评审者与提交配对，结果以结构化的 `AllocationResult` 返回，
//! 只有存储故障才会以错误返回。

pub mod manual;
pub mod random;
pub mod scheduled;

use crate::errors::Result;
use crate::models::allocation::entities::AllocationResult;
use crate::models::workshops::entities::Workshop;
use crate::storage::Storage;

pub use manual::ManualAllocator;
pub use random::RandomAllocator;
pub use scheduled::ScheduledAllocator;

#[async_trait::async_trait]
pub trait Allocator: Send + Sync {
    /// 分配器 ID
    fn id(&self) -> &'static str;

    /// 处理本分配器的选项，没有选项时返回 `Void`
    async fn init(
        &self,
        storage: &dyn Storage,
        workshop: &Workshop,
        options: Option<&serde_json::Value>,
    ) -> Result<AllocationResult>;
}

/// 解析分配器选项，失败时给出 `Error` 结果
pub(crate) fn parse_options<T: serde::de::DeserializeOwned>(
    allocator: &str,
    options: &serde_json::Value,
) -> std::result::Result<T, AllocationResult> {
    serde_json::from_value(options.clone()).map_err(|e| {
        AllocationResult::new(
            allocator,
            crate::models::allocation::entities::AllocationStatus::Error,
        )
        .with_message(format!("Invalid options: {e}"))
    })
}
