//! 定时分配
//!
//! 保存一份随机分配设置，提交截止后仍处于提交阶段时执行一次。

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{Allocator, RandomAllocator, parse_options};
use crate::errors::Result;
use crate::models::allocation::entities::{
    AllocationResult, AllocationStatus, ScheduledAllocationSettings,
};
use crate::models::workshops::entities::Workshop;
use crate::storage::Storage;
use crate::workflow::phase::Phase;

pub struct ScheduledAllocator;

impl ScheduledAllocator {
    pub const ID: &'static str = "scheduled";

    /// 到期则执行一次，已执行过或未到期时返回 None
    pub async fn execute_due(
        storage: &dyn Storage,
        workshop: &Workshop,
        now: DateTime<Utc>,
    ) -> Result<Option<AllocationResult>> {
        let Some(schedule) = storage.get_allocation_schedule(workshop.id).await? else {
            return Ok(None);
        };
        if !schedule.enabled || schedule.time_allocated.is_some() {
            return Ok(None);
        }
        let due = workshop.phase == Phase::Submission
            && workshop.submission_end.is_some_and(|end| end < now);
        if !due {
            return Ok(None);
        }

        // 并发调用只有一个能抢到
        if !storage
            .claim_allocation_schedule(schedule.id, now.timestamp())
            .await?
        {
            return Ok(None);
        }

        let result =
            RandomAllocator::allocate(storage, workshop, &schedule.settings, Self::ID).await?;
        storage
            .record_allocation_schedule_result(schedule.id, result.status, result.message.clone())
            .await?;

        if result.status == AllocationStatus::Ok {
            info!(
                "Scheduled allocation executed for workshop {}: {} allocation(s)",
                workshop.id,
                result.created.len()
            );
        } else {
            warn!(
                "Scheduled allocation for workshop {} finished with status {}: {:?}",
                workshop.id,
                result.status.as_str(),
                result.message
            );
        }
        Ok(Some(result))
    }
}

#[async_trait::async_trait]
impl Allocator for ScheduledAllocator {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn init(
        &self,
        storage: &dyn Storage,
        workshop: &Workshop,
        options: Option<&serde_json::Value>,
    ) -> Result<AllocationResult> {
        let Some(options) = options else {
            return Ok(AllocationResult::void(Self::ID));
        };
        let scheduled = match parse_options::<ScheduledAllocationSettings>(Self::ID, options) {
            Ok(settings) => settings,
            Err(result) => return Ok(result),
        };
        if scheduled.settings.num_of_reviews < 1 {
            return Ok(AllocationResult::new(Self::ID, AllocationStatus::Error)
                .with_message("Number of reviews must be at least 1"));
        }

        storage
            .save_allocation_schedule(workshop.id, scheduled.enabled, &scheduled.settings)
            .await?;

        if !scheduled.enabled {
            return Ok(AllocationResult::new(Self::ID, AllocationStatus::Ok)
                .with_message("Scheduled allocation disabled"));
        }
        if workshop.submission_end.is_none() {
            return Ok(AllocationResult::new(Self::ID, AllocationStatus::NeedSetup)
                .with_message("Scheduled allocation needs a submissions deadline"));
        }
        Ok(AllocationResult::new(Self::ID, AllocationStatus::Ok)
            .with_message("Scheduled allocation enabled"))
    }
}
