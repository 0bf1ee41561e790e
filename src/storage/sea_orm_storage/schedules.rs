//! 定时分配存储操作

use super::{SeaOrmStorage, db_err};
use crate::entity::allocation_schedules::{ActiveModel, Column, Entity as AllocationSchedules};
use crate::errors::{Result, WorkshopError};
use crate::models::allocation::entities::{
    AllocationSchedule, AllocationStatus, RandomAllocationSettings,
};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

fn into_schedule(model: crate::entity::allocation_schedules::Model) -> Result<AllocationSchedule> {
    let id = model.id;
    model
        .into_schedule()
        .ok_or_else(|| WorkshopError::serialization(format!("定时分配 {id} 的设置无法解析")))
}

impl SeaOrmStorage {
    pub async fn get_allocation_schedule_impl(
        &self,
        workshop_id: i64,
    ) -> Result<Option<AllocationSchedule>> {
        let result = AllocationSchedules::find()
            .filter(Column::WorkshopId.eq(workshop_id))
            .one(&self.db)
            .await
            .map_err(db_err("查询定时分配"))?;
        result.map(into_schedule).transpose()
    }

    /// 保存设置；修改设置会重置上次执行记录
    pub async fn save_allocation_schedule_impl(
        &self,
        workshop_id: i64,
        enabled: bool,
        settings: &RandomAllocationSettings,
    ) -> Result<AllocationSchedule> {
        let txn = self.begin().await?;
        let existing = AllocationSchedules::find()
            .filter(Column::WorkshopId.eq(workshop_id))
            .one(&txn)
            .await
            .map_err(db_err("查询定时分配"))?;

        let mut model = ActiveModel {
            workshop_id: Set(workshop_id),
            enabled: Set(enabled),
            settings: Set(serde_json::to_string(settings)?),
            time_allocated: Set(None),
            result_status: Set(None),
            result_message: Set(None),
            ..Default::default()
        };
        let saved = match existing {
            Some(current) => {
                model.id = Set(current.id);
                model.update(&txn).await.map_err(db_err("更新定时分配"))?
            }
            None => model.insert(&txn).await.map_err(db_err("创建定时分配"))?,
        };
        super::commit(txn).await?;

        into_schedule(saved)
    }

    /// 认领一次执行：只有 time_allocated 仍为空的调用者成功
    pub async fn claim_allocation_schedule_impl(&self, schedule_id: i64, now: i64) -> Result<bool> {
        let result = AllocationSchedules::update_many()
            .col_expr(Column::TimeAllocated, Expr::value(now))
            .filter(Column::Id.eq(schedule_id))
            .filter(Column::Enabled.eq(true))
            .filter(Column::TimeAllocated.is_null())
            .exec(&self.db)
            .await
            .map_err(db_err("认领定时分配"))?;
        Ok(result.rows_affected == 1)
    }

    pub async fn record_allocation_schedule_result_impl(
        &self,
        schedule_id: i64,
        status: AllocationStatus,
        message: Option<String>,
    ) -> Result<()> {
        ActiveModel {
            id: Set(schedule_id),
            result_status: Set(Some(status.as_str().to_string())),
            result_message: Set(message),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(db_err("记录定时分配结果"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::seed_workshop;
    use super::*;
    use crate::models::allocation::entities::NumPer;

    fn settings() -> RandomAllocationSettings {
        RandomAllocationSettings {
            num_of_reviews: 2,
            num_per: NumPer::PerSubmission,
            exclude_same_group: false,
            remove_current: false,
            assess_without_submission: false,
            add_self_assessment: false,
            seed: Some(7),
        }
    }

    #[tokio::test]
    async fn test_claim_only_once() {
        let (storage, workshop) = seed_workshop(&[1]).await;
        let schedule = storage
            .save_allocation_schedule_impl(workshop.id, true, &settings())
            .await
            .unwrap();

        assert!(storage.claim_allocation_schedule_impl(schedule.id, 100).await.unwrap());
        assert!(!storage.claim_allocation_schedule_impl(schedule.id, 200).await.unwrap());

        storage
            .record_allocation_schedule_result_impl(schedule.id, AllocationStatus::Ok, Some("done".into()))
            .await
            .unwrap();
        let stored = storage
            .get_allocation_schedule_impl(workshop.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.result_status, Some(AllocationStatus::Ok));
        assert!(stored.time_allocated.is_some());
        assert_eq!(stored.settings, settings());
    }

    #[tokio::test]
    async fn test_disabled_schedule_cannot_be_claimed() {
        let (storage, workshop) = seed_workshop(&[1]).await;
        let schedule = storage
            .save_allocation_schedule_impl(workshop.id, false, &settings())
            .await
            .unwrap();
        assert!(!storage.claim_allocation_schedule_impl(schedule.id, 100).await.unwrap());
    }
}
