//! 定时分配实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workshop_allocation_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub workshop_id: i64,
    pub enabled: bool,
    #[sea_orm(column_type = "Text")]
    pub settings: String,
    pub time_allocated: Option<i64>,
    pub result_status: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub result_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workshops::Entity",
        from = "Column::WorkshopId",
        to = "super::workshops::Column::Id"
    )]
    Workshop,
}

impl Related<super::workshops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workshop.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 设置无法解析时返回 None
    pub fn into_schedule(self) -> Option<crate::models::allocation::entities::AllocationSchedule> {
        use crate::models::allocation::entities::{AllocationSchedule, AllocationStatus};

        let settings = serde_json::from_str(&self.settings).ok()?;
        Some(AllocationSchedule {
            id: self.id,
            workshop_id: self.workshop_id,
            enabled: self.enabled,
            settings,
            time_allocated: self.time_allocated.map(super::timestamp),
            result_status: self
                .result_status
                .and_then(|s| s.parse::<AllocationStatus>().ok()),
            result_message: self.result_message,
        })
    }
}
