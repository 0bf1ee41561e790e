//! 评分表单维度实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workshop_criteria")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub workshop_id: i64,
    pub strategy: String,
    pub sort_order: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub max_grade: f64,
    pub weight: i32,
    // 量规等级，JSON 数组
    #[sea_orm(column_type = "Text", nullable)]
    pub levels: Option<String>,
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
    pub fn into_criterion(self) -> crate::models::grading::entities::Criterion {
        use crate::models::grading::entities::{Criterion, RubricLevel};

        let levels = self
            .levels
            .and_then(|raw| serde_json::from_str::<Vec<RubricLevel>>(&raw).ok())
            .unwrap_or_default();

        Criterion {
            id: self.id,
            sort_order: self.sort_order,
            description: self.description,
            max_grade: self.max_grade,
            weight: self.weight,
            levels,
        }
    }
}
