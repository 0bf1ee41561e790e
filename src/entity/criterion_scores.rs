//! 维度得分实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workshop_criterion_scores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assessment_id: i64,
    pub strategy: String,
    pub dimension_id: i64,
    pub grade: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub peer_comment: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assessments::Entity",
        from = "Column::AssessmentId",
        to = "super::assessments::Column::Id"
    )]
    Assessment,
}

impl Related<super::assessments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assessment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_criterion_score(self) -> crate::models::assessments::entities::CriterionScore {
        use crate::models::assessments::entities::CriterionScore;

        CriterionScore {
            id: self.id,
            assessment_id: self.assessment_id,
            strategy: self.strategy,
            dimension_id: self.dimension_id,
            grade: self.grade,
            peer_comment: self.peer_comment,
        }
    }
}
