//! 提交实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workshop_submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub workshop_id: i64,
    pub author_id: Option<i64>,
    pub example: bool,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub published: bool,
    pub late: bool,
    pub grade: Option<f64>,
    pub grade_over: Option<f64>,
    pub grade_over_by: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback_author: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workshops::Entity",
        from = "Column::WorkshopId",
        to = "super::workshops::Column::Id"
    )]
    Workshop,
    #[sea_orm(has_many = "super::assessments::Entity")]
    Assessments,
}

impl Related<super::workshops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workshop.def()
    }
}

impl Related<super::assessments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assessments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_submission(self) -> crate::models::submissions::entities::Submission {
        use crate::models::submissions::entities::Submission;

        Submission {
            id: self.id,
            workshop_id: self.workshop_id,
            author_id: self.author_id,
            example: self.example,
            title: self.title,
            content: self.content,
            published: self.published,
            late: self.late,
            grade: self.grade,
            grade_over: self.grade_over,
            grade_over_by: self.grade_over_by,
            feedback_author: self.feedback_author,
            created_at: super::timestamp(self.created_at),
            modified_at: super::timestamp(self.modified_at),
        }
    }
}
