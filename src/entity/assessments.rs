//! 评审实体，grade 为空的行即一条分配

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workshop_assessments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submission_id: i64,
    pub reviewer_id: i64,
    pub weight: i32,
    pub grade: Option<f64>,
    pub grading_grade: Option<f64>,
    pub grading_grade_over: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback_author: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback_reviewer: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submissions::Entity",
        from = "Column::SubmissionId",
        to = "super::submissions::Column::Id"
    )]
    Submission,
    #[sea_orm(has_many = "super::criterion_scores::Entity")]
    CriterionScores,
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl Related<super::criterion_scores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CriterionScores.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_assessment(self) -> crate::models::assessments::entities::Assessment {
        use crate::models::assessments::entities::Assessment;

        Assessment {
            id: self.id,
            submission_id: self.submission_id,
            reviewer_id: self.reviewer_id,
            weight: self.weight,
            grade: self.grade,
            grading_grade: self.grading_grade,
            grading_grade_over: self.grading_grade_over,
            feedback_author: self.feedback_author,
            feedback_reviewer: self.feedback_reviewer,
            created_at: super::timestamp(self.created_at),
            modified_at: super::timestamp(self.modified_at),
        }
    }
}
