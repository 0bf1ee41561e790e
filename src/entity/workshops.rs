//! 工作坊实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workshops")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub phase: i32,
    pub assessment_type: i32,
    pub use_self_assessment: bool,
    pub allow_submission: bool,
    pub assess_without_submission: bool,
    pub assess_as_soon_submitted: bool,
    pub use_examples: bool,
    pub examples_mode: i32,
    pub grade: f64,
    pub grading_grade: f64,
    pub grade_decimals: i32,
    pub strategy: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub strategy_settings: Option<String>,
    pub evaluation: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub evaluation_settings: Option<String>,
    pub submission_start: i64,
    pub submission_end: i64,
    pub assessment_start: i64,
    pub assessment_end: i64,
    pub phase_switch_assessment: bool,
    pub late_submissions: bool,
    pub group_mode: i32,
    pub submission_grade_pass: Option<f64>,
    pub grading_grade_pass: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::participants::Entity")]
    Participants,
    #[sea_orm(has_many = "super::submissions::Entity")]
    Submissions,
    #[sea_orm(has_many = "super::criteria::Entity")]
    Criteria,
}

impl Related<super::participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::criteria::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Criteria.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_workshop(self) -> crate::models::workshops::entities::Workshop {
        use crate::models::workshops::entities::{AssessmentType, ExamplesMode, GroupMode, Workshop};
        use crate::workflow::phase::Phase;

        Workshop {
            id: self.id,
            course_id: self.course_id,
            name: self.name,
            phase: Phase::from_code(self.phase).unwrap_or(Phase::Setup),
            assessment_type: AssessmentType::from_code(self.assessment_type)
                .unwrap_or(AssessmentType::Peer),
            use_self_assessment: self.use_self_assessment,
            allow_submission: self.allow_submission,
            assess_without_submission: self.assess_without_submission,
            assess_as_soon_submitted: self.assess_as_soon_submitted,
            use_examples: self.use_examples,
            examples_mode: ExamplesMode::from_code(self.examples_mode)
                .unwrap_or(ExamplesMode::Voluntary),
            grade: self.grade,
            grading_grade: self.grading_grade,
            grade_decimals: self.grade_decimals,
            strategy: self.strategy,
            strategy_settings: super::json_column(self.strategy_settings),
            evaluation: self.evaluation,
            evaluation_settings: super::json_column(self.evaluation_settings),
            submission_start: super::optional_timestamp(self.submission_start),
            submission_end: super::optional_timestamp(self.submission_end),
            assessment_start: super::optional_timestamp(self.assessment_start),
            assessment_end: super::optional_timestamp(self.assessment_end),
            phase_switch_assessment: self.phase_switch_assessment,
            late_submissions: self.late_submissions,
            group_mode: GroupMode::from_code(self.group_mode).unwrap_or(GroupMode::NoGroups),
            submission_grade_pass: self.submission_grade_pass,
            grading_grade_pass: self.grading_grade_pass,
            created_at: super::timestamp(self.created_at),
            updated_at: super::timestamp(self.updated_at),
        }
    }
}
