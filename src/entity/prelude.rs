//! 预导入模块，方便使用

pub use super::aggregations::{
    ActiveModel as AggregationActiveModel, Entity as Aggregations, Model as AggregationModel,
};
pub use super::allocation_schedules::{
    ActiveModel as AllocationScheduleActiveModel, Entity as AllocationSchedules,
    Model as AllocationScheduleModel,
};
pub use super::assessments::{
    ActiveModel as AssessmentActiveModel, Entity as Assessments, Model as AssessmentModel,
};
pub use super::criteria::{
    ActiveModel as CriterionActiveModel, Entity as Criteria, Model as CriterionModel,
};
pub use super::criterion_scores::{
    ActiveModel as CriterionScoreActiveModel, Entity as CriterionScores,
    Model as CriterionScoreModel,
};
pub use super::participants::{
    ActiveModel as ParticipantActiveModel, Entity as Participants, Model as ParticipantModel,
};
pub use super::submissions::{
    ActiveModel as SubmissionActiveModel, Entity as Submissions, Model as SubmissionModel,
};
pub use super::workshops::{
    ActiveModel as WorkshopActiveModel, Entity as Workshops, Model as WorkshopModel,
};
