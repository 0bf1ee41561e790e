use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建工作坊表
        manager
            .create_table(
                Table::create()
                    .table(Workshops::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Workshops::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Workshops::CourseId).big_integer().not_null())
                    .col(ColumnDef::new(Workshops::Name).string().not_null())
                    .col(ColumnDef::new(Workshops::Phase).integer().not_null())
                    .col(
                        ColumnDef::new(Workshops::AssessmentType)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Workshops::UseSelfAssessment)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Workshops::AllowSubmission)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Workshops::AssessWithoutSubmission)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Workshops::AssessAsSoonSubmitted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Workshops::UseExamples)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Workshops::ExamplesMode)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Workshops::Grade).double().not_null())
                    .col(ColumnDef::new(Workshops::GradingGrade).double().not_null())
                    .col(
                        ColumnDef::new(Workshops::GradeDecimals)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Workshops::Strategy).string().not_null())
                    .col(ColumnDef::new(Workshops::StrategySettings).text().null())
                    .col(ColumnDef::new(Workshops::Evaluation).string().not_null())
                    .col(ColumnDef::new(Workshops::EvaluationSettings).text().null())
                    .col(
                        ColumnDef::new(Workshops::SubmissionStart)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Workshops::SubmissionEnd)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Workshops::AssessmentStart)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Workshops::AssessmentEnd)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Workshops::PhaseSwitchAssessment)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Workshops::LateSubmissions)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Workshops::GroupMode)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Workshops::SubmissionGradePass).double().null())
                    .col(ColumnDef::new(Workshops::GradingGradePass).double().null())
                    .col(ColumnDef::new(Workshops::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Workshops::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建参与者表
        manager
            .create_table(
                Table::create()
                    .table(WorkshopParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkshopParticipants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WorkshopParticipants::WorkshopId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopParticipants::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopParticipants::Username)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopParticipants::Firstname)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopParticipants::Lastname)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopParticipants::GroupId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(WorkshopParticipants::Role).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(WorkshopParticipants::Table, WorkshopParticipants::WorkshopId)
                            .to(Workshops::Table, Workshops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建提交表（示例提交的 author_id 为空）
        manager
            .create_table(
                Table::create()
                    .table(WorkshopSubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkshopSubmissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WorkshopSubmissions::WorkshopId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopSubmissions::AuthorId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopSubmissions::Example)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(WorkshopSubmissions::Title).string().not_null())
                    .col(ColumnDef::new(WorkshopSubmissions::Content).text().not_null())
                    .col(
                        ColumnDef::new(WorkshopSubmissions::Published)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(WorkshopSubmissions::Late)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(WorkshopSubmissions::Grade).double().null())
                    .col(ColumnDef::new(WorkshopSubmissions::GradeOver).double().null())
                    .col(
                        ColumnDef::new(WorkshopSubmissions::GradeOverBy)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopSubmissions::FeedbackAuthor)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopSubmissions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopSubmissions::ModifiedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(WorkshopSubmissions::Table, WorkshopSubmissions::WorkshopId)
                            .to(Workshops::Table, Workshops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评审表（同时也是分配表，grade 为空表示已分配未评分）
        manager
            .create_table(
                Table::create()
                    .table(WorkshopAssessments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkshopAssessments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAssessments::SubmissionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAssessments::ReviewerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAssessments::Weight)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(WorkshopAssessments::Grade).double().null())
                    .col(
                        ColumnDef::new(WorkshopAssessments::GradingGrade)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAssessments::GradingGradeOver)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAssessments::FeedbackAuthor)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAssessments::FeedbackReviewer)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAssessments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAssessments::ModifiedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(WorkshopAssessments::Table, WorkshopAssessments::SubmissionId)
                            .to(WorkshopSubmissions::Table, WorkshopSubmissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评分维度得分表
        manager
            .create_table(
                Table::create()
                    .table(WorkshopCriterionScores::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkshopCriterionScores::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WorkshopCriterionScores::AssessmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopCriterionScores::Strategy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopCriterionScores::DimensionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopCriterionScores::Grade)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopCriterionScores::PeerComment)
                            .text()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                WorkshopCriterionScores::Table,
                                WorkshopCriterionScores::AssessmentId,
                            )
                            .to(WorkshopAssessments::Table, WorkshopAssessments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评分表单维度表
        manager
            .create_table(
                Table::create()
                    .table(WorkshopCriteria::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkshopCriteria::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WorkshopCriteria::WorkshopId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WorkshopCriteria::Strategy).string().not_null())
                    .col(
                        ColumnDef::new(WorkshopCriteria::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(WorkshopCriteria::Description).text().not_null())
                    .col(
                        ColumnDef::new(WorkshopCriteria::MaxGrade)
                            .double()
                            .not_null()
                            .default(10.0),
                    )
                    .col(
                        ColumnDef::new(WorkshopCriteria::Weight)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(WorkshopCriteria::Levels).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(WorkshopCriteria::Table, WorkshopCriteria::WorkshopId)
                            .to(Workshops::Table, Workshops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评审成绩汇总表
        manager
            .create_table(
                Table::create()
                    .table(WorkshopAggregations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkshopAggregations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAggregations::WorkshopId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAggregations::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAggregations::GradingGrade)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAggregations::TimeGraded)
                            .big_integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(WorkshopAggregations::Table, WorkshopAggregations::WorkshopId)
                            .to(Workshops::Table, Workshops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建定时分配配置表
        manager
            .create_table(
                Table::create()
                    .table(WorkshopAllocationSchedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkshopAllocationSchedules::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAllocationSchedules::WorkshopId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAllocationSchedules::Enabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(WorkshopAllocationSchedules::Settings)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAllocationSchedules::TimeAllocated)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAllocationSchedules::ResultStatus)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkshopAllocationSchedules::ResultMessage)
                            .text()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                WorkshopAllocationSchedules::Table,
                                WorkshopAllocationSchedules::WorkshopId,
                            )
                            .to(Workshops::Table, Workshops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建索引以提高查询性能
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_workshops_phase")
                    .table(Workshops::Table)
                    .col(Workshops::Phase)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_participants_workshop_user")
                    .table(WorkshopParticipants::Table)
                    .col(WorkshopParticipants::WorkshopId)
                    .col(WorkshopParticipants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 每位作者在一个工作坊中至多一份正式提交，示例提交的 author_id 为空不受限制
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_workshop_author")
                    .table(WorkshopSubmissions::Table)
                    .col(WorkshopSubmissions::WorkshopId)
                    .col(WorkshopSubmissions::AuthorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // (submission, reviewer) 唯一，分配的并发创建以此兜底
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assessments_submission_reviewer")
                    .table(WorkshopAssessments::Table)
                    .col(WorkshopAssessments::SubmissionId)
                    .col(WorkshopAssessments::ReviewerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assessments_reviewer_id")
                    .table(WorkshopAssessments::Table)
                    .col(WorkshopAssessments::ReviewerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_criterion_scores_assessment_dimension")
                    .table(WorkshopCriterionScores::Table)
                    .col(WorkshopCriterionScores::AssessmentId)
                    .col(WorkshopCriterionScores::Strategy)
                    .col(WorkshopCriterionScores::DimensionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_criteria_workshop_strategy")
                    .table(WorkshopCriteria::Table)
                    .col(WorkshopCriteria::WorkshopId)
                    .col(WorkshopCriteria::Strategy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_aggregations_workshop_user")
                    .table(WorkshopAggregations::Table)
                    .col(WorkshopAggregations::WorkshopId)
                    .col(WorkshopAggregations::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(
                Table::drop()
                    .table(WorkshopAllocationSchedules::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(WorkshopAggregations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkshopCriteria::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(WorkshopCriterionScores::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(WorkshopAssessments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkshopSubmissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkshopParticipants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Workshops::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Workshops {
    #[sea_orm(iden = "workshops")]
    Table,
    Id,
    CourseId,
    Name,
    Phase,
    AssessmentType,
    UseSelfAssessment,
    AllowSubmission,
    AssessWithoutSubmission,
    AssessAsSoonSubmitted,
    UseExamples,
    ExamplesMode,
    Grade,
    GradingGrade,
    GradeDecimals,
    Strategy,
    StrategySettings,
    Evaluation,
    EvaluationSettings,
    SubmissionStart,
    SubmissionEnd,
    AssessmentStart,
    AssessmentEnd,
    PhaseSwitchAssessment,
    LateSubmissions,
    GroupMode,
    SubmissionGradePass,
    GradingGradePass,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WorkshopParticipants {
    #[sea_orm(iden = "workshop_participants")]
    Table,
    Id,
    WorkshopId,
    UserId,
    Username,
    Firstname,
    Lastname,
    GroupId,
    Role,
}

#[derive(DeriveIden)]
enum WorkshopSubmissions {
    #[sea_orm(iden = "workshop_submissions")]
    Table,
    Id,
    WorkshopId,
    AuthorId,
    Example,
    Title,
    Content,
    Published,
    Late,
    Grade,
    GradeOver,
    GradeOverBy,
    FeedbackAuthor,
    CreatedAt,
    ModifiedAt,
}

#[derive(DeriveIden)]
enum WorkshopAssessments {
    #[sea_orm(iden = "workshop_assessments")]
    Table,
    Id,
    SubmissionId,
    ReviewerId,
    Weight,
    Grade,
    GradingGrade,
    GradingGradeOver,
    FeedbackAuthor,
    FeedbackReviewer,
    CreatedAt,
    ModifiedAt,
}

#[derive(DeriveIden)]
enum WorkshopCriterionScores {
    #[sea_orm(iden = "workshop_criterion_scores")]
    Table,
    Id,
    AssessmentId,
    Strategy,
    DimensionId,
    Grade,
    PeerComment,
}

#[derive(DeriveIden)]
enum WorkshopCriteria {
    #[sea_orm(iden = "workshop_criteria")]
    Table,
    Id,
    WorkshopId,
    Strategy,
    SortOrder,
    Description,
    MaxGrade,
    Weight,
    Levels,
}

#[derive(DeriveIden)]
enum WorkshopAggregations {
    #[sea_orm(iden = "workshop_aggregations")]
    Table,
    Id,
    WorkshopId,
    UserId,
    GradingGrade,
    TimeGraded,
}

#[derive(DeriveIden)]
enum WorkshopAllocationSchedules {
    #[sea_orm(iden = "workshop_allocation_schedules")]
    Table,
    Id,
    WorkshopId,
    Enabled,
    Settings,
    TimeAllocated,
    ResultStatus,
    ResultMessage,
}
