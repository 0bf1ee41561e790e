//! 核心业务操作
//!
//! 每个操作显式接收 `RequestContext`，不依赖 HTTP 类型；能力判定由路由层完成，
//! 这里只做阶段准入与业务规则。

pub mod allocation;
pub mod assessments;
pub mod evaluation;
pub mod grading_form;
pub mod grading_report;
pub mod participants;
pub mod submissions;
pub mod user_plan;
pub mod workshops;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::WorkshopDefaults;
use crate::errors::{Result, WorkshopError};
use crate::events::{EventBus, WorkshopEvent};
use crate::models::{
    allocation::{requests::AllocationRequest, responses::AllocationPage},
    assessments::{
        entities::{Assessment, FieldError},
        requests::{OverrideGradingGradeRequest, SaveAssessmentRequest},
        responses::SaveAssessmentOutcome,
    },
    context::RequestContext,
    evaluation::{
        requests::ToolboxAction,
        responses::{AggregationSummary, ClearSummary},
    },
    grading::{entities::GradingForm, requests::UpdateGradingFormRequest, responses::GradingFormResponse},
    participants::{entities::Participant, requests::SyncParticipantsRequest},
    plan::responses::UserPlan,
    report::{requests::GradingReportQuery, responses::GradingReport},
    submissions::{
        entities::Submission,
        requests::{CreateSubmissionRequest, OverrideSubmissionGradeRequest},
    },
    wizard::responses::{AssessmentTypeStepResponse, WizardNavigationPage},
    workshops::{
        entities::{AssessmentType, Workshop},
        requests::{CreateWorkshopRequest, UpdateWorkshopSettingsRequest},
        responses::WorkshopResponse,
    },
};
use crate::storage::Storage;
use crate::strategies::grading::GradingStrategy;
use crate::strategies::registry;
use crate::workflow::phase::{AdvanceOutcome, Phase, WorkshopOperation};

pub struct WorkshopService {
    storage: Arc<dyn Storage>,
    events: EventBus,
    defaults: WorkshopDefaults,
}

/// 阶段准入检查
pub(crate) fn ensure_permitted(workshop: &Workshop, op: WorkshopOperation) -> Result<()> {
    if workshop.permits(op) {
        Ok(())
    } else {
        Err(WorkshopError::phase_violation(format!(
            "操作 {op:?} 在 {} 阶段不可用",
            workshop.phase
        )))
    }
}

/// 逐字段错误合并为一个校验错误
pub(crate) fn validation_error(errors: &[FieldError]) -> WorkshopError {
    let message = errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");
    WorkshopError::validation(message)
}

impl WorkshopService {
    pub fn new(storage: Arc<dyn Storage>, events: EventBus, defaults: WorkshopDefaults) -> Self {
        Self {
            storage,
            events,
            defaults,
        }
    }

    pub(crate) fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub(crate) fn defaults(&self) -> &WorkshopDefaults {
        &self.defaults
    }

    pub(crate) fn publish(&self, event: WorkshopEvent) {
        self.events.publish(event);
    }

    pub(crate) async fn load_workshop(&self, workshop_id: i64) -> Result<Workshop> {
        self.storage
            .get_workshop(workshop_id)
            .await?
            .ok_or_else(|| WorkshopError::not_found(format!("工作坊 {workshop_id} 不存在")))
    }

    /// 先执行到期推进再读取工作坊，受阶段约束的操作都从这里取得工作坊
    pub(crate) async fn current_workshop(&self, workshop_id: i64, now: DateTime<Utc>) -> Result<Workshop> {
        self.advance_if_due(workshop_id, now).await?;
        self.load_workshop(workshop_id).await
    }

    pub(crate) async fn load_submission(&self, submission_id: i64) -> Result<Submission> {
        self.storage
            .get_submission(submission_id)
            .await?
            .ok_or_else(|| WorkshopError::not_found(format!("提交 {submission_id} 不存在")))
    }

    pub(crate) async fn load_assessment(&self, assessment_id: i64) -> Result<Assessment> {
        self.storage
            .get_assessment(assessment_id)
            .await?
            .ok_or_else(|| WorkshopError::not_found(format!("评审 {assessment_id} 不存在")))
    }

    /// 当前评分策略的表单
    pub(crate) async fn grading_form(&self, workshop: &Workshop) -> Result<GradingForm> {
        let criteria = self
            .storage
            .list_criteria(workshop.id, &workshop.strategy)
            .await?;
        Ok(GradingForm {
            strategy: workshop.strategy.clone(),
            criteria,
            settings: workshop.strategy_settings.clone(),
        })
    }

    pub(crate) async fn grading_strategy(&self, workshop: &Workshop) -> Result<Box<dyn GradingStrategy>> {
        let form = self.grading_form(workshop).await?;
        registry::get_grading_strategy(&workshop.strategy, form).ok_or_else(|| {
            WorkshopError::strategy_not_found(format!("评分策略 {} 未注册", workshop.strategy))
        })
    }

    // 工作坊与阶段
    pub async fn create_workshop(
        &self,
        ctx: &RequestContext,
        req: CreateWorkshopRequest,
    ) -> Result<Workshop> {
        workshops::create_workshop(self, ctx, req).await
    }

    pub async fn get_workshop(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        now: DateTime<Utc>,
    ) -> Result<WorkshopResponse> {
        workshops::get_workshop(self, ctx, workshop_id, now).await
    }

    pub async fn update_settings(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        req: UpdateWorkshopSettingsRequest,
    ) -> Result<Workshop> {
        workshops::update_settings(self, ctx, workshop_id, req).await
    }

    pub async fn switch_phase(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        target: Phase,
    ) -> Result<Workshop> {
        workshops::phase::switch_phase(self, ctx, workshop_id, target).await
    }

    pub async fn advance_if_due(&self, workshop_id: i64, now: DateTime<Utc>) -> Result<AdvanceOutcome> {
        workshops::phase::advance_if_due(self, workshop_id, now).await
    }

    pub async fn wizard_page(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
    ) -> Result<WizardNavigationPage> {
        workshops::wizard::wizard_page(self, ctx, workshop_id).await
    }

    pub async fn save_assessment_type(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        assessment_type: AssessmentType,
    ) -> Result<AssessmentTypeStepResponse> {
        workshops::wizard::save_assessment_type(self, ctx, workshop_id, assessment_type).await
    }

    // 参与者
    pub async fn sync_participants(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        req: SyncParticipantsRequest,
    ) -> Result<Vec<Participant>> {
        participants::sync_participants(self, ctx, workshop_id, req).await
    }

    // 提交
    pub async fn save_submission(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        req: CreateSubmissionRequest,
        now: DateTime<Utc>,
    ) -> Result<Submission> {
        submissions::save_submission(self, ctx, workshop_id, req, now).await
    }

    pub async fn create_example(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        req: CreateSubmissionRequest,
    ) -> Result<Submission> {
        submissions::create_example(self, ctx, workshop_id, req).await
    }

    pub async fn override_submission_grade(
        &self,
        ctx: &RequestContext,
        submission_id: i64,
        req: OverrideSubmissionGradeRequest,
    ) -> Result<Submission> {
        submissions::override_submission_grade(self, ctx, submission_id, req).await
    }

    pub async fn set_submission_published(
        &self,
        ctx: &RequestContext,
        submission_id: i64,
        published: bool,
    ) -> Result<Submission> {
        submissions::set_submission_published(self, ctx, submission_id, published).await
    }

    // 评分表单
    pub async fn get_grading_form(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
    ) -> Result<GradingFormResponse> {
        grading_form::get_grading_form(self, ctx, workshop_id).await
    }

    pub async fn update_grading_form(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        req: UpdateGradingFormRequest,
    ) -> Result<GradingFormResponse> {
        grading_form::update_grading_form(self, ctx, workshop_id, req).await
    }

    // 评审
    pub async fn save_assessment(
        &self,
        ctx: &RequestContext,
        assessment_id: i64,
        req: SaveAssessmentRequest,
    ) -> Result<SaveAssessmentOutcome> {
        assessments::save_assessment(self, ctx, assessment_id, req).await
    }

    pub async fn override_grading_grade(
        &self,
        ctx: &RequestContext,
        assessment_id: i64,
        req: OverrideGradingGradeRequest,
    ) -> Result<Assessment> {
        assessments::override_grading_grade(self, ctx, assessment_id, req).await
    }

    // 分配
    pub async fn run_allocation_pass(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        req: AllocationRequest,
    ) -> Result<AllocationPage> {
        allocation::run_allocation_pass(self, ctx, workshop_id, req).await
    }

    // 评价
    pub async fn aggregate(&self, ctx: &RequestContext, workshop_id: i64) -> Result<AggregationSummary> {
        evaluation::aggregate(self, ctx, workshop_id).await
    }

    pub async fn set_evaluation_method(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        method: &str,
    ) -> Result<Workshop> {
        evaluation::set_evaluation_method(self, ctx, workshop_id, method).await
    }

    pub async fn update_evaluation_settings(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        settings: serde_json::Value,
    ) -> Result<Workshop> {
        evaluation::update_evaluation_settings(self, ctx, workshop_id, settings).await
    }

    pub async fn run_toolbox_action(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        action: ToolboxAction,
        confirm: Option<&str>,
    ) -> Result<ClearSummary> {
        evaluation::run_toolbox_action(self, ctx, workshop_id, action, confirm).await
    }

    // 只读视图，读取前先执行到期推进
    pub async fn user_plan(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
    ) -> Result<UserPlan> {
        user_plan::user_plan(self, ctx, workshop_id).await
    }

    pub async fn grading_report(
        &self,
        ctx: &RequestContext,
        workshop_id: i64,
        query: GradingReportQuery,
    ) -> Result<GradingReport> {
        grading_report::grading_report(self, ctx, workshop_id, query).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::context::Capability;
    use crate::storage::sea_orm_storage::tests::seed_workshop;

    pub(crate) fn service(storage: crate::storage::sea_orm_storage::SeaOrmStorage) -> WorkshopService {
        WorkshopService::new(Arc::new(storage), EventBus::new(16), WorkshopDefaults::default())
    }

    pub(crate) fn teacher() -> RequestContext {
        RequestContext::new(
            100,
            [
                Capability::ManageActivity,
                Capability::ManageExamples,
                Capability::Allocate,
                Capability::OverrideGrades,
                Capability::ViewAllSubmissions,
                Capability::ViewAllAssessments,
                Capability::ViewReviewerNames,
                Capability::AccessAllGroups,
            ],
        )
    }

    pub(crate) fn student(user_id: i64) -> RequestContext {
        RequestContext::new(user_id, [Capability::Submit, Capability::PeerAssess])
    }

    /// 提交阶段的工作坊与服务
    pub(crate) async fn seeded(students: &[i64]) -> (WorkshopService, Workshop) {
        let (storage, workshop) = seed_workshop(students).await;
        (service(storage), workshop)
    }

    pub(crate) async fn submit_all(service: &WorkshopService, workshop: &Workshop, authors: &[i64]) -> Vec<Submission> {
        let mut submissions = vec![];
        for author in authors {
            let submission = service
                .storage()
                .create_submission(crate::storage::NewSubmission {
                    workshop_id: workshop.id,
                    author_id: Some(*author),
                    example: false,
                    title: format!("Essay by {author}"),
                    content: "Lorem ipsum".to_string(),
                    late: false,
                })
                .await
                .unwrap();
            submissions.push(submission);
        }
        submissions
    }

    #[tokio::test]
    async fn test_missing_workshop_is_not_found() {
        let (service, _) = seeded(&[]).await;
        let result = service.load_workshop(999).await;
        assert!(matches!(result, Err(WorkshopError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_ensure_permitted_reports_phase() {
        let (_, workshop) = seeded(&[]).await;
        assert!(ensure_permitted(&workshop, WorkshopOperation::CreateSubmission).is_ok());
        let err = ensure_permitted(&workshop, WorkshopOperation::AggregateGrades).unwrap_err();
        assert!(matches!(err, WorkshopError::PhaseViolation(_)));
        assert!(err.message().contains("submission"));
    }
}
