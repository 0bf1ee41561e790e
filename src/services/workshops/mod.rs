//! 工作坊创建、读取与设置

pub mod phase;
pub mod wizard;

use chrono::{DateTime, Utc};
use tracing::info;

use super::{WorkshopService, validation_error};
use crate::entity::optional_timestamp;
use crate::errors::{Result, WorkshopError};
use crate::models::context::RequestContext;
use crate::models::workshops::{
    entities::{AssessmentType, ExamplesMode, GroupMode, Workshop},
    requests::{CreateWorkshopRequest, UpdateWorkshopSettingsRequest},
    responses::WorkshopResponse,
};
use crate::strategies::registry;
use crate::utils::validate::validate_workshop_settings;
use crate::workflow::phase::{Phase, WorkshopOperation};

fn ensure_strategy(strategy: &str) -> Result<()> {
    if registry::has_grading_strategy(strategy) {
        Ok(())
    } else {
        Err(WorkshopError::configuration(format!("未知的评分策略: {strategy}")))
    }
}

fn ensure_evaluator(evaluation: &str) -> Result<()> {
    if registry::has_evaluator(evaluation) {
        Ok(())
    } else {
        Err(WorkshopError::configuration(format!("未知的评价策略: {evaluation}")))
    }
}

/// 以站点默认值创建，初始阶段为 SETUP
pub async fn create_workshop(
    service: &WorkshopService,
    ctx: &RequestContext,
    req: CreateWorkshopRequest,
) -> Result<Workshop> {
    let defaults = service.defaults();
    let assessment_type = req.assessment_type.unwrap_or(AssessmentType::Peer);
    let strategy = req.strategy.unwrap_or_else(|| defaults.strategy.clone());
    let evaluation = req.evaluation.unwrap_or_else(|| defaults.evaluation.clone());
    ensure_strategy(&strategy)?;
    ensure_evaluator(&evaluation)?;

    let now = Utc::now();
    let draft = Workshop {
        id: 0,
        course_id: req.course_id,
        name: req.name.trim().to_string(),
        phase: Phase::Setup,
        assessment_type,
        use_self_assessment: assessment_type != AssessmentType::Peer,
        allow_submission: true,
        assess_without_submission: false,
        assess_as_soon_submitted: false,
        use_examples: false,
        examples_mode: ExamplesMode::from_code(defaults.examples_mode)
            .unwrap_or(ExamplesMode::Voluntary),
        grade: defaults.grade,
        grading_grade: defaults.grading_grade,
        grade_decimals: defaults.grade_decimals,
        strategy,
        strategy_settings: serde_json::Value::Null,
        evaluation,
        evaluation_settings: serde_json::Value::Null,
        submission_start: None,
        submission_end: None,
        assessment_start: None,
        assessment_end: None,
        phase_switch_assessment: false,
        late_submissions: false,
        group_mode: GroupMode::NoGroups,
        submission_grade_pass: None,
        grading_grade_pass: None,
        created_at: now,
        updated_at: now,
    };

    let errors = validate_workshop_settings(&draft);
    if !errors.is_empty() {
        return Err(validation_error(&errors));
    }

    let workshop = service.storage().create_workshop(draft).await?;
    info!(
        "Workshop {} created in course {} by user {}",
        workshop.id, workshop.course_id, ctx.user_id
    );
    Ok(workshop)
}

/// 读取前先执行一次到期检查
pub async fn get_workshop(
    service: &WorkshopService,
    _ctx: &RequestContext,
    workshop_id: i64,
    now: DateTime<Utc>,
) -> Result<WorkshopResponse> {
    let advance = service.advance_if_due(workshop_id, now).await?;
    let workshop = service.load_workshop(workshop_id).await?;
    let permitted = workshop.permitted_operations();
    Ok(WorkshopResponse {
        workshop,
        permitted,
        advance,
    })
}

/// 保存设置，阶段不在这里修改
pub async fn update_settings(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    req: UpdateWorkshopSettingsRequest,
) -> Result<Workshop> {
    let mut workshop = service.load_workshop(workshop_id).await?;

    if let Some(strategy) = req.strategy
        && strategy != workshop.strategy
    {
        // 已有评审后不能再换评分策略
        if !workshop.permits(WorkshopOperation::ManageGradingForm) {
            return Err(WorkshopError::phase_violation(format!(
                "评分策略只能在 setup 或 submission 阶段修改，当前为 {}",
                workshop.phase
            )));
        }
        ensure_strategy(&strategy)?;
        workshop.strategy = strategy;
        workshop.strategy_settings = serde_json::Value::Null;
    }

    if let Some(name) = req.name {
        workshop.name = name.trim().to_string();
    }
    if let Some(grade) = req.grade {
        workshop.grade = grade;
    }
    if let Some(grading_grade) = req.grading_grade {
        workshop.grading_grade = grading_grade;
    }
    if let Some(decimals) = req.grade_decimals {
        workshop.grade_decimals = decimals;
    }
    if let Some(allow) = req.allow_submission {
        workshop.allow_submission = allow;
    }
    if let Some(flag) = req.assess_without_submission {
        workshop.assess_without_submission = flag;
    }
    if let Some(flag) = req.assess_as_soon_submitted {
        workshop.assess_as_soon_submitted = flag;
    }
    if let Some(flag) = req.use_examples {
        workshop.use_examples = flag;
    }
    if let Some(mode) = req.examples_mode {
        workshop.examples_mode = mode;
    }
    if let Some(ts) = req.submission_start {
        workshop.submission_start = optional_timestamp(ts);
    }
    if let Some(ts) = req.submission_end {
        workshop.submission_end = optional_timestamp(ts);
    }
    if let Some(ts) = req.assessment_start {
        workshop.assessment_start = optional_timestamp(ts);
    }
    if let Some(ts) = req.assessment_end {
        workshop.assessment_end = optional_timestamp(ts);
    }
    if let Some(flag) = req.phase_switch_assessment {
        workshop.phase_switch_assessment = flag;
    }
    if let Some(flag) = req.late_submissions {
        workshop.late_submissions = flag;
    }
    if let Some(mode) = req.group_mode {
        workshop.group_mode = mode;
    }
    if req.submission_grade_pass.is_some() {
        workshop.submission_grade_pass = req.submission_grade_pass;
    }
    if req.grading_grade_pass.is_some() {
        workshop.grading_grade_pass = req.grading_grade_pass;
    }
    if workshop.assessment_type == AssessmentType::SelfOnly {
        workshop.assess_without_submission = false;
    }

    let errors = validate_workshop_settings(&workshop);
    if !errors.is_empty() {
        return Err(validation_error(&errors));
    }

    let saved = service.storage().update_workshop(&workshop).await?;
    info!("Workshop {} settings updated by user {}", workshop_id, ctx.user_id);
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tests::{seeded, teacher};

    fn create_request(strategy: Option<&str>) -> CreateWorkshopRequest {
        CreateWorkshopRequest {
            course_id: 3,
            name: "  Peer review  ".to_string(),
            assessment_type: Some(AssessmentType::Both),
            strategy: strategy.map(str::to_string),
            evaluation: None,
        }
    }

    #[tokio::test]
    async fn test_create_uses_defaults() {
        let (service, _) = seeded(&[]).await;
        let workshop = service
            .create_workshop(&teacher(), create_request(None))
            .await
            .unwrap();

        assert_eq!(workshop.phase, Phase::Setup);
        assert_eq!(workshop.name, "Peer review");
        assert_eq!(workshop.grade, 80.0);
        assert_eq!(workshop.grading_grade, 20.0);
        assert_eq!(workshop.strategy, "accumulative");
        assert_eq!(workshop.evaluation, "best");
        assert!(workshop.use_self_assessment);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_strategy() {
        let (service, _) = seeded(&[]).await;
        let result = service
            .create_workshop(&teacher(), create_request(Some("median")))
            .await;
        assert!(matches!(result, Err(WorkshopError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_update_settings_validates() {
        let (service, workshop) = seeded(&[]).await;
        let req = UpdateWorkshopSettingsRequest {
            submission_start: Some(2_000),
            submission_end: Some(1_000),
            ..Default::default()
        };
        let result = service.update_settings(&teacher(), workshop.id, req).await;
        assert!(matches!(result, Err(WorkshopError::Validation(_))));

        let req = UpdateWorkshopSettingsRequest {
            grade: Some(50.0),
            submission_end: Some(0),
            ..Default::default()
        };
        let saved = service.update_settings(&teacher(), workshop.id, req).await.unwrap();
        assert_eq!(saved.grade, 50.0);
        assert_eq!(saved.submission_end, None);
        assert_eq!(saved.phase, Phase::Submission);
    }

    #[tokio::test]
    async fn test_strategy_locked_after_submission_phase() {
        let (service, workshop) = seeded(&[]).await;
        service
            .switch_phase(&teacher(), workshop.id, Phase::Assessment)
            .await
            .unwrap();

        let req = UpdateWorkshopSettingsRequest {
            strategy: Some("rubric".to_string()),
            ..Default::default()
        };
        let result = service.update_settings(&teacher(), workshop.id, req).await;
        assert!(matches!(result, Err(WorkshopError::PhaseViolation(_))));
    }
}
