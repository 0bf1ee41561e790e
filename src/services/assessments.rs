//! 评审的保存与评审成绩覆盖

use chrono::Utc;
use tracing::{debug, info};

use super::{WorkshopService, ensure_permitted, user_plan};
use crate::errors::{Result, WorkshopError};
use crate::events::WorkshopEvent;
use crate::models::assessments::{
    entities::Assessment,
    requests::{OverrideGradingGradeRequest, SaveAssessmentRequest},
    responses::SaveAssessmentOutcome,
};
use crate::models::context::{Capability, RequestContext};
use crate::models::workshops::entities::Workshop;
use crate::utils::grades::round_grade;
use crate::workflow::phase::WorkshopOperation;

/// 保存评审，校验失败时返回逐字段错误且不写入
pub async fn save_assessment(
    service: &WorkshopService,
    ctx: &RequestContext,
    assessment_id: i64,
    req: SaveAssessmentRequest,
) -> Result<SaveAssessmentOutcome> {
    let assessment = service.load_assessment(assessment_id).await?;
    if assessment.reviewer_id != ctx.user_id {
        return Err(WorkshopError::authorization("只能保存分配给自己的评审"));
    }
    let submission = service.load_submission(assessment.submission_id).await?;
    let workshop = service.current_workshop(submission.workshop_id, Utc::now()).await?;

    if submission.example {
        if ctx.has(Capability::ManageExamples) {
            // 教师对示例的参考评审
            ensure_permitted(&workshop, WorkshopOperation::ManageExamples)?;
        } else {
            ensure_permitted(&workshop, WorkshopOperation::AssessExample)?;
            if !workshop.assessing_examples_allowed() {
                return Err(WorkshopError::phase_violation("当前阶段不能评审示例提交"));
            }
        }
    } else {
        ensure_permitted(&workshop, WorkshopOperation::Assess)?;
        if workshop.examples_must() && !user_plan::examples_done(service, ctx, &workshop).await? {
            return Err(WorkshopError::phase_violation("评审同伴前需要先评审示例提交"));
        }
    }

    let strategy = service.grading_strategy(&workshop).await?;
    if !strategy.form_ready() {
        return Err(WorkshopError::configuration("评分表单尚未配置"));
    }
    let errors = strategy.validate(&req.scores);
    if !errors.is_empty() {
        debug!(
            "Assessment {} rejected with {} field error(s)",
            assessment_id,
            errors.len()
        );
        return Ok(SaveAssessmentOutcome::Invalid { errors });
    }
    let grade = strategy.compute_grade(&req.scores);

    let (assessment, scores) = service
        .storage()
        .save_assessment(
            assessment_id,
            strategy.id(),
            &req.scores,
            grade,
            req.feedback_author,
        )
        .await?;
    info!(
        "Assessment {} saved by user {} with grade {:?}",
        assessment_id, ctx.user_id, grade
    );
    service.publish(WorkshopEvent::AssessmentGraded {
        workshop_id: workshop.id,
        assessment_id,
        submission_id: assessment.submission_id,
        reviewer_id: assessment.reviewer_id,
        grade,
    });
    Ok(SaveAssessmentOutcome::Saved { assessment, scores })
}

/// 覆盖评审成绩，输入按评审满分给出，随后重算该评审者的汇总
pub async fn override_grading_grade(
    service: &WorkshopService,
    ctx: &RequestContext,
    assessment_id: i64,
    req: OverrideGradingGradeRequest,
) -> Result<Assessment> {
    let assessment = service.load_assessment(assessment_id).await?;
    let submission = service.load_submission(assessment.submission_id).await?;
    let workshop = service.load_workshop(submission.workshop_id).await?;
    ensure_permitted(&workshop, WorkshopOperation::OverrideGrades)?;

    let grading_grade_over = match req.grading_grade_over {
        Some(grade) if grade < 0.0 || grade > workshop.grading_grade => {
            return Err(WorkshopError::validation(format!(
                "grading_grade_over: 成绩必须在 0 到 {} 之间",
                workshop.grading_grade
            )));
        }
        Some(_) if workshop.grading_grade <= 0.0 => {
            return Err(WorkshopError::validation("grading_grade_over: 评审满分为 0"));
        }
        Some(grade) => Some(round_grade(grade / workshop.grading_grade * 100.0)),
        None => None,
    };

    let updated = service
        .storage()
        .override_grading_grade(assessment_id, grading_grade_over, req.feedback_reviewer)
        .await?
        .ok_or_else(|| WorkshopError::not_found(format!("评审 {assessment_id} 不存在")))?;
    info!(
        "Assessment {} grading grade overridden by user {}: {:?}",
        assessment_id, ctx.user_id, grading_grade_over
    );

    if !submission.example {
        let aggregate = reviewer_aggregate(service, &workshop, updated.reviewer_id).await?;
        service
            .storage()
            .upsert_aggregation(workshop.id, updated.reviewer_id, aggregate)
            .await?;
    }
    Ok(updated)
}

/// 评审者在正式提交上的评审成绩均值，覆盖值优先
pub(crate) async fn reviewer_aggregate(
    service: &WorkshopService,
    workshop: &Workshop,
    reviewer_id: i64,
) -> Result<Option<f64>> {
    let grades: Vec<f64> = service
        .storage()
        .list_workshop_assessments(workshop.id)
        .await?
        .iter()
        .filter(|a| a.reviewer_id == reviewer_id && a.weight > 0)
        .filter_map(Assessment::final_grading_grade)
        .collect();
    Ok(mean(&grades))
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(round_grade(values.iter().sum::<f64>() / values.len() as f64))
    }
}
