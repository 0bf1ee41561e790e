//! 提交：学生作品、示例提交、成绩覆盖与发布

use chrono::{DateTime, Utc};
use tracing::info;

use super::{WorkshopService, ensure_permitted, user_plan};
use crate::errors::{Result, WorkshopError};
use crate::events::WorkshopEvent;
use crate::models::context::RequestContext;
use crate::models::submissions::{
    entities::Submission,
    requests::{CreateSubmissionRequest, OverrideSubmissionGradeRequest},
};
use crate::storage::NewSubmission;
use crate::utils::grades::round_grade;
use crate::workflow::phase::WorkshopOperation;

fn validate_title(req: &CreateSubmissionRequest) -> Result<String> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(WorkshopError::validation("title: 标题不能为空"));
    }
    Ok(title.to_string())
}

/// 创建或更新当前用户的提交
pub async fn save_submission(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    req: CreateSubmissionRequest,
    now: DateTime<Utc>,
) -> Result<Submission> {
    let workshop = service.current_workshop(workshop_id, now).await?;
    ensure_permitted(&workshop, WorkshopOperation::CreateSubmission)?;
    let title = validate_title(&req)?;

    if workshop.examples_must() && !user_plan::examples_done(service, ctx, &workshop).await? {
        return Err(WorkshopError::phase_violation("提交作品前需要先评审示例提交"));
    }

    let late = workshop.submission_end.is_some_and(|end| end < now);
    if late && !workshop.late_submissions {
        return Err(WorkshopError::phase_violation("提交已截止"));
    }

    let storage = service.storage();
    if let Some(existing) = storage.get_author_submission(workshop_id, ctx.user_id).await? {
        let updated = storage
            .update_submission_content(existing.id, title, req.content, existing.late || late)
            .await?
            .ok_or_else(|| WorkshopError::not_found(format!("提交 {} 不存在", existing.id)))?;
        info!("Submission {} updated by user {}", updated.id, ctx.user_id);
        return Ok(updated);
    }

    let submission = storage
        .create_submission(NewSubmission {
            workshop_id,
            author_id: Some(ctx.user_id),
            example: false,
            title,
            content: req.content,
            late,
        })
        .await?;
    info!(
        "Submission {} created in workshop {} by user {}",
        submission.id, workshop_id, ctx.user_id
    );
    service.publish(WorkshopEvent::SubmissionCreated {
        workshop_id,
        submission_id: submission.id,
        author_id: submission.author_id,
        example: false,
    });
    Ok(submission)
}

/// 创建示例提交，评分表单就绪后才允许
pub async fn create_example(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    req: CreateSubmissionRequest,
) -> Result<Submission> {
    let workshop = service.current_workshop(workshop_id, Utc::now()).await?;
    ensure_permitted(&workshop, WorkshopOperation::ManageExamples)?;
    let title = validate_title(&req)?;

    if !service.grading_strategy(&workshop).await?.form_ready() {
        return Err(WorkshopError::configuration("评分表单尚未配置，不能创建示例提交"));
    }

    let submission = service
        .storage()
        .create_submission(NewSubmission {
            workshop_id,
            author_id: None,
            example: true,
            title,
            content: req.content,
            late: false,
        })
        .await?;
    info!(
        "Example submission {} created in workshop {} by user {}",
        submission.id, workshop_id, ctx.user_id
    );
    service.publish(WorkshopEvent::SubmissionCreated {
        workshop_id,
        submission_id: submission.id,
        author_id: None,
        example: true,
    });
    Ok(submission)
}

/// 覆盖提交成绩，输入按工作坊满分给出
pub async fn override_submission_grade(
    service: &WorkshopService,
    ctx: &RequestContext,
    submission_id: i64,
    req: OverrideSubmissionGradeRequest,
) -> Result<Submission> {
    let submission = service.load_submission(submission_id).await?;
    let workshop = service.load_workshop(submission.workshop_id).await?;
    ensure_permitted(&workshop, WorkshopOperation::OverrideGrades)?;

    let grade_over = match req.grade_over {
        Some(grade) if grade < 0.0 || grade > workshop.grade => {
            return Err(WorkshopError::validation(format!(
                "grade_over: 成绩必须在 0 到 {} 之间",
                workshop.grade
            )));
        }
        Some(_) if workshop.grade <= 0.0 => {
            return Err(WorkshopError::validation("grade_over: 工作坊满分为 0"));
        }
        Some(grade) => Some(round_grade(grade / workshop.grade * 100.0)),
        None => None,
    };

    let updated = service
        .storage()
        .override_submission_grade(submission_id, grade_over, ctx.user_id, req.feedback_author)
        .await?
        .ok_or_else(|| WorkshopError::not_found(format!("提交 {submission_id} 不存在")))?;
    info!(
        "Submission {} grade overridden by user {}: {:?}",
        submission_id, ctx.user_id, grade_over
    );
    Ok(updated)
}

pub async fn set_submission_published(
    service: &WorkshopService,
    ctx: &RequestContext,
    submission_id: i64,
    published: bool,
) -> Result<Submission> {
    let submission = service.load_submission(submission_id).await?;
    let workshop = service.load_workshop(submission.workshop_id).await?;
    ensure_permitted(&workshop, WorkshopOperation::PublishSubmission)?;

    let updated = service
        .storage()
        .set_submission_published(submission_id, published)
        .await?
        .ok_or_else(|| WorkshopError::not_found(format!("提交 {submission_id} 不存在")))?;
    info!(
        "Submission {} published={} by user {}",
        submission_id, published, ctx.user_id
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grading::requests::{CriterionInput, UpdateGradingFormRequest};
    use crate::services::tests::{seeded, student, teacher};
    use crate::workflow::phase::Phase;

    fn request(title: &str) -> CreateSubmissionRequest {
        CreateSubmissionRequest {
            title: title.to_string(),
            content: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_second_save_updates_own_submission() {
        let (service, workshop) = seeded(&[1]).await;
        let first = service
            .save_submission(&student(1), workshop.id, request("Draft"), Utc::now())
            .await
            .unwrap();
        let second = service
            .save_submission(&student(1), workshop.id, request("Final"), Utc::now())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "Final");
    }

    #[tokio::test]
    async fn test_late_submission_rejected() {
        let (service, mut workshop) = seeded(&[1]).await;
        workshop.submission_end = Some(Utc::now() - chrono::Duration::hours(1));
        service.storage().update_workshop(&workshop).await.unwrap();

        let result = service
            .save_submission(&student(1), workshop.id, request("Late"), Utc::now())
            .await;
        assert!(matches!(result, Err(WorkshopError::PhaseViolation(_))));

        workshop.late_submissions = true;
        service.storage().update_workshop(&workshop).await.unwrap();
        let submission = service
            .save_submission(&student(1), workshop.id, request("Late"), Utc::now())
            .await
            .unwrap();
        assert!(submission.late);
    }

    #[tokio::test]
    async fn test_due_workshop_advances_before_submission() {
        let (service, mut workshop) = seeded(&[1]).await;
        workshop.late_submissions = true;
        workshop.phase_switch_assessment = true;
        workshop.submission_end = Some(Utc::now() - chrono::Duration::minutes(5));
        service.storage().update_workshop(&workshop).await.unwrap();

        // 截止后先切换到评审阶段，迟交不再被接受
        let result = service
            .save_submission(&student(1), workshop.id, request("Late"), Utc::now())
            .await;
        assert!(matches!(result, Err(WorkshopError::PhaseViolation(_))));

        let reloaded = service.load_workshop(workshop.id).await.unwrap();
        assert_eq!(reloaded.phase, Phase::Assessment);
        assert!(!reloaded.phase_switch_assessment);
        assert!(
            service
                .storage()
                .get_author_submission(workshop.id, 1)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let (service, workshop) = seeded(&[1]).await;
        let result = service
            .save_submission(&student(1), workshop.id, request("   "), Utc::now())
            .await;
        assert!(matches!(result, Err(WorkshopError::Validation(_))));
    }

    #[tokio::test]
    async fn test_example_requires_ready_form() {
        let (service, mut workshop) = seeded(&[]).await;
        workshop.use_examples = true;
        service.storage().update_workshop(&workshop).await.unwrap();

        let result = service
            .create_example(&teacher(), workshop.id, request("Example"))
            .await;
        assert!(matches!(result, Err(WorkshopError::Configuration(_))));

        service
            .update_grading_form(
                &teacher(),
                workshop.id,
                UpdateGradingFormRequest {
                    criteria: vec![CriterionInput {
                        description: "Argument".to_string(),
                        max_grade: Some(10.0),
                        weight: Some(1),
                        levels: vec![],
                    }],
                    settings: None,
                },
            )
            .await
            .unwrap();
        let example = service
            .create_example(&teacher(), workshop.id, request("Example"))
            .await
            .unwrap();
        assert!(example.example);
        assert_eq!(example.author_id, None);
    }

    #[tokio::test]
    async fn test_override_in_evaluation_only() {
        let (service, workshop) = seeded(&[1]).await;
        let submission = service
            .save_submission(&student(1), workshop.id, request("Essay"), Utc::now())
            .await
            .unwrap();
        let req = || OverrideSubmissionGradeRequest {
            grade_over: Some(40.0),
            feedback_author: Some("Solid".to_string()),
        };

        let result = service
            .override_submission_grade(&teacher(), submission.id, req())
            .await;
        assert!(matches!(result, Err(WorkshopError::PhaseViolation(_))));

        service.switch_phase(&teacher(), workshop.id, Phase::Assessment).await.unwrap();
        service.switch_phase(&teacher(), workshop.id, Phase::Evaluation).await.unwrap();
        let updated = service
            .override_submission_grade(&teacher(), submission.id, req())
            .await
            .unwrap();
        // 40 / 80 换算到 0-100
        assert_eq!(updated.grade_over, Some(50.0));
        assert_eq!(updated.grade_over_by, Some(teacher().user_id));

        let published = service
            .set_submission_published(&teacher(), submission.id, true)
            .await
            .unwrap();
        assert!(published.published);
    }
}
