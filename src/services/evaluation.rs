//! 成绩汇总、评价方法设置与工具箱

use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

use super::{WorkshopService, assessments::mean, ensure_permitted};
use crate::errors::{Result, WorkshopError};
use crate::events::WorkshopEvent;
use crate::models::context::RequestContext;
use crate::models::evaluation::{
    requests::ToolboxAction,
    responses::{AggregationSummary, ClearSummary},
};
use crate::models::workshops::entities::Workshop;
use crate::storage::EvaluationWrite;
use crate::strategies::evaluation::{AssessmentSnapshot, EvaluationInput};
use crate::strategies::registry;
use crate::workflow::phase::WorkshopOperation;

/// 重新计算全部提交成绩、评审成绩与评审者汇总
pub async fn aggregate(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
) -> Result<AggregationSummary> {
    let workshop = service.load_workshop(workshop_id).await?;
    ensure_permitted(&workshop, WorkshopOperation::AggregateGrades)?;

    let evaluator = registry::create_evaluator(&workshop.evaluation, &workshop.evaluation_settings)?;
    let dimensions = service.grading_strategy(&workshop).await?.dimensions();
    let storage = service.storage();
    let snapshot = storage.evaluation_snapshot(workshop_id, &workshop.strategy).await?;

    let mut scores: HashMap<i64, HashMap<i64, f64>> = HashMap::new();
    for score in &snapshot.scores {
        scores
            .entry(score.assessment_id)
            .or_default()
            .insert(score.dimension_id, score.grade);
    }

    let mut write = EvaluationWrite::default();
    let mut computed: HashMap<i64, f64> = HashMap::new();
    for submission in &snapshot.submissions {
        let assessments: Vec<AssessmentSnapshot> = snapshot
            .assessments
            .iter()
            .filter(|a| a.submission_id == submission.id)
            .map(|a| AssessmentSnapshot {
                assessment_id: a.id,
                reviewer_id: a.reviewer_id,
                weight: a.weight,
                grade: a.grade,
                scores: scores.remove(&a.id).unwrap_or_default(),
            })
            .collect();
        let evaluation = evaluator.evaluate(&EvaluationInput {
            dimensions: &dimensions,
            assessments: &assessments,
        });
        write.submission_grades.push((submission.id, evaluation.submission_grade));
        for grade in evaluation.grading_grades {
            computed.insert(grade.assessment_id, grade.grading_grade);
        }
    }

    // 评审者汇总：权重大于 0 的评审成绩均值，覆盖值优先
    let mut per_reviewer: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for assessment in &snapshot.assessments {
        let grading_grade = computed.get(&assessment.id).copied();
        write.grading_grades.push((assessment.id, grading_grade));
        let values = per_reviewer.entry(assessment.reviewer_id).or_default();
        if assessment.weight > 0
            && let Some(value) = assessment.grading_grade_over.or(grading_grade)
        {
            values.push(value);
        }
    }
    write.aggregations = per_reviewer
        .into_iter()
        .map(|(reviewer_id, values)| (reviewer_id, mean(&values)))
        .collect();

    let summary = AggregationSummary {
        submissions_evaluated: write.submission_grades.len() as i64,
        grading_grades_written: write.grading_grades.iter().filter(|(_, g)| g.is_some()).count() as i64,
        reviewers_aggregated: write.aggregations.iter().filter(|(_, g)| g.is_some()).count() as i64,
    };
    storage.write_evaluation(workshop_id, write).await?;

    info!(
        "Grades aggregated for workshop {} by user {} with {}: {:?}",
        workshop_id, ctx.user_id, workshop.evaluation, summary
    );
    service.publish(WorkshopEvent::GradesAggregated {
        workshop_id,
        summary: summary.clone(),
    });
    Ok(summary)
}

pub async fn set_evaluation_method(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    method: &str,
) -> Result<Workshop> {
    let mut workshop = service.load_workshop(workshop_id).await?;
    ensure_permitted(&workshop, WorkshopOperation::SetEvaluationMethod)?;
    if !registry::has_evaluator(method) {
        return Err(WorkshopError::configuration(format!("评价方法 {method} 未注册")));
    }
    if workshop.evaluation == method {
        return Ok(workshop);
    }

    workshop.evaluation = method.to_string();
    workshop.evaluation_settings = serde_json::Value::Null;
    let workshop = service.storage().update_workshop(&workshop).await?;
    info!(
        "Workshop {} evaluation method set to {} by user {}",
        workshop_id, method, ctx.user_id
    );
    Ok(workshop)
}

pub async fn update_evaluation_settings(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    settings: serde_json::Value,
) -> Result<Workshop> {
    let mut workshop = service.load_workshop(workshop_id).await?;
    ensure_permitted(&workshop, WorkshopOperation::SetEvaluationMethod)?;
    // 构造失败即设置不合法
    registry::create_evaluator(&workshop.evaluation, &settings)?;

    workshop.evaluation_settings = settings;
    let workshop = service.storage().update_workshop(&workshop).await?;
    info!(
        "Workshop {} evaluation settings updated by user {}",
        workshop_id, ctx.user_id
    );
    Ok(workshop)
}

/// 工具箱中的清理操作，必须回传确认口令
pub async fn run_toolbox_action(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    action: ToolboxAction,
    confirm: Option<&str>,
) -> Result<ClearSummary> {
    let workshop = service.load_workshop(workshop_id).await?;
    let op = match action {
        ToolboxAction::ClearAggregatedGrades => WorkshopOperation::ClearAggregatedGrades,
        ToolboxAction::ClearAssessments => WorkshopOperation::ClearAssessments,
    };
    ensure_permitted(&workshop, op)?;
    if confirm != Some(action.confirmation_token()) {
        return Err(WorkshopError::confirmation_required(format!(
            "请回传确认口令 {}",
            action.confirmation_token()
        )));
    }

    let storage = service.storage();
    let summary = match action {
        ToolboxAction::ClearAggregatedGrades => storage.clear_aggregated_grades(workshop_id).await?,
        ToolboxAction::ClearAssessments => storage.clear_assessments(workshop_id).await?,
    };
    warn!(
        "Toolbox action {:?} on workshop {} by user {}: {:?}",
        action, workshop_id, ctx.user_id, summary
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assessments::requests::{CriterionScoreInput, SaveAssessmentRequest};
    use crate::models::grading::requests::{CriterionInput, UpdateGradingFormRequest};
    use crate::services::tests::{seeded, student, submit_all, teacher};
    use crate::workflow::phase::Phase;
    use serde_json::json;

    /// 两位学生互评，进入评价阶段
    async fn graded_workshop() -> (WorkshopService, Workshop, Vec<i64>) {
        let (service, workshop) = seeded(&[1, 2]).await;
        let form = service
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
        let dimension = form.form.criteria[0].id;
        let submissions = submit_all(&service, &workshop, &[1, 2]).await;
        let (a, _) = service.storage().add_allocation(submissions[0].id, 2, 1).await.unwrap();
        let (b, _) = service.storage().add_allocation(submissions[1].id, 1, 1).await.unwrap();
        service.switch_phase(&teacher(), workshop.id, Phase::Assessment).await.unwrap();

        for (reviewer, assessment, grade) in [(2, a.id, 8.0), (1, b.id, 6.0)] {
            let req = SaveAssessmentRequest {
                scores: vec![CriterionScoreInput {
                    dimension_id: dimension,
                    grade: Some(grade),
                    peer_comment: None,
                }],
                feedback_author: None,
            };
            service.save_assessment(&student(reviewer), assessment, req).await.unwrap();
        }
        service.switch_phase(&teacher(), workshop.id, Phase::Evaluation).await.unwrap();
        (service, workshop, submissions.iter().map(|s| s.id).collect())
    }

    #[tokio::test]
    async fn test_aggregate_writes_grades() {
        let (service, workshop, submissions) = graded_workshop().await;
        let summary = service.aggregate(&teacher(), workshop.id).await.unwrap();
        assert_eq!(summary.submissions_evaluated, 2);
        assert_eq!(summary.grading_grades_written, 2);
        assert_eq!(summary.reviewers_aggregated, 2);

        let first = service.storage().get_submission(submissions[0]).await.unwrap().unwrap();
        let second = service.storage().get_submission(submissions[1]).await.unwrap().unwrap();
        assert_eq!(first.grade, Some(80.0));
        assert_eq!(second.grade, Some(60.0));

        // 单一评审者时评审成绩为满分
        let aggregations = service.storage().list_aggregations(workshop.id).await.unwrap();
        assert_eq!(aggregations.get(&1), Some(&Some(100.0)));
        assert_eq!(aggregations.get(&2), Some(&Some(100.0)));
    }

    #[tokio::test]
    async fn test_clear_then_aggregate_yields_nothing() {
        let (service, workshop, submissions) = graded_workshop().await;
        service.aggregate(&teacher(), workshop.id).await.unwrap();

        let missing = service
            .run_toolbox_action(&teacher(), workshop.id, ToolboxAction::ClearAssessments, None)
            .await;
        assert!(matches!(missing, Err(WorkshopError::ConfirmationRequired(_))));

        let cleared = service
            .run_toolbox_action(
                &teacher(),
                workshop.id,
                ToolboxAction::ClearAssessments,
                Some("clear_assessments"),
            )
            .await
            .unwrap();
        assert_eq!(cleared.assessments_reset, 2);

        let summary = service.aggregate(&teacher(), workshop.id).await.unwrap();
        assert_eq!(summary.grading_grades_written, 0);
        assert_eq!(summary.reviewers_aggregated, 0);
        let first = service.storage().get_submission(submissions[0]).await.unwrap().unwrap();
        assert_eq!(first.grade, None);
    }

    #[tokio::test]
    async fn test_evaluation_method_and_settings() {
        let (service, workshop, _) = graded_workshop().await;
        let result = service.set_evaluation_method(&teacher(), workshop.id, "median").await;
        assert!(matches!(result, Err(WorkshopError::Configuration(_))));

        let bad = service
            .update_evaluation_settings(&teacher(), workshop.id, json!({ "comparison": 4 }))
            .await;
        assert!(matches!(bad, Err(WorkshopError::Configuration(_))));

        let updated = service
            .update_evaluation_settings(&teacher(), workshop.id, json!({ "comparison": 9 }))
            .await
            .unwrap();
        assert_eq!(updated.evaluation_settings, json!({ "comparison": 9 }));

        let switched = service
            .set_evaluation_method(&teacher(), workshop.id, "comments")
            .await
            .unwrap();
        assert_eq!(switched.evaluation, "comments");
        assert_eq!(switched.evaluation_settings, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_aggregate_outside_evaluation_rejected() {
        let (service, workshop) = seeded(&[1]).await;
        let result = service.aggregate(&teacher(), workshop.id).await;
        assert!(matches!(result, Err(WorkshopError::PhaseViolation(_))));
    }
}
