//! 用户计划
//!
//! 按阶段列出当前用户的任务与完成情况。读取时会按需补建分配：
//! 示例评审总是惰性创建，自评在 `lazy` 策略下于评审阶段首次读取时创建。

use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;

use super::WorkshopService;
use crate::config::SelfAssessmentPolicy;
use crate::errors::Result;
use crate::models::assessments::entities::Assessment;
use crate::models::context::{Capability, RequestContext};
use crate::models::plan::responses::{
    AssignedAssessment, ExampleStatus, PhasePlan, PlanTask, UserPlan,
};
use crate::models::submissions::entities::Submission;
use crate::models::workshops::entities::{ExamplesMode, Workshop};
use crate::workflow::phase::{Phase, WorkshopOperation};

/// 示例评审的权重，不计入成绩
const EXAMPLE_WEIGHT: i32 = 0;

fn examples_graded(examples: &[Submission], assessments: &[Assessment]) -> bool {
    examples.iter().all(|example| {
        assessments
            .iter()
            .any(|a| a.submission_id == example.id && a.is_graded())
    })
}

/// 当前用户是否已完成示例评审
pub(crate) async fn examples_done(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop: &Workshop,
) -> Result<bool> {
    if !workshop.use_examples
        || workshop.examples_mode == ExamplesMode::Voluntary
        || ctx.has(Capability::ManageExamples)
    {
        return Ok(true);
    }
    let storage = service.storage();
    let examples = storage.list_submissions(workshop.id, true).await?;
    let own = storage
        .list_reviewer_assessments(workshop.id, ctx.user_id)
        .await?;
    Ok(examples_graded(&examples, &own))
}

/// 是否需要为当前用户补建示例评审
fn wants_example_allocations(workshop: &Workshop, ctx: &RequestContext, has_submission: bool) -> bool {
    if !workshop.use_examples
        || !workshop.assessing_examples_allowed()
        || !ctx.has(Capability::Submit)
        || ctx.has(Capability::ManageExamples)
    {
        return false;
    }
    match workshop.phase {
        Phase::Submission => true,
        Phase::Assessment => {
            workshop.examples_mode != ExamplesMode::BeforeAssessment
                || has_submission
                || workshop.assess_without_submission
        }
        _ => false,
    }
}

pub async fn user_plan(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
) -> Result<UserPlan> {
    let workshop = service.current_workshop(workshop_id, Utc::now()).await?;
    let storage = service.storage();
    let user_id = ctx.user_id;

    let own_submission = storage.get_author_submission(workshop_id, user_id).await?;
    let examples = storage.list_submissions(workshop_id, true).await?;

    if service.defaults().self_assessment_policy == SelfAssessmentPolicy::Lazy
        && workshop.phase == Phase::Assessment
        && workshop.use_self_assessment
        && let Some(own) = &own_submission
    {
        let (assessment, created) = storage.add_allocation(own.id, user_id, 1).await?;
        if created {
            debug!("Self-assessment {} created lazily for user {}", assessment.id, user_id);
        }
    }

    if wants_example_allocations(&workshop, ctx, own_submission.is_some()) {
        for example in &examples {
            let (assessment, created) = storage
                .add_allocation(example.id, user_id, EXAMPLE_WEIGHT)
                .await?;
            if created {
                debug!(
                    "Example assessment {} created for user {} on submission {}",
                    assessment.id, user_id, example.id
                );
            }
        }
    }

    let own_assessments = storage.list_reviewer_assessments(workshop_id, user_id).await?;
    let real_submissions = storage.list_submissions(workshop_id, false).await?;
    let by_id: HashMap<i64, &Submission> = real_submissions.iter().map(|s| (s.id, s)).collect();

    let example_status: Vec<ExampleStatus> = examples
        .iter()
        .map(|example| {
            let assessment = own_assessments.iter().find(|a| a.submission_id == example.id);
            ExampleStatus {
                submission_id: example.id,
                title: example.title.clone(),
                assessment_id: assessment.map(|a| a.id),
                grade: assessment.and_then(|a| a.grade),
            }
        })
        .collect();

    let examples_done = !workshop.use_examples
        || workshop.examples_mode == ExamplesMode::Voluntary
        || ctx.has(Capability::ManageExamples)
        || examples_graded(&examples, &own_assessments);
    let examples_must = workshop.examples_must();
    let gate_open = !examples_must || examples_done;

    let can_create_submission = ctx.has(Capability::Submit)
        && workshop.permits(WorkshopOperation::CreateSubmission)
        && gate_open;
    let assessments_available = workshop.permits(WorkshopOperation::Assess) && gate_open;

    let assigned: Vec<AssignedAssessment> = if gate_open {
        own_assessments
            .iter()
            .filter_map(|a| {
                let submission = by_id.get(&a.submission_id)?;
                Some(AssignedAssessment {
                    assessment_id: a.id,
                    submission_id: submission.id,
                    submission_title: submission.title.clone(),
                    author_id: submission.author_id,
                    weight: a.weight,
                    grade: a.grade,
                })
            })
            .collect()
    } else {
        vec![]
    };

    let phases = phase_plans(PlanFacts {
        workshop: &workshop,
        ctx,
        form_ready: service.grading_strategy(&workshop).await?.form_ready(),
        has_examples: !examples.is_empty(),
        examples_done,
        own_submission: own_submission.as_ref(),
        real_submissions: &real_submissions,
        workshop_assessments: &storage.list_workshop_assessments(workshop_id).await?,
        own_assessments: &own_assessments,
    });

    Ok(UserPlan {
        user_id,
        phases,
        examples: example_status,
        examples_done,
        examples_must,
        can_create_submission,
        own_submission_id: own_submission.map(|s| s.id),
        assessments_available,
        assigned,
    })
}

struct PlanFacts<'a> {
    workshop: &'a Workshop,
    ctx: &'a RequestContext,
    form_ready: bool,
    has_examples: bool,
    examples_done: bool,
    own_submission: Option<&'a Submission>,
    real_submissions: &'a [Submission],
    workshop_assessments: &'a [Assessment],
    own_assessments: &'a [Assessment],
}

fn phase_plans(facts: PlanFacts<'_>) -> Vec<PhasePlan> {
    let PlanFacts {
        workshop,
        ctx,
        form_ready,
        has_examples,
        examples_done,
        own_submission,
        real_submissions,
        workshop_assessments,
        own_assessments,
    } = facts;
    let manager = ctx.has(Capability::ManageActivity);
    let student = ctx.has(Capability::Submit);

    // 自己在正式提交上的评审，区分同伴与自评
    let (own_self, own_peer): (Vec<&Assessment>, Vec<&Assessment>) = own_assessments
        .iter()
        .filter(|a| real_submissions.iter().any(|s| s.id == a.submission_id))
        .partition(|a| own_submission.is_some_and(|s| s.id == a.submission_id));
    let all_graded = |list: &[&Assessment]| {
        if list.is_empty() {
            None
        } else {
            Some(list.iter().all(|a| a.is_graded()))
        }
    };

    let mut plans = Vec::with_capacity(Phase::all().len());
    for phase in Phase::all() {
        let mut tasks = vec![];
        match phase {
            Phase::Setup => {
                if manager {
                    tasks.push(PlanTask::new("setup_form", Some(form_ready)));
                }
                if workshop.use_examples && ctx.has(Capability::ManageExamples) {
                    tasks.push(PlanTask::new("prepare_examples", Some(has_examples)));
                }
            }
            Phase::Submission => {
                if student && workshop.use_examples && workshop.examples_mode == ExamplesMode::BeforeSubmission {
                    tasks.push(PlanTask::new("assess_examples", Some(examples_done)));
                }
                if student && workshop.allow_submission {
                    tasks.push(PlanTask::new("submit", Some(own_submission.is_some())));
                }
                if ctx.has(Capability::Allocate) && workshop.assessment_type.includes_peers() {
                    let completed = if real_submissions.is_empty() {
                        None
                    } else {
                        Some(real_submissions.iter().all(|s| {
                            workshop_assessments
                                .iter()
                                .any(|a| a.submission_id == s.id && Some(a.reviewer_id) != s.author_id)
                        }))
                    };
                    tasks.push(PlanTask::new("allocate", completed));
                }
            }
            Phase::Assessment => {
                if student && workshop.use_examples && workshop.examples_mode == ExamplesMode::BeforeAssessment {
                    tasks.push(PlanTask::new("assess_examples", Some(examples_done)));
                }
                if ctx.has(Capability::PeerAssess) && workshop.assessment_type.includes_peers() {
                    tasks.push(PlanTask::new("assess_peers", all_graded(&own_peer)));
                }
                if student && workshop.use_self_assessment {
                    tasks.push(PlanTask::new("assess_self", all_graded(&own_self)));
                }
            }
            Phase::Evaluation => {
                if manager {
                    let completed = if real_submissions.is_empty() {
                        None
                    } else {
                        Some(real_submissions.iter().all(|s| s.grade.is_some()))
                    };
                    tasks.push(PlanTask::new("calculate_grades", completed));
                }
            }
            Phase::Closed => {}
        }
        plans.push(PhasePlan {
            phase: *phase,
            active: *phase == workshop.phase,
            tasks,
        });
    }
    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkshopDefaults;
    use crate::events::EventBus;
    use crate::errors::WorkshopError;
    use crate::models::assessments::requests::{CriterionScoreInput, SaveAssessmentRequest};
    use crate::models::assessments::responses::SaveAssessmentOutcome;
    use crate::models::grading::requests::{CriterionInput, UpdateGradingFormRequest};
    use crate::models::submissions::requests::CreateSubmissionRequest;
    use crate::models::workshops::entities::AssessmentType;
    use crate::services::tests::{seeded, student, submit_all, teacher};
    use crate::storage::sea_orm_storage::tests::seed_workshop;
    use std::sync::Arc;

    fn essay() -> CreateSubmissionRequest {
        CreateSubmissionRequest {
            title: "Essay".to_string(),
            content: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_examples_before_submission_gate() {
        let (service, mut workshop) = seeded(&[1]).await;
        workshop.use_examples = true;
        workshop.examples_mode = ExamplesMode::BeforeSubmission;
        service.storage().update_workshop(&workshop).await.unwrap();
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
        service.create_example(&teacher(), workshop.id, essay()).await.unwrap();
        service.create_example(&teacher(), workshop.id, essay()).await.unwrap();

        let plan = service.user_plan(&student(1), workshop.id).await.unwrap();
        assert!(plan.examples_must);
        assert!(!plan.examples_done);
        assert!(!plan.can_create_submission);
        assert_eq!(plan.examples.len(), 2);

        // 示例分配懒创建，权重为 0 且未评分
        let mut example_assessments = vec![];
        for example in &plan.examples {
            let id = example.assessment_id.unwrap();
            let allocation = service.storage().get_assessment(id).await.unwrap().unwrap();
            assert_eq!(allocation.reviewer_id, 1);
            assert_eq!(allocation.weight, EXAMPLE_WEIGHT);
            assert_eq!(allocation.grade, None);
            example_assessments.push(id);
        }

        let blocked = service
            .save_submission(&student(1), workshop.id, essay(), Utc::now())
            .await;
        assert!(matches!(blocked, Err(WorkshopError::PhaseViolation(_))));

        let answer = || SaveAssessmentRequest {
            scores: vec![CriterionScoreInput {
                dimension_id: dimension,
                grade: Some(7.0),
                peer_comment: None,
            }],
            feedback_author: None,
        };

        // 只评了一个示例，仍然不能提交
        let outcome = service
            .save_assessment(&student(1), example_assessments[0], answer())
            .await
            .unwrap();
        assert!(matches!(outcome, SaveAssessmentOutcome::Saved { .. }));
        let plan = service.user_plan(&student(1), workshop.id).await.unwrap();
        assert!(!plan.examples_done);
        assert!(!plan.can_create_submission);

        let outcome = service
            .save_assessment(&student(1), example_assessments[1], answer())
            .await
            .unwrap();
        assert!(matches!(outcome, SaveAssessmentOutcome::Saved { .. }));

        let plan = service.user_plan(&student(1), workshop.id).await.unwrap();
        assert!(plan.examples_done);
        assert!(plan.can_create_submission);
        // 示例评审不会重复创建
        let ids: Vec<Option<i64>> = plan.examples.iter().map(|e| e.assessment_id).collect();
        assert_eq!(ids, example_assessments.iter().copied().map(Some).collect::<Vec<_>>());
        service
            .save_submission(&student(1), workshop.id, essay(), Utc::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_single_active_phase() {
        let (service, workshop) = seeded(&[1]).await;
        let plan = service.user_plan(&student(1), workshop.id).await.unwrap();
        let active: Vec<Phase> = plan.phases.iter().filter(|p| p.active).map(|p| p.phase).collect();
        assert_eq!(active, vec![Phase::Submission]);

        let submission = &plan.phases[1];
        assert_eq!(submission.tasks, vec![PlanTask::new("submit", Some(false))]);
    }

    #[tokio::test]
    async fn test_lazy_self_assessment() {
        let (storage, mut workshop) = seed_workshop(&[1]).await;
        let defaults = WorkshopDefaults {
            self_assessment_policy: SelfAssessmentPolicy::Lazy,
            ..WorkshopDefaults::default()
        };
        let service = WorkshopService::new(Arc::new(storage), EventBus::new(16), defaults);
        workshop.assessment_type = AssessmentType::Both;
        workshop.use_self_assessment = true;
        service.storage().update_workshop(&workshop).await.unwrap();
        let submissions = submit_all(&service, &workshop, &[1]).await;

        service.switch_phase(&teacher(), workshop.id, Phase::Assessment).await.unwrap();
        assert!(service
            .storage()
            .list_submission_assessments(submissions[0].id)
            .await
            .unwrap()
            .is_empty());

        let plan = service.user_plan(&student(1), workshop.id).await.unwrap();
        assert_eq!(plan.assigned.len(), 1);
        assert_eq!(plan.assigned[0].submission_id, submissions[0].id);
        let assess_self = plan.phases[2].tasks.iter().find(|t| t.code == "assess_self").unwrap();
        assert_eq!(assess_self.completed, Some(false));

        // 再次读取不会重复创建
        service.user_plan(&student(1), workshop.id).await.unwrap();
        let all = service.storage().list_submission_assessments(submissions[0].id).await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
