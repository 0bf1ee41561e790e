//! 阶段切换与自动推进
//!
//! 阶段字段只通过存储层的比较并交换更新，并发请求中只有一个会生效。

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::SelfAssessmentPolicy;
use crate::errors::{Result, WorkshopError};
use crate::events::WorkshopEvent;
use crate::models::context::RequestContext;
use crate::models::workshops::entities::Workshop;
use crate::services::WorkshopService;
use crate::strategies::allocation::ScheduledAllocator;
use crate::workflow::phase::{AdvanceOutcome, Phase, auto_switch_due};

fn creates_self_assessments(service: &WorkshopService, target: Phase) -> bool {
    target == Phase::Assessment
        && service.defaults().self_assessment_policy == SelfAssessmentPolicy::OnTransition
}

/// 手动切换到下一阶段
pub async fn switch_phase(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    target: Phase,
) -> Result<Workshop> {
    let workshop = service.load_workshop(workshop_id).await?;
    let from = workshop.phase;
    if from.next() != Some(target) {
        return Err(WorkshopError::phase_violation(format!(
            "不能从 {from} 切换到 {target}，只能前进到下一阶段"
        )));
    }

    let created = service
        .storage()
        .transition_phase(
            workshop_id,
            from,
            target,
            false,
            creates_self_assessments(service, target),
        )
        .await?
        .ok_or_else(|| WorkshopError::conflict(format!("工作坊 {workshop_id} 的阶段已被修改")))?;

    info!(
        "Workshop {} switched from {} to {} by user {} ({} self-assessment(s) created)",
        workshop_id,
        from,
        target,
        ctx.user_id,
        created.len()
    );
    service.publish(WorkshopEvent::PhaseChanged {
        workshop_id,
        from,
        to: target,
        automatic: false,
        self_assessments_created: created.len(),
    });

    service.load_workshop(workshop_id).await
}

/// 幂等的到期推进
///
/// 定时分配先于阶段切换执行；切换本身是带条件的更新，只会发生一次。
pub async fn advance_if_due(
    service: &WorkshopService,
    workshop_id: i64,
    now: DateTime<Utc>,
) -> Result<AdvanceOutcome> {
    let workshop = service.load_workshop(workshop_id).await?;
    if workshop.phase != Phase::Submission {
        return Ok(AdvanceOutcome::NotDue);
    }

    if let Some(result) = ScheduledAllocator::execute_due(service.storage(), &workshop, now).await? {
        service.publish(WorkshopEvent::AllocationExecuted {
            workshop_id,
            allocator: result.allocator.clone(),
            status: result.status,
            created: result.created.len(),
        });
    }

    if !auto_switch_due(&workshop, now) {
        return Ok(AdvanceOutcome::NotDue);
    }

    let transitioned = service
        .storage()
        .transition_phase(
            workshop_id,
            Phase::Submission,
            Phase::Assessment,
            true,
            creates_self_assessments(service, Phase::Assessment),
        )
        .await?;

    match transitioned {
        Some(created) => {
            info!(
                "Workshop {} switched to assessment after the submission deadline",
                workshop_id
            );
            service.publish(WorkshopEvent::PhaseChanged {
                workshop_id,
                from: Phase::Submission,
                to: Phase::Assessment,
                automatic: true,
                self_assessments_created: created.len(),
            });
            Ok(AdvanceOutcome::Advanced)
        }
        None => {
            warn!("Workshop {} was already advanced by another request", workshop_id);
            Ok(AdvanceOutcome::AlreadyAdvanced)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::allocation::entities::{NumPer, RandomAllocationSettings};
    use crate::services::tests::{seeded, submit_all, teacher};

    async fn make_due(service: &WorkshopService, workshop: &mut Workshop) {
        workshop.phase_switch_assessment = true;
        workshop.submission_end = Some(Utc::now() - chrono::Duration::minutes(1));
        *workshop = service.storage().update_workshop(workshop).await.unwrap();
    }

    #[tokio::test]
    async fn test_switch_only_forward_by_one() {
        let (service, workshop) = seeded(&[]).await;
        let result = service
            .switch_phase(&teacher(), workshop.id, Phase::Evaluation)
            .await;
        assert!(matches!(result, Err(WorkshopError::PhaseViolation(_))));

        let switched = service
            .switch_phase(&teacher(), workshop.id, Phase::Assessment)
            .await
            .unwrap();
        assert_eq!(switched.phase, Phase::Assessment);
    }

    #[tokio::test]
    async fn test_advance_not_due_without_flag() {
        let (service, workshop) = seeded(&[]).await;
        let outcome = service.advance_if_due(workshop.id, Utc::now()).await.unwrap();
        assert_eq!(outcome, AdvanceOutcome::NotDue);
    }

    #[tokio::test]
    async fn test_auto_transition_happens_once() {
        let (service, mut workshop) = seeded(&[1, 2]).await;
        workshop.use_self_assessment = true;
        make_due(&service, &mut workshop).await;
        submit_all(&service, &workshop, &[1, 2]).await;

        let mut events = service.events.subscribe();
        let now = Utc::now();
        let (a, b) = tokio::join!(
            service.advance_if_due(workshop.id, now),
            service.advance_if_due(workshop.id, now)
        );
        let outcomes = [a.unwrap(), b.unwrap()];
        assert!(outcomes.contains(&AdvanceOutcome::Advanced));
        assert!(!outcomes.iter().all(|o| *o == AdvanceOutcome::Advanced));

        let current = service.load_workshop(workshop.id).await.unwrap();
        assert_eq!(current.phase, Phase::Assessment);
        assert!(!current.phase_switch_assessment);

        // 一次切换，一组自评
        let table = service.storage().allocation_table(workshop.id).await.unwrap();
        assert_eq!(table.len(), 2);
        let event = events.try_recv().unwrap();
        assert!(matches!(
            event,
            WorkshopEvent::PhaseChanged { automatic: true, self_assessments_created: 2, .. }
        ));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_scheduled_allocation_runs_before_transition() {
        let (service, mut workshop) = seeded(&[1, 2, 3]).await;
        submit_all(&service, &workshop, &[1, 2, 3]).await;
        let settings = RandomAllocationSettings {
            num_of_reviews: 1,
            num_per: NumPer::PerSubmission,
            exclude_same_group: false,
            remove_current: false,
            assess_without_submission: false,
            add_self_assessment: false,
            seed: Some(11),
        };
        service
            .storage()
            .save_allocation_schedule(workshop.id, true, &settings)
            .await
            .unwrap();
        make_due(&service, &mut workshop).await;

        let outcome = service.advance_if_due(workshop.id, Utc::now()).await.unwrap();
        assert_eq!(outcome, AdvanceOutcome::Advanced);

        let schedule = service
            .storage()
            .get_allocation_schedule(workshop.id)
            .await
            .unwrap()
            .unwrap();
        assert!(schedule.time_allocated.is_some());
        assert_eq!(service.storage().allocation_table(workshop.id).await.unwrap().len(), 3);

        // 再次调用不会重复分配
        let outcome = service.advance_if_due(workshop.id, Utc::now()).await.unwrap();
        assert_eq!(outcome, AdvanceOutcome::NotDue);
        assert_eq!(service.storage().allocation_table(workshop.id).await.unwrap().len(), 3);
    }
}
