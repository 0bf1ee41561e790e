//! 设置向导
//!
//! 评审方式 → 评分方法 → 提交设置 → 同伴分配 → 评审设置 → 摘要，
//! 仅自评时跳过同伴分配。

use tracing::info;

use crate::errors::Result;
use crate::models::context::RequestContext;
use crate::models::participants::entities::ParticipantRole;
use crate::models::wizard::responses::{
    AssessmentTypeStepResponse, ConfigurationSummary, WizardNavigationPage, WizardStep,
    WizardStepEntry,
};
use crate::models::workshops::entities::{AssessmentType, Workshop};
use crate::services::{WorkshopService, ensure_permitted};
use crate::workflow::phase::WorkshopOperation;

/// 适用于当前评审方式的步骤
pub fn wizard_steps(assessment_type: AssessmentType) -> Vec<WizardStepEntry> {
    let steps: Vec<WizardStep> = [
        WizardStep::AssessmentType,
        WizardStep::GradingMethod,
        WizardStep::SubmissionSettings,
        WizardStep::PeerAllocation,
        WizardStep::AssessmentSettings,
        WizardStep::Summary,
    ]
    .into_iter()
    .filter(|step| *step != WizardStep::PeerAllocation || assessment_type.includes_peers())
    .collect();

    steps
        .iter()
        .enumerate()
        .map(|(i, step)| WizardStepEntry {
            step: *step,
            previous: i.checked_sub(1).map(|p| steps[p]),
            next: steps.get(i + 1).copied(),
        })
        .collect()
}

pub async fn wizard_page(
    service: &WorkshopService,
    _ctx: &RequestContext,
    workshop_id: i64,
) -> Result<WizardNavigationPage> {
    let workshop = service.load_workshop(workshop_id).await?;
    let storage = service.storage();

    let criteria = storage
        .list_criteria(workshop.id, &workshop.strategy)
        .await?;
    let participants = storage.list_participants(workshop.id).await?;
    let submissions = storage.list_submissions(workshop.id, false).await?;
    let scheduled = storage
        .get_allocation_schedule(workshop.id)
        .await?
        .is_some_and(|s| s.enabled);

    let summary = ConfigurationSummary {
        name: workshop.name.clone(),
        phase: workshop.phase,
        assessment_type: workshop.assessment_type,
        strategy: workshop.strategy.clone(),
        evaluation: workshop.evaluation.clone(),
        allow_submission: workshop.allow_submission,
        use_examples: workshop.use_examples,
        examples_mode: workshop.examples_mode,
        submission_start: workshop.submission_start,
        submission_end: workshop.submission_end,
        assessment_start: workshop.assessment_start,
        assessment_end: workshop.assessment_end,
        phase_switch_assessment: workshop.phase_switch_assessment,
        criteria_count: criteria.len() as i64,
        participants_count: participants
            .iter()
            .filter(|p| p.role == ParticipantRole::Student)
            .count() as i64,
        submissions_count: submissions.len() as i64,
        scheduled_allocation_enabled: scheduled,
    };

    Ok(WizardNavigationPage {
        steps: wizard_steps(workshop.assessment_type),
        summary,
    })
}

/// 第一步：保存评审方式
pub async fn save_assessment_type(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    assessment_type: AssessmentType,
) -> Result<AssessmentTypeStepResponse> {
    let mut workshop: Workshop = service.load_workshop(workshop_id).await?;
    ensure_permitted(&workshop, WorkshopOperation::EditSettings)?;

    workshop.assessment_type = assessment_type;
    workshop.use_self_assessment = assessment_type != AssessmentType::Peer;
    if assessment_type == AssessmentType::SelfOnly {
        workshop.assess_without_submission = false;
    }
    let workshop = service.storage().update_workshop(&workshop).await?;
    info!(
        "Workshop {} assessment type set to {:?} by user {}",
        workshop_id, assessment_type, ctx.user_id
    );

    Ok(AssessmentTypeStepResponse {
        workshop,
        next: WizardStep::GradingMethod,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tests::{seeded, submit_all, teacher};

    #[test]
    fn test_self_only_skips_peer_allocation() {
        let steps = wizard_steps(AssessmentType::SelfOnly);
        assert_eq!(steps.len(), 5);
        assert!(steps.iter().all(|s| s.step != WizardStep::PeerAllocation));
        let submission = steps
            .iter()
            .find(|s| s.step == WizardStep::SubmissionSettings)
            .unwrap();
        assert_eq!(submission.next, Some(WizardStep::AssessmentSettings));
    }

    #[test]
    fn test_peer_steps_chain() {
        let steps = wizard_steps(AssessmentType::Peer);
        assert_eq!(steps.len(), 6);
        assert_eq!(steps[0].previous, None);
        assert_eq!(steps[0].next, Some(WizardStep::GradingMethod));
        assert_eq!(steps[5].step, WizardStep::Summary);
        assert_eq!(steps[5].next, None);
    }

    #[tokio::test]
    async fn test_save_self_only_type() {
        let (service, mut workshop) = seeded(&[1]).await;
        workshop.assess_without_submission = true;
        service.storage().update_workshop(&workshop).await.unwrap();

        let response = service
            .save_assessment_type(&teacher(), workshop.id, AssessmentType::SelfOnly)
            .await
            .unwrap();
        assert_eq!(response.next, WizardStep::GradingMethod);
        assert!(response.workshop.use_self_assessment);
        assert!(!response.workshop.assess_without_submission);
    }

    #[tokio::test]
    async fn test_wizard_summary_counts() {
        let (service, workshop) = seeded(&[1, 2]).await;
        submit_all(&service, &workshop, &[1]).await;

        let page = service.wizard_page(&teacher(), workshop.id).await.unwrap();
        assert_eq!(page.summary.participants_count, 2);
        assert_eq!(page.summary.submissions_count, 1);
        assert_eq!(page.summary.criteria_count, 0);
        assert!(!page.summary.scheduled_allocation_enabled);
    }
}
