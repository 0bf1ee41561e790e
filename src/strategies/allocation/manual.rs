//! 手动分配：逐条添加或删除评审分配

use tracing::info;

use super::{Allocator, parse_options};
use crate::errors::Result;
use crate::models::allocation::entities::{
    AllocatedPair, AllocationResult, AllocationStatus, ManualAction,
};
use crate::models::workshops::entities::Workshop;
use crate::storage::Storage;

pub struct ManualAllocator;

impl ManualAllocator {
    pub const ID: &'static str = "manual";

    fn error(message: impl Into<String>) -> AllocationResult {
        AllocationResult::new(Self::ID, AllocationStatus::Error).with_message(message)
    }

    async fn add(
        storage: &dyn Storage,
        workshop: &Workshop,
        reviewer_id: i64,
        author_id: i64,
    ) -> Result<AllocationResult> {
        if reviewer_id == author_id && !workshop.use_self_assessment {
            return Ok(Self::error("Self-assessment is not enabled in this workshop"));
        }
        if storage.get_participant(workshop.id, reviewer_id).await?.is_none() {
            return Ok(Self::error(format!(
                "User {reviewer_id} is not a participant of this workshop"
            )));
        }
        let Some(submission) = storage.get_author_submission(workshop.id, author_id).await? else {
            return Ok(Self::error(format!("User {author_id} has no submission")));
        };

        let (assessment, created) = storage.add_allocation(submission.id, reviewer_id, 1).await?;
        if !created {
            return Ok(AllocationResult::new(Self::ID, AllocationStatus::Ok)
                .with_message(format!("Allocation #{} already exists", assessment.id)));
        }

        info!(
            "Manual allocation #{} created: reviewer {} -> submission {}",
            assessment.id, reviewer_id, submission.id
        );
        let mut result = AllocationResult::new(Self::ID, AllocationStatus::Ok)
            .with_message(format!("Allocation #{} added", assessment.id));
        result.created.push(AllocatedPair {
            assessment_id: assessment.id,
            submission_id: submission.id,
            reviewer_id,
        });
        Ok(result)
    }

    async fn delete(
        storage: &dyn Storage,
        workshop: &Workshop,
        assessment_id: i64,
        confirm: bool,
    ) -> Result<AllocationResult> {
        let Some(assessment) = storage.get_assessment(assessment_id).await? else {
            return Ok(Self::error(format!("Allocation #{assessment_id} not found")));
        };
        let belongs = storage
            .get_submission(assessment.submission_id)
            .await?
            .is_some_and(|s| s.workshop_id == workshop.id);
        if !belongs {
            return Ok(Self::error(format!("Allocation #{assessment_id} not found")));
        }

        // 已评分的分配需要确认后才能删除
        if assessment.is_graded() && !confirm {
            return Ok(AllocationResult::new(Self::ID, AllocationStatus::NeedSetup)
                .with_message(format!(
                    "Allocation #{assessment_id} is already graded, confirmation required"
                )));
        }

        storage.delete_allocation(assessment_id).await?;
        info!("Manual allocation #{} deleted", assessment_id);
        Ok(AllocationResult::new(Self::ID, AllocationStatus::Ok)
            .with_message(format!("Allocation #{assessment_id} deleted")))
    }
}

#[async_trait::async_trait]
impl Allocator for ManualAllocator {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn init(
        &self,
        storage: &dyn Storage,
        workshop: &Workshop,
        options: Option<&serde_json::Value>,
    ) -> Result<AllocationResult> {
        let Some(options) = options else {
            return Ok(AllocationResult::void(Self::ID));
        };
        let action = match parse_options::<ManualAction>(Self::ID, options) {
            Ok(action) => action,
            Err(result) => return Ok(result),
        };

        match action {
            ManualAction::Add {
                reviewer_id,
                author_id,
            } => Self::add(storage, workshop, reviewer_id, author_id).await,
            ManualAction::Delete {
                assessment_id,
                confirm,
            } => Self::delete(storage, workshop, assessment_id, confirm).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::tests::{seed_workshop, submit};
    use serde_json::json;

    #[tokio::test]
    async fn test_no_options_is_void() {
        let (storage, workshop) = seed_workshop(&[1, 2]).await;
        let result = ManualAllocator.init(&storage, &workshop, None).await.unwrap();
        assert!(result.is_void());
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (storage, workshop) = seed_workshop(&[1, 2]).await;
        submit(&storage, &workshop, 1).await;
        let options = json!({ "action": "add", "reviewer_id": 2, "author_id": 1 });

        let first = ManualAllocator
            .init(&storage, &workshop, Some(&options))
            .await
            .unwrap();
        assert_eq!(first.status, AllocationStatus::Ok);
        assert_eq!(first.created.len(), 1);

        let second = ManualAllocator
            .init(&storage, &workshop, Some(&options))
            .await
            .unwrap();
        assert_eq!(second.status, AllocationStatus::Ok);
        assert!(second.created.is_empty());
        assert_eq!(storage.allocation_table(workshop.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_self_allocation_needs_self_assessment() {
        let (storage, workshop) = seed_workshop(&[1]).await;
        submit(&storage, &workshop, 1).await;
        let options = json!({ "action": "add", "reviewer_id": 1, "author_id": 1 });
        let result = ManualAllocator
            .init(&storage, &workshop, Some(&options))
            .await
            .unwrap();
        assert_eq!(result.status, AllocationStatus::Error);
    }

    #[tokio::test]
    async fn test_delete_graded_requires_confirmation() {
        let (storage, workshop) = seed_workshop(&[1, 2]).await;
        let submission = submit(&storage, &workshop, 1).await;
        let (assessment, _) = storage.add_allocation(submission.id, 2, 1).await.unwrap();
        storage
            .save_assessment(assessment.id, "accumulative", &[], Some(70.0), None)
            .await
            .unwrap();

        let options = json!({ "action": "delete", "assessment_id": assessment.id });
        let result = ManualAllocator
            .init(&storage, &workshop, Some(&options))
            .await
            .unwrap();
        assert_eq!(result.status, AllocationStatus::NeedSetup);
        assert!(storage.get_assessment(assessment.id).await.unwrap().is_some());

        let options = json!({ "action": "delete", "assessment_id": assessment.id, "confirm": true });
        let result = ManualAllocator
            .init(&storage, &workshop, Some(&options))
            .await
            .unwrap();
        assert_eq!(result.status, AllocationStatus::Ok);
        assert!(storage.get_assessment(assessment.id).await.unwrap().is_none());
    }
}
