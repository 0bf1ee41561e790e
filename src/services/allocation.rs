//! 分配流程：依次运行全部分配器，手动分配器最后运行

use chrono::Utc;
use tracing::{info, warn};

use super::{WorkshopService, ensure_permitted};
use crate::errors::Result;
use crate::events::WorkshopEvent;
use crate::models::allocation::{
    entities::AllocationStatus,
    requests::AllocationRequest,
    responses::{AllocationPage, ManualView},
};
use crate::models::context::RequestContext;
use crate::strategies::allocation::ManualAllocator;
use crate::strategies::registry;
use crate::workflow::phase::WorkshopOperation;

pub async fn run_allocation_pass(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    req: AllocationRequest,
) -> Result<AllocationPage> {
    let workshop = service.current_workshop(workshop_id, Utc::now()).await?;
    ensure_permitted(&workshop, WorkshopOperation::Allocate)?;
    let storage = service.storage();

    let mut other_results = vec![];
    let mut manual_result = None;
    for allocator in registry::allocators() {
        let result = allocator
            .init(storage, &workshop, req.option(allocator.id()))
            .await?;
        if result.is_void() {
            if allocator.id() != ManualAllocator::ID {
                continue;
            }
        } else {
            match result.status {
                AllocationStatus::Ok => info!(
                    "Allocator {} on workshop {} by user {}: {:?}",
                    result.allocator, workshop_id, ctx.user_id, result.message
                ),
                _ => warn!(
                    "Allocator {} on workshop {} finished with status {}: {:?}",
                    result.allocator,
                    workshop_id,
                    result.status.as_str(),
                    result.message
                ),
            }
            service.publish(WorkshopEvent::AllocationExecuted {
                workshop_id,
                allocator: result.allocator.clone(),
                status: result.status,
                created: result.created.len(),
            });
        }

        if allocator.id() == ManualAllocator::ID {
            manual_result = Some(result);
        } else {
            other_results.push(result);
        }
    }

    let priority_message = other_results
        .iter()
        .find(|r| r.status != AllocationStatus::Ok)
        .and_then(|r| r.message.clone());

    let manual = match manual_result {
        Some(result) if !result.is_void() => ManualView::Result { result },
        _ => ManualView::Table {
            rows: storage.allocation_table(workshop_id).await?,
        },
    };

    Ok(AllocationPage {
        other_results,
        manual,
        priority_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tests::{seeded, submit_all, teacher};
    use crate::workflow::phase::Phase;
    use serde_json::json;

    #[tokio::test]
    async fn test_no_options_shows_table() {
        let (service, workshop) = seeded(&[1, 2]).await;
        let submissions = submit_all(&service, &workshop, &[1]).await;
        service.storage().add_allocation(submissions[0].id, 2, 1).await.unwrap();

        let page = service
            .run_allocation_pass(&teacher(), workshop.id, AllocationRequest::default())
            .await
            .unwrap();
        assert!(page.other_results.is_empty());
        assert_eq!(page.priority_message, None);
        match page.manual {
            ManualView::Table { rows } => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].author_id, Some(1));
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_random_and_manual_in_one_pass() {
        let (service, workshop) = seeded(&[1, 2, 3]).await;
        submit_all(&service, &workshop, &[1, 2, 3]).await;

        let req = AllocationRequest::default()
            .with_option("random", json!({ "num_of_reviews": 1, "num_per": "per_submission", "seed": 11 }))
            .with_option("manual", json!({ "action": "add", "reviewer_id": 1, "author_id": 1 }));
        let page = service
            .run_allocation_pass(&teacher(), workshop.id, req)
            .await
            .unwrap();

        assert_eq!(page.other_results.len(), 1);
        assert_eq!(page.other_results[0].status, AllocationStatus::Ok);
        assert_eq!(page.other_results[0].created.len(), 3);
        assert_eq!(page.priority_message, None);
        // 未启用自评，手动添加自评被拒绝
        match page.manual {
            ManualView::Result { result } => assert_eq!(result.status, AllocationStatus::Error),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_becomes_priority_message() {
        let (service, workshop) = seeded(&[1, 2]).await;
        let req = AllocationRequest::default()
            .with_option("random", json!({ "num_of_reviews": 1, "num_per": "per_submission" }));
        let page = service
            .run_allocation_pass(&teacher(), workshop.id, req)
            .await
            .unwrap();
        assert_eq!(
            page.priority_message.as_deref(),
            Some("There are no submissions to allocate")
        );
    }

    #[tokio::test]
    async fn test_allocation_closed_in_evaluation() {
        let (service, workshop) = seeded(&[1]).await;
        service.switch_phase(&teacher(), workshop.id, Phase::Assessment).await.unwrap();
        service.switch_phase(&teacher(), workshop.id, Phase::Evaluation).await.unwrap();
        let result = service
            .run_allocation_pass(&teacher(), workshop.id, AllocationRequest::default())
            .await;
        assert!(matches!(result, Err(crate::errors::WorkshopError::PhaseViolation(_))));
    }
}
