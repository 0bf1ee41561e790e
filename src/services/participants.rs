//! 参与者名单同步

use std::collections::HashSet;
use tracing::info;

use super::WorkshopService;
use crate::errors::{Result, WorkshopError};
use crate::models::context::RequestContext;
use crate::models::participants::{entities::Participant, requests::SyncParticipantsRequest};

/// 以 LMS 推送的名单整体替换
pub async fn sync_participants(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    req: SyncParticipantsRequest,
) -> Result<Vec<Participant>> {
    service.load_workshop(workshop_id).await?;

    let mut seen = HashSet::new();
    for participant in &req.participants {
        if !seen.insert(participant.user_id) {
            return Err(WorkshopError::validation(format!(
                "用户 {} 在名单中重复",
                participant.user_id
            )));
        }
    }

    let participants = service
        .storage()
        .sync_participants(workshop_id, req.participants)
        .await?;
    info!(
        "Workshop {} roster synced by user {}: {} participant(s)",
        workshop_id,
        ctx.user_id,
        participants.len()
    );
    Ok(participants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tests::{seeded, teacher};
    use crate::storage::sea_orm_storage::tests::student;

    #[tokio::test]
    async fn test_duplicate_user_rejected() {
        let (service, workshop) = seeded(&[1]).await;
        let req = SyncParticipantsRequest {
            participants: vec![student(2, None), student(2, Some(1))],
        };
        let result = service.sync_participants(&teacher(), workshop.id, req).await;
        assert!(matches!(result, Err(WorkshopError::Validation(_))));

        // 原名单不变
        let roster = service.storage().list_participants(workshop.id).await.unwrap();
        assert_eq!(roster.len(), 1);
    }

    #[tokio::test]
    async fn test_sync_unknown_workshop() {
        let (service, _) = seeded(&[]).await;
        let req = SyncParticipantsRequest { participants: vec![] };
        let result = service.sync_participants(&teacher(), 404, req).await;
        assert!(matches!(result, Err(WorkshopError::NotFound(_))));
    }
}
