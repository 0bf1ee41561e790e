//! 参与者存储操作

use super::{SeaOrmStorage, commit, db_err};
use crate::entity::participants::{ActiveModel, Column, Entity as Participants};
use crate::errors::Result;
use crate::models::participants::{entities::Participant, requests::ParticipantInput};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 以传入名单为准同步参与者：更新已有、插入新增、删除缺席
    pub async fn sync_participants_impl(
        &self,
        workshop_id: i64,
        participants: Vec<ParticipantInput>,
    ) -> Result<Vec<Participant>> {
        let txn = self.begin().await?;

        let existing = Participants::find()
            .filter(Column::WorkshopId.eq(workshop_id))
            .all(&txn)
            .await
            .map_err(db_err("查询参与者"))?;

        let incoming: std::collections::HashSet<i64> =
            participants.iter().map(|p| p.user_id).collect();
        let stale: Vec<i64> = existing
            .iter()
            .filter(|m| !incoming.contains(&m.user_id))
            .map(|m| m.id)
            .collect();
        if !stale.is_empty() {
            Participants::delete_many()
                .filter(Column::Id.is_in(stale))
                .exec(&txn)
                .await
                .map_err(db_err("删除参与者"))?;
        }

        for input in participants {
            let current = existing.iter().find(|m| m.user_id == input.user_id);
            let mut model = ActiveModel {
                workshop_id: Set(workshop_id),
                user_id: Set(input.user_id),
                username: Set(input.username),
                firstname: Set(input.firstname),
                lastname: Set(input.lastname),
                group_id: Set(input.group_id),
                role: Set(input.role.to_string()),
                ..Default::default()
            };
            match current {
                Some(m) => {
                    model.id = Set(m.id);
                    model.update(&txn).await.map_err(db_err("更新参与者"))?;
                }
                None => {
                    model.insert(&txn).await.map_err(db_err("创建参与者"))?;
                }
            }
        }

        let result = Participants::find()
            .filter(Column::WorkshopId.eq(workshop_id))
            .order_by_asc(Column::UserId)
            .all(&txn)
            .await
            .map_err(db_err("查询参与者"))?;
        commit(txn).await?;

        Ok(result.into_iter().map(|m| m.into_participant()).collect())
    }

    /// 列出参与者，按用户 ID 排序
    pub async fn list_participants_impl(&self, workshop_id: i64) -> Result<Vec<Participant>> {
        let result = Participants::find()
            .filter(Column::WorkshopId.eq(workshop_id))
            .order_by_asc(Column::UserId)
            .all(&self.db)
            .await
            .map_err(db_err("查询参与者"))?;
        Ok(result.into_iter().map(|m| m.into_participant()).collect())
    }

    pub async fn get_participant_impl(
        &self,
        workshop_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>> {
        let result = Participants::find()
            .filter(Column::WorkshopId.eq(workshop_id))
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err("查询参与者"))?;
        Ok(result.map(|m| m.into_participant()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{seed_workshop, student};
    use crate::models::participants::entities::ParticipantRole;

    #[tokio::test]
    async fn test_sync_replaces_roster() {
        let (storage, workshop) = seed_workshop(&[1, 2, 3]).await;

        let mut teacher = student(9, None);
        teacher.role = ParticipantRole::Manager;
        let synced = storage
            .sync_participants_impl(workshop.id, vec![student(2, Some(7)), teacher])
            .await
            .unwrap();

        let ids: Vec<i64> = synced.iter().map(|p| p.user_id).collect();
        assert_eq!(ids, vec![2, 9]);
        assert_eq!(synced[0].group_id, Some(7));
        assert_eq!(synced[1].role, ParticipantRole::Manager);
        assert!(
            storage
                .get_participant_impl(workshop.id, 1)
                .await
                .unwrap()
                .is_none()
        );
    }
}
