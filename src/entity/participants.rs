//! 工作坊参与者实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workshop_participants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub workshop_id: i64,
    pub user_id: i64,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub group_id: Option<i64>,
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workshops::Entity",
        from = "Column::WorkshopId",
        to = "super::workshops::Column::Id"
    )]
    Workshop,
}

impl Related<super::workshops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workshop.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_participant(self) -> crate::models::participants::entities::Participant {
        use crate::models::participants::entities::{Participant, ParticipantRole};

        Participant {
            id: self.id,
            workshop_id: self.workshop_id,
            user_id: self.user_id,
            username: self.username,
            firstname: self.firstname,
            lastname: self.lastname,
            group_id: self.group_id,
            role: self
                .role
                .parse::<ParticipantRole>()
                .unwrap_or(ParticipantRole::Student),
        }
    }
}
