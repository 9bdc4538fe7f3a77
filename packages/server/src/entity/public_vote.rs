use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "public_vote")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub entry_id: i32,
    #[sea_orm(belongs_to, from = "entry_id", to = "id")]
    pub entry: HasOne<super::entry::Entity>,

    /// Unique together with `entry_id`, see `database::ensure_indexes`.
    pub voter_id: i32,
    /// 1 to 5.
    pub score: f64,
    pub comment: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for common::PublicVote {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            entry_id: model.entry_id,
            voter_id: model.voter_id,
            score: model.score,
            comment: model.comment,
            created_at: model.created_at,
        }
    }
}
