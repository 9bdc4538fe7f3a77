use common::EntryStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entry")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub contest_id: i32,
    #[sea_orm(belongs_to, from = "contest_id", to = "id")]
    pub contest: HasOne<super::contest::Entity>,

    pub producer_id: i32,
    pub name: String,
    pub category: String,

    /// Lab-reported composition, in percent.
    pub thc_percent: Option<f64>,
    pub cbd_percent: Option<f64>,
    pub terpene_percent: Option<f64>,

    pub status: EntryStatus,

    #[sea_orm(has_many)]
    pub judge_scores: HasMany<super::judge_score::Entity>,
    #[sea_orm(has_many)]
    pub public_votes: HasMany<super::public_vote::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for common::Entry {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            contest_id: model.contest_id,
            producer_id: model.producer_id,
            name: model.name,
            category: model.category,
            thc_percent: model.thc_percent,
            cbd_percent: model.cbd_percent,
            terpene_percent: model.terpene_percent,
            status: model.status,
        }
    }
}
