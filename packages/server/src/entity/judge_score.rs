use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "judge_score")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub entry_id: i32,
    #[sea_orm(belongs_to, from = "entry_id", to = "id")]
    pub entry: HasOne<super::entry::Entity>,

    /// Unique together with `entry_id`, see `database::ensure_indexes`.
    pub judge_id: i32,
    /// 0 to 100.
    pub overall_score: f64,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for common::JudgeScore {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            entry_id: model.entry_id,
            judge_id: model.judge_id,
            overall_score: model.overall_score,
            created_at: model.created_at,
        }
    }
}
