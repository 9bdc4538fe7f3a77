use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::{judge_score, public_vote};

/// Connect with the given pool size and bring the schema up to date.
pub async fn init_db(db_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    sync_schema(&db).await?;

    Ok(db)
}

/// Create or migrate every table registered under `server::entity`.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("server::entity::*")
        .sync(db)
        .await
}

/// Ensure the one-record-per-author indexes exist.
///
/// Score and vote writes are upserts keyed on these indexes, so a judge has
/// at most one score and a voter at most one vote per entry.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    let indexes = [
        (
            "idx_judge_score_judge_entry",
            Index::create()
                .if_not_exists()
                .unique()
                .name("idx_judge_score_judge_entry")
                .table(judge_score::Entity)
                .col(judge_score::Column::JudgeId)
                .col(judge_score::Column::EntryId)
                .to_owned(),
        ),
        (
            "idx_public_vote_voter_entry",
            Index::create()
                .if_not_exists()
                .unique()
                .name("idx_public_vote_voter_entry")
                .table(public_vote::Entity)
                .col(public_vote::Column::VoterId)
                .col(public_vote::Column::EntryId)
                .to_owned(),
        ),
    ];

    for (name, index) in indexes {
        match db.execute_raw(backend.build(&index)).await {
            Ok(_) => info!(index = name, "Ensured index exists"),
            Err(e) => {
                warn!(index = name, error = %e, "Failed to create index");
                return Err(e);
            }
        }
    }

    Ok(())
}
