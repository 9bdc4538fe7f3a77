use chrono::{DateTime, Utc};
use common::EntryStatus;
use serde::{Deserialize, Serialize};

use super::shared::{validate_name, validate_percent};
use crate::entity::{contest, entry};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateContestRequest {
    #[schema(example = "Harvest Cup 2026")]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEntryRequest {
    pub producer_id: i32,
    #[schema(example = "Lemon Haze")]
    pub name: String,
    #[schema(example = "flower")]
    pub category: String,
    pub thc_percent: Option<f64>,
    pub cbd_percent: Option<f64>,
    pub terpene_percent: Option<f64>,
    /// Defaults to `draft`.
    pub status: Option<EntryStatus>,
}

pub fn validate_create_contest(req: &CreateContestRequest) -> Result<(), AppError> {
    validate_name(&req.name, "Name")
}

pub fn validate_create_entry(req: &CreateEntryRequest) -> Result<(), AppError> {
    validate_name(&req.name, "Name")?;
    validate_name(&req.category, "Category")?;
    validate_percent(req.thc_percent, "THC percent")?;
    validate_percent(req.cbd_percent, "CBD percent")?;
    validate_percent(req.terpene_percent, "Terpene percent")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContestResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<contest::Model> for ContestResponse {
    fn from(m: contest::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EntryResponse {
    pub id: i32,
    pub contest_id: i32,
    pub producer_id: i32,
    pub name: String,
    pub category: String,
    pub thc_percent: Option<f64>,
    pub cbd_percent: Option<f64>,
    pub terpene_percent: Option<f64>,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<entry::Model> for EntryResponse {
    fn from(m: entry::Model) -> Self {
        Self {
            id: m.id,
            contest_id: m.contest_id,
            producer_id: m.producer_id,
            name: m.name,
            category: m.category,
            thc_percent: m.thc_percent,
            cbd_percent: m.cbd_percent,
            terpene_percent: m.terpene_percent,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
