use results_core::PageWindow;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl From<&PageWindow> for Pagination {
    fn from(window: &PageWindow) -> Self {
        Self {
            page: window.current_page() as u64,
            per_page: window.items_per_page() as u64,
            total: window.total_items() as u64,
            total_pages: window.total_pages() as u64,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number. Pages past the end fall back to page 1.
    pub page: Option<u64>,
    /// Items per page, capped by the configured maximum.
    pub per_page: Option<u64>,
}

/// Validate a trimmed display name (1-256 Unicode characters).
pub fn validate_name(name: &str, field: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 256 {
        return Err(AppError::Validation(format!(
            "{field} must be 1-256 characters"
        )));
    }
    Ok(())
}

/// Validate an optional composition percentage (0-100 when present).
pub fn validate_percent(value: Option<f64>, field: &str) -> Result<(), AppError> {
    if let Some(value) = value
        && !(value.is_finite() && (0.0..=100.0).contains(&value))
    {
        return Err(AppError::Validation(format!(
            "{field} must be between 0 and 100"
        )));
    }
    Ok(())
}
