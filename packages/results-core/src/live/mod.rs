//! Live invalidation of cached contest views.
//!
//! A [`ResultsWatcher`] listens to the change feed for one contest and marks
//! the affected [`ContestViews`] stale. It never recomputes anything itself;
//! readers do that through the loader when they find a view stale.

mod membership;
mod views;
mod watcher;

pub use membership::{ContestMembership, ViewKind};
pub use views::{ContestViews, ViewSnapshot};
pub use watcher::{ResultsWatcher, WatchPhase, WatchStatus};
