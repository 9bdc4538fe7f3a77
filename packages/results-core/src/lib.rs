pub mod aggregation;
pub mod error;
pub mod live;
pub mod loader;
pub mod pagination;
pub mod ranking;

pub use aggregation::{AggregateView, EntryAggregate, EntryListing, EntrySummary, average};
pub use error::{LoadError, WatchError};
pub use live::{
    ContestMembership, ContestViews, ResultsWatcher, ViewKind, ViewSnapshot, WatchPhase,
    WatchStatus,
};
pub use loader::ResultsLoader;
pub use pagination::{
    Page, PageMarker, PageWindow, Paginator, page_numbers, paginate, paginate_at,
};
pub use ranking::{RankedEntry, RankingStrategy, rank, strategy_for};
