pub mod config;
pub mod entry_status;
pub mod event;
pub mod model;
pub mod signed_url;
pub mod store;

pub use entry_status::EntryStatus;
pub use event::{ChangeEvent, ChangeKind, ChannelStatus, Row, SubscriptionSpec, Table};
pub use model::{ContestId, Entry, EntryId, JudgeScore, PublicVote};
pub use store::{ContestStore, StoreError};
