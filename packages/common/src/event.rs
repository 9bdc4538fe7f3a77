use serde::{Deserialize, Serialize};

use crate::model::{ContestId, Entry, EntryId, JudgeScore, PublicVote};

/// Tables that emit change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Entries,
    JudgeScores,
    PublicVotes,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entries => "entries",
            Self::JudgeScores => "judge_scores",
            Self::PublicVotes => "public_votes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Which change kinds a subscription receives. `All` is the `"*"` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFilter {
    #[default]
    #[serde(rename = "*")]
    All,
    #[serde(untagged)]
    Only(ChangeKind),
}

impl EventFilter {
    pub fn accepts(&self, kind: ChangeKind) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => *expected == kind,
        }
    }
}

/// A typed row carried by a change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", content = "row", rename_all = "snake_case")]
pub enum Row {
    Entry(Entry),
    JudgeScore(JudgeScore),
    PublicVote(PublicVote),
}

impl Row {
    pub fn table(&self) -> Table {
        match self {
            Self::Entry(_) => Table::Entries,
            Self::JudgeScore(_) => Table::JudgeScores,
            Self::PublicVote(_) => Table::PublicVotes,
        }
    }

    /// The contest the row belongs to. Only entries carry a contest reference;
    /// scores and votes must be resolved through their entry.
    pub fn contest_id(&self) -> Option<ContestId> {
        match self {
            Self::Entry(entry) => Some(entry.contest_id),
            Self::JudgeScore(_) | Self::PublicVote(_) => None,
        }
    }

    /// The entry the row describes or refers to.
    pub fn entry_id(&self) -> EntryId {
        match self {
            Self::Entry(entry) => entry.id,
            Self::JudgeScore(score) => score.entry_id,
            Self::PublicVote(vote) => vote.entry_id,
        }
    }
}

/// A single insert, update or delete observed on a table.
///
/// Inserts carry only `new_row`, deletes only `old_row`. Updates carry
/// `new_row` and, when the transport provides it, `old_row`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub new_row: Option<Row>,
    pub old_row: Option<Row>,
}

impl ChangeEvent {
    pub fn inserted(row: Row) -> Self {
        Self {
            table: row.table(),
            kind: ChangeKind::Insert,
            new_row: Some(row),
            old_row: None,
        }
    }

    pub fn updated(old_row: Option<Row>, new_row: Row) -> Self {
        Self {
            table: new_row.table(),
            kind: ChangeKind::Update,
            new_row: Some(new_row),
            old_row,
        }
    }

    pub fn deleted(row: Row) -> Self {
        Self {
            table: row.table(),
            kind: ChangeKind::Delete,
            new_row: None,
            old_row: Some(row),
        }
    }

    /// The new row when present, otherwise the old one.
    pub fn row(&self) -> Option<&Row> {
        self.new_row.as_ref().or(self.old_row.as_ref())
    }
}

/// Server-side row filter applied by the transport before delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFilter {
    Contest(ContestId),
}

impl RowFilter {
    /// A row matches when its contest reference equals the filter. Rows that
    /// carry no contest reference never match.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Contest(contest_id) => row.contest_id() == Some(*contest_id),
        }
    }
}

/// What a subscription listens to: `{table, event, filter?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSpec {
    pub table: Table,
    #[serde(default)]
    pub event: EventFilter,
    pub filter: Option<RowFilter>,
}

impl SubscriptionSpec {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            event: EventFilter::All,
            filter: None,
        }
    }

    pub fn with_event(mut self, event: EventFilter) -> Self {
        self.event = event;
        self
    }

    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Whether the event should be delivered to this subscription.
    ///
    /// For filtered subscriptions an update matches if either side matches,
    /// so a row moving out of the filter is still observed.
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table || !self.event.accepts(event.kind) {
            return false;
        }
        match &self.filter {
            None => true,
            Some(filter) => event
                .new_row
                .iter()
                .chain(event.old_row.iter())
                .any(|row| filter.matches(row)),
        }
    }
}

/// Connection status reported by the change-feed transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ChannelStatus {
    Subscribed,
    ChannelError(String),
    TimedOut,
    Closed,
}

impl ChannelStatus {
    /// Live updates are flowing.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Subscribed)
    }

    /// The channel will not recover on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
