use std::collections::HashSet;

use common::{ChangeEvent, ChangeKind, ContestId, EntryId, Row, Table};
use serde::Serialize;

/// A cached view that a change can make stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Ranked results, both scoring channels.
    Results,
    /// Entry listing with public averages.
    Entries,
}

impl ViewKind {
    /// Every view of a contest.
    pub const ALL: &'static [ViewKind] = &[ViewKind::Results, ViewKind::Entries];
}

const NONE: &[ViewKind] = &[];
const RESULTS: &[ViewKind] = &[ViewKind::Results];
const ALL: &[ViewKind] = ViewKind::ALL;

/// Entry ids known to belong to the watched contest.
///
/// Scores and votes carry no contest reference, so membership is what decides
/// whether their changes concern the contest.
#[derive(Debug, Clone)]
pub struct ContestMembership {
    contest_id: ContestId,
    entries: HashSet<EntryId>,
}

impl ContestMembership {
    pub fn new(contest_id: ContestId) -> Self {
        Self {
            contest_id,
            entries: HashSet::new(),
        }
    }

    pub fn contest_id(&self) -> ContestId {
        self.contest_id
    }

    /// Merge the initial snapshot of entry ids.
    pub fn prime(&mut self, entry_ids: impl IntoIterator<Item = EntryId>) {
        self.entries.extend(entry_ids);
    }

    pub fn contains(&self, entry_id: EntryId) -> bool {
        self.entries.contains(&entry_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold one change into the membership and return the views it makes stale.
    pub fn apply(&mut self, event: &ChangeEvent) -> &'static [ViewKind] {
        match event.table {
            Table::Entries => {
                self.apply_entry_change(event);
                ALL
            }
            Table::JudgeScores => self.if_member(event, RESULTS),
            Table::PublicVotes => self.if_member(event, ALL),
        }
    }

    fn apply_entry_change(&mut self, event: &ChangeEvent) {
        match (event.kind, &event.new_row, &event.old_row) {
            (ChangeKind::Insert | ChangeKind::Update, Some(Row::Entry(entry)), _) => {
                if entry.contest_id == self.contest_id {
                    self.entries.insert(entry.id);
                } else {
                    self.entries.remove(&entry.id);
                }
            }
            (ChangeKind::Delete, _, Some(Row::Entry(entry))) => {
                self.entries.remove(&entry.id);
            }
            _ => {}
        }
    }

    fn if_member(&self, event: &ChangeEvent, views: &'static [ViewKind]) -> &'static [ViewKind] {
        let touches_member = event
            .new_row
            .iter()
            .chain(event.old_row.iter())
            .any(|row| self.contains(row.entry_id()));
        if touches_member { views } else { NONE }
    }
}
