//! Per-entry averages of the judge and public scoring channels.
//!
//! Everything here is a pure function of its inputs.

use std::collections::HashMap;

use common::model::ProducerId;
use common::{Entry, EntryId, EntryStatus, JudgeScore, PublicVote};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Arithmetic mean rounded to one decimal place, half away from zero.
///
/// Returns `None` for an empty input: no records is never the same as an
/// average of zero. Non-finite values do not contribute.
pub fn average<I>(scores: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = Decimal::ZERO;
    let mut count = 0u32;
    for score in scores {
        if let Some(value) = to_decimal(score) {
            sum += value;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }

    let mean = sum / Decimal::from(count);
    Some(decimal_to_f64(
        mean.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
    ))
}

// Goes through the shortest decimal representation so that 85.25 is 85.25
// and not the nearest binary fraction.
fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    value.to_string().parse().ok()
}

fn decimal_to_f64(decimal: Decimal) -> f64 {
    decimal.to_string().parse().unwrap_or(0.0)
}

/// Derived summary of one entry's scores. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateView {
    pub entry_id: EntryId,
    /// `None` when no judge has scored the entry.
    pub judge_average: Option<f64>,
    pub judge_count: u32,
    /// `None` when nobody has voted for the entry.
    pub public_average: Option<f64>,
    pub public_count: u32,
}

impl AggregateView {
    /// Counts cover the same records as the averages: non-finite values are
    /// left out of both.
    pub fn from_scores(entry_id: EntryId, judge: &[f64], public: &[f64]) -> Self {
        Self {
            entry_id,
            judge_average: average(judge.iter().copied()),
            judge_count: count(judge),
            public_average: average(public.iter().copied()),
            public_count: count(public),
        }
    }
}

/// The display fields of an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub id: EntryId,
    pub name: String,
    pub category: String,
    pub producer_id: ProducerId,
    pub status: EntryStatus,
    pub thc_percent: Option<f64>,
    pub cbd_percent: Option<f64>,
}

impl From<&Entry> for EntrySummary {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            category: entry.category.clone(),
            producer_id: entry.producer_id,
            status: entry.status,
            thc_percent: entry.thc_percent,
            cbd_percent: entry.cbd_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryAggregate {
    pub entry: EntrySummary,
    pub view: AggregateView,
}

/// One aggregate per input entry, in input order.
///
/// Entries without any score or vote are kept with `None` averages. Records
/// whose entry is not in `entries` are ignored.
pub fn aggregate(
    entries: &[Entry],
    judge_scores: &[JudgeScore],
    public_votes: &[PublicVote],
) -> Vec<EntryAggregate> {
    let judge = group_by_entry(judge_scores.iter().map(|s| (s.entry_id, s.overall_score)));
    let public = group_by_entry(public_votes.iter().map(|v| (v.entry_id, v.score)));

    entries
        .iter()
        .map(|entry| EntryAggregate {
            entry: EntrySummary::from(entry),
            view: AggregateView::from_scores(
                entry.id,
                judge.get(&entry.id).map(Vec::as_slice).unwrap_or_default(),
                public.get(&entry.id).map(Vec::as_slice).unwrap_or_default(),
            ),
        })
        .collect()
}

/// An entry as shown in the entries list: public channel only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryListing {
    pub entry: EntrySummary,
    pub public_average: Option<f64>,
    pub public_count: u32,
}

/// Listings for `entries`, in input order.
pub fn listings(entries: &[Entry], public_votes: &[PublicVote]) -> Vec<EntryListing> {
    let public = group_by_entry(public_votes.iter().map(|v| (v.entry_id, v.score)));

    entries
        .iter()
        .map(|entry| {
            let scores = public.get(&entry.id).map(Vec::as_slice).unwrap_or_default();
            EntryListing {
                entry: EntrySummary::from(entry),
                public_average: average(scores.iter().copied()),
                public_count: count(scores),
            }
        })
        .collect()
}

fn count(scores: &[f64]) -> u32 {
    let finite = scores.iter().filter(|score| score.is_finite()).count();
    u32::try_from(finite).unwrap_or(u32::MAX)
}

fn group_by_entry(records: impl Iterator<Item = (EntryId, f64)>) -> HashMap<EntryId, Vec<f64>> {
    let mut grouped: HashMap<EntryId, Vec<f64>> = HashMap::new();
    for (entry_id, score) in records {
        grouped.entry(entry_id).or_default().push(score);
    }
    grouped
}
