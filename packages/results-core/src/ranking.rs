//! Combined ranking of aggregated entries.
//!
//! How the judge and public channels combine is a contest setting, so the
//! ordering is a pluggable [`RankingStrategy`] rather than a fixed formula.

use std::cmp::Ordering;
use std::sync::Arc;

use common::config::{RankingConfig, RankingRule};
use common::model::{JUDGE_SCORE_RANGE, PUBLIC_VOTE_RANGE};
use serde::Serialize;

use crate::aggregation::{AggregateView, EntryAggregate, EntrySummary};

pub trait RankingStrategy: Send + Sync {
    /// Stable identifier, e.g. for logs and API responses.
    fn name(&self) -> &'static str;

    /// The value entries are ranked by, higher is better. `None` means the
    /// entry cannot be ranked yet and sorts after every ranked entry.
    fn score(&self, view: &AggregateView) -> Option<f64>;

    fn compare(&self, a: &AggregateView, b: &AggregateView) -> Ordering {
        match (self.score(a), self.score(b)) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Ranks by judge average.
#[derive(Debug, Clone, Copy, Default)]
pub struct JudgeAverage;

impl RankingStrategy for JudgeAverage {
    fn name(&self) -> &'static str {
        "judge"
    }

    fn score(&self, view: &AggregateView) -> Option<f64> {
        view.judge_average
    }
}

/// Ranks by public vote average.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicAverage;

impl RankingStrategy for PublicAverage {
    fn name(&self) -> &'static str {
        "public"
    }

    fn score(&self, view: &AggregateView) -> Option<f64> {
        view.public_average
    }
}

/// Weighted combination of both channels on the judge scale.
///
/// The public average is rescaled from the vote range onto the judge range
/// before weighting. When only one channel has data, that channel alone is
/// used; when neither has, the entry is unranked.
#[derive(Debug, Clone, Copy)]
pub struct Weighted {
    pub judge_weight: f64,
    pub public_weight: f64,
}

impl Weighted {
    pub fn new(judge_weight: f64, public_weight: f64) -> Self {
        Self {
            judge_weight: judge_weight.max(0.0),
            public_weight: public_weight.max(0.0),
        }
    }

    fn rescale_public(value: f64) -> f64 {
        let (lo, hi) = (*PUBLIC_VOTE_RANGE.start(), *PUBLIC_VOTE_RANGE.end());
        let (out_lo, out_hi) = (*JUDGE_SCORE_RANGE.start(), *JUDGE_SCORE_RANGE.end());
        out_lo + (value - lo) / (hi - lo) * (out_hi - out_lo)
    }
}

impl RankingStrategy for Weighted {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn score(&self, view: &AggregateView) -> Option<f64> {
        let judge = view.judge_average.map(|v| (v, self.judge_weight));
        let public = view
            .public_average
            .map(|v| (Self::rescale_public(v), self.public_weight));

        let (total, weight) = judge
            .into_iter()
            .chain(public)
            .fold((0.0, 0.0), |(total, weight), (v, w)| (total + v * w, weight + w));

        (weight > 0.0).then(|| total / weight)
    }
}

/// Resolve the configured rule into a strategy.
pub fn strategy_for(config: &RankingConfig) -> Arc<dyn RankingStrategy> {
    match config.rule {
        RankingRule::Judge => Arc::new(JudgeAverage),
        RankingRule::Public => Arc::new(PublicAverage),
        RankingRule::Weighted => Arc::new(Weighted::new(config.judge_weight, config.public_weight)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    /// 1-based; entries that compare equal share a rank (1, 1, 3).
    /// `None` for entries the strategy cannot score.
    pub rank: Option<u32>,
    pub score: Option<f64>,
    pub entry: EntrySummary,
    pub view: AggregateView,
}

/// Order entries by `strategy`.
///
/// Only entries in a ranked status take part. The sort is stable, so
/// entries that tie keep their input order.
pub fn rank(aggregates: Vec<EntryAggregate>, strategy: &dyn RankingStrategy) -> Vec<RankedEntry> {
    let mut ranked: Vec<EntryAggregate> = aggregates
        .into_iter()
        .filter(|aggregate| aggregate.entry.status.is_ranked())
        .collect();
    ranked.sort_by(|a, b| strategy.compare(&a.view, &b.view));

    let mut result: Vec<RankedEntry> = Vec::with_capacity(ranked.len());
    for (position, aggregate) in ranked.into_iter().enumerate() {
        let score = strategy.score(&aggregate.view);
        let rank = match result.last() {
            _ if score.is_none() => None,
            Some(previous)
                if strategy.compare(&previous.view, &aggregate.view) == Ordering::Equal =>
            {
                previous.rank
            }
            _ => Some(position as u32 + 1),
        };
        result.push(RankedEntry {
            rank,
            score,
            entry: aggregate.entry,
            view: aggregate.view,
        });
    }
    result
}
