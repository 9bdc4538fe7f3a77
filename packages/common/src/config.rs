use std::time::Duration;

use serde::Deserialize;

/// How entries are ordered in contest results.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RankingRule {
    /// Judge average only.
    #[default]
    Judge,
    /// Public vote average only.
    Public,
    /// Weighted combination of both channels.
    Weighted,
}

/// Ranking configuration. Weights only apply to [`RankingRule::Weighted`].
#[derive(Debug, Deserialize, Clone)]
pub struct RankingConfig {
    #[serde(default)]
    pub rule: RankingRule,
    /// Weight of the judge average. Default: 0.5.
    #[serde(default = "default_weight")]
    pub judge_weight: f64,
    /// Weight of the public average, after scaling to the judge range. Default: 0.5.
    #[serde(default = "default_weight")]
    pub public_weight: f64,
}

fn default_weight() -> f64 {
    0.5
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            rule: RankingRule::default(),
            judge_weight: default_weight(),
            public_weight: default_weight(),
        }
    }
}

/// Results view configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ResultsConfig {
    /// Page size used when the caller does not ask for one. Default: 20.
    #[serde(default = "default_per_page")]
    pub default_per_page: u64,
    /// Largest page size a caller may ask for. Default: 100.
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u64,
    #[serde(default)]
    pub ranking: RankingConfig,
}

fn default_per_page() -> u64 {
    20
}
fn default_max_per_page() -> u64 {
    100
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            ranking: RankingConfig::default(),
        }
    }
}

/// Change-feed configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Prefix of per-contest channel names. Default: "contest-results".
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,
    /// Seconds without a read after which a contest watch is stopped.
    /// 0 keeps watches until shutdown. Default: 600.
    #[serde(default = "default_idle_watch_secs")]
    pub idle_watch_secs: u64,
}

fn default_channel_prefix() -> String {
    "contest-results".into()
}

fn default_idle_watch_secs() -> u64 {
    600
}

impl FeedConfig {
    /// Channel name used when watching the given contest.
    pub fn channel_for(&self, contest_id: i32) -> String {
        format!("{}-{}", self.channel_prefix, contest_id)
    }

    /// How long an unread contest watch is kept, if it is evicted at all.
    pub fn idle_watch_timeout(&self) -> Option<Duration> {
        (self.idle_watch_secs > 0).then(|| Duration::from_secs(self.idle_watch_secs))
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            channel_prefix: default_channel_prefix(),
            idle_watch_secs: default_idle_watch_secs(),
        }
    }
}
