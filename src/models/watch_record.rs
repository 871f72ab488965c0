use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fraction of the running time that counts as a full viewing
pub const COMPLETION_RATIO: f64 = 0.9;

/// Type of catalog content a record tracks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Movie,
    Series,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Series => "series",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(ContentKind::Movie),
            "series" => Some(ContentKind::Series),
            _ => None,
        }
    }
}

/// Device class reported by the player, informational only
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Desktop => "desktop",
            Device::Tablet => "tablet",
            Device::Mobile => "mobile",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "desktop" => Some(Device::Desktop),
            "tablet" => Some(Device::Tablet),
            "mobile" => Some(Device::Mobile),
            _ => None,
        }
    }
}

/// Identity of a watch record: one record per viewer/content pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WatchKey {
    pub account_id: Uuid,
    pub profile_id: Uuid,
    pub content_id: Uuid,
}

/// Pointer to the episode a series position refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EpisodeRef {
    pub season_number: u32,
    pub episode_number: u32,
    pub episode_id: Option<Uuid>,
}

/// Where the two completion inputs come from: an explicit caller assertion
/// (a "mark as watched" action) or a ratio derived from the report.
/// The caller assertion always wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionSignal {
    Explicit(bool),
    Derived(f64),
}

impl CompletionSignal {
    /// Builds the signal for one report. A zero or unknown total yields
    /// ratio 0, so an unknown duration can never derive completion.
    pub fn from_report(override_flag: Option<bool>, current_time: f64, effective_total: f64) -> Self {
        match override_flag {
            Some(explicit) => CompletionSignal::Explicit(explicit),
            None => {
                let ratio = if effective_total > 0.0 {
                    current_time / effective_total
                } else {
                    0.0
                };
                CompletionSignal::Derived(ratio)
            }
        }
    }

    /// Resolves the completion flag. Derived completion is monotone: a
    /// replay with a small position keeps an earlier completion; only an
    /// explicit `false` reverts it.
    pub fn resolve(&self, was_completed: bool) -> bool {
        match self {
            CompletionSignal::Explicit(explicit) => *explicit,
            CompletionSignal::Derived(ratio) => was_completed || *ratio >= COMPLETION_RATIO,
        }
    }
}

/// Durable per-(account, profile, content) viewing state.
///
/// Created on the first progress report for its key, mutated in place by
/// every later report, deleted only by an explicit clear-history action or
/// the catalog-removal cascade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub profile_id: Uuid,
    pub content_id: Uuid,
    /// Fixed from the catalog item at creation, never altered afterward
    pub content_kind: ContentKind,
    /// Seconds into the movie, or into the current episode for series
    pub watched_duration: f64,
    /// Denominator for the completion ratio; refreshed when a report
    /// supplies a new duration
    pub total_duration: f64,
    pub current_episode: Option<EpisodeRef>,
    /// Mirrors `watched_duration` for series
    pub episode_progress: f64,
    pub completed: bool,
    pub last_watched_at: DateTime<Utc>,
    /// Counter of reports received, not of plays
    pub watch_count: u64,
    pub device: Device,
}

impl WatchRecord {
    /// Initializes a record for the first report of a viewer/content pair.
    /// `watch_count` starts at zero; the merge of the creating report
    /// brings it to one.
    pub fn new(key: WatchKey, kind: ContentKind, total_duration: f64, device: Device) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: key.account_id,
            profile_id: key.profile_id,
            content_id: key.content_id,
            content_kind: kind,
            watched_duration: 0.0,
            total_duration,
            current_episode: None,
            episode_progress: 0.0,
            completed: false,
            last_watched_at: Utc::now(),
            watch_count: 0,
            device,
        }
    }

    pub fn key(&self) -> WatchKey {
        WatchKey {
            account_id: self.account_id,
            profile_id: self.profile_id,
            content_id: self.content_id,
        }
    }

    /// Merges one progress report into the record.
    ///
    /// Movies take the position directly. Series positions only move when
    /// the report identifies an episode; `watched_duration` is kept in sync
    /// with `episode_progress` so aggregate duration stats stay meaningful
    /// across content kinds. A report for a different episode repoints the
    /// record and restarts the episode progress at the reported position.
    pub fn merge_report(
        &mut self,
        current_time: f64,
        total_duration: Option<f64>,
        episode: Option<EpisodeRef>,
        signal: CompletionSignal,
        device: Option<Device>,
        now: DateTime<Utc>,
    ) {
        self.last_watched_at = now;
        self.watch_count += 1;
        if let Some(device) = device {
            self.device = device;
        }

        match self.content_kind {
            ContentKind::Movie => {
                self.watched_duration = current_time;
                if let Some(total) = total_duration {
                    self.total_duration = total;
                }
            }
            ContentKind::Series => {
                if let Some(episode) = episode {
                    self.current_episode = Some(episode);
                    self.episode_progress = current_time;
                    self.watched_duration = current_time;
                }
                // Without an episode pointer only the duration bookkeeping
                // moves; the stored position stays where it was.
                if let Some(total) = total_duration {
                    self.total_duration = total;
                }
            }
        }

        self.completed = signal.resolve(self.completed);
    }
}
