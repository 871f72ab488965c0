mod content;
mod profile;
mod watch_record;

pub use content::{ContentItem, Episode, Rating};
pub use profile::{Profile, MAX_PROFILES_PER_ACCOUNT};
pub use watch_record::{
    CompletionSignal, ContentKind, Device, EpisodeRef, WatchKey, WatchRecord, COMPLETION_RATIO,
};
