use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ContentKind;

/// External ratings attached to a catalog item
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub imdb: Option<f64>,
    pub rotten_tomatoes: Option<f64>,
}

/// One episode of a series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub season_number: u32,
    pub episode_number: u32,
    pub title: String,
    /// Running time in seconds
    pub duration: f64,
    pub thumbnail_url: Option<String>,
}

/// Catalog item as seen by this service.
///
/// The catalog itself is owned elsewhere; this is the shape the watch and
/// recommendation engines consume, and `view_count` is the only field they
/// ever mutate (through the catalog collaborator).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    pub kind: ContentKind,
    pub genres: Vec<String>,
    pub release_year: Option<i32>,
    /// Nominal running time in seconds, movies only
    pub duration: Option<f64>,
    pub rating: Rating,
    pub view_count: u64,
    pub is_active: bool,
    pub thumbnail_url: Option<String>,
    pub episodes: Vec<Episode>,
}

impl ContentItem {
    pub fn new(title: impl Into<String>, kind: ContentKind, genres: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            kind,
            genres,
            release_year: None,
            duration: None,
            rating: Rating::default(),
            view_count: 0,
            is_active: true,
            thumbnail_url: None,
            episodes: Vec::new(),
        }
    }

    /// Art to show on a shelf: the item's own thumbnail, or the first
    /// episode's when an older series entry only carries episode-level art.
    pub fn display_thumbnail(&self) -> Option<&str> {
        self.thumbnail_url
            .as_deref()
            .or_else(|| self.episodes.first().and_then(|ep| ep.thumbnail_url.as_deref()))
    }

    pub fn matches_any_genre(&self, genres: &[String]) -> bool {
        self.genres.iter().any(|g| genres.contains(g))
    }
}
