use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on viewing profiles per account, checked at creation time
pub const MAX_PROFILES_PER_ACCOUNT: usize = 5;

/// A viewing profile under an account.
///
/// Profiles are stored as their own keyed records with a foreign reference
/// to the account rather than embedded in it; the per-account cap is an
/// application-level invariant enforced by the profile store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub is_kids: bool,
    /// Content ids this profile marked as liked
    pub liked_content: HashSet<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(account_id: Uuid, name: impl Into<String>, is_kids: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            name: name.into(),
            is_kids,
            liked_content: HashSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn likes(&self, content_id: Uuid) -> bool {
        self.liked_content.contains(&content_id)
    }

    /// Flips the liked mark for a content id; returns the new state.
    pub fn toggle_like(&mut self, content_id: Uuid) -> bool {
        if !self.liked_content.remove(&content_id) {
            self.liked_content.insert(content_id);
            true
        } else {
            false
        }
    }
}
