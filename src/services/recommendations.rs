use std::collections::HashSet;

use crate::context::ViewerContext;
use crate::db::{CatalogStore, ProfileStore, WatchStore};
use crate::error::AppResult;
use crate::models::ContentItem;

use super::CatalogSummary;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 20;

/// How much recent history feeds the affinity profile
const HISTORY_SAMPLE: usize = 50;
const TOP_GENRE_COUNT: usize = 3;

/// Counts a genre, preserving first-encounter order so that equal counts
/// rank deterministically.
fn count_genre(counts: &mut Vec<(String, u32)>, genre: &str) {
    match counts.iter_mut().find(|(g, _)| g == genre) {
        Some((_, n)) => *n += 1,
        None => counts.push((genre.to_string(), 1)),
    }
}

fn ranking_rating(item: &ContentItem) -> f64 {
    item.rating.imdb.unwrap_or(f64::NEG_INFINITY)
}

/// Genre-affinity recommendations for a profile.
///
/// The affinity is a plain frequency count over the genres of recently
/// watched items; an item with three genres contributes one count to each.
/// Watch duration and recency carry no weight. Candidates are active
/// catalog items the profile has neither watched nor liked that match one
/// of the top genres, ranked by IMDb rating and then popularity. Without
/// any history or likes there is no signal, and no signal means no
/// recommendations rather than a popularity fallback.
pub async fn recommendations(
    watch: &dyn WatchStore,
    catalog: &dyn CatalogStore,
    profiles: &dyn ProfileStore,
    viewer: &ViewerContext,
    limit: usize,
) -> AppResult<Vec<CatalogSummary>> {
    let liked = profiles
        .get_liked(viewer.account_id, viewer.profile_id)
        .await?;

    let recent = watch
        .list_recent(viewer.account_id, viewer.profile_id, HISTORY_SAMPLE)
        .await?;

    let mut watched_ids: HashSet<uuid::Uuid> = HashSet::new();
    let mut genre_counts: Vec<(String, u32)> = Vec::new();
    for record in &recent {
        // Items gone from the catalog contribute neither affinity nor
        // exclusion; inactive ones still shape the affinity profile
        let Some(content) = catalog.get(record.content_id).await? else {
            continue;
        };
        watched_ids.insert(content.id);
        for genre in &content.genres {
            count_genre(&mut genre_counts, genre);
        }
    }

    // Stable sort: equal counts keep encounter order
    genre_counts.sort_by(|a, b| b.1.cmp(&a.1));
    let top_genres: Vec<String> = genre_counts
        .into_iter()
        .take(TOP_GENRE_COUNT)
        .map(|(genre, _)| genre)
        .collect();

    if top_genres.is_empty() && liked.is_empty() {
        tracing::debug!(
            account_id = %viewer.account_id,
            profile_id = %viewer.profile_id,
            "No watch history or likes, returning no recommendations"
        );
        return Ok(Vec::new());
    }

    let mut candidates: Vec<ContentItem> = catalog
        .list_active()
        .await?
        .into_iter()
        .filter(|item| {
            !watched_ids.contains(&item.id)
                && !liked.contains(&item.id)
                && item.matches_any_genre(&top_genres)
        })
        .collect();

    candidates.sort_by(|a, b| {
        ranking_rating(b)
            .partial_cmp(&ranking_rating(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.view_count.cmp(&a.view_count))
    });
    candidates.truncate(limit);

    Ok(candidates.iter().map(CatalogSummary::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::db::{MemoryCatalog, MemoryProfileStore, MemoryWatchStore, WatchStore};
    use crate::models::{ContentKind, Device, WatchKey, WatchRecord};

    struct Fixture {
        watch: MemoryWatchStore,
        catalog: MemoryCatalog,
        profiles: MemoryProfileStore,
        viewer: ViewerContext,
        profile_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let profiles = MemoryProfileStore::new();
        let account_id = Uuid::new_v4();
        let profile = profiles
            .create_profile(account_id, "main".to_string(), false)
            .await
            .unwrap();
        Fixture {
            watch: MemoryWatchStore::new(),
            catalog: MemoryCatalog::new(),
            profiles,
            viewer: ViewerContext {
                account_id,
                profile_id: profile.id,
            },
            profile_id: profile.id,
        }
    }

    async fn seed_item(
        fixture: &Fixture,
        title: &str,
        genres: &[&str],
        imdb: Option<f64>,
        view_count: u64,
    ) -> Uuid {
        let mut item = ContentItem::new(
            title,
            ContentKind::Movie,
            genres.iter().map(|g| g.to_string()).collect(),
        );
        item.rating.imdb = imdb;
        item.view_count = view_count;
        let id = item.id;
        fixture.catalog.insert(item).await;
        id
    }

    async fn watch_item(fixture: &Fixture, content_id: Uuid) {
        let key = WatchKey {
            account_id: fixture.viewer.account_id,
            profile_id: fixture.viewer.profile_id,
            content_id,
        };
        let record = WatchRecord::new(key, ContentKind::Movie, 100.0, Device::Desktop);
        fixture.watch.upsert(record).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_signal_yields_empty() {
        let fixture = fixture().await;
        seed_item(&fixture, "Popular", &["Drama"], Some(9.0), 1000).await;

        let recs = recommendations(
            &fixture.watch,
            &fixture.catalog,
            &fixture.profiles,
            &fixture.viewer,
            20,
        )
        .await
        .unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn test_excludes_watched_and_liked() {
        let fixture = fixture().await;
        let watched = seed_item(&fixture, "Seen", &["Drama"], Some(8.0), 10).await;
        let liked = seed_item(&fixture, "Loved", &["Drama"], Some(9.0), 10).await;
        let fresh = seed_item(&fixture, "New", &["Drama"], Some(7.0), 10).await;

        watch_item(&fixture, watched).await;
        fixture
            .profiles
            .toggle_like(fixture.profile_id, liked)
            .await
            .unwrap();

        let recs = recommendations(
            &fixture.watch,
            &fixture.catalog,
            &fixture.profiles,
            &fixture.viewer,
            20,
        )
        .await
        .unwrap();
        let ids: Vec<Uuid> = recs.iter().map(|r| r.content_id).collect();
        assert_eq!(ids, vec![fresh]);
    }

    #[tokio::test]
    async fn test_favors_dominant_genre() {
        let fixture = fixture().await;
        // Five dramas and one comedy in the history
        for i in 0..5 {
            let id = seed_item(&fixture, &format!("Drama {}", i), &["Drama"], None, 0).await;
            watch_item(&fixture, id).await;
        }
        let comedy = seed_item(&fixture, "One Comedy", &["Comedy"], None, 0).await;
        watch_item(&fixture, comedy).await;

        let drama_pick = seed_item(&fixture, "Fresh Drama", &["Drama"], Some(7.0), 0).await;
        let comedy_pick = seed_item(&fixture, "Fresh Comedy", &["Comedy"], Some(7.0), 0).await;
        let western = seed_item(&fixture, "Fresh Western", &["Western"], Some(9.9), 0).await;

        let recs = recommendations(
            &fixture.watch,
            &fixture.catalog,
            &fixture.profiles,
            &fixture.viewer,
            20,
        )
        .await
        .unwrap();
        let ids: Vec<Uuid> = recs.iter().map(|r| r.content_id).collect();

        // Both top-2 genres qualify, the unrelated genre never does
        assert!(ids.contains(&drama_pick));
        assert!(ids.contains(&comedy_pick));
        assert!(!ids.contains(&western));
    }

    #[tokio::test]
    async fn test_top_three_genres_cap() {
        let fixture = fixture().await;
        // Genre frequencies: Drama 4, Crime 3, Thriller 2, Comedy 1
        let weights = [("Drama", 4), ("Crime", 3), ("Thriller", 2), ("Comedy", 1)];
        for (genre, count) in weights {
            for i in 0..count {
                let id =
                    seed_item(&fixture, &format!("{} {}", genre, i), &[genre], None, 0).await;
                watch_item(&fixture, id).await;
            }
        }

        let comedy_pick = seed_item(&fixture, "Fresh Comedy", &["Comedy"], Some(9.0), 100).await;
        let thriller_pick = seed_item(&fixture, "Fresh Thriller", &["Thriller"], None, 0).await;

        let recs = recommendations(
            &fixture.watch,
            &fixture.catalog,
            &fixture.profiles,
            &fixture.viewer,
            20,
        )
        .await
        .unwrap();
        let ids: Vec<Uuid> = recs.iter().map(|r| r.content_id).collect();

        // Comedy is the fourth genre and falls outside the affinity
        assert!(ids.contains(&thriller_pick));
        assert!(!ids.contains(&comedy_pick));
    }

    #[tokio::test]
    async fn test_ranked_by_rating_then_popularity() {
        let fixture = fixture().await;
        let seen = seed_item(&fixture, "Seen", &["Drama"], None, 0).await;
        watch_item(&fixture, seen).await;

        let low = seed_item(&fixture, "Low", &["Drama"], Some(6.0), 500).await;
        let high = seed_item(&fixture, "High", &["Drama"], Some(9.0), 1).await;
        let mid_popular = seed_item(&fixture, "Mid popular", &["Drama"], Some(7.5), 900).await;
        let mid_quiet = seed_item(&fixture, "Mid quiet", &["Drama"], Some(7.5), 3).await;
        let unrated = seed_item(&fixture, "Unrated", &["Drama"], None, 9999).await;

        let recs = recommendations(
            &fixture.watch,
            &fixture.catalog,
            &fixture.profiles,
            &fixture.viewer,
            20,
        )
        .await
        .unwrap();
        let ids: Vec<Uuid> = recs.iter().map(|r| r.content_id).collect();
        assert_eq!(ids, vec![high, mid_popular, mid_quiet, low, unrated]);
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let fixture = fixture().await;
        let seen = seed_item(&fixture, "Seen", &["Drama"], None, 0).await;
        watch_item(&fixture, seen).await;
        for i in 0..10 {
            seed_item(&fixture, &format!("Pick {}", i), &["Drama"], Some(5.0), i).await;
        }

        let recs = recommendations(
            &fixture.watch,
            &fixture.catalog,
            &fixture.profiles,
            &fixture.viewer,
            4,
        )
        .await
        .unwrap();
        assert_eq!(recs.len(), 4);
    }

    #[tokio::test]
    async fn test_liked_only_profile_gets_no_genre_matches() {
        // Likes gate the early return but contribute no affinity weight,
        // so a profile with likes and no history still gets nothing
        let fixture = fixture().await;
        let liked = seed_item(&fixture, "Loved", &["Drama"], Some(9.0), 10).await;
        seed_item(&fixture, "Other Drama", &["Drama"], Some(8.0), 10).await;
        fixture
            .profiles
            .toggle_like(fixture.profile_id, liked)
            .await
            .unwrap();

        let recs = recommendations(
            &fixture.watch,
            &fixture.catalog,
            &fixture.profiles,
            &fixture.viewer,
            20,
        )
        .await
        .unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn test_inactive_items_never_recommended() {
        let fixture = fixture().await;
        let seen = seed_item(&fixture, "Seen", &["Drama"], None, 0).await;
        watch_item(&fixture, seen).await;

        let mut pulled = ContentItem::new("Pulled", ContentKind::Movie, vec!["Drama".into()]);
        pulled.is_active = false;
        pulled.rating.imdb = Some(9.9);
        let pulled_id = pulled.id;
        fixture.catalog.insert(pulled).await;

        let recs = recommendations(
            &fixture.watch,
            &fixture.catalog,
            &fixture.profiles,
            &fixture.viewer,
            20,
        )
        .await
        .unwrap();
        assert!(recs.iter().all(|r| r.content_id != pulled_id));
    }
}
