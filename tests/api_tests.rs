use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::json;
use uuid::Uuid;

use playhead_api::db::{
    CatalogStore, MemoryCatalog, MemoryProfileStore, MemoryWatchStore, ProfileStore,
};
use playhead_api::models::{ContentItem, ContentKind};
use playhead_api::routes::create_router;
use playhead_api::state::AppState;

struct TestApp {
    server: TestServer,
    catalog: MemoryCatalog,
    profiles: MemoryProfileStore,
    account_id: Uuid,
    profile_id: Uuid,
}

fn create_test_app() -> TestApp {
    let catalog = MemoryCatalog::new();
    let profiles = MemoryProfileStore::new();
    let state = AppState::new(
        Arc::new(MemoryWatchStore::new()),
        Arc::new(catalog.clone()),
        Arc::new(profiles.clone()),
    );
    let server = TestServer::new(create_router(state)).unwrap();

    TestApp {
        server,
        catalog,
        profiles,
        account_id: Uuid::new_v4(),
        profile_id: Uuid::new_v4(),
    }
}

fn account_header(app: &TestApp) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-account-id"),
        HeaderValue::from_str(&app.account_id.to_string()).unwrap(),
    )
}

fn profile_header(app: &TestApp) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-profile-id"),
        HeaderValue::from_str(&app.profile_id.to_string()).unwrap(),
    )
}

async fn seed_movie(app: &TestApp, title: &str, genres: &[&str], duration: f64) -> Uuid {
    let mut item = ContentItem::new(
        title,
        ContentKind::Movie,
        genres.iter().map(|g| g.to_string()).collect(),
    );
    item.duration = Some(duration);
    let id = item.id;
    app.catalog.insert(item).await;
    id
}

async fn post_progress(app: &TestApp, content_id: Uuid, body: serde_json::Value) -> serde_json::Value {
    let (account_name, account_value) = account_header(app);
    let (profile_name, profile_value) = profile_header(app);
    let response = app
        .server
        .post(&format!("/api/v1/watch/{}/progress", content_id))
        .add_header(account_name, account_value)
        .add_header(profile_name, profile_value)
        .json(&body)
        .await;
    response.assert_status_ok();
    response.json()
}

async fn get_json(app: &TestApp, path: &str) -> serde_json::Value {
    let (account_name, account_value) = account_header(app);
    let (profile_name, profile_value) = profile_header(app);
    let response = app
        .server
        .get(path)
        .add_header(account_name, account_value)
        .add_header(profile_name, profile_value)
        .await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let response = app.server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_requests_without_viewer_headers_are_unauthorized() {
    let app = create_test_app();
    let response = app.server.get("/api/v1/watch/history").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_viewer_header_is_bad_request() {
    let app = create_test_app();
    let response = app
        .server
        .get("/api/v1/watch/history")
        .add_header(
            HeaderName::from_static("x-account-id"),
            HeaderValue::from_static("not-a-uuid"),
        )
        .add_header(
            HeaderName::from_static("x-profile-id"),
            HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_progress_for_unknown_content_is_not_found() {
    let app = create_test_app();
    let (account_name, account_value) = account_header(&app);
    let (profile_name, profile_value) = profile_header(&app);
    let response = app
        .server
        .post(&format!("/api/v1/watch/{}/progress", Uuid::new_v4()))
        .add_header(account_name, account_value)
        .add_header(profile_name, profile_value)
        .json(&json!({ "current_time": 10.0 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_progress_completion_and_view_count_flow() {
    let app = create_test_app();
    let content_id = seed_movie(&app, "Heist Night", &["Crime"], 60.0).await;

    let record = post_progress(&app, content_id, json!({ "current_time": 30.0 })).await;
    assert_eq!(record["watched_duration"], 30.0);
    assert_eq!(record["completed"], false);
    assert_eq!(record["watch_count"], 1);

    // 54/60 crosses the completion threshold
    let record = post_progress(&app, content_id, json!({ "current_time": 54.0 })).await;
    assert_eq!(record["completed"], true);
    let item = app.catalog.get(content_id).await.unwrap().unwrap();
    assert_eq!(item.view_count, 1);

    // Staying completed must not bump the view count again
    let record = post_progress(&app, content_id, json!({ "current_time": 58.0 })).await;
    assert_eq!(record["completed"], true);
    assert_eq!(record["watch_count"], 3);
    let item = app.catalog.get(content_id).await.unwrap().unwrap();
    assert_eq!(item.view_count, 1);
}

#[tokio::test]
async fn test_continue_watching_orders_and_limits() {
    let app = create_test_app();
    let first = seed_movie(&app, "Watched First", &["Drama"], 100.0).await;
    let second = seed_movie(&app, "Watched Second", &["Drama"], 100.0).await;

    post_progress(&app, first, json!({ "current_time": 10.0 })).await;
    post_progress(&app, second, json!({ "current_time": 20.0 })).await;

    let shelf = get_json(&app, "/api/v1/watch/continue").await;
    let entries = shelf.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["content"]["title"], "Watched Second");
    assert_eq!(entries[1]["content"]["title"], "Watched First");

    let shelf = get_json(&app, "/api/v1/watch/continue?limit=1").await;
    let entries = shelf.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["content"]["title"], "Watched Second");
}

#[tokio::test]
async fn test_history_pagination_shape() {
    let app = create_test_app();
    for i in 0..3 {
        let content_id = seed_movie(&app, &format!("Movie {}", i), &["Drama"], 100.0).await;
        post_progress(&app, content_id, json!({ "current_time": 5.0 })).await;
    }

    let page = get_json(&app, "/api/v1/watch/history?page=1&page_size=2").await;
    assert_eq!(page["entries"].as_array().unwrap().len(), 2);
    assert_eq!(page["pagination"]["total"], 3);
    assert_eq!(page["pagination"]["pages"], 2);
    // Newest first
    assert_eq!(page["entries"][0]["content"]["title"], "Movie 2");
}

#[tokio::test]
async fn test_delete_watch_record_is_idempotent() {
    let app = create_test_app();
    let content_id = seed_movie(&app, "Short Lived", &["Drama"], 100.0).await;
    post_progress(&app, content_id, json!({ "current_time": 10.0 })).await;

    let (account_name, account_value) = account_header(&app);
    let (profile_name, profile_value) = profile_header(&app);
    let response = app
        .server
        .delete(&format!("/api/v1/watch/{}", content_id))
        .add_header(account_name.clone(), account_value.clone())
        .add_header(profile_name.clone(), profile_value.clone())
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    // Deleting again still succeeds
    let response = app
        .server
        .delete(&format!("/api/v1/watch/{}", content_id))
        .add_header(account_name, account_value)
        .add_header(profile_name, profile_value)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let shelf = get_json(&app, "/api/v1/watch/continue").await;
    assert!(shelf.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_stats_summary_shape() {
    let app = create_test_app();
    let movie = seed_movie(&app, "Long One", &["Drama"], 100.0).await;
    post_progress(&app, movie, json!({ "current_time": 95.0 })).await;
    let other = seed_movie(&app, "Other", &["Comedy"], 100.0).await;
    post_progress(&app, other, json!({ "current_time": 40.0 })).await;

    let stats = get_json(&app, "/api/v1/watch/stats").await;
    assert_eq!(stats["summary"]["total_watched"], 2);
    assert_eq!(stats["summary"]["total_completed"], 1);
    assert_eq!(stats["summary"]["total_duration"], 135.0);
    assert_eq!(stats["daily"].as_array().unwrap().len(), 2);
    assert_eq!(stats["by_genre"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_recommendations_follow_watch_history() {
    let app = create_test_app();
    let watched = seed_movie(&app, "Seen Drama", &["Drama"], 100.0).await;
    post_progress(&app, watched, json!({ "current_time": 10.0 })).await;

    seed_movie(&app, "Fresh Drama", &["Drama"], 100.0).await;
    seed_movie(&app, "Fresh Western", &["Western"], 100.0).await;

    let recs = get_json(&app, "/api/v1/recommendations").await;
    let titles: Vec<&str> = recs
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Fresh Drama"]);
}

#[tokio::test]
async fn test_recommendations_exclude_liked_and_empty_without_signal() {
    let app = create_test_app();

    // No history, no likes: no signal
    let recs = get_json(&app, "/api/v1/recommendations").await;
    assert!(recs.as_array().unwrap().is_empty());

    // Liked items are excluded from results and carry no affinity weight
    let profile = app
        .profiles
        .create_profile(app.account_id, "main".to_string(), false)
        .await
        .unwrap();
    let app = TestApp {
        profile_id: profile.id,
        ..app
    };
    let liked = seed_movie(&app, "Loved Drama", &["Drama"], 100.0).await;
    app.profiles.toggle_like(profile.id, liked).await.unwrap();
    seed_movie(&app, "Fresh Drama", &["Drama"], 100.0).await;

    let recs = get_json(&app, "/api/v1/recommendations").await;
    assert!(recs.as_array().unwrap().is_empty());

    // Once there is history, liked items stay excluded
    let watched = seed_movie(&app, "Seen Drama", &["Drama"], 100.0).await;
    post_progress(&app, watched, json!({ "current_time": 10.0 })).await;

    let recs = get_json(&app, "/api/v1/recommendations").await;
    let titles: Vec<&str> = recs
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Fresh Drama"));
    assert!(!titles.contains(&"Loved Drama"));
}

#[tokio::test]
async fn test_series_progress_tracks_episode_pointer() {
    let app = create_test_app();
    let mut item = ContentItem::new("Nightfall", ContentKind::Series, vec!["Drama".to_string()]);
    item.is_active = true;
    let content_id = item.id;
    app.catalog.insert(item).await;

    let record = post_progress(
        &app,
        content_id,
        json!({
            "current_time": 300.0,
            "total_duration": 2700.0,
            "episode": { "season_number": 1, "episode_number": 2, "episode_id": null }
        }),
    )
    .await;
    assert_eq!(record["current_episode"]["episode_number"], 2);
    assert_eq!(record["episode_progress"], 300.0);

    let record = post_progress(
        &app,
        content_id,
        json!({
            "current_time": 30.0,
            "episode": { "season_number": 1, "episode_number": 3, "episode_id": null }
        }),
    )
    .await;
    assert_eq!(record["current_episode"]["episode_number"], 3);
    assert_eq!(record["episode_progress"], 30.0);
}
