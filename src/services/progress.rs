use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::context::ViewerContext;
use crate::db::{CatalogStore, WatchStore};
use crate::error::{AppError, AppResult};
use crate::models::{CompletionSignal, Device, EpisodeRef, WatchKey, WatchRecord};

/// One progress report from a player
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressReport {
    /// Seconds into the movie or the reported episode
    pub current_time: f64,
    /// Running time as the player currently knows it
    #[serde(default)]
    pub total_duration: Option<f64>,
    /// Which episode the position refers to, series only
    #[serde(default)]
    pub episode: Option<EpisodeRef>,
    #[serde(default)]
    pub device: Option<Device>,
    /// Explicit completion assertion ("mark as watched"); overrides the
    /// derived ratio in both directions
    #[serde(default)]
    pub completed: Option<bool>,
}

/// Ingests one progress report: the single writer of watch state.
///
/// Looks up the catalog item, creates or merges the viewer's record, and
/// bumps the catalog view count exactly once when the record transitions
/// into completed. The view-count bump is best effort; its failure is
/// logged and never rolls back the already-persisted record.
pub async fn record_progress(
    watch: &dyn WatchStore,
    catalog: &dyn CatalogStore,
    viewer: &ViewerContext,
    content_id: Uuid,
    report: ProgressReport,
) -> AppResult<WatchRecord> {
    if !report.current_time.is_finite() || report.current_time < 0.0 {
        return Err(AppError::InvalidInput(
            "current_time must be a non-negative number of seconds".to_string(),
        ));
    }
    // A zero or negative total carries no information; treat it as absent
    let supplied_total = report.total_duration.filter(|t| t.is_finite() && *t > 0.0);

    let content = catalog
        .get(content_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Content not found".to_string()))?;

    let key = WatchKey {
        account_id: viewer.account_id,
        profile_id: viewer.profile_id,
        content_id,
    };

    let mut record = match watch.find(&key).await? {
        Some(record) => record,
        None => WatchRecord::new(
            key,
            content.kind,
            supplied_total.or(content.duration).unwrap_or(0.0),
            report.device.unwrap_or_default(),
        ),
    };

    // Captured before the merge so the transition below fires exactly once
    let was_completed = record.completed;

    let effective_total = supplied_total.unwrap_or(record.total_duration);
    let signal = CompletionSignal::from_report(report.completed, report.current_time, effective_total);

    record.merge_report(
        report.current_time,
        supplied_total,
        report.episode,
        signal,
        report.device,
        Utc::now(),
    );

    let record = watch.upsert(record).await?;

    if !was_completed && record.completed {
        if let Err(e) = catalog.increment_view_count(content_id).await {
            tracing::error!(
                error = %e,
                content_id = %content_id,
                "View count increment failed after completion"
            );
        }
    }

    tracing::info!(
        account_id = %viewer.account_id,
        profile_id = %viewer.profile_id,
        content_id = %content_id,
        current_time = report.current_time,
        completed = record.completed,
        "Watch progress updated"
    );

    Ok(record)
}
