use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use haven_core::{CommunityGate, PolicyDecision, TimeDistribution, WallPost, WallStats};
use haven_observability::AppMetrics;
use haven_storage::{WallError, WallRepository};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Wall posts live for one hour.
pub const WALL_POST_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("post rejected: {}", .0.reason.as_deref().unwrap_or("not allowed"))]
    Rejected(PolicyDecision),
    #[error("community wall is temporarily unavailable")]
    Unavailable,
    #[error("failed to save post")]
    SaveFailed,
}

/// Community wall orchestrator: gate, store, and read-time aggregation.
/// Reads fail soft; an unreachable store looks like an empty wall.
#[derive(Clone)]
pub struct WallService<S>
where
    S: WallRepository,
{
    gate: CommunityGate,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
    ttl_seconds: i64,
}

impl<S> WallService<S>
where
    S: WallRepository,
{
    pub fn new(gate: CommunityGate, store: Arc<S>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            gate,
            store,
            metrics,
            ttl_seconds: WALL_POST_TTL_SECONDS,
        }
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub async fn is_available(&self) -> bool {
        self.store.is_available().await
    }

    /// Empty-message validation happens here, before the gate, and is a
    /// distinct failure from a policy rejection.
    pub async fn submit_post(
        &self,
        message: &str,
        mood: Option<&str>,
    ) -> Result<WallPost, SubmitError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SubmitError::EmptyMessage);
        }

        let decision = self.gate.evaluate(message);
        if !decision.allowed {
            self.metrics.inc_wall_rejection();
            info!(
                reason = decision.reason.as_deref().unwrap_or_default(),
                "wall post rejected"
            );
            return Err(SubmitError::Rejected(decision));
        }

        let created_at = Utc::now();
        let post = WallPost {
            id: Uuid::new_v4().to_string(),
            message: message.to_string(),
            mood: mood
                .map(str::trim)
                .filter(|mood| !mood.is_empty())
                .unwrap_or("neutral")
                .to_string(),
            created_at,
            expires_at: created_at + Duration::seconds(self.ttl_seconds),
        };

        match self.store.put_post(&post, self.ttl_seconds).await {
            Ok(()) => {
                self.metrics.inc_wall_post();
                info!(post_id = %post.id, mood = %post.mood, "wall post created");
                Ok(post)
            }
            Err(WallError::Unavailable) => Err(SubmitError::Unavailable),
            Err(error) => {
                warn!(%error, "failed to save wall post");
                Err(SubmitError::SaveFailed)
            }
        }
    }

    pub async fn list_posts(&self) -> Vec<WallPost> {
        match self.store.list_posts().await {
            Ok(posts) => posts,
            Err(error) => {
                warn!(%error, "failed to list wall posts");
                Vec::new()
            }
        }
    }

    /// Derived from the current snapshot on every call; nothing is persisted.
    /// Time buckets are cumulative: a ten-minute-old post counts in all three.
    pub async fn stats(&self) -> WallStats {
        let posts = self.list_posts().await;
        let now = Utc::now();

        let mut mood_distribution: BTreeMap<String, u64> = BTreeMap::new();
        let mut time_distribution = TimeDistribution::default();

        for post in &posts {
            *mood_distribution.entry(post.mood.clone()).or_default() += 1;

            let minutes_ago = (now - post.created_at).num_minutes();
            if minutes_ago <= 15 {
                time_distribution.last_15_min += 1;
            }
            if minutes_ago <= 30 {
                time_distribution.last_30_min += 1;
            }
            if minutes_ago <= 60 {
                time_distribution.last_60_min += 1;
            }
        }

        WallStats {
            total_posts: posts.len() as u64,
            mood_distribution,
            time_distribution,
        }
    }

    pub async fn sweep(&self) -> u64 {
        match self.store.sweep_expired().await {
            Ok(removed) => removed,
            Err(error) => {
                warn!(%error, "wall sweep failed");
                0
            }
        }
    }
}
