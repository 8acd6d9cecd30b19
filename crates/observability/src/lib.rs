use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// In-process counters only; nothing here is persisted or shipped anywhere.
#[derive(Debug, Default)]
pub struct AppMetrics {
    chat_turns_total: AtomicU64,
    crisis_turns_total: AtomicU64,
    emergency_bypass_total: AtomicU64,
    responder_fallback_total: AtomicU64,
    wall_posts_total: AtomicU64,
    wall_rejections_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub chat_turns_total: u64,
    pub crisis_turns_total: u64,
    pub emergency_bypass_total: u64,
    pub responder_fallback_total: u64,
    pub wall_posts_total: u64,
    pub wall_rejections_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_chat_turn(&self) {
        self.chat_turns_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_crisis_turn(&self) {
        self.crisis_turns_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_emergency_bypass(&self) {
        self.emergency_bypass_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_responder_fallback(&self) {
        self.responder_fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_wall_post(&self) {
        self.wall_posts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_wall_rejection(&self) {
        self.wall_rejections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let turns = self.chat_turns_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            chat_turns_total: turns,
            crisis_turns_total: self.crisis_turns_total.load(Ordering::Relaxed),
            emergency_bypass_total: self.emergency_bypass_total.load(Ordering::Relaxed),
            responder_fallback_total: self.responder_fallback_total.load(Ordering::Relaxed),
            wall_posts_total: self.wall_posts_total.load(Ordering::Relaxed),
            wall_rejections_total: self.wall_rejections_total.load(Ordering::Relaxed),
            avg_latency_millis: if turns == 0 {
                0.0
            } else {
                latency as f64 / turns as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,haven_api=info,haven_agents=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
