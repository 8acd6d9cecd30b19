use std::sync::Arc;
use std::time::{Duration, Instant};

use haven_core::{compose_envelope, ChatTurn, CrisisDetector, KeywordCrisisDetector};
use haven_observability::AppMetrics;
use haven_responder::TextResponder;
use tracing::{info, instrument, warn};

/// Fixed reply substituted when the external responder fails or times out.
/// A chat turn always produces something user-visible.
pub const FALLBACK_REPLY: &str = "I'm having trouble responding right now. Please try again \
     in a moment - I'm still here, and what you're feeling still matters.";

pub const DEFAULT_RESPONDER_TIMEOUT: Duration = Duration::from_secs(12);

/// End-to-end chat turn orchestrator: classify, compose, then either return
/// the fixed emergency copy or consult the text responder.
#[derive(Clone)]
pub struct CompanionAgent<R>
where
    R: TextResponder,
{
    detector: Arc<dyn CrisisDetector>,
    responder: Arc<R>,
    metrics: Arc<AppMetrics>,
    responder_timeout: Duration,
}

impl<R> CompanionAgent<R>
where
    R: TextResponder,
{
    pub fn new(responder: Arc<R>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            detector: Arc::new(KeywordCrisisDetector),
            responder,
            metrics,
            responder_timeout: DEFAULT_RESPONDER_TIMEOUT,
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn CrisisDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_responder_timeout(mut self, timeout: Duration) -> Self {
        self.responder_timeout = timeout;
        self
    }

    pub fn responder_name(&self) -> &'static str {
        self.responder.name()
    }

    /// Classification always runs first; which branch follows depends only on
    /// the composed envelope. Emergency turns never reach the responder.
    #[instrument(skip(self, text))]
    pub async fn handle_turn(&self, text: &str) -> ChatTurn {
        let started = Instant::now();
        self.metrics.inc_chat_turn();

        let verdict = self.detector.classify(text);
        if verdict.has_crisis_content {
            self.metrics.inc_crisis_turn();
        }

        let turn = match compose_envelope(&verdict) {
            Some(envelope) if envelope.bypass_generator => {
                self.metrics.inc_emergency_bypass();
                ChatTurn {
                    reply: envelope.message,
                    crisis: true,
                    emergency: true,
                    resources: Some(envelope.resources),
                    degraded: false,
                }
            }
            Some(envelope) => {
                let (generated, degraded) = self.generate_or_fallback(text).await;
                ChatTurn {
                    reply: format!("{}\n\n{}", envelope.message, generated),
                    crisis: true,
                    emergency: false,
                    resources: Some(envelope.resources),
                    degraded,
                }
            }
            None => {
                let (generated, degraded) = self.generate_or_fallback(text).await;
                ChatTurn {
                    reply: generated,
                    crisis: false,
                    emergency: false,
                    resources: None,
                    degraded,
                }
            }
        };

        self.metrics.observe_latency(started.elapsed());
        info!(
            crisis = turn.crisis,
            emergency = turn.emergency,
            degraded = turn.degraded,
            severity = verdict.severity.as_str(),
            "chat turn handled"
        );

        turn
    }

    async fn generate_or_fallback(&self, text: &str) -> (String, bool) {
        match tokio::time::timeout(self.responder_timeout, self.responder.generate(text)).await {
            Ok(Ok(reply)) => (reply, false),
            Ok(Err(error)) => {
                self.metrics.inc_responder_fallback();
                warn!(%error, responder = self.responder.name(), "responder failed, substituting fallback reply");
                (FALLBACK_REPLY.to_string(), true)
            }
            Err(_) => {
                self.metrics.inc_responder_fallback();
                warn!(responder = self.responder.name(), "responder timed out, substituting fallback reply");
                (FALLBACK_REPLY.to_string(), true)
            }
        }
    }
}
