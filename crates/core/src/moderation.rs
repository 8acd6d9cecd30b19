use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::detect::{CrisisDetector, KeywordCrisisDetector};
use crate::models::PolicyDecision;

/// Upper bound on a wall post, counted in grapheme clusters of the trimmed
/// message.
pub const MAX_POST_CHARS: usize = 500;

/// Spam, solicitation, and contact-sharing signals. A single hit rejects the
/// post.
static INAPPROPRIATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)spam",
        r"(?i)advertisement",
        r"(?i)buy now",
        r"(?i)click here",
        r"(?i)www\.",
        r"(?i)http",
        r"(?i)\.com",
        r"(?i)personal information",
        r"(?i)phone number",
        r"(?i)address",
        r"(?i)meet me",
        r"(?i)location",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static moderation pattern"))
    .collect()
});

/// Decides whether a message may be posted publicly. Rule order is part of
/// the contract: the first failing rule supplies the reason.
#[derive(Clone)]
pub struct CommunityGate {
    detector: Arc<dyn CrisisDetector>,
}

impl CommunityGate {
    pub fn new(detector: Arc<dyn CrisisDetector>) -> Self {
        Self { detector }
    }

    /// Total over every string input, including empty text; empty-message
    /// validation belongs to the caller, not the gate.
    pub fn evaluate(&self, message: &str) -> PolicyDecision {
        let verdict = self.detector.classify(message);
        if verdict.has_crisis_content {
            return PolicyDecision::reject(
                "Crisis content should be handled privately through chat",
                "Please use the private chat feature for personal support",
            );
        }

        if INAPPROPRIATE_PATTERNS
            .iter()
            .any(|pattern| pattern.is_match(message))
        {
            return PolicyDecision::reject(
                "Contains potentially inappropriate content",
                "Please keep posts supportive and relevant to mental health",
            );
        }

        if message.trim().graphemes(true).count() > MAX_POST_CHARS {
            return PolicyDecision::reject(
                "Message too long",
                "Please keep community posts under 500 characters",
            );
        }

        PolicyDecision::allow()
    }
}

impl Default for CommunityGate {
    fn default() -> Self {
        Self::new(Arc::new(KeywordCrisisDetector))
    }
}
