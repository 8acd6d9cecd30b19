use crate::models::CrisisVerdict;

/// Phrases that flag a message as crisis-adjacent. Matched keywords are
/// reported in table order, one entry per keyword.
pub const CRISIS_KEYWORDS: &[&str] = &[
    "suicide",
    "suicidal",
    "kill myself",
    "end my life",
    "want to die",
    "self harm",
    "self-harm",
    "hurt myself",
    "cutting",
    "overdose",
    "panic attack",
    "panic",
    "anxiety attack",
    "can't breathe",
    "anxious",
    "hopeless",
    "worthless",
    "nobody cares",
    "better off dead",
    "abuse",
    "domestic violence",
    "being hurt",
    "unsafe",
    "crisis",
    "emergency",
    "help me",
    "desperate",
];

/// Strict subset of [`CRISIS_KEYWORDS`] denoting acute self-harm intent.
pub const EMERGENCY_KEYWORDS: &[&str] = &[
    "suicide",
    "suicidal",
    "kill myself",
    "end my life",
    "want to die",
    "overdose",
    "self harm",
    "cutting",
    "hurt myself",
];

/// Strategy seam for crisis classification. The default implementation is
/// plain substring containment; callers only depend on this trait, so a
/// tokenizing or model-backed matcher can be swapped in without touching them.
pub trait CrisisDetector: Send + Sync {
    fn classify(&self, text: &str) -> CrisisVerdict;
}

/// Case-insensitive substring matcher over the fixed keyword tables.
///
/// No stemming, no tokenization, no negation handling: matching is
/// intentionally permissive, so "crisis averted" still flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordCrisisDetector;

impl CrisisDetector for KeywordCrisisDetector {
    fn classify(&self, text: &str) -> CrisisVerdict {
        let lower = text.to_lowercase();

        let matched_keywords = CRISIS_KEYWORDS
            .iter()
            .filter(|keyword| lower.contains(**keyword))
            .map(|keyword| keyword.to_string())
            .collect();

        let is_emergency = EMERGENCY_KEYWORDS
            .iter()
            .any(|keyword| lower.contains(*keyword));

        CrisisVerdict::from_matches(matched_keywords, is_emergency)
    }
}
