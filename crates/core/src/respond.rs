use crate::models::{
    CrisisVerdict, EnvelopeKind, HelpResource, ResourceBundle, ResponseEnvelope, Severity,
};

/// Fixed safety copy for emergency turns. Never generated.
pub const EMERGENCY_MESSAGE: &str = "I'm really concerned about you right now. Your safety is \
     the most important thing. Please reach out to someone who can help immediately - whether \
     that's emergency services, a crisis helpline, or a trusted person in your life.";

/// Fixed supportive copy for non-emergency crisis turns.
pub const SUPPORT_MESSAGE: &str = "I hear that you're going through a really difficult time. \
     Thank you for sharing with me. While I'm here to listen, I want to make sure you have \
     access to professional support that can provide the help you deserve.";

pub fn emergency_resources() -> ResourceBundle {
    ResourceBundle {
        title: "Immediate Crisis Support".to_string(),
        message: "If you're in immediate danger, please contact emergency services or go to \
                  your nearest emergency room."
            .to_string(),
        entries: vec![
            resource(
                "National Suicide Prevention Lifeline (US)",
                "988 or 1-800-273-8255",
                "24/7",
            ),
            resource("Crisis Text Line", "Text HOME to 741741", "24/7"),
            resource(
                "International Association for Suicide Prevention",
                "https://www.iasp.info/resources/Crisis_Centres/",
                "Global resources",
            ),
        ],
    }
}

pub fn support_resources() -> ResourceBundle {
    ResourceBundle {
        title: "Mental Health Support".to_string(),
        message: "You're not alone. Here are some resources that can help:".to_string(),
        entries: vec![
            resource(
                "National Alliance on Mental Illness (NAMI)",
                "1-800-950-6264",
                "Mon-Fri 10AM-6PM ET",
            ),
            resource("SAMHSA National Helpline", "1-800-662-4357", "24/7"),
            resource("Crisis Text Line", "Text HOME to 741741", "24/7"),
        ],
    }
}

/// Builds the fixed response for a verdict, or `None` for low severity.
///
/// The composer trusts `verdict.severity` as handed to it; it never re-derives
/// severity from the flags.
pub fn compose_envelope(verdict: &CrisisVerdict) -> Option<ResponseEnvelope> {
    match verdict.severity {
        Severity::High => Some(ResponseEnvelope {
            kind: EnvelopeKind::Emergency,
            message: EMERGENCY_MESSAGE.to_string(),
            resources: emergency_resources(),
            bypass_generator: true,
        }),
        Severity::Medium => Some(ResponseEnvelope {
            kind: EnvelopeKind::Support,
            message: SUPPORT_MESSAGE.to_string(),
            resources: support_resources(),
            bypass_generator: false,
        }),
        Severity::Low => None,
    }
}

fn resource(name: &str, contact: &str, available: &str) -> HelpResource {
    HelpResource {
        name: name.to_string(),
        contact: contact.to_string(),
        available: available.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{CrisisDetector, KeywordCrisisDetector};

    #[test]
    fn high_severity_composes_emergency_bypass_envelope() {
        let verdict = KeywordCrisisDetector.classify("I want to die");
        let envelope = compose_envelope(&verdict).expect("emergency envelope");

        assert_eq!(envelope.kind, EnvelopeKind::Emergency);
        assert!(envelope.bypass_generator);
        assert_eq!(envelope.message, EMERGENCY_MESSAGE);
        assert_eq!(envelope.resources.entries.len(), 3);
    }

    #[test]
    fn medium_severity_composes_support_envelope() {
        let verdict = KeywordCrisisDetector.classify("everything feels hopeless");
        let envelope = compose_envelope(&verdict).expect("support envelope");

        assert_eq!(envelope.kind, EnvelopeKind::Support);
        assert!(!envelope.bypass_generator);
        assert_eq!(envelope.resources.title, "Mental Health Support");
    }

    #[test]
    fn low_severity_composes_nothing() {
        let verdict = KeywordCrisisDetector.classify("lovely weather today");
        assert!(compose_envelope(&verdict).is_none());
    }

    #[test]
    fn composer_trusts_the_verdict_severity() {
        // A hand-built verdict with inconsistent flags still resolves purely
        // on severity.
        let verdict = CrisisVerdict {
            has_crisis_content: true,
            is_emergency: true,
            matched_keywords: vec!["suicide".to_string()],
            severity: Severity::Medium,
        };

        let envelope = compose_envelope(&verdict).expect("envelope");
        assert_eq!(envelope.kind, EnvelopeKind::Support);
        assert!(!envelope.bypass_generator);
    }
}
