use rand::seq::IndexedRandom;

use crate::{ResponderError, TextResponder};

/// Keyword-matched supportive replies, checked in order; first hit wins.
const SCRIPTED_REPLIES: &[(&[&str], &str)] = &[
    (
        &["sad", "depressed"],
        "I hear that you're feeling really down right now. It's okay to feel sad - your \
         emotions are valid. Sometimes just acknowledging these feelings can be the first step \
         toward healing.",
    ),
    (
        &["anxious", "worried", "anxiety"],
        "Anxiety can feel overwhelming, but you're not alone in this. Take a deep breath with \
         me. What you're experiencing is real, and there are ways to work through these \
         feelings.",
    ),
    (
        &["angry", "frustrated"],
        "It sounds like you're carrying a lot of frustration. Those feelings are completely \
         understandable. Let's take a moment to acknowledge that anger often comes from caring \
         deeply about something.",
    ),
    (
        &["lonely", "alone"],
        "Loneliness can feel so heavy. Thank you for reaching out and sharing with me. Even \
         though it might not feel like it right now, you matter and your feelings are \
         important.",
    ),
    (
        &["stressed", "overwhelmed"],
        "It sounds like you're carrying a lot right now. Feeling overwhelmed is a sign that \
         you care and that you're dealing with real challenges. Let's take this one step at a \
         time.",
    ),
    (
        &["happy", "good", "great"],
        "I'm so glad to hear you're feeling positive! It's wonderful that you're experiencing \
         some joy. These moments of happiness are precious and worth celebrating.",
    ),
    (
        &["tired", "exhausted"],
        "Being tired - whether physically or emotionally - is your body and mind telling you \
         they need care. Rest isn't selfish; it's necessary for your wellbeing.",
    ),
    (
        &["confused", "lost"],
        "Feeling confused or lost can be really unsettling. It's okay not to have all the \
         answers right now. Sometimes clarity comes gradually as we process our experiences.",
    ),
];

const DEFAULT_REPLIES: &[&str] = &[
    "Thank you for sharing that with me. Your feelings matter, and I'm here to listen. What \
     you're experiencing is valid, and you don't have to go through this alone.",
    "I appreciate you opening up about what's on your mind. It takes courage to express your \
     feelings. Remember that seeking support is a sign of strength, not weakness.",
    "I hear you, and I want you to know that your emotions are completely valid. You're doing \
     the best you can with what you're facing right now.",
    "It sounds like you're dealing with a lot. Your willingness to share shows real strength. \
     Take things one moment at a time - you don't have to figure everything out right now.",
    "Your feelings are important and deserve to be heard. Thank you for trusting me with what \
     you're going through. You're braver than you realize.",
];

/// Local generator used when no hosted model is configured. Keyword hits are
/// deterministic; only the catch-all reply is randomized.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedResponder;

impl ScriptedResponder {
    pub fn new() -> Self {
        Self
    }

    fn reply_for(&self, text: &str) -> String {
        let lower = text.to_lowercase();

        for (keywords, reply) in SCRIPTED_REPLIES {
            if keywords.iter().any(|keyword| lower.contains(keyword)) {
                return reply.to_string();
            }
        }

        let mut rng = rand::rng();
        DEFAULT_REPLIES
            .choose(&mut rng)
            .copied()
            .unwrap_or(DEFAULT_REPLIES[0])
            .to_string()
    }
}

impl TextResponder for ScriptedResponder {
    async fn generate(&self, text: &str) -> Result<String, ResponderError> {
        Ok(self.reply_for(text))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keyword_hits_are_deterministic() {
        let responder = ScriptedResponder::new();
        let first = responder.generate("I feel so sad tonight").await.unwrap();
        let second = responder.generate("I feel so sad tonight").await.unwrap();

        assert_eq!(first, second);
        assert!(first.contains("feeling really down"));
    }

    #[tokio::test]
    async fn earlier_table_entries_win() {
        let responder = ScriptedResponder::new();
        let reply = responder.generate("sad and tired").await.unwrap();
        assert!(reply.contains("feeling really down"));
    }

    #[tokio::test]
    async fn unmatched_text_draws_from_the_default_pool() {
        let responder = ScriptedResponder::new();
        let reply = responder.generate("mmm").await.unwrap();
        assert!(DEFAULT_REPLIES.contains(&reply.as_str()));
    }
}
