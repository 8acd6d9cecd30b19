mod openai;
mod scripted;

use std::env;

pub use openai::OpenAiResponder;
pub use scripted::ScriptedResponder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("responder request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("responder returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("responder returned no usable text")]
    EmptyReply,
}

/// A synchronous short-reply generator. Implementations may be remote; the
/// orchestrator bounds every call with its own timeout on top of whatever the
/// implementation enforces.
pub trait TextResponder: Send + Sync {
    async fn generate(&self, text: &str) -> Result<String, ResponderError>;

    /// Stable backend label for health reporting and logs.
    fn name(&self) -> &'static str;
}

/// Runtime-selected backend: the hosted model when an API key is configured,
/// otherwise the local scripted generator.
#[derive(Clone)]
pub enum Responder {
    OpenAi(OpenAiResponder),
    Scripted(ScriptedResponder),
}

impl Responder {
    pub fn from_env() -> Result<Self, ResponderError> {
        let api_key = env::var("HAVEN_OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        match api_key {
            Some(api_key) => {
                let model = env::var("HAVEN_OPENAI_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string());
                Ok(Self::OpenAi(OpenAiResponder::new(api_key, model)?))
            }
            None => Ok(Self::Scripted(ScriptedResponder::new())),
        }
    }

    pub fn scripted() -> Self {
        Self::Scripted(ScriptedResponder::new())
    }
}

impl TextResponder for Responder {
    async fn generate(&self, text: &str) -> Result<String, ResponderError> {
        match self {
            Responder::OpenAi(responder) => responder.generate(text).await,
            Responder::Scripted(responder) => responder.generate(text).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Responder::OpenAi(responder) => responder.name(),
            Responder::Scripted(responder) => responder.name(),
        }
    }
}
