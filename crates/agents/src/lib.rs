mod chat;
mod wall;

pub use chat::{CompanionAgent, DEFAULT_RESPONDER_TIMEOUT, FALLBACK_REPLY};
pub use wall::{SubmitError, WallService, WALL_POST_TTL_SECONDS};
