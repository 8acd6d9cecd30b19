pub mod detect;
pub mod models;
pub mod moderation;
pub mod respond;

pub use detect::{CrisisDetector, KeywordCrisisDetector};
pub use models::*;
pub use moderation::CommunityGate;
pub use respond::{compose_envelope, emergency_resources, support_resources};
