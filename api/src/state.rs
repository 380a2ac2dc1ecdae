use app::{auth::SessionConfig, database::Database};

use crate::rate_limit::RateLimit;

pub struct RocketState {
    pub db: Database,
    pub sessions: SessionConfig,
    pub rate_limit: RateLimit,
}
