//! This library contains definitions for the API layer.

use app::{auth::SessionConfig, database::Database};
use rocket::{Build, Rocket};
use state::RocketState;

mod access;
mod error;
mod rate_limit;
mod routes;
mod state;

pub use rate_limit::RateLimit;

pub fn register(
    rocket: Rocket<Build>,
    db: Database,
    sessions: SessionConfig,
    rate_limit: RateLimit,
) -> Rocket<Build> {
    routes::register(
        rocket,
        RocketState {
            db,
            sessions,
            rate_limit,
        },
    )
}
