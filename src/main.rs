use std::time::Duration;

use app::database::{self, run_migrations, seed_development_data};
use rocket::{launch, Build, Rocket};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct Config {
    database_url: Url,
    session: SessionConfig,
    rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize)]
struct SessionConfig {
    expiry: Duration,
}

impl SessionConfig {
    fn into_sessions(self) -> app::auth::SessionConfig {
        app::auth::SessionConfig {
            expiry: self.expiry,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RateLimitConfig {
    limit: usize,
    span: Duration,
}

impl RateLimitConfig {
    fn into_rate_limit(self) -> api::RateLimit {
        api::RateLimit::new(self.limit, self.span)
    }
}

#[launch]
async fn rocket() -> _ {
    start_server().await
}

async fn start_server() -> Rocket<Build> {
    env_logger::init();

    let rocket = Rocket::build();
    let config: Config = rocket.figment().extract().unwrap();

    let db = database::connect(&config.database_url).await.unwrap();

    run_migrations(&db).await;
    #[cfg(debug_assertions)]
    seed_development_data(&db).await;

    api::register(
        rocket,
        db,
        config.session.into_sessions(),
        config.rate_limit.into_rate_limit(),
    )
}
