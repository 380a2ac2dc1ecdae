use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use url::Url;

pub use migrations::run_migrations;
pub use seeder::seed_development_data;

mod migrations;
mod seeder;

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub(crate) type Transaction = sqlx::Transaction<'static, sqlx::Postgres>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn connect(url: &Url) -> Result<Database, sqlx::Error> {
    PgPoolOptions::new()
        .connect_timeout(CONNECT_TIMEOUT)
        .connect(url.as_str())
        .await
}

/// Postgres unique-violation check, used to detect duplicate emails and
/// invoice numbers without racing a separate existence query.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CountRow {
    pub count: i64,
}
