//! Startup schema migrations. Each migration is a submodule with a unique
//! serial number; applied serial numbers are recorded in the `migrations`
//! table and skipped on subsequent runs.

use super::{CountRow, Database};
use async_trait::async_trait;
use sqlx::Transaction;
use std::borrow::BorrowMut;
use std::collections::HashSet;

mod m0000_init;

#[async_trait]
pub trait Migration {
    fn serial_number(&self) -> i64;
    async fn run(&self, tx: &mut Transaction<sqlx::Postgres>);
}

struct SimpleSqlMigration {
    pub serial_number: i64,
    pub sql: Vec<&'static str>,
}

#[async_trait]
impl Migration for SimpleSqlMigration {
    fn serial_number(&self) -> i64 {
        self.serial_number
    }

    async fn run(&self, tx: &mut Transaction<sqlx::Postgres>) {
        for sql in self.sql.iter() {
            sqlx::query(sql).execute(tx.borrow_mut()).await.unwrap();
        }
    }
}

fn all_migrations() -> Vec<Box<dyn Migration + Send + Sync>> {
    vec![Box::new(m0000_init::migration())]
}

/// Execute all pending migrations on the database. Panics if two migrations
/// share a serial number, since the applied-set bookkeeping would silently
/// skip one of them.
pub async fn run_migrations(db: &Database) {
    prepare_migrations_table(db).await;
    let migrations = all_migrations();
    let serials: HashSet<i64> = migrations.iter().map(|m| m.serial_number()).collect();
    assert_eq!(serials.len(), migrations.len(), "duplicate migration serial number");
    for migration in migrations {
        run_migration(migration.as_ref(), db).await;
    }
}

async fn prepare_migrations_table(db: &Database) {
    sqlx::query("CREATE TABLE IF NOT EXISTS migrations (serial_number bigint)")
        .execute(db)
        .await
        .unwrap();
}

async fn run_migration(migration: &(dyn Migration + Send + Sync), db: &Database) {
    let row = sqlx::query_as::<_, CountRow>(
        "SELECT COUNT(*) AS count FROM migrations WHERE serial_number = $1",
    )
    .bind(migration.serial_number())
    .fetch_one(db)
    .await
    .unwrap();

    if row.count > 0 {
        return;
    }

    let mut transaction = db.begin().await.unwrap();
    migration.run(&mut transaction).await;

    sqlx::query("INSERT INTO migrations VALUES ($1)")
        .bind(migration.serial_number())
        .execute(&mut transaction)
        .await
        .unwrap();

    transaction.commit().await.unwrap();
}
