pub mod auth;
pub mod catalog;
pub mod concurrency;
pub mod database;
mod hex;
pub mod ledger;
pub mod money;
pub mod user;

pub use money::Rupiah;

#[derive(Debug, Clone, Copy)]
pub struct QueryRange {
    pub limit: i64,
    pub offset: i64,
}
