use crate::{
    auth, catalog, concurrency,
    database::{self, Database},
    money::Rupiah,
    QueryRange,
};
use std::future::Future;
use thiserror::Error;

mod entities;

pub use entities::{
    Balance, Entry, HistoryEntry, Id, InsufficientBalance, InvoiceNumber, Kind, PaymentReceipt,
    TopUpReceipt,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error("service code must not be empty")]
    MissingServiceCode,
    #[error("service not found")]
    ServiceNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("{0:?}")]
    InsufficientBalance(#[from] InsufficientBalance),
    #[error("invoice number collision")]
    DuplicateInvoice,
    #[error("{0:?}")]
    ConcurrencyConflict(#[from] concurrency::ConflictError),
    #[error("storage failure")]
    Storage(#[from] sqlx::Error),
}

/// Reads the current balance.
pub async fn balance(grant: &auth::Grant, db: &Database) -> Result<Rupiah, Error> {
    queries::current_balance(db, grant.user_id)
        .await?
        .ok_or(Error::UserNotFound)
}

/// Credits the balance and appends one TOPUP entry. The balance update and
/// the history insert commit in the same transaction; a concurrent mutation
/// of the same balance fails the conditional update and the sequence is
/// retried from the fresh balance.
pub async fn top_up(grant: &auth::Grant, db: &Database, amount: Rupiah) -> Result<TopUpReceipt, Error> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount);
    }
    regenerate_on_collision(|| {
        concurrency::retry_loop(|| async {
            let mut data_tx = db.begin().await?;
            let mut balance = queries::balance(&mut data_tx, grant.user_id)
                .await?
                .ok_or(Error::UserNotFound)?;
            balance.credit(amount);
            let entry = Entry::top_up(grant.user_id, amount);
            queries::insert_entry(&mut data_tx, &entry)
                .await
                .map_err(entry_insert_error)?;
            queries::update_balance(&mut data_tx, &balance).await?;
            data_tx.commit().await?;
            Ok(TopUpReceipt {
                invoice_number: entry.invoice_number,
                amount,
                balance: balance.amount(),
            })
        })
    })
    .await
}

/// Charges the service tariff against the balance and appends one PAYMENT
/// entry, under the same transactional discipline as [`top_up`]. A short
/// balance fails with [`Error::InsufficientBalance`] before anything is
/// written.
pub async fn pay(
    grant: &auth::Grant,
    db: &Database,
    service_code: &str,
) -> Result<PaymentReceipt, Error> {
    if service_code.trim().is_empty() {
        return Err(Error::MissingServiceCode);
    }
    let service = catalog::get(db, service_code)
        .await?
        .ok_or(Error::ServiceNotFound)?;
    regenerate_on_collision(|| {
        concurrency::retry_loop(|| async {
            let mut data_tx = db.begin().await?;
            let mut balance = queries::balance(&mut data_tx, grant.user_id)
                .await?
                .ok_or(Error::UserNotFound)?;
            balance.debit(service.tariff)?;
            let entry = Entry::payment(grant.user_id, &service);
            queries::insert_entry(&mut data_tx, &entry)
                .await
                .map_err(entry_insert_error)?;
            queries::update_balance(&mut data_tx, &balance).await?;
            data_tx.commit().await?;
            Ok(PaymentReceipt {
                invoice_number: entry.invoice_number,
                service_code: service.code.clone(),
                service_name: service.name.clone(),
                amount: service.tariff,
                balance: balance.amount(),
                created: entry.created,
            })
        })
    })
    .await
}

/// The user's ledger entries, newest first, joined with the catalog for
/// display names. An empty page is not an error.
pub async fn history(
    grant: &auth::Grant,
    db: &Database,
    range: QueryRange,
) -> Result<Vec<HistoryEntry>, Error> {
    Ok(queries::history(db, grant.user_id, range).await?)
}

/// Invoice number collisions abort the transaction; the mutation is retried
/// exactly once with a freshly generated number before giving up.
async fn regenerate_on_collision<T, F, Fut>(mut attempt: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    match attempt().await {
        Err(Error::DuplicateInvoice) => attempt().await,
        other => other,
    }
}

fn entry_insert_error(e: sqlx::Error) -> Error {
    if database::is_unique_violation(&e) {
        Error::DuplicateInvoice
    } else {
        e.into()
    }
}

mod queries {
    use super::{Balance, Entry, HistoryEntry, InvoiceNumber, Kind};
    use crate::catalog::ServiceCode;
    use crate::{
        database::{self, Database},
        money::Rupiah,
        user, QueryRange,
    };
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    pub(super) async fn current_balance(
        db: &Database,
        user_id: user::Id,
    ) -> Result<Option<Rupiah>, sqlx::Error> {
        let row = sqlx::query_as::<_, BalanceRow>(
            "SELECT id AS user_id, balance FROM users WHERE id = $1",
        )
        .bind(user_id.0)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|row| row.into_entity().amount()))
    }

    pub(super) async fn balance(
        data_tx: &mut database::Transaction,
        user_id: user::Id,
    ) -> Result<Option<Balance>, sqlx::Error> {
        let row = sqlx::query_as::<_, BalanceRow>(
            "SELECT id AS user_id, balance FROM users WHERE id = $1",
        )
        .bind(user_id.0)
        .fetch_optional(&mut *data_tx)
        .await?;
        Ok(row.map(|row| row.into_entity()))
    }

    /// Conditional write: only succeeds if the stored balance still matches
    /// the amount we read. No matching row means somebody else won the race.
    pub(super) async fn update_balance(
        data_tx: &mut database::Transaction,
        balance: &Balance,
    ) -> Result<(), super::Error> {
        if balance.changed() {
            sqlx::query(
                "UPDATE users SET balance = $1 WHERE id = $2 AND balance = $3 RETURNING id",
            )
            .bind(balance.amount().0)
            .bind(balance.user_id().0)
            .bind(balance.original_amount().0)
            .fetch_optional(&mut *data_tx)
            .await?
            .ok_or(crate::concurrency::ConflictError)?;
        }
        Ok(())
    }

    pub(super) async fn insert_entry(
        data_tx: &mut database::Transaction,
        entry: &Entry,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO transaction_history (id, user_id, invoice_number, transaction_type, total_amount, service_code, created)
                VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(entry.id.0)
        .bind(entry.user_id.0)
        .bind(entry.invoice_number.as_str())
        .bind(kind_to_i32(entry.kind))
        .bind(entry.amount.0)
        .bind(entry.service_code.as_ref().map(|code| code.0.clone()))
        .bind(entry.created)
        .execute(&mut *data_tx)
        .await?;
        Ok(())
    }

    pub(super) async fn history(
        db: &Database,
        user_id: user::Id,
        range: QueryRange,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"SELECT th.invoice_number, th.transaction_type, th.total_amount, th.service_code, s.service_name, th.created
                FROM transaction_history th
                LEFT JOIN service s ON s.service_code = th.service_code
                WHERE th.user_id = $1
                ORDER BY th.created DESC
                LIMIT $2 OFFSET $3"#,
        )
        .bind(user_id.0)
        .bind(range.limit)
        .bind(range.offset)
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(|row| row.into_entity()).collect())
    }

    #[derive(Debug, sqlx::FromRow)]
    struct BalanceRow {
        user_id: Uuid,
        balance: i64,
    }

    impl BalanceRow {
        fn into_entity(self) -> Balance {
            Balance::new(user::Id(self.user_id), Rupiah(self.balance))
        }
    }

    #[derive(Debug, sqlx::FromRow)]
    struct HistoryRow {
        invoice_number: String,
        transaction_type: i32,
        total_amount: i64,
        service_code: Option<String>,
        service_name: Option<String>,
        created: DateTime<Utc>,
    }

    impl HistoryRow {
        fn into_entity(self) -> HistoryEntry {
            HistoryEntry {
                invoice_number: InvoiceNumber(self.invoice_number),
                kind: i32_to_kind(self.transaction_type),
                amount: Rupiah(self.total_amount),
                service_code: self.service_code.map(ServiceCode),
                service_name: self.service_name,
                created: self.created,
            }
        }
    }

    fn kind_to_i32(kind: Kind) -> i32 {
        match kind {
            Kind::TopUp => 0,
            Kind::Payment => 1,
        }
    }

    fn i32_to_kind(kind: i32) -> Kind {
        match kind {
            0 => Kind::TopUp,
            1 => Kind::Payment,
            _ => unreachable!("unknown transaction type {:?}", kind),
        }
    }
}
