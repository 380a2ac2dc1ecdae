//! Routes for the balance ledger: current balance, top-ups, payments, and
//! the transaction history feed.

use super::Range;
use crate::{
    access,
    error::{self, JsonError, JsonResult},
    state::RocketState,
};
use app::{ledger, Rupiah};
use chrono::{DateTime, Utc};
use rocket::{get, post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct BalanceResponse {
    /// Current balance in Rupiah.
    balance: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct TopUpRequest {
    /// Amount to credit, in Rupiah. Must be greater than zero.
    top_up_amount: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct TopUpResponse {
    /// Invoice assigned to this top-up.
    invoice_number: String,
    /// Amount credited.
    amount: i64,
    /// Balance after the credit.
    balance: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct TransactionRequest {
    /// Catalog key of the service to pay for.
    service_code: String,
}

#[derive(Debug, Serialize, JsonSchema)]
struct TransactionModel {
    invoice_number: String,
    service_code: String,
    service_name: String,
    transaction_type: TransactionType,
    /// Amount charged, copied from the tariff at charge time.
    total_amount: i64,
    /// Balance after the charge.
    balance: i64,
    created_on: DateTime<Utc>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct TransactionResponse {
    transaction: TransactionModel,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TransactionType {
    Topup,
    Payment,
}

impl TransactionType {
    fn from_kind(kind: ledger::Kind) -> Self {
        match kind {
            ledger::Kind::TopUp => TransactionType::Topup,
            ledger::Kind::Payment => TransactionType::Payment,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
struct HistoryModel {
    invoice_number: String,
    transaction_type: TransactionType,
    /// "Top Up balance" for top-ups, the service name otherwise.
    description: String,
    total_amount: i64,
    created_on: DateTime<Utc>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct HistoryResponse {
    /// Effective offset after clamping.
    offset: i64,
    /// Effective limit after clamping.
    limit: i64,
    records: Vec<HistoryModel>,
}

impl HistoryModel {
    fn from_entity(entry: &ledger::HistoryEntry) -> Self {
        Self {
            invoice_number: entry.invoice_number.as_str().to_owned(),
            transaction_type: TransactionType::from_kind(entry.kind),
            description: entry.description(),
            total_amount: entry.amount.0,
            created_on: entry.created,
        }
    }
}

/// Error during a transaction operation.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please contact support.
    Unknown,
    /// Top-up amount must be greater than zero.
    InvalidAmount,
    /// Service code must not be empty.
    MissingServiceCode,
    /// The service code does not match any catalog entry.
    ServiceNotFound,
    /// Insufficient balance to complete the payment.
    InsufficientBalance,
    /// The authenticated user no longer exists.
    UserNotFound,
}

fn ledger_error(
    e: ledger::Error,
    operation: &'static str,
    user_id: app::user::Id,
) -> JsonError<Error> {
    match e {
        ledger::Error::InvalidAmount => error::bad_request(
            Error::InvalidAmount,
            "amount must be greater than zero".to_owned(),
        ),
        ledger::Error::MissingServiceCode => error::bad_request(
            Error::MissingServiceCode,
            "service code must not be empty".to_owned(),
        ),
        ledger::Error::ServiceNotFound => {
            error::bad_request(Error::ServiceNotFound, "service not found".to_owned())
        }
        ledger::Error::InsufficientBalance(_) => {
            error::bad_request(Error::InsufficientBalance, "insufficient balance".to_owned())
        }
        ledger::Error::UserNotFound => {
            error::not_found(Error::UserNotFound, "user not found".to_owned())
        }
        e => error::storage_failure(Error::Unknown, operation, Some(user_id), &e),
    }
}

/// Get the current balance.
#[openapi(tag = "Transaction")]
#[get("/balance")]
pub(super) async fn balance(
    guard: access::AuthGuard,
    state: &State<RocketState>,
) -> JsonResult<BalanceResponse, Error> {
    ledger::balance(guard.grant(), &state.db)
        .await
        .map(|balance| Json(BalanceResponse { balance: balance.0 }))
        .map_err(|e| ledger_error(e, "get balance", guard.grant().user_id))
}

/// Credit the balance. Appends a TOPUP entry to the transaction history.
#[openapi(tag = "Transaction")]
#[post("/topup", data = "<req>")]
pub(super) async fn top_up(
    guard: access::AuthGuard,
    state: &State<RocketState>,
    req: Json<TopUpRequest>,
) -> JsonResult<TopUpResponse, Error> {
    ledger::top_up(guard.grant(), &state.db, Rupiah(req.top_up_amount))
        .await
        .map(|receipt| {
            Json(TopUpResponse {
                invoice_number: receipt.invoice_number.as_str().to_owned(),
                amount: receipt.amount.0,
                balance: receipt.balance.0,
            })
        })
        .map_err(|e| ledger_error(e, "top up", guard.grant().user_id))
}

/// Pay for a catalog service with the wallet balance. Appends a PAYMENT
/// entry to the transaction history.
#[openapi(tag = "Transaction")]
#[post("/transaction", data = "<req>")]
pub(super) async fn pay(
    guard: access::AuthGuard,
    state: &State<RocketState>,
    req: Json<TransactionRequest>,
) -> JsonResult<TransactionResponse, Error> {
    ledger::pay(guard.grant(), &state.db, &req.service_code)
        .await
        .map(|receipt| {
            Json(TransactionResponse {
                transaction: TransactionModel {
                    invoice_number: receipt.invoice_number.as_str().to_owned(),
                    service_code: receipt.service_code.0.clone(),
                    service_name: receipt.service_name.clone(),
                    transaction_type: TransactionType::Payment,
                    total_amount: receipt.amount.0,
                    balance: receipt.balance.0,
                    created_on: receipt.created,
                },
            })
        })
        .map_err(|e| ledger_error(e, "pay", guard.grant().user_id))
}

/// The transaction history, newest first. `offset` defaults to 0 and
/// `limit` defaults to 3; `limit` is capped at 100.
#[openapi(tag = "Transaction")]
#[get("/transaction/history?<range..>")]
pub(super) async fn history(
    guard: access::AuthGuard,
    state: &State<RocketState>,
    range: Range,
) -> JsonResult<HistoryResponse, Error> {
    let range = range.query_range();
    ledger::history(guard.grant(), &state.db, range)
        .await
        .map(|entries| {
            Json(HistoryResponse {
                offset: range.offset,
                limit: range.limit,
                records: entries.iter().map(HistoryModel::from_entity).collect(),
            })
        })
        .map_err(|e| ledger_error(e, "transaction history", guard.grant().user_id))
}
