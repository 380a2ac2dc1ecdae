//! Entities for balance mutations and their audit trail. Every mutation is a
//! credit (top-up) or a debit (payment) and leaves exactly one immutable
//! history entry behind. Debits must never drive a balance negative, even
//! under concurrent requests for the same user; see [`Balance`].

use crate::catalog::{Service, ServiceCode};
use crate::money::Rupiah;
use crate::user;
use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("insufficient balance")]
pub struct InsufficientBalance;

/// A user balance loaded for mutation.
///
/// The original amount is kept alongside any updates so the persistence layer
/// can issue a conditional write: the update only succeeds if nobody else
/// changed the balance between our read and our write. A failed condition
/// surfaces as a conflict and the whole mutation is retried.
#[derive(Debug, Clone, Default)]
pub struct Balance {
    user_id: user::Id,
    original_amount: Rupiah,
    amount: Rupiah,
}

impl Balance {
    pub fn new(user_id: user::Id, amount: Rupiah) -> Self {
        Self {
            user_id,
            original_amount: amount,
            amount,
        }
    }

    pub fn user_id(&self) -> user::Id {
        self.user_id
    }

    pub fn original_amount(&self) -> Rupiah {
        self.original_amount
    }

    pub fn amount(&self) -> Rupiah {
        self.amount
    }

    pub fn changed(&self) -> bool {
        self.original_amount != self.amount
    }

    pub fn credit(&mut self, amount: Rupiah) {
        self.amount += amount;
    }

    /// Debits the balance, refusing to go below zero.
    pub fn debit(&mut self, amount: Rupiah) -> Result<(), InsufficientBalance> {
        if amount > self.amount {
            return Err(InsufficientBalance);
        }
        self.amount -= amount;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    TopUp,
    Payment,
}

/// An invoice number: a millisecond timestamp plus a random three-digit
/// suffix. Collisions are possible in principle, so true uniqueness is
/// enforced by the unique index on the history table; on a collision the
/// caller regenerates once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceNumber(pub String);

impl InvoiceNumber {
    pub(crate) fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let suffix: u16 = rand::thread_rng().gen_range(0..1000);
        Self(format!("INV{}{:03}", millis, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One immutable ledger entry, created exactly once per mutation.
#[derive(Debug)]
pub struct Entry {
    pub id: Id,
    pub user_id: user::Id,
    pub invoice_number: InvoiceNumber,
    pub kind: Kind,
    pub amount: Rupiah,
    pub service_code: Option<ServiceCode>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Id(pub Uuid);

impl Entry {
    pub(crate) fn top_up(user_id: user::Id, amount: Rupiah) -> Self {
        Self {
            id: Id(Uuid::new_v4()),
            user_id,
            invoice_number: InvoiceNumber::generate(),
            kind: Kind::TopUp,
            amount,
            service_code: None,
            created: Utc::now(),
        }
    }

    /// The tariff is copied off the catalog entry here; later catalog price
    /// changes never alter recorded history.
    pub(crate) fn payment(user_id: user::Id, service: &Service) -> Self {
        Self {
            id: Id(Uuid::new_v4()),
            user_id,
            invoice_number: InvoiceNumber::generate(),
            kind: Kind::Payment,
            amount: service.tariff,
            service_code: Some(service.code.clone()),
            created: Utc::now(),
        }
    }
}

/// Result of a successful top-up.
#[derive(Debug)]
pub struct TopUpReceipt {
    pub invoice_number: InvoiceNumber,
    pub amount: Rupiah,
    pub balance: Rupiah,
}

/// Result of a successful payment. The post-charge balance is included even
/// though the original wire contract only echoed invoice details.
#[derive(Debug)]
pub struct PaymentReceipt {
    pub invoice_number: InvoiceNumber,
    pub service_code: ServiceCode,
    pub service_name: String,
    pub amount: Rupiah,
    pub balance: Rupiah,
    pub created: DateTime<Utc>,
}

/// A history entry joined with the catalog for display.
#[derive(Debug)]
pub struct HistoryEntry {
    pub invoice_number: InvoiceNumber,
    pub kind: Kind,
    pub amount: Rupiah,
    pub service_code: Option<ServiceCode>,
    pub service_name: Option<String>,
    pub created: DateTime<Utc>,
}

impl HistoryEntry {
    /// Human-readable feed line: top-ups have a fixed label, payments show
    /// the service name, falling back to the raw code if the catalog entry
    /// has since disappeared.
    pub fn description(&self) -> String {
        match self.kind {
            Kind::TopUp => "Top Up balance".to_owned(),
            Kind::Payment => self
                .service_name
                .clone()
                .or_else(|| self.service_code.as_ref().map(|code| code.0.clone()))
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(amount: i64) -> Balance {
        Balance::new(user::Id(Uuid::from_u128(1)), Rupiah(amount))
    }

    fn service(code: &str, tariff: i64) -> Service {
        Service {
            code: ServiceCode(code.to_owned()),
            name: format!("{} service", code),
            icon: "/icons/test.png".to_owned(),
            tariff: Rupiah(tariff),
        }
    }

    #[test]
    fn credit_increases_the_amount_by_exactly_the_credit() {
        let mut balance = balance(50_000);
        balance.credit(Rupiah(100_000));
        assert_eq!(balance.amount(), Rupiah(150_000));
        assert_eq!(balance.original_amount(), Rupiah(50_000));
        assert!(balance.changed());
    }

    #[test]
    fn debit_decreases_the_amount_by_exactly_the_debit() {
        let mut balance = balance(150_000);
        balance.debit(Rupiah(20_000)).unwrap();
        assert_eq!(balance.amount(), Rupiah(130_000));
    }

    #[test]
    fn debit_beyond_the_balance_changes_nothing() {
        let mut balance = balance(10_000);
        assert!(balance.debit(Rupiah(10_001)).is_err());
        assert_eq!(balance.amount(), Rupiah(10_000));
        assert!(!balance.changed());
    }

    #[test]
    fn debit_of_the_entire_balance_is_allowed() {
        let mut balance = balance(10_000);
        balance.debit(Rupiah(10_000)).unwrap();
        assert_eq!(balance.amount(), Rupiah::ZERO);
    }

    #[test]
    fn invoice_numbers_have_the_documented_shape() {
        let invoice = InvoiceNumber::generate();
        let digits = invoice.as_str().strip_prefix("INV").unwrap();
        assert!(digits.len() >= 4);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn top_up_entry_carries_no_service() {
        let entry = Entry::top_up(user::Id(Uuid::from_u128(1)), Rupiah(100_000));
        assert_eq!(entry.kind, Kind::TopUp);
        assert_eq!(entry.amount, Rupiah(100_000));
        assert!(entry.service_code.is_none());
    }

    #[test]
    fn payment_entry_copies_the_tariff_and_code() {
        let service = service("PLN10", 20_000);
        let entry = Entry::payment(user::Id(Uuid::from_u128(1)), &service);
        assert_eq!(entry.kind, Kind::Payment);
        assert_eq!(entry.amount, Rupiah(20_000));
        assert_eq!(entry.service_code, Some(ServiceCode("PLN10".to_owned())));
    }

    #[test]
    fn top_up_description_is_fixed() {
        let entry = HistoryEntry {
            invoice_number: InvoiceNumber("INV1700000000000001".to_owned()),
            kind: Kind::TopUp,
            amount: Rupiah(100_000),
            service_code: None,
            service_name: None,
            created: Utc::now(),
        };
        assert_eq!(entry.description(), "Top Up balance");
    }

    #[test]
    fn payment_description_prefers_the_service_name() {
        let entry = HistoryEntry {
            invoice_number: InvoiceNumber("INV1700000000000002".to_owned()),
            kind: Kind::Payment,
            amount: Rupiah(20_000),
            service_code: Some(ServiceCode("PLN10".to_owned())),
            service_name: Some("Listrik Prabayar".to_owned()),
            created: Utc::now(),
        };
        assert_eq!(entry.description(), "Listrik Prabayar");

        let nameless = HistoryEntry {
            service_name: None,
            ..entry
        };
        assert_eq!(nameless.description(), "PLN10");
    }
}
