use crate::money::Rupiah;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCode(pub String);

/// A purchasable catalog entry with a fixed tariff. The catalog is read-only
/// from the ledger's perspective; tariffs are copied into history rows at
/// charge time, so later catalog edits never rewrite history.
#[derive(Debug, Clone)]
pub struct Service {
    pub code: ServiceCode,
    pub name: String,
    pub icon: String,
    pub tariff: Rupiah,
}

/// A promotional banner. Public, no auth involved.
#[derive(Debug, Clone)]
pub struct Banner {
    pub name: String,
    pub image: String,
    pub description: String,
}
