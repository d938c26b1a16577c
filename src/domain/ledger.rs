//! The account ledger: entry kinds and balance replay.
//!
//! A ledger entry is immutable. Stored account totals are a cache of what
//! replaying an account's entries in creation order yields.

use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

/// What a ledger entry does to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Capital paid in by the investor.
    Funding,
    /// Capital paid out to the investor.
    Withdrawal,
    /// Realised interest credited on settlement.
    Interest,
    /// Management fee charged.
    Fee,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Funding => "funding",
            EntryKind::Withdrawal => "withdrawal",
            EntryKind::Interest => "interest",
            EntryKind::Fee => "fee",
        }
    }

    pub fn is_credit(&self) -> bool {
        matches!(self, EntryKind::Funding | EntryKind::Interest)
    }
}

impl std::str::FromStr for EntryKind {
    type Err = super::status::ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "funding" => Ok(EntryKind::Funding),
            "withdrawal" => Ok(EntryKind::Withdrawal),
            "interest" => Ok(EntryKind::Interest),
            "fee" => Ok(EntryKind::Fee),
            other => Err(super::status::ParseStatusError {
                kind: "ledger entry kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Account totals, either stored or rebuilt from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub total_invested: BigDecimal,
    pub total_withdrawn: BigDecimal,
    pub total_interest: BigDecimal,
    pub total_fees: BigDecimal,
    pub current_balance: BigDecimal,
}

impl Default for Balances {
    fn default() -> Self {
        Self {
            total_invested: BigDecimal::zero(),
            total_withdrawn: BigDecimal::zero(),
            total_interest: BigDecimal::zero(),
            total_fees: BigDecimal::zero(),
            current_balance: BigDecimal::zero(),
        }
    }
}

impl Balances {
    /// Applies one entry. Totals only ever grow; the balance moves with the
    /// direction of the entry.
    pub fn apply(&mut self, kind: EntryKind, amount: &BigDecimal) {
        match kind {
            EntryKind::Funding => self.total_invested += amount,
            EntryKind::Withdrawal => self.total_withdrawn += amount,
            EntryKind::Interest => self.total_interest += amount,
            EntryKind::Fee => self.total_fees += amount,
        }
        if kind.is_credit() {
            self.current_balance += amount;
        } else {
            self.current_balance -= amount;
        }
    }

    /// `total_invested - total_withdrawn + total_interest - total_fees`.
    pub fn derived_balance(&self) -> BigDecimal {
        &self.total_invested - &self.total_withdrawn + &self.total_interest - &self.total_fees
    }

    pub fn is_consistent(&self) -> bool {
        self.current_balance == self.derived_balance()
    }
}

/// Replays entries in the order given (creation order) from a zero balance.
pub fn replay<'a, I>(entries: I) -> Balances
where
    I: IntoIterator<Item = (EntryKind, &'a BigDecimal)>,
{
    let mut balances = Balances::default();
    for (kind, amount) in entries {
        balances.apply(kind, amount);
    }
    balances
}

/// Outcome of comparing stored totals to a ledger replay.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub stored: Balances,
    pub replayed: Balances,
    pub entry_count: usize,
    pub consistent: bool,
}

impl Reconciliation {
    pub fn new(stored: Balances, replayed: Balances, entry_count: usize) -> Self {
        let consistent = stored == replayed && stored.is_consistent();
        Self {
            stored,
            replayed,
            entry_count,
            consistent,
        }
    }
}
