//! Framework-agnostic business rules of the fund.

pub mod ledger;
pub mod money;
pub mod role;
pub mod status;

pub use ledger::{Balances, EntryKind, Reconciliation};
pub use role::{Actor, Permission, Role};
pub use status::{
    AllocationStatus, NotificationKind, NotificationStatus, ParseStatusError, Priority,
    RequestStatus, ReviewDecision, RiskAppetite,
};
