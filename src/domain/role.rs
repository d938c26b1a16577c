use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::status::ParseStatusError;

/// The five parties that act on fund records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Originator submitting funding applications.
    Bsf,
    BimAdmin,
    PaymentOfficer,
    /// Investment committee.
    Ic,
    Investor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Bsf => "bsf",
            Role::BimAdmin => "bim_admin",
            Role::PaymentOfficer => "payment_officer",
            Role::Ic => "ic",
            Role::Investor => "investor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bsf" => Ok(Role::Bsf),
            "bim_admin" => Ok(Role::BimAdmin),
            "payment_officer" => Ok(Role::PaymentOfficer),
            "ic" => Ok(Role::Ic),
            "investor" => Ok(Role::Investor),
            other => Err(ParseStatusError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Operations that are restricted to particular roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    SubmitApplication,
    ReviewApplication,
    InstructFunding,
    SettleApplication,
    ManageInvestors,
    SubmitRequest,
    ReviewRequest,
    ProcessPayment,
    AssessFees,
    /// Reads that span the whole fund rather than one investor's holdings.
    ViewFund,
}

impl Permission {
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Permission::SubmitApplication => &[Role::Bsf, Role::BimAdmin],
            Permission::ReviewApplication => &[Role::Ic, Role::BimAdmin],
            Permission::InstructFunding
            | Permission::SettleApplication
            | Permission::ManageInvestors
            | Permission::ReviewRequest
            | Permission::AssessFees => &[Role::BimAdmin],
            Permission::SubmitRequest => &[Role::Investor, Role::BimAdmin],
            Permission::ProcessPayment => &[Role::PaymentOfficer, Role::BimAdmin],
            Permission::ViewFund => &[Role::Bsf, Role::BimAdmin, Role::PaymentOfficer, Role::Ic],
        }
    }
}

impl Role {
    pub fn may(self, permission: Permission) -> bool {
        permission.allowed_roles().contains(&self)
    }
}

/// Who is performing an operation. Recorded on every record and audit row
/// the operation writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub email: String,
    pub role: Role,
}

impl Actor {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            role,
        }
    }

    pub fn may(&self, permission: Permission) -> bool {
        self.role.may(permission)
    }

    /// The profile email an investor's reads and requests are confined to.
    /// Staff roles are not confined.
    pub fn owner_scope(&self) -> Option<&str> {
        (self.role == Role::Investor).then_some(self.email.as_str())
    }
}
