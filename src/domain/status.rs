//! Status vocabularies and the transition tables that guard them.
//!
//! Every status column is stored as text; these enums are the only place the
//! legal values and moves between them are spelled out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseStatusError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(RequestStatus, "request status", {
    Pending => "pending",
    Approved => "approved",
    Declined => "declined",
    Processed => "processed",
    Cancelled => "cancelled",
});

text_enum!(Priority, "priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

text_enum!(NotificationKind, "notification kind", {
    RffFunding => "rff_funding",
    Withdrawal => "withdrawal",
});

text_enum!(NotificationStatus, "notification status", {
    Pending => "pending",
    Processed => "processed",
    Cancelled => "cancelled",
});

text_enum!(AllocationStatus, "allocation status", {
    Pending => "pending",
    Disbursed => "disbursed",
    Settled => "settled",
    Cancelled => "cancelled",
});

text_enum!(RiskAppetite, "risk appetite", {
    Conservative => "conservative",
    Moderate => "moderate",
    Aggressive => "aggressive",
});

impl RequestStatus {
    /// `pending -> {approved, declined}`, `approved -> {processed, cancelled}`.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Declined)
                | (Approved, Processed)
                | (Approved, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Declined | RequestStatus::Processed | RequestStatus::Cancelled
        )
    }
}

impl NotificationStatus {
    pub fn can_transition_to(self, next: NotificationStatus) -> bool {
        matches!(
            (self, next),
            (NotificationStatus::Pending, NotificationStatus::Processed)
                | (NotificationStatus::Pending, NotificationStatus::Cancelled)
        )
    }
}

impl Priority {
    /// Sort key used when listing payment notifications: high first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

/// Review outcome for a funding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Decline,
}

impl ReviewDecision {
    pub fn target(self) -> RequestStatus {
        match self {
            ReviewDecision::Approve => RequestStatus::Approved,
            ReviewDecision::Decline => RequestStatus::Declined,
        }
    }
}
