pub mod invoice;
pub mod line;
pub mod payment;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationReport;

pub use invoice::DraftInvoice;
pub use line::{DraftLineItem, LineId, PendingLine};
pub use payment::{AppliedLine, DraftPayment, OpenInvoice};

/// Token value assumed when an existing record arrives without one.
pub const INITIAL_SYNC_TOKEN: &str = "0";

/// Opaque version marker issued by the remote system.
///
/// Round-tripped unchanged on every update of an existing record so the
/// server can reject stale writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConcurrencyToken(String);

impl ConcurrencyToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The sentinel used before the remote system has issued a token.
    pub fn initial() -> Self {
        Self(INITIAL_SYNC_TOKEN.to_string())
    }

    /// Token from a remote record, falling back to the sentinel when absent or blank.
    pub fn from_remote(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some(token) if !token.is_empty() => Self::new(token),
            _ => Self::initial(),
        }
    }

    /// Token exactly as the server issued it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConcurrencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a draft that edits an existing remote record.
///
/// Brand-new drafts have no identity at all; it is populated from the
/// first create or fetch response and carried on every later submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIdentity {
    pub id: String,
    pub token: ConcurrencyToken,
}

impl RemoteIdentity {
    pub fn new(id: impl Into<String>, token: ConcurrencyToken) -> Self {
        Self {
            id: id.into(),
            token,
        }
    }
}

/// A draft of either supported entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Invoice(DraftInvoice),
    Payment(DraftPayment),
}

impl Draft {
    /// "invoice" or "payment", for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Draft::Invoice(_) => "invoice",
            Draft::Payment(_) => "payment",
        }
    }

    pub fn identity(&self) -> Option<&RemoteIdentity> {
        match self {
            Draft::Invoice(draft) => draft.identity(),
            Draft::Payment(draft) => draft.identity(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.identity().is_none()
    }

    pub fn recompute_derived(&mut self) {
        match self {
            Draft::Invoice(draft) => draft.recompute_derived(),
            Draft::Payment(draft) => draft.recompute_derived(),
        }
    }

    pub fn validate(&self) -> ValidationReport {
        match self {
            Draft::Invoice(draft) => draft.validate(),
            Draft::Payment(draft) => draft.validate(),
        }
    }
}

impl From<DraftInvoice> for Draft {
    fn from(draft: DraftInvoice) -> Self {
        Draft::Invoice(draft)
    }
}

impl From<DraftPayment> for Draft {
    fn from(draft: DraftPayment) -> Self {
        Draft::Payment(draft)
    }
}
