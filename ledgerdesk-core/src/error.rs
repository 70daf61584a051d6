use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::draft::LineId;
use crate::validation::ValidationReport;

/// Errors raised while mutating a draft in memory.
///
/// These never involve the network; they are surfaced to the user as an
/// alert and leave the draft unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Please select an item")]
    ItemSelectionRequired,

    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("Unit price cannot be negative")]
    InvalidUnitPrice,

    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Line {0} is not part of this draft")]
    LineNotFound(LineId),

    #[error("Applied amount {requested} exceeds the open balance {balance} of invoice {invoice_id}")]
    ExceedsInvoiceBalance {
        invoice_id: String,
        requested: Decimal,
        balance: Decimal,
    },

    /// The invoice is neither open for this customer nor already applied.
    #[error("Invoice {0} is not an open invoice of this customer")]
    UnknownInvoice(String),
}

/// Errors returned by the remote accounting API or the transport under it.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Server responded with status {status}")]
    Server { status: u16, body: Option<Value> },

    /// The requested record does not exist on the remote side.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The response body could not be parsed into the expected shape.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// Message supplied by the server in the response body, if any.
    ///
    /// Looks at the accounting platform's fault envelope first
    /// (`Fault.Error[0].Message`), then at plain `error` and `message` fields.
    pub fn server_message(&self) -> Option<String> {
        match self {
            ApiError::Server {
                body: Some(body), ..
            } => structured_message(body),
            _ => None,
        }
    }

    /// Message from the error itself, when it carries one that means
    /// something to a user. A bare status code does not.
    pub fn generic_message(&self) -> Option<String> {
        match self {
            ApiError::Server { .. } => None,
            ApiError::Network(msg) | ApiError::Decode(msg) | ApiError::InvalidConfig(msg)
                if msg.trim().is_empty() =>
            {
                None
            }
            other => Some(other.to_string()),
        }
    }

    /// Single user-visible message for this failure.
    ///
    /// Preference order: structured server message, the error's own
    /// message, then `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message()
            .or_else(|| self.generic_message())
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

fn structured_message(body: &Value) -> Option<String> {
    let fault = body
        .pointer("/Fault/Error/0/Message")
        .and_then(Value::as_str);
    let error = body.get("error").and_then(|v| {
        v.as_str()
            .or_else(|| v.get("message").and_then(Value::as_str))
    });
    let message = body.get("message").and_then(Value::as_str);

    fault
        .or(error)
        .or(message)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Errors surfaced by the remote synchronizer to the form that owns a draft.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required fields failed; nothing was sent.
    #[error("{}", .0.message())]
    Validation(ValidationReport),

    #[error(transparent)]
    Draft(#[from] DraftError),

    /// The remote call failed. `message` is the notification shown to the user.
    #[error("{message}")]
    Api {
        #[source]
        source: ApiError,
        message: String,
    },

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    /// A create call succeeded but the response carried no record id. The
    /// record may exist remotely even though the draft is still new.
    #[error("The server did not confirm the new record. It may already exist, so refresh before submitting again")]
    MissingIdentity,
}

impl SyncError {
    /// Wraps an API failure, deriving the user message with `fallback` as last resort.
    pub fn api(source: ApiError, fallback: &str) -> Self {
        let message = source.user_message(fallback);
        SyncError::Api { source, message }
    }

    /// Notification text shown to the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::Api { source, .. } if source.is_not_found())
    }
}
