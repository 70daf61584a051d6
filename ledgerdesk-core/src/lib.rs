//! Draft, validation and remote-sync core of the LedgerDesk bookkeeping client.
//!
//! Invoices and payments are edited locally as drafts, validated, and then
//! written to the remote accounting API through a [`sync::RemoteSynchronizer`].

pub mod auth;
pub mod config;
pub mod draft;
pub mod error;
pub mod listing;
pub mod models;
pub mod sync;
pub mod validation;

pub use auth::Session;
pub use config::ClientConfig;
pub use draft::{Draft, DraftInvoice, DraftLineItem, DraftPayment};
pub use error::{ApiError, DraftError, SyncError};
pub use sync::{HttpApi, RecordsApi, RemoteSynchronizer, SubmitOutcome};
pub use validation::{Field, ValidationReport};
