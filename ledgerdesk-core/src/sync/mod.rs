pub mod api;
pub mod guard;
pub mod inbound;
pub mod outbound;
pub mod synchronizer;
pub mod types;

#[cfg(test)]
mod tests;

pub use api::{HttpApi, RecordsApi};
pub use guard::{SubmitGuard, SubmitTicket};
pub use synchronizer::{RemoteSynchronizer, SubmitOutcome};
pub use types::*;
