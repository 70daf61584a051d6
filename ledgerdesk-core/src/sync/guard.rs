use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Ensures at most one submission per form is outstanding.
///
/// [`SubmitGuard::try_begin`] hands out a ticket; the guard stays busy until
/// the ticket is dropped, whether the submission succeeded or failed.
#[derive(Debug, Clone, Default)]
pub struct SubmitGuard {
    in_flight: Arc<AtomicBool>,
}

/// Proof that the holder owns the in-flight slot of a [`SubmitGuard`].
#[derive(Debug)]
pub struct SubmitTicket {
    in_flight: Arc<AtomicBool>,
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the in-flight slot, or returns `None` if a submission is running.
    pub fn try_begin(&self) -> Option<SubmitTicket> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitTicket {
                in_flight: Arc::clone(&self.in_flight),
            })
    }

    /// Whether a ticket is currently held.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for SubmitTicket {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
