use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::draft::RemoteIdentity;
use crate::error::DraftError;
use crate::models::payment::{default_payment_method, PaymentRecord};
use crate::models::reference::Reference;
use crate::sync::inbound;
use crate::validation::{self, ValidationReport};

/// Portion of the payment allocated to one invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedLine {
    pub invoice_id: String,
    pub amount: Decimal,
}

/// Open invoice of the paying customer, with its outstanding balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenInvoice {
    pub id: String,
    pub doc_number: Option<String>,
    pub balance: Decimal,
    pub due_date: Option<NaiveDate>,
}

/// Locally held payment being created or edited.
///
/// `unapplied_amount` is derived as `max(0, total - sum(applied))` and is
/// refreshed after every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftPayment {
    customer: Reference,
    total_amount: Decimal,
    reference_number: String,
    txn_date: NaiveDate,
    payment_method: Reference,
    applied: Vec<AppliedLine>,
    unapplied_amount: Decimal,
    private_note: Option<String>,
    open_invoices: Vec<OpenInvoice>,
    /// Whether `open_invoices` reflects a lookup for the current customer.
    open_invoices_loaded: bool,
    /// Applications present when the record was loaded. Their amounts are
    /// already deducted from the invoices' remote balances.
    loaded_applied: Vec<AppliedLine>,
    identity: Option<RemoteIdentity>,
}

impl DraftPayment {
    /// New payment dated `txn_date`, paid in cash, with nothing applied.
    pub fn new(txn_date: NaiveDate) -> Self {
        Self {
            customer: Reference::default(),
            total_amount: Decimal::ZERO,
            reference_number: String::new(),
            txn_date,
            payment_method: default_payment_method(),
            applied: Vec::new(),
            unapplied_amount: Decimal::ZERO,
            private_note: None,
            open_invoices: Vec::new(),
            open_invoices_loaded: false,
            loaded_applied: Vec::new(),
            identity: None,
        }
    }

    /// New payment dated today.
    pub fn empty() -> Self {
        Self::new(Utc::now().date_naive())
    }

    /// Edit draft for a loaded payment record.
    pub fn from_record(record: &PaymentRecord) -> Self {
        inbound::payment_draft(record)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        customer: Reference,
        total_amount: Decimal,
        reference_number: String,
        txn_date: NaiveDate,
        payment_method: Reference,
        applied: Vec<AppliedLine>,
        private_note: Option<String>,
        identity: Option<RemoteIdentity>,
    ) -> Self {
        let mut draft = Self {
            customer,
            total_amount,
            reference_number,
            txn_date,
            payment_method,
            loaded_applied: applied.clone(),
            applied,
            unapplied_amount: Decimal::ZERO,
            private_note,
            open_invoices: Vec::new(),
            open_invoices_loaded: false,
            identity,
        };
        draft.recompute_derived();
        draft
    }

    /// Paying customer; unset on a fresh draft.
    pub fn customer(&self) -> &Reference {
        &self.customer
    }

    /// Amount received from the customer.
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// Cheque or transfer reference. Required before submitting.
    pub fn reference_number(&self) -> &str {
        &self.reference_number
    }

    /// Date the payment was received.
    pub fn txn_date(&self) -> NaiveDate {
        self.txn_date
    }

    /// Method from the payment-method catalog.
    pub fn payment_method(&self) -> &Reference {
        &self.payment_method
    }

    /// Allocations to invoices, in the order they were first applied.
    pub fn applied_lines(&self) -> &[AppliedLine] {
        &self.applied
    }

    /// Amount applied to `invoice_id`, zero when nothing is.
    pub fn applied_to(&self, invoice_id: &str) -> Decimal {
        self.applied
            .iter()
            .find(|line| line.invoice_id == invoice_id)
            .map(|line| line.amount)
            .unwrap_or_default()
    }

    /// Sum of all applied amounts.
    pub fn applied_total(&self) -> Decimal {
        self.applied.iter().map(|line| line.amount).sum()
    }

    /// Part of the total not yet allocated, never below zero.
    pub fn unapplied_amount(&self) -> Decimal {
        self.unapplied_amount
    }

    /// Internal note, never shown to the customer.
    pub fn private_note(&self) -> Option<&str> {
        self.private_note.as_deref()
    }

    /// Open invoices of the customer, as last loaded.
    pub fn open_invoices(&self) -> &[OpenInvoice] {
        &self.open_invoices
    }

    /// Remote id and concurrency token; `None` until the payment is saved.
    pub fn identity(&self) -> Option<&RemoteIdentity> {
        self.identity.as_ref()
    }

    /// Whether submitting creates a new remote payment.
    pub fn is_new(&self) -> bool {
        self.identity.is_none()
    }

    /// Selects the paying customer.
    ///
    /// Switching to a different customer drops the applications and the open
    /// invoice list, which belonged to the previous customer.
    pub fn set_customer(&mut self, customer: Reference) {
        if customer.id != self.customer.id {
            self.applied.clear();
            self.open_invoices.clear();
            self.open_invoices_loaded = false;
            self.loaded_applied.clear();
        }
        self.customer = customer;
        self.recompute_derived();
    }

    /// Replaces the open invoice list. From here on, applications must
    /// target one of these invoices or one applied when the record loaded.
    pub fn set_open_invoices(&mut self, open_invoices: Vec<OpenInvoice>) {
        self.open_invoices = open_invoices;
        self.open_invoices_loaded = true;
    }

    /// Sets the amount received and refreshes the unapplied amount.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::NegativeAmount` for negative totals.
    pub fn set_total_amount(&mut self, total_amount: Decimal) -> Result<(), DraftError> {
        if total_amount < Decimal::ZERO {
            return Err(DraftError::NegativeAmount);
        }
        self.total_amount = total_amount;
        self.recompute_derived();
        Ok(())
    }

    pub fn set_reference_number(&mut self, reference_number: impl Into<String>) {
        self.reference_number = reference_number.into();
    }

    pub fn set_txn_date(&mut self, txn_date: NaiveDate) {
        self.txn_date = txn_date;
    }

    pub fn set_payment_method(&mut self, payment_method: Reference) {
        self.payment_method = payment_method;
    }

    /// A blank note clears it.
    pub fn set_private_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        self.private_note = if note.trim().is_empty() { None } else { Some(note) };
    }

    /// Largest amount this payment may apply to `invoice_id`, if known.
    ///
    /// That is the invoice's open balance plus whatever this payment already
    /// had applied to it when loaded. Invoices that are neither open nor
    /// previously applied have no known bound.
    pub fn available_for(&self, invoice_id: &str) -> Option<Decimal> {
        let loaded = self
            .loaded_applied
            .iter()
            .find(|line| line.invoice_id == invoice_id)
            .map(|line| line.amount);
        let open = self
            .open_invoices
            .iter()
            .find(|invoice| invoice.id == invoice_id)
            .map(|invoice| invoice.balance);

        match (open, loaded) {
            (None, None) => None,
            (open, loaded) => Some(open.unwrap_or_default() + loaded.unwrap_or_default()),
        }
    }

    /// Applies `amount` of this payment to `invoice_id`, replacing any
    /// earlier amount for that invoice. Zero removes the application.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `DraftError::NegativeAmount` for negative amounts
    /// - `DraftError::UnknownInvoice` when open invoices are loaded and
    ///   `invoice_id` is neither among them nor applied at load time
    /// - `DraftError::ExceedsInvoiceBalance` when the amount is above the
    ///   invoice's known outstanding balance
    pub fn apply_to_invoice(
        &mut self,
        invoice_id: &str,
        amount: Decimal,
    ) -> Result<(), DraftError> {
        if amount < Decimal::ZERO {
            return Err(DraftError::NegativeAmount);
        }
        match self.available_for(invoice_id) {
            Some(balance) if amount > balance => {
                return Err(DraftError::ExceedsInvoiceBalance {
                    invoice_id: invoice_id.to_string(),
                    requested: amount,
                    balance,
                });
            }
            None if self.open_invoices_loaded && !amount.is_zero() => {
                return Err(DraftError::UnknownInvoice(invoice_id.to_string()));
            }
            _ => {}
        }

        let existing = self
            .applied
            .iter()
            .position(|line| line.invoice_id == invoice_id);
        match existing {
            Some(index) if amount.is_zero() => {
                self.applied.remove(index);
            }
            Some(index) => self.applied[index].amount = amount,
            None if amount.is_zero() => {}
            None => self.applied.push(AppliedLine {
                invoice_id: invoice_id.to_string(),
                amount,
            }),
        }
        debug!("Applied {} to invoice {}", amount, invoice_id);

        self.recompute_derived();
        Ok(())
    }

    /// Refreshes `unapplied_amount` from the total and the applications.
    pub fn recompute_derived(&mut self) {
        let remaining = self.total_amount - self.applied_total();
        self.unapplied_amount = remaining.max(Decimal::ZERO);
    }

    pub fn validate(&self) -> ValidationReport {
        validation::validate_payment(self)
    }

    pub(crate) fn mark_saved(&mut self, identity: RemoteIdentity) {
        self.loaded_applied = self.applied.clone();
        self.identity = Some(identity);
    }
}
