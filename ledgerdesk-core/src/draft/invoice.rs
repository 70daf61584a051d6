use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::draft::line::{DraftLineItem, LineId, PendingLine};
use crate::draft::RemoteIdentity;
use crate::error::DraftError;
use crate::models::invoice::InvoiceRecord;
use crate::models::reference::Reference;
use crate::sync::inbound;
use crate::validation::{self, ValidationReport};

/// Locally held invoice being created or edited.
///
/// Lines keep insertion order, which is also their display and submission
/// order. Every mutation refreshes the derived line amounts before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftInvoice {
    customer: Reference,
    txn_date: NaiveDate,
    due_date: Option<NaiveDate>,
    lines: Vec<DraftLineItem>,
    memo: Option<String>,
    identity: Option<RemoteIdentity>,
}

impl DraftInvoice {
    /// Empty draft dated `txn_date`.
    pub fn new(txn_date: NaiveDate) -> Self {
        Self {
            customer: Reference::default(),
            txn_date,
            due_date: None,
            lines: Vec::new(),
            memo: None,
            identity: None,
        }
    }

    /// Empty draft dated today.
    pub fn empty() -> Self {
        Self::new(Utc::now().date_naive())
    }

    /// Draft editing an existing remote invoice.
    pub fn from_record(record: &InvoiceRecord) -> Self {
        inbound::invoice_draft(record)
    }

    pub(crate) fn restore(
        customer: Reference,
        txn_date: NaiveDate,
        due_date: Option<NaiveDate>,
        lines: Vec<DraftLineItem>,
        memo: Option<String>,
        identity: Option<RemoteIdentity>,
    ) -> Self {
        let mut draft = Self {
            customer,
            txn_date,
            due_date,
            lines,
            memo,
            identity,
        };
        draft.recompute_derived();
        draft
    }

    /// Customer being billed; unset on a fresh draft.
    pub fn customer(&self) -> &Reference {
        &self.customer
    }

    /// Invoice date.
    pub fn txn_date(&self) -> NaiveDate {
        self.txn_date
    }

    /// Payment due date, if one was set.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Committed lines in display order.
    pub fn lines(&self) -> &[DraftLineItem] {
        &self.lines
    }

    /// Line with the given id, if it is still part of the draft.
    pub fn line(&self, id: LineId) -> Option<&DraftLineItem> {
        self.lines.iter().find(|line| line.id() == id)
    }

    /// Customer-facing memo printed on the invoice.
    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }

    /// Remote id and concurrency token; `None` until the invoice is saved.
    pub fn identity(&self) -> Option<&RemoteIdentity> {
        self.identity.as_ref()
    }

    /// Whether submitting creates a new remote invoice.
    pub fn is_new(&self) -> bool {
        self.identity.is_none()
    }

    /// Sum of the line amounts.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(DraftLineItem::amount).sum()
    }

    pub fn set_customer(&mut self, customer: Reference) {
        self.customer = customer;
    }

    pub fn set_txn_date(&mut self, txn_date: NaiveDate) {
        self.txn_date = txn_date;
    }

    pub fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.due_date = due_date;
    }

    /// Sets the customer-facing memo; a blank memo clears it.
    pub fn set_memo(&mut self, memo: impl Into<String>) {
        let memo = memo.into();
        self.memo = if memo.trim().is_empty() { None } else { Some(memo) };
    }

    /// Appends a line for `item` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::ItemSelectionRequired` when no item is selected,
    /// or a range error for a zero quantity or negative price. The draft is
    /// left unchanged on error.
    pub fn add_line(
        &mut self,
        item: &Reference,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<LineId, DraftError> {
        let line = DraftLineItem::new(item.clone(), quantity, unit_price, "")?;
        Ok(self.push_line(line))
    }

    /// Commits the pending "add item" row and resets it for the next entry.
    pub fn commit_pending(&mut self, pending: &mut PendingLine) -> Result<LineId, DraftError> {
        let id = self.push_line(pending.build()?);
        pending.reset();
        Ok(id)
    }

    fn push_line(&mut self, line: DraftLineItem) -> LineId {
        let id = line.id();
        debug!("Adding line {} for item {}", id, line.item().id);
        self.lines.push(line);
        self.recompute_derived();
        id
    }

    /// Removes the line with `id` and returns it.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::LineNotFound` if no line has that id.
    pub fn remove_line(&mut self, id: LineId) -> Result<DraftLineItem, DraftError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.id() == id)
            .ok_or(DraftError::LineNotFound(id))?;
        let removed = self.lines.remove(index);
        self.recompute_derived();
        Ok(removed)
    }

    /// Changes quantity and price of an existing line in one step.
    pub fn update_line(
        &mut self,
        id: LineId,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<(), DraftError> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.id() == id)
            .ok_or(DraftError::LineNotFound(id))?;
        let mut updated = line.clone();
        updated.set_quantity(quantity)?;
        updated.set_unit_price(unit_price)?;
        *line = updated;
        self.recompute_derived();
        Ok(())
    }

    /// Recomputes every line amount from its quantity and unit price.
    pub fn recompute_derived(&mut self) {
        for line in &mut self.lines {
            line.recompute();
        }
    }

    /// Runs every invoice check; see [`validation::validate_invoice`].
    pub fn validate(&self) -> ValidationReport {
        validation::validate_invoice(self)
    }

    /// Records the identity the server assigned on the last successful save.
    pub(crate) fn mark_saved(&mut self, identity: RemoteIdentity) {
        self.identity = Some(identity);
    }
}
