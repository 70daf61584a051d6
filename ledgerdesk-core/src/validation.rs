use std::collections::BTreeMap;
use std::fmt;

use crate::draft::{DraftInvoice, DraftPayment};

/// Whether a failing field is a hard requirement or an advisory bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Required,
    Advisory,
}

/// Form fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Customer,
    Items,
    TotalAmount,
    ReferenceNumber,
    AppliedAmount,
}

impl Field {
    /// Field name as the forms key it.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Customer => "customer",
            Field::Items => "items",
            Field::TotalAmount => "totalAmount",
            Field::ReferenceNumber => "referenceNumber",
            Field::AppliedAmount => "appliedAmount",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Field::AppliedAmount => Severity::Advisory,
            _ => Severity::Required,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Field::Customer => "Please select a customer",
            Field::Items => "Please add at least one line item",
            Field::TotalAmount => "Amount is required",
            Field::ReferenceNumber => "Payment reference is required",
            Field::AppliedAmount => "Total applied amount cannot exceed payment amount",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of validating a draft: every checked field mapped to whether it failed.
///
/// All checks run, so every failing field is reported at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    fields: BTreeMap<Field, bool>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, field: Field, failed: bool) -> &mut Self {
        self.fields.insert(field, failed);
        self
    }

    pub fn failed(&self, field: Field) -> bool {
        self.fields.get(&field).copied().unwrap_or(false)
    }

    /// Fields that failed, in field order.
    pub fn failed_fields(&self) -> Vec<Field> {
        self.fields
            .iter()
            .filter(|(_, failed)| **failed)
            .map(|(field, _)| *field)
            .collect()
    }

    /// `true` when no field failed; only then may the draft be submitted.
    pub fn is_valid(&self) -> bool {
        self.fields.values().all(|failed| !failed)
    }

    pub fn has_required_failures(&self) -> bool {
        self.failed_fields()
            .iter()
            .any(|field| field.severity() == Severity::Required)
    }

    /// Field-name keyed flags, as the forms consume them.
    pub fn to_map(&self) -> BTreeMap<&'static str, bool> {
        self.fields
            .iter()
            .map(|(field, failed)| (field.name(), *failed))
            .collect()
    }

    /// One line naming every failure, for the form's error banner.
    pub fn message(&self) -> String {
        self.failed_fields()
            .iter()
            .map(Field::message)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Checks an invoice draft.
///
/// A customer and at least one line are required. Every check runs, so
/// the report lists all failing fields at once.
pub fn validate_invoice(draft: &DraftInvoice) -> ValidationReport {
    let mut report = ValidationReport::new();
    report
        .record(Field::Customer, !draft.customer().is_set())
        .record(Field::Items, draft.lines().is_empty());
    report
}

/// Over-application (applied total above the payment total) is advisory:
/// it is flagged separately from the required fields and still blocks
/// submission.
pub fn validate_payment(draft: &DraftPayment) -> ValidationReport {
    let mut report = ValidationReport::new();
    report
        .record(Field::Customer, !draft.customer().is_set())
        .record(Field::TotalAmount, draft.total_amount().is_zero())
        .record(
            Field::ReferenceNumber,
            draft.reference_number().trim().is_empty(),
        )
        .record(
            Field::AppliedAmount,
            draft.applied_total() > draft.total_amount(),
        );
    report
}
