use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::SyncError;
use crate::models::customer::Customer;
use crate::models::invoice::InvoiceRecord;
use crate::models::payment::PaymentRecord;
use crate::sync::inbound::parse_remote_date;

/// Name shown when an invoice's customer cannot be resolved.
pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";

/// Payment state of an invoice, derived from its remaining balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    Open,
    Paid,
}

impl InvoiceStatus {
    /// `Paid` once nothing is left to collect.
    ///
    /// Records without a balance fall back to the server's status text.
    pub fn of(record: &InvoiceRecord) -> Self {
        match record.balance {
            Some(balance) if balance.is_zero() => InvoiceStatus::Paid,
            Some(_) => InvoiceStatus::Open,
            None => match record.status.as_deref() {
                Some(status) if status.eq_ignore_ascii_case("paid") => InvoiceStatus::Paid,
                _ => InvoiceStatus::Open,
            },
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Open => write!(f, "Open"),
            InvoiceStatus::Paid => write!(f, "Paid"),
        }
    }
}

/// Status filter of the invoice list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Paid,
}

impl StatusFilter {
    pub fn matches(&self, status: InvoiceStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Open => status == InvoiceStatus::Open,
            StatusFilter::Paid => status == InvoiceStatus::Paid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown status filter: {0}")]
pub struct UnknownStatusFilter(pub String);

impl FromStr for StatusFilter {
    type Err = UnknownStatusFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "open" => Ok(StatusFilter::Open),
            "paid" => Ok(StatusFilter::Paid),
            other => Err(UnknownStatusFilter(other.to_string())),
        }
    }
}

/// Row of the invoice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSummary {
    pub id: String,
    pub doc_number: String,
    pub customer_name: String,
    pub txn_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub total: Decimal,
    pub balance: Decimal,
    pub status: InvoiceStatus,
}

impl InvoiceSummary {
    /// Case-insensitive match against doc number, customer, status and total.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [
            self.doc_number.to_lowercase(),
            self.customer_name.to_lowercase(),
            self.status.to_string().to_lowercase(),
            self.total.to_string(),
        ]
        .iter()
        .any(|field| field.contains(&term))
    }
}

/// Customer id to display name.
pub fn customer_names(customers: &[Customer]) -> HashMap<String, String> {
    customers
        .iter()
        .filter(|customer| !customer.id.is_empty())
        .map(|customer| (customer.id.clone(), customer.name()))
        .collect()
}

fn resolve_customer_name(record: &InvoiceRecord, names: &HashMap<String, String>) -> String {
    let from_map = record
        .customer_ref_id()
        .and_then(|id| names.get(id))
        .cloned();
    let nested = record
        .customer
        .as_ref()
        .map(|customer| customer.name.trim().to_string())
        .filter(|name| !name.is_empty());

    from_map
        .or(nested)
        .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string())
}

/// Rows for the invoice list, with customer names resolved through `names`.
pub fn summarize_invoices(
    records: &[InvoiceRecord],
    names: &HashMap<String, String>,
) -> Vec<InvoiceSummary> {
    records
        .iter()
        .map(|record| InvoiceSummary {
            id: record.id.clone(),
            doc_number: record.doc_number.clone().unwrap_or_default(),
            customer_name: resolve_customer_name(record, names),
            txn_date: record.date.as_deref().and_then(parse_remote_date),
            due_date: record.due_date.as_deref().and_then(parse_remote_date),
            total: record.total_amount.unwrap_or_default(),
            balance: record.balance_or_zero(),
            status: InvoiceStatus::of(record),
        })
        .collect()
}

/// Rows matching both the status filter and the search text.
pub fn filter_invoices<'a>(
    invoices: &'a [InvoiceSummary],
    filter: StatusFilter,
    search: &str,
) -> Vec<&'a InvoiceSummary> {
    invoices
        .iter()
        .filter(|invoice| filter.matches(invoice.status))
        .filter(|invoice| invoice.matches_search(search))
        .collect()
}

/// Row of the payment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSummary {
    pub id: String,
    pub customer_name: String,
    pub reference_number: String,
    pub txn_date: Option<NaiveDate>,
    pub total: Decimal,
    pub unapplied: Decimal,
    pub method: String,
}

/// Rows for the payment list.
pub fn summarize_payments(records: &[PaymentRecord]) -> Vec<PaymentSummary> {
    records
        .iter()
        .map(|record| PaymentSummary {
            id: record.id.clone(),
            customer_name: record
                .customer
                .as_ref()
                .map(|customer| customer.name.clone())
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string()),
            reference_number: record.payment_ref_num.clone().unwrap_or_default(),
            txn_date: record.date.as_deref().and_then(parse_remote_date),
            total: record.total_amount.unwrap_or_default(),
            unapplied: record.unapplied_amount.unwrap_or_default(),
            method: record
                .payment_method
                .as_ref()
                .map(|method| method.name.clone())
                .unwrap_or_default(),
        })
        .collect()
}

/// Outcome of loading a record for a view.
///
/// `NotFound` is terminal: the view offers nothing but navigating away.
/// `Failed` carries the notification text; the user may retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    Loaded(T),
    NotFound,
    Failed(String),
}

impl<T> ViewState<T> {
    /// Maps a load result to what the view renders. Not-found errors get
    /// their own state instead of an error banner.
    pub fn from_result(result: Result<T, SyncError>) -> Self {
        match result {
            Ok(value) => ViewState::Loaded(value),
            Err(err) if err.is_not_found() => ViewState::NotFound,
            Err(err) => ViewState::Failed(err.user_message()),
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            ViewState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}
