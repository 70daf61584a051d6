use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::reference::NamedRef;

/// Line item of an invoice as returned by `GET /invoices/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvoiceLineRecord {
    pub item_id: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub amount: Option<Decimal>,
}

/// Invoice record as returned by the remote API.
///
/// The read side of the API flattens the accounting platform's invoice into
/// camelCase fields with a nested `customer` and `lineItems`. Aliases cover
/// the PascalCase fields echoed back by create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvoiceRecord {
    #[serde(alias = "Id")]
    pub id: String,

    #[serde(alias = "SyncToken")]
    pub sync_token: Option<String>,

    #[serde(alias = "DocNumber")]
    pub doc_number: Option<String>,

    pub customer: Option<NamedRef>,

    pub customer_id: Option<String>,

    /// Transaction date, `YYYY-MM-DD` optionally followed by a time part
    #[serde(alias = "TxnDate")]
    pub date: Option<String>,

    #[serde(alias = "DueDate")]
    pub due_date: Option<String>,

    #[serde(alias = "TotalAmt")]
    pub total_amount: Option<Decimal>,

    #[serde(alias = "Balance")]
    pub balance: Option<Decimal>,

    pub customer_memo: Option<String>,

    pub status: Option<String>,

    pub line_items: Vec<InvoiceLineRecord>,
}

impl InvoiceRecord {
    /// Id of the billed customer, from the nested object or the flat field.
    pub fn customer_ref_id(&self) -> Option<&str> {
        self.customer
            .as_ref()
            .map(|customer| customer.id.as_str())
            .filter(|id| !id.is_empty())
            .or(self.customer_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn balance_or_zero(&self) -> Decimal {
        self.balance.unwrap_or_default()
    }
}

/// Body of `GET /invoices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceList {
    pub invoices: Vec<InvoiceRecord>,
    pub count: Option<u64>,
}

/// Filters accepted by `GET /invoices`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceQuery {
    pub customer_id: Option<String>,
    pub status: Option<String>,
}

impl InvoiceQuery {
    /// Open invoices of one customer, as needed when applying a payment.
    pub fn open_for_customer(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: Some(customer_id.into()),
            status: Some("open".to_string()),
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(customer_id) = &self.customer_id {
            pairs.push(("customerId", customer_id.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        pairs
    }
}
