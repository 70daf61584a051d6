use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reference field on the write side: `{ "value": id }`. Names are dropped on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefValue {
    pub value: String,
}

impl RefValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Free-text field wrapped the way the accounting platform expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoValue {
    pub value: String,
}

pub const SALES_ITEM_LINE: &str = "SalesItemLineDetail";
pub const INVOICE_TXN_TYPE: &str = "Invoice";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesItemLineDetail {
    pub item_ref: RefValue,
    pub qty: u32,
    pub unit_price: Decimal,
}

/// Typed invoice line as submitted to the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceLine {
    pub detail_type: String,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
    pub sales_item_line_detail: SalesItemLineDetail,
}

/// Body of `POST /invoices/create-invoice` and `PUT /invoices/{id}`.
///
/// `Id` and `SyncToken` are present only on updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoicePayload {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sync_token: Option<String>,

    pub customer_ref: RefValue,

    pub txn_date: NaiveDate,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub due_date: Option<NaiveDate>,

    pub line: Vec<InvoiceLine>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub customer_memo: Option<MemoValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkedTxn {
    pub txn_id: String,
    pub txn_type: String,
}

/// Application of a payment to one invoice on the write side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentLine {
    pub amount: Decimal,
    pub linked_txn: Vec<LinkedTxn>,
}

/// Body of `POST /payments` and `PUT /payments/{id}`.
///
/// Updates carry `Id`, `SyncToken` and `sparse: true`; creates carry none of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentPayload {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sync_token: Option<String>,

    #[serde(
        rename = "sparse",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub sparse: Option<bool>,

    pub customer_ref: RefValue,

    pub total_amt: Decimal,

    pub unapplied_amt: Decimal,

    pub payment_ref_num: String,

    pub txn_date: NaiveDate,

    pub payment_method_ref: RefValue,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub private_note: Option<String>,

    pub line: Vec<PaymentLine>,
}
