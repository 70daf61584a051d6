use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::reference::{NamedRef, Reference};

/// Portion of a payment applied to one invoice, as returned on reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppliedInvoiceRecord {
    pub invoice_id: String,
    pub invoice_doc_number: Option<String>,
    pub amount: Option<Decimal>,
}

/// Payment record as returned by the remote API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(alias = "Id")]
    pub id: String,

    #[serde(alias = "SyncToken")]
    pub sync_token: Option<String>,

    pub customer: Option<NamedRef>,

    #[serde(alias = "TotalAmt")]
    pub total_amount: Option<Decimal>,

    #[serde(alias = "UnappliedAmt")]
    pub unapplied_amount: Option<Decimal>,

    #[serde(alias = "PaymentRefNum")]
    pub payment_ref_num: Option<String>,

    #[serde(alias = "TxnDate")]
    pub date: Option<String>,

    pub payment_method: Option<NamedRef>,

    #[serde(alias = "PrivateNote")]
    pub private_note: Option<String>,

    pub applied_invoices: Vec<AppliedInvoiceRecord>,
}

/// Body of `GET /payments`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentList {
    pub payments: Vec<PaymentRecord>,
    pub count: Option<u64>,
}

/// Filters accepted by `GET /payments`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentQuery {
    pub customer_id: Option<String>,
}

impl PaymentQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        self.customer_id
            .iter()
            .map(|id| ("customerId", id.clone()))
            .collect()
    }
}

/// Payment methods offered by the accounting platform, in display order.
pub fn payment_methods() -> Vec<Reference> {
    vec![
        Reference::new("1", "Cash"),
        Reference::new("2", "Credit Card"),
        Reference::new("3", "Check"),
        Reference::new("4", "Bank Transfer"),
    ]
}

/// Method preselected on new payments (cash).
pub fn default_payment_method() -> Reference {
    Reference::new("1", "Cash")
}

/// Looks up a payment method by id, defaulting the name for unknown ids.
pub fn payment_method(id: &str) -> Reference {
    payment_methods()
        .into_iter()
        .find(|method| method.id == id)
        .unwrap_or_else(|| Reference::new(id, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_payment_read_shape() {
        let record: PaymentRecord = serde_json::from_value(json!({
            "id": "88",
            "syncToken": "2",
            "customer": { "id": "42", "name": "Red Rock Diner" },
            "totalAmount": 250.5,
            "unappliedAmount": 50.5,
            "paymentRefNum": "CHK-1001",
            "date": "2024-04-02T00:00:00-07:00",
            "paymentMethod": { "id": "3", "name": "Check" },
            "appliedInvoices": [
                { "invoiceId": "130", "invoiceDocNumber": "1037", "amount": 200 }
            ]
        }))
        .unwrap();

        assert_eq!(record.total_amount, Some(Decimal::new(2505, 1)));
        assert_eq!(record.applied_invoices[0].invoice_id, "130");
        assert_eq!(record.payment_method.unwrap().name, "Check");
    }

    #[test]
    fn test_list_defaults_to_empty() {
        let list: PaymentList = serde_json::from_value(json!({})).unwrap();
        assert!(list.payments.is_empty());
        assert_eq!(list.count, None);
    }

    #[test]
    fn test_payment_method_lookup() {
        assert_eq!(payment_method("4").display_name, "Bank Transfer");
        assert_eq!(payment_method("99"), Reference::new("99", ""));
        assert_eq!(default_payment_method(), payment_methods()[0]);
    }
}
