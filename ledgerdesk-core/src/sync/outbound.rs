use rust_decimal::Decimal;

use crate::draft::{DraftInvoice, DraftPayment};
use crate::sync::types::{
    InvoiceLine, InvoicePayload, LinkedTxn, MemoValue, PaymentLine, PaymentPayload, RefValue,
    SalesItemLineDetail, INVOICE_TXN_TYPE, SALES_ITEM_LINE,
};

/// Maps a draft invoice to the remote write shape.
///
/// Line amounts are recomputed as `quantity × unit_price` here rather than
/// read from the draft's cached amount. The remote id and concurrency token
/// are included only when the draft edits an existing record.
pub fn invoice_payload(draft: &DraftInvoice) -> InvoicePayload {
    let line = draft
        .lines()
        .iter()
        .map(|line| InvoiceLine {
            detail_type: SALES_ITEM_LINE.to_string(),
            amount: line.computed_amount(),
            description: line.description().to_string(),
            sales_item_line_detail: SalesItemLineDetail {
                item_ref: RefValue::new(line.item().id.clone()),
                qty: line.quantity(),
                unit_price: line.unit_price(),
            },
        })
        .collect();

    let identity = draft.identity();

    InvoicePayload {
        id: identity.map(|identity| identity.id.clone()),
        sync_token: identity.map(|identity| identity.token.as_str().to_string()),
        customer_ref: RefValue::new(draft.customer().id.clone()),
        txn_date: draft.txn_date(),
        due_date: draft.due_date(),
        line,
        customer_memo: draft.memo().map(|memo| MemoValue {
            value: memo.to_string(),
        }),
    }
}

/// Maps a draft payment to the remote write shape.
///
/// Updates are sent as sparse updates carrying the id and the concurrency
/// token exactly as loaded.
pub fn payment_payload(draft: &DraftPayment) -> PaymentPayload {
    let line = draft
        .applied_lines()
        .iter()
        .map(|applied| PaymentLine {
            amount: applied.amount,
            linked_txn: vec![LinkedTxn {
                txn_id: applied.invoice_id.clone(),
                txn_type: INVOICE_TXN_TYPE.to_string(),
            }],
        })
        .collect();

    let identity = draft.identity();
    let unapplied = (draft.total_amount() - draft.applied_total()).max(Decimal::ZERO);

    PaymentPayload {
        id: identity.map(|identity| identity.id.clone()),
        sync_token: identity.map(|identity| identity.token.as_str().to_string()),
        sparse: identity.map(|_| true),
        customer_ref: RefValue::new(draft.customer().id.clone()),
        total_amt: draft.total_amount(),
        unapplied_amt: unapplied,
        payment_ref_num: draft.reference_number().trim().to_string(),
        txn_date: draft.txn_date(),
        payment_method_ref: RefValue::new(draft.payment_method().id.clone()),
        private_note: draft.private_note().map(str::to_string),
        line,
    }
}
