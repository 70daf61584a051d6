use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use crate::draft::{
    AppliedLine, ConcurrencyToken, DraftInvoice, DraftLineItem, DraftPayment, OpenInvoice,
    RemoteIdentity,
};
use crate::models::invoice::{InvoiceLineRecord, InvoiceRecord};
use crate::models::payment::{default_payment_method, payment_method, PaymentRecord};
use crate::models::reference::{NamedRef, Reference};

/// Parses a remote date, accepting both `YYYY-MM-DD` and full timestamps.
pub fn parse_remote_date(raw: &str) -> Option<NaiveDate> {
    let day = raw
        .trim()
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn date_or_today(raw: Option<&str>) -> NaiveDate {
    raw.and_then(parse_remote_date)
        .unwrap_or_else(|| Utc::now().date_naive())
}

/// Identity of a remote record. Records without an id yield none.
pub fn remote_identity(id: &str, sync_token: Option<&str>) -> Option<RemoteIdentity> {
    if id.trim().is_empty() {
        return None;
    }
    Some(RemoteIdentity::new(id, ConcurrencyToken::from_remote(sync_token)))
}

fn reference(named: Option<&NamedRef>) -> Reference {
    named.map(Reference::from).unwrap_or_default()
}

fn whole_quantity(raw: Decimal) -> Option<u32> {
    Some(raw)
        .filter(|quantity| quantity.fract().is_zero())
        .and_then(|quantity| quantity.to_u32())
        .filter(|quantity| *quantity > 0)
}

/// Quantity and unit price of a remote line.
///
/// The pair always reproduces the stored line amount. A missing price is
/// derived as `amount / quantity`. A line whose quantity is not a positive
/// whole number, or whose numbers do not multiply out to its amount, is
/// kept as one unit priced at the amount. Negative prices (discount lines)
/// are kept as they are.
fn line_numbers(line: &InvoiceLineRecord) -> (u32, Decimal) {
    let raw_quantity = line.quantity.unwrap_or(Decimal::ONE);
    let quantity = whole_quantity(raw_quantity);

    let Some(amount) = line.amount else {
        let quantity = quantity.unwrap_or_else(|| {
            warn!("Remote line quantity {} is not a whole number", raw_quantity);
            raw_quantity.round().to_u32().filter(|q| *q > 0).unwrap_or(1)
        });
        return (quantity, line.unit_price.unwrap_or_default());
    };

    if let Some(quantity) = quantity {
        let unit_price = line
            .unit_price
            .or_else(|| amount.checked_div(Decimal::from(quantity)));
        if let Some(unit_price) = unit_price {
            if Decimal::from(quantity).checked_mul(unit_price) == Some(amount) {
                return (quantity, unit_price);
            }
        }
    }

    warn!(
        "Remote line (quantity {}, unit price {:?}) does not reproduce its amount {}; kept as one unit",
        raw_quantity, line.unit_price, amount
    );
    (1, amount)
}

fn draft_line(line: &InvoiceLineRecord) -> DraftLineItem {
    let description = line.description.clone().unwrap_or_default();
    let item = Reference::new(line.item_id.clone().unwrap_or_default(), description.clone());
    let (quantity, unit_price) = line_numbers(line);
    DraftLineItem::restore(item, quantity, unit_price, description)
}

/// Projects a remote invoice into an edit draft.
///
/// Nested customer and line objects are flattened; absent optional fields
/// default to empty strings and zero amounts.
pub fn invoice_draft(record: &InvoiceRecord) -> DraftInvoice {
    let customer = Reference::new(
        record.customer_ref_id().unwrap_or_default(),
        record
            .customer
            .as_ref()
            .map(|customer| customer.name.clone())
            .unwrap_or_default(),
    );
    let lines = record.line_items.iter().map(draft_line).collect();

    DraftInvoice::restore(
        customer,
        date_or_today(record.date.as_deref()),
        record.due_date.as_deref().and_then(parse_remote_date),
        lines,
        record.customer_memo.clone().filter(|memo| !memo.trim().is_empty()),
        remote_identity(&record.id, record.sync_token.as_deref()),
    )
}

/// Projects a remote payment into an edit draft.
pub fn payment_draft(record: &PaymentRecord) -> DraftPayment {
    let method = match record.payment_method.as_ref() {
        Some(method) if method.id.is_empty() => default_payment_method(),
        Some(method) if method.name.is_empty() => payment_method(&method.id),
        Some(method) => Reference::from(method),
        None => default_payment_method(),
    };

    let applied = record
        .applied_invoices
        .iter()
        .filter(|applied| !applied.invoice_id.trim().is_empty())
        .map(|applied| AppliedLine {
            invoice_id: applied.invoice_id.clone(),
            amount: applied.amount.unwrap_or_default(),
        })
        .collect();

    DraftPayment::restore(
        reference(record.customer.as_ref()),
        record.total_amount.unwrap_or_default().max(Decimal::ZERO),
        record.payment_ref_num.clone().unwrap_or_default(),
        date_or_today(record.date.as_deref()),
        method,
        applied,
        record.private_note.clone().filter(|note| !note.trim().is_empty()),
        remote_identity(&record.id, record.sync_token.as_deref()),
    )
}

/// Invoices that still have an outstanding balance.
pub fn open_invoices(records: &[InvoiceRecord]) -> Vec<OpenInvoice> {
    records
        .iter()
        .filter(|record| record.balance_or_zero() > Decimal::ZERO)
        .map(|record| OpenInvoice {
            id: record.id.clone(),
            doc_number: record.doc_number.clone(),
            balance: record.balance_or_zero(),
            due_date: record.due_date.as_deref().and_then(parse_remote_date),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::InvoiceLineRecord;
    use crate::models::payment::AppliedInvoiceRecord;
    use crate::sync::outbound::{invoice_payload, payment_payload};

    fn loaded_invoice() -> InvoiceRecord {
        InvoiceRecord {
            id: "130".to_string(),
            sync_token: Some("4".to_string()),
            doc_number: Some("1037".to_string()),
            customer: Some(NamedRef {
                id: "42".to_string(),
                name: "Sushi by Katsuyuki".to_string(),
            }),
            date: Some("2024-03-01T00:00:00Z".to_string()),
            due_date: Some("2024-03-31".to_string()),
            line_items: vec![
                InvoiceLineRecord {
                    item_id: Some("1".to_string()),
                    description: Some("Web Design Service".to_string()),
                    quantity: Some(Decimal::from(2)),
                    unit_price: Some(Decimal::from(500)),
                    amount: Some(Decimal::from(1000)),
                },
                InvoiceLineRecord {
                    item_id: Some("3".to_string()),
                    description: Some("Consulting".to_string()),
                    quantity: Some(Decimal::from(3)),
                    unit_price: Some(Decimal::new(15050, 2)),
                    amount: Some(Decimal::new(45150, 2)),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_remote_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_remote_date("2024-03-01"), expected);
        assert_eq!(parse_remote_date("2024-03-01T08:30:00-07:00"), expected);
        assert_eq!(parse_remote_date("not a date"), None);
    }

    #[test]
    fn test_invoice_projection() {
        let draft = invoice_draft(&loaded_invoice());
        assert_eq!(draft.customer(), &Reference::new("42", "Sushi by Katsuyuki"));
        assert_eq!(draft.txn_date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(draft.due_date(), NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(draft.lines().len(), 2);
        assert_eq!(draft.lines()[1].item(), &Reference::new("3", "Consulting"));

        let identity = draft.identity().unwrap();
        assert_eq!(identity.id, "130");
        assert_eq!(identity.token.as_str(), "4");
    }

    #[test]
    fn test_unchanged_round_trip_keeps_line_amounts() {
        let record = loaded_invoice();
        let payload = invoice_payload(&invoice_draft(&record));

        let loaded: Vec<Decimal> = record
            .line_items
            .iter()
            .map(|line| line.amount.unwrap())
            .collect();
        let sent: Vec<Decimal> = payload.line.iter().map(|line| line.amount).collect();
        assert_eq!(sent, loaded);
        assert_eq!(payload.sync_token.as_deref(), Some("4"));
    }

    fn round_trip(line: InvoiceLineRecord) -> (Decimal, DraftLineItem) {
        let record = InvoiceRecord {
            id: "130".to_string(),
            sync_token: Some("4".to_string()),
            line_items: vec![line],
            ..Default::default()
        };
        let draft = invoice_draft(&record);
        let payload = invoice_payload(&draft);
        (payload.line[0].amount, draft.lines()[0].clone())
    }

    #[test]
    fn test_fractional_quantity_keeps_amount() {
        let (sent, line) = round_trip(InvoiceLineRecord {
            item_id: Some("3".to_string()),
            description: Some("Consulting".to_string()),
            quantity: Some(Decimal::new(15, 1)),
            unit_price: Some(Decimal::from(150)),
            amount: Some(Decimal::from(225)),
        });
        assert_eq!(sent, Decimal::from(225));
        assert_eq!(line.quantity(), 1);
        assert_eq!(line.unit_price(), Decimal::from(225));
    }

    #[test]
    fn test_missing_price_derived_from_amount() {
        let (sent, line) = round_trip(InvoiceLineRecord {
            item_id: Some("1".to_string()),
            quantity: Some(Decimal::from(2)),
            unit_price: None,
            amount: Some(Decimal::from(1000)),
            ..Default::default()
        });
        assert_eq!(sent, Decimal::from(1000));
        assert_eq!(line.quantity(), 2);
        assert_eq!(line.unit_price(), Decimal::from(500));

        let (sent, line) = round_trip(InvoiceLineRecord {
            item_id: Some("1".to_string()),
            quantity: Some(Decimal::from(3)),
            unit_price: None,
            amount: Some(Decimal::from(100)),
            ..Default::default()
        });
        assert_eq!(sent, Decimal::from(100));
        assert_eq!(line.quantity(), 1);
    }

    #[test]
    fn test_discount_line_keeps_negative_price() {
        let (sent, line) = round_trip(InvoiceLineRecord {
            item_id: Some("1".to_string()),
            description: Some("Loyalty discount".to_string()),
            quantity: Some(Decimal::ONE),
            unit_price: Some(Decimal::from(-50)),
            amount: Some(Decimal::from(-50)),
        });
        assert_eq!(sent, Decimal::from(-50));
        assert_eq!(line.unit_price(), Decimal::from(-50));
    }

    #[test]
    fn test_mismatched_amount_wins_over_price() {
        let (sent, _) = round_trip(InvoiceLineRecord {
            item_id: Some("2".to_string()),
            quantity: Some(Decimal::from(3)),
            unit_price: Some(Decimal::new(3333, 2)),
            amount: Some(Decimal::from(100)),
            ..Default::default()
        });
        assert_eq!(sent, Decimal::from(100));
    }

    #[test]
    fn test_absent_fields_default() {
        let record = InvoiceRecord {
            id: "5".to_string(),
            line_items: vec![InvoiceLineRecord::default()],
            ..Default::default()
        };
        let draft = invoice_draft(&record);
        assert_eq!(draft.customer(), &Reference::default());
        assert_eq!(draft.memo(), None);
        assert_eq!(draft.lines()[0].quantity(), 1);
        assert_eq!(draft.lines()[0].unit_price(), Decimal::ZERO);
        assert_eq!(draft.lines()[0].description(), "");
        assert_eq!(draft.identity().unwrap().token, ConcurrencyToken::initial());
    }

    #[test]
    fn test_payment_projection_and_token_pass_through() {
        let record = PaymentRecord {
            id: "88".to_string(),
            sync_token: Some("9".to_string()),
            customer: Some(NamedRef {
                id: "42".to_string(),
                name: "Bill's Windsurf Shop".to_string(),
            }),
            total_amount: Some(Decimal::from(250)),
            payment_ref_num: Some("CHK-1001".to_string()),
            date: Some("2024-04-02".to_string()),
            payment_method: Some(NamedRef {
                id: "3".to_string(),
                name: String::new(),
            }),
            applied_invoices: vec![AppliedInvoiceRecord {
                invoice_id: "130".to_string(),
                invoice_doc_number: Some("1037".to_string()),
                amount: Some(Decimal::from(200)),
            }],
            ..Default::default()
        };

        let draft = payment_draft(&record);
        assert_eq!(draft.payment_method(), &Reference::new("3", "Check"));
        assert_eq!(draft.unapplied_amount(), Decimal::from(50));
        assert_eq!(draft.available_for("130"), Some(Decimal::from(200)));

        let payload = payment_payload(&draft);
        assert_eq!(payload.sync_token.as_deref(), Some("9"));
        assert_eq!(payload.id.as_deref(), Some("88"));
    }

    #[test]
    fn test_open_invoices_skip_paid() {
        let records = vec![
            InvoiceRecord {
                id: "1".to_string(),
                balance: Some(Decimal::ZERO),
                ..Default::default()
            },
            InvoiceRecord {
                id: "2".to_string(),
                balance: Some(Decimal::from(75)),
                due_date: Some("2024-07-01".to_string()),
                ..Default::default()
            },
        ];
        let open = open_invoices(&records);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "2");
        assert_eq!(open[0].due_date, NaiveDate::from_ymd_opt(2024, 7, 1));
    }
}
