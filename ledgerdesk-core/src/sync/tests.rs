#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::draft::{ConcurrencyToken, Draft, DraftInvoice, DraftPayment};
    use crate::error::{ApiError, SyncError};
    use crate::models::customer::{Customer, CustomerInput};
    use crate::models::invoice::{InvoiceList, InvoiceQuery, InvoiceRecord};
    use crate::models::payment::{AppliedInvoiceRecord, PaymentList, PaymentQuery, PaymentRecord};
    use crate::models::reference::{NamedRef, Reference};
    use crate::sync::api::RecordsApi;
    use crate::sync::synchronizer::{RemoteSynchronizer, SubmitOutcome};
    use crate::sync::types::{InvoicePayload, PaymentPayload};
    use crate::validation::Field;

    /// In-memory accounting API that records every call it receives.
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        customers: Vec<Customer>,
        invoices: HashMap<String, InvoiceRecord>,
        payments: HashMap<String, PaymentRecord>,
        open_invoices: Vec<InvoiceRecord>,
        write_error: Option<ApiError>,
        omit_created_id: bool,
        sent_invoices: Mutex<Vec<InvoicePayload>>,
        sent_payments: Mutex<Vec<PaymentPayload>>,
        invoice_queries: Mutex<Vec<InvoiceQuery>>,
    }

    impl FakeApi {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn created_id(&self, id: &str) -> String {
            if self.omit_created_id {
                String::new()
            } else {
                id.to_string()
            }
        }

        fn write_result(&self) -> Result<(), ApiError> {
            match &self.write_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    fn bump(token: Option<&String>) -> Option<String> {
        let current = token.and_then(|t| t.parse::<u32>().ok()).unwrap_or(0);
        Some((current + 1).to_string())
    }

    #[async_trait]
    impl RecordsApi for FakeApi {
        async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
            self.record("list_customers");
            self.write_result()?;
            Ok(self.customers.clone())
        }

        async fn get_customer(&self, id: &str) -> Result<Customer, ApiError> {
            self.record("get_customer");
            self.customers
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or(ApiError::NotFound {
                    entity: "customer",
                    id: id.to_string(),
                })
        }

        async fn create_customer(&self, input: &CustomerInput) -> Result<Customer, ApiError> {
            self.record("create_customer");
            self.write_result()?;
            Ok(Customer {
                id: "900".to_string(),
                display_name: Some(input.display_name.clone()),
                ..Default::default()
            })
        }

        async fn update_customer(
            &self,
            id: &str,
            input: &CustomerInput,
        ) -> Result<Customer, ApiError> {
            self.record("update_customer");
            self.write_result()?;
            Ok(Customer {
                id: id.to_string(),
                display_name: Some(input.display_name.clone()),
                ..Default::default()
            })
        }

        async fn list_invoices(&self, query: &InvoiceQuery) -> Result<InvoiceList, ApiError> {
            self.record("list_invoices");
            self.invoice_queries.lock().unwrap().push(query.clone());
            Ok(InvoiceList {
                invoices: self.open_invoices.clone(),
                count: Some(self.open_invoices.len() as u64),
            })
        }

        async fn get_invoice(&self, id: &str) -> Result<InvoiceRecord, ApiError> {
            self.record("get_invoice");
            self.invoices.get(id).cloned().ok_or(ApiError::NotFound {
                entity: "invoice",
                id: id.to_string(),
            })
        }

        async fn create_invoice(&self, payload: &InvoicePayload) -> Result<InvoiceRecord, ApiError> {
            self.record("create_invoice");
            self.sent_invoices.lock().unwrap().push(payload.clone());
            self.write_result()?;
            Ok(InvoiceRecord {
                id: self.created_id("501"),
                sync_token: Some("0".to_string()),
                ..Default::default()
            })
        }

        async fn update_invoice(
            &self,
            id: &str,
            payload: &InvoicePayload,
        ) -> Result<InvoiceRecord, ApiError> {
            self.record("update_invoice");
            self.sent_invoices.lock().unwrap().push(payload.clone());
            self.write_result()?;
            Ok(InvoiceRecord {
                id: id.to_string(),
                sync_token: bump(payload.sync_token.as_ref()),
                ..Default::default()
            })
        }

        async fn list_payments(&self, _query: &PaymentQuery) -> Result<PaymentList, ApiError> {
            self.record("list_payments");
            Ok(PaymentList {
                payments: self.payments.values().cloned().collect(),
                count: Some(self.payments.len() as u64),
            })
        }

        async fn get_payment(&self, id: &str) -> Result<PaymentRecord, ApiError> {
            self.record("get_payment");
            self.payments.get(id).cloned().ok_or(ApiError::NotFound {
                entity: "payment",
                id: id.to_string(),
            })
        }

        async fn create_payment(&self, payload: &PaymentPayload) -> Result<PaymentRecord, ApiError> {
            self.record("create_payment");
            self.sent_payments.lock().unwrap().push(payload.clone());
            self.write_result()?;
            Ok(PaymentRecord {
                id: self.created_id("77"),
                sync_token: Some("0".to_string()),
                ..Default::default()
            })
        }

        async fn update_payment(
            &self,
            id: &str,
            payload: &PaymentPayload,
        ) -> Result<PaymentRecord, ApiError> {
            self.record("update_payment");
            self.sent_payments.lock().unwrap().push(payload.clone());
            self.write_result()?;
            Ok(PaymentRecord {
                id: id.to_string(),
                sync_token: bump(payload.sync_token.as_ref()),
                ..Default::default()
            })
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn valid_invoice() -> DraftInvoice {
        let mut draft = DraftInvoice::new(date());
        draft.set_customer(Reference::new("42", "Amy's Bird Sanctuary"));
        draft
            .add_line(&Reference::new("1", "Web Design Service"), 2, Decimal::from(500))
            .unwrap();
        draft
    }

    fn open_invoice(id: &str, balance: i64) -> InvoiceRecord {
        InvoiceRecord {
            id: id.to_string(),
            doc_number: Some(format!("10{}", id)),
            balance: Some(Decimal::from(balance)),
            ..Default::default()
        }
    }

    fn stored_payment() -> PaymentRecord {
        PaymentRecord {
            id: "88".to_string(),
            sync_token: Some("9".to_string()),
            customer: Some(NamedRef {
                id: "42".to_string(),
                name: "Amy's Bird Sanctuary".to_string(),
            }),
            total_amount: Some(Decimal::from(300)),
            payment_ref_num: Some("CHK-3003".to_string()),
            date: Some("2024-05-01".to_string()),
            applied_invoices: vec![AppliedInvoiceRecord {
                invoice_id: "130".to_string(),
                invoice_doc_number: None,
                amount: Some(Decimal::from(300)),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_invoice_without_lines_is_never_sent() {
        let sync = RemoteSynchronizer::new(FakeApi::default());
        let mut draft = DraftInvoice::new(date());
        draft.set_customer(Reference::new("42", "Amy's Bird Sanctuary"));

        let err = sync.submit_invoice(&mut draft).await.unwrap_err();
        match err {
            SyncError::Validation(report) => {
                assert_eq!(report.failed_fields(), vec![Field::Items]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(sync.api().calls().is_empty());
        assert!(!sync.is_submitting());
    }

    #[tokio::test]
    async fn test_payment_with_blank_reference_is_never_sent() {
        let sync = RemoteSynchronizer::new(FakeApi::default());
        let mut draft = DraftPayment::new(date());
        draft.set_customer(Reference::new("42", "Amy's Bird Sanctuary"));
        draft.set_total_amount(Decimal::from(120)).unwrap();
        draft.set_reference_number("");

        let err = sync.submit_payment(&mut draft).await.unwrap_err();
        assert!(matches!(err, SyncError::Validation(ref report) if report.failed(Field::ReferenceNumber)));
        assert!(sync.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_then_update_carries_server_token() {
        let sync = RemoteSynchronizer::new(FakeApi::default());
        let mut draft = valid_invoice();

        let outcome = sync.submit_invoice(&mut draft).await.unwrap();
        assert!(outcome.is_created());
        assert_eq!(draft.identity().unwrap().id, "501");
        assert_eq!(draft.identity().unwrap().token, ConcurrencyToken::new("0"));

        let outcome = sync.submit_invoice(&mut draft).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Updated(_)));
        assert_eq!(draft.identity().unwrap().token.as_str(), "1");

        let sent = sync.api().sent_invoices.lock().unwrap().clone();
        assert_eq!(sent[0].id, None);
        assert_eq!(sent[0].sync_token, None);
        assert_eq!(sent[0].line[0].amount, Decimal::from(1000));
        assert_eq!(sent[1].id.as_deref(), Some("501"));
        assert_eq!(sent[1].sync_token.as_deref(), Some("0"));
        assert_eq!(sync.api().calls(), vec!["create_invoice", "update_invoice"]);
    }

    #[tokio::test]
    async fn test_edited_payment_sends_loaded_token_unchanged() {
        let mut api = FakeApi::default();
        api.payments.insert("88".to_string(), stored_payment());
        api.open_invoices = vec![open_invoice("130", 200), open_invoice("131", 50)];
        let sync = RemoteSynchronizer::new(api);

        let mut draft = sync.load_payment_draft("88").await.unwrap();
        assert_eq!(draft.open_invoices().len(), 2);
        assert_eq!(draft.available_for("130"), Some(Decimal::from(500)));

        draft.set_private_note("Adjusted after call");
        let outcome = sync.submit_payment(&mut draft).await.unwrap();
        assert_eq!(outcome.identity().token.as_str(), "10");

        let sent = sync.api().sent_payments.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id.as_deref(), Some("88"));
        assert_eq!(sent[0].sync_token.as_deref(), Some("9"));
        assert_eq!(sent[0].sparse, Some(true));
        assert_eq!(sent[0].private_note.as_deref(), Some("Adjusted after call"));

        let queries = sync.api().invoice_queries.lock().unwrap().clone();
        assert_eq!(queries, vec![InvoiceQuery::open_for_customer("42")]);
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_draft_and_reports_server_message() {
        let api = FakeApi {
            write_error: Some(ApiError::Server {
                status: 400,
                body: Some(json!({
                    "Fault": { "Error": [{ "Message": "Stale object error" }] }
                })),
            }),
            ..Default::default()
        };
        let sync = RemoteSynchronizer::new(api);
        let mut draft = valid_invoice();
        let before = draft.clone();

        let err = sync.submit_invoice(&mut draft).await.unwrap_err();
        assert_eq!(err.user_message(), "Stale object error");
        assert_eq!(draft, before);
        assert!(draft.is_new());
        assert!(!sync.is_submitting());
    }

    #[tokio::test]
    async fn test_failed_submission_without_message_uses_fallback() {
        let api = FakeApi {
            write_error: Some(ApiError::Server {
                status: 500,
                body: None,
            }),
            ..Default::default()
        };
        let sync = RemoteSynchronizer::new(api);
        let mut draft = DraftPayment::new(date());
        draft.set_customer(Reference::new("42", "Amy's Bird Sanctuary"));
        draft.set_total_amount(Decimal::from(80)).unwrap();
        draft.set_reference_number("EFT-9");

        let err = sync.submit_payment(&mut draft).await.unwrap_err();
        assert_eq!(err.user_message(), "Failed to create payment");
        assert!(draft.is_new());
    }

    #[tokio::test]
    async fn test_create_without_returned_id_reports_missing_identity() {
        let api = FakeApi {
            omit_created_id: true,
            ..Default::default()
        };
        let sync = RemoteSynchronizer::new(api);
        let mut draft = valid_invoice();

        let err = sync.submit_invoice(&mut draft).await.unwrap_err();
        assert!(matches!(err, SyncError::MissingIdentity));
        assert!(err.user_message().contains("refresh"));
        assert!(draft.is_new());
        assert!(!sync.is_submitting());
        assert_eq!(sync.api().calls(), vec!["create_invoice"]);
    }

    #[tokio::test]
    async fn test_second_submission_refused_while_in_flight() {
        let sync = RemoteSynchronizer::new(FakeApi::default());
        let ticket = sync.guard().try_begin().unwrap();

        let mut draft: Draft = valid_invoice().into();
        let err = sync.submit(&mut draft).await.unwrap_err();
        assert!(matches!(err, SyncError::SubmissionInFlight));
        assert!(sync.api().calls().is_empty());

        drop(ticket);
        let outcome = sync.submit(&mut draft).await.unwrap();
        assert!(outcome.is_created());
        assert!(!draft.is_new());
    }

    #[tokio::test]
    async fn test_missing_invoice_is_not_found() {
        let sync = RemoteSynchronizer::new(FakeApi::default());
        let err = sync.load_invoice_draft("404").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_select_customer_loads_open_invoices() {
        let api = FakeApi {
            open_invoices: vec![open_invoice("130", 200), open_invoice("140", 0)],
            ..Default::default()
        };
        let sync = RemoteSynchronizer::new(api);
        let mut draft = DraftPayment::new(date());

        sync.select_payment_customer(&mut draft, Reference::new("7", "Geeta Kalapatapu"))
            .await
            .unwrap();
        assert_eq!(draft.open_invoices().len(), 1);
        assert_eq!(draft.open_invoices()[0].id, "130");

        sync.select_payment_customer(&mut draft, Reference::new("7", "Geeta Kalapatapu"))
            .await
            .unwrap();
        assert_eq!(sync.api().calls(), vec!["list_invoices"]);
    }

    #[tokio::test]
    async fn test_customer_options_and_save() {
        let api = FakeApi {
            customers: vec![
                Customer {
                    id: "1".to_string(),
                    display_name: Some("Cool Cars".to_string()),
                    ..Default::default()
                },
                Customer::default(),
            ],
            ..Default::default()
        };
        let sync = RemoteSynchronizer::new(api);

        let options = sync.customer_options().await.unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].name, "Cool Cars");

        let input = CustomerInput {
            display_name: "Dukes Basketball Camp".to_string(),
            ..Default::default()
        };
        let created = sync.save_customer(None, &input).await.unwrap();
        assert_eq!(created.id, "900");
        let updated = sync.save_customer(Some("900"), &input).await.unwrap();
        assert_eq!(updated.id, "900");
    }

    #[tokio::test]
    async fn test_customer_load_failure_falls_back() {
        let api = FakeApi {
            write_error: Some(ApiError::Server {
                status: 503,
                body: None,
            }),
            ..Default::default()
        };
        let sync = RemoteSynchronizer::new(api);
        let err = sync.customer_options().await.unwrap_err();
        assert_eq!(err.user_message(), "Failed to load customers");

        let err = sync.save_customer(None, &CustomerInput::default()).await.unwrap_err();
        assert_eq!(err.user_message(), "Failed to create customer");
        assert!(!sync.is_submitting());
    }
}
