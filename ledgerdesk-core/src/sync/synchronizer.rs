use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::draft::{ConcurrencyToken, Draft, DraftInvoice, DraftPayment, OpenInvoice, RemoteIdentity};
use crate::error::{ApiError, SyncError};
use crate::models::customer::{customer_options, Customer, CustomerInput, CustomerOption};
use crate::models::invoice::{InvoiceList, InvoiceQuery};
use crate::models::payment::{PaymentList, PaymentQuery};
use crate::models::reference::Reference;
use crate::sync::api::RecordsApi;
use crate::sync::guard::SubmitGuard;
use crate::sync::inbound;
use crate::sync::outbound::{invoice_payload, payment_payload};

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new remote record was created with this identity.
    Created(RemoteIdentity),
    /// An existing record was updated; the identity carries the new token.
    Updated(RemoteIdentity),
}

impl SubmitOutcome {
    /// Identity the draft now carries.
    pub fn identity(&self) -> &RemoteIdentity {
        match self {
            SubmitOutcome::Created(identity) | SubmitOutcome::Updated(identity) => identity,
        }
    }

    /// Whether the submission created a new remote record.
    pub fn is_created(&self) -> bool {
        matches!(self, SubmitOutcome::Created(_))
    }
}

/// Moves drafts between the local forms and the remote accounting API.
///
/// Submissions go through a [`SubmitGuard`], so a form cannot have two
/// submissions outstanding. Failed submissions leave the draft as it was.
pub struct RemoteSynchronizer<A: RecordsApi> {
    api: Arc<A>,
    guard: SubmitGuard,
}

impl<A: RecordsApi> Clone for RemoteSynchronizer<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            guard: self.guard.clone(),
        }
    }
}

impl<A: RecordsApi> RemoteSynchronizer<A> {
    /// Synchronizer owning `api`, with its own submission guard.
    pub fn new(api: A) -> Self {
        Self::with_shared(Arc::new(api))
    }

    /// Synchronizer over an API shared with other forms. Each form still
    /// gets its own submission guard.
    pub fn with_shared(api: Arc<A>) -> Self {
        Self {
            api,
            guard: SubmitGuard::new(),
        }
    }

    /// API the synchronizer talks to.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Guard shared by all clones of this synchronizer.
    pub fn guard(&self) -> &SubmitGuard {
        &self.guard
    }

    /// Whether a submission is in flight; forms disable submit while it is.
    pub fn is_submitting(&self) -> bool {
        self.guard.is_submitting()
    }

    /// Customer picker options.
    #[instrument(skip(self))]
    pub async fn customer_options(&self) -> Result<Vec<CustomerOption>, SyncError> {
        let customers = self
            .api
            .list_customers()
            .await
            .map_err(|e| failed(e, "Failed to load customers"))?;
        Ok(customer_options(&customers))
    }

    /// All customers, unwrapped from the list envelope.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<Customer>, SyncError> {
        self.api
            .list_customers()
            .await
            .map_err(|e| failed(e, "Failed to load customers"))
    }

    /// One customer by id, for the customer edit form.
    ///
    /// # Errors
    ///
    /// A missing record yields an error for which
    /// [`SyncError::is_not_found`] is `true`.
    #[instrument(skip(self))]
    pub async fn load_customer(&self, id: &str) -> Result<Customer, SyncError> {
        self.api
            .get_customer(id)
            .await
            .map_err(|e| failed(e, "Failed to load customer"))
    }

    /// Creates the customer when `id` is `None`, otherwise updates it.
    #[instrument(skip(self, input))]
    pub async fn save_customer(
        &self,
        id: Option<&str>,
        input: &CustomerInput,
    ) -> Result<Customer, SyncError> {
        let _ticket = self.guard.try_begin().ok_or(SyncError::SubmissionInFlight)?;

        let customer = match id {
            Some(id) => self
                .api
                .update_customer(id, input)
                .await
                .map_err(|e| failed(e, "Failed to update customer"))?,
            None => self
                .api
                .create_customer(input)
                .await
                .map_err(|e| failed(e, "Failed to create customer"))?,
        };

        info!("Saved customer {}", customer.id);
        Ok(customer)
    }

    /// Invoices matching `query`, for the invoice list view.
    #[instrument(skip(self))]
    pub async fn list_invoices(&self, query: &InvoiceQuery) -> Result<InvoiceList, SyncError> {
        self.api
            .list_invoices(query)
            .await
            .map_err(|e| failed(e, "Failed to load invoices"))
    }

    /// Payments matching `query`, for the payment list view.
    #[instrument(skip(self))]
    pub async fn list_payments(&self, query: &PaymentQuery) -> Result<PaymentList, SyncError> {
        self.api
            .list_payments(query)
            .await
            .map_err(|e| failed(e, "Failed to load payments"))
    }

    /// Open invoices of `customer_id`, for allocating a payment.
    #[instrument(skip(self))]
    pub async fn open_invoices_for(&self, customer_id: &str) -> Result<Vec<OpenInvoice>, SyncError> {
        let list = self
            .api
            .list_invoices(&InvoiceQuery::open_for_customer(customer_id))
            .await
            .map_err(|e| failed(e, "Failed to load open invoices"))?;
        Ok(inbound::open_invoices(&list.invoices))
    }

    /// Loads an existing invoice into an edit draft.
    ///
    /// # Errors
    ///
    /// A missing record yields an error for which
    /// [`SyncError::is_not_found`] is `true`.
    #[instrument(skip(self))]
    pub async fn load_invoice_draft(&self, id: &str) -> Result<DraftInvoice, SyncError> {
        let record = self
            .api
            .get_invoice(id)
            .await
            .map_err(|e| failed(e, "Failed to load invoice"))?;
        Ok(inbound::invoice_draft(&record))
    }

    /// Loads an existing payment into an edit draft, together with the open
    /// invoices of its customer.
    #[instrument(skip(self))]
    pub async fn load_payment_draft(&self, id: &str) -> Result<DraftPayment, SyncError> {
        let record = self
            .api
            .get_payment(id)
            .await
            .map_err(|e| failed(e, "Failed to load payment"))?;
        let mut draft = inbound::payment_draft(&record);

        if draft.customer().is_set() {
            let open = self.open_invoices_for(&draft.customer().id).await?;
            draft.set_open_invoices(open);
        }
        Ok(draft)
    }

    /// Selects the paying customer and loads that customer's open invoices.
    pub async fn select_payment_customer(
        &self,
        draft: &mut DraftPayment,
        customer: Reference,
    ) -> Result<(), SyncError> {
        let changed = customer.id != draft.customer().id;
        draft.set_customer(customer);
        if changed && draft.customer().is_set() {
            let open = self.open_invoices_for(&draft.customer().id).await?;
            draft.set_open_invoices(open);
        }
        Ok(())
    }

    /// Submits an invoice draft.
    ///
    /// The draft is validated first; a failing draft is never sent. A new
    /// draft is created remotely, an edit draft is updated with its id and
    /// concurrency token. On success the draft takes the identity returned
    /// by the server.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `SyncError::SubmissionInFlight` if another submission is running
    /// - `SyncError::Validation` if required fields are missing
    /// - `SyncError::Api` if the remote call fails, with the draft untouched
    #[instrument(skip(self, draft))]
    pub async fn submit_invoice(&self, draft: &mut DraftInvoice) -> Result<SubmitOutcome, SyncError> {
        let _ticket = self.guard.try_begin().ok_or(SyncError::SubmissionInFlight)?;

        draft.recompute_derived();
        let report = draft.validate();
        if !report.is_valid() {
            warn!("Invoice draft failed validation: {}", report.message());
            return Err(SyncError::Validation(report));
        }

        let payload = invoice_payload(draft);
        let outcome = match draft.identity().cloned() {
            None => {
                let created = self
                    .api
                    .create_invoice(&payload)
                    .await
                    .map_err(|e| failed(e, "Failed to create invoice"))?;
                let identity =
                    reconcile(None, &created.id, created.sync_token.as_deref(), "invoice")?;
                SubmitOutcome::Created(identity)
            }
            Some(current) => {
                let updated = self
                    .api
                    .update_invoice(&current.id, &payload)
                    .await
                    .map_err(|e| failed(e, "Failed to update invoice"))?;
                let identity = reconcile(
                    Some(&current),
                    &updated.id,
                    updated.sync_token.as_deref(),
                    "invoice",
                )?;
                SubmitOutcome::Updated(identity)
            }
        };

        draft.mark_saved(outcome.identity().clone());
        info!("Invoice {} saved", outcome.identity().id);
        Ok(outcome)
    }

    /// Submits a payment draft. Same contract as [`Self::submit_invoice`];
    /// updates are sent as sparse updates.
    #[instrument(skip(self, draft))]
    pub async fn submit_payment(&self, draft: &mut DraftPayment) -> Result<SubmitOutcome, SyncError> {
        let _ticket = self.guard.try_begin().ok_or(SyncError::SubmissionInFlight)?;

        draft.recompute_derived();
        let report = draft.validate();
        if !report.is_valid() {
            warn!("Payment draft failed validation: {}", report.message());
            return Err(SyncError::Validation(report));
        }

        let payload = payment_payload(draft);
        let outcome = match draft.identity().cloned() {
            None => {
                let created = self
                    .api
                    .create_payment(&payload)
                    .await
                    .map_err(|e| failed(e, "Failed to create payment"))?;
                let identity =
                    reconcile(None, &created.id, created.sync_token.as_deref(), "payment")?;
                SubmitOutcome::Created(identity)
            }
            Some(current) => {
                let updated = self
                    .api
                    .update_payment(&current.id, &payload)
                    .await
                    .map_err(|e| failed(e, "Failed to update payment"))?;
                let identity = reconcile(
                    Some(&current),
                    &updated.id,
                    updated.sync_token.as_deref(),
                    "payment",
                )?;
                SubmitOutcome::Updated(identity)
            }
        };

        draft.mark_saved(outcome.identity().clone());
        info!("Payment {} saved", outcome.identity().id);
        Ok(outcome)
    }

    /// Submits whichever draft the form holds.
    pub async fn submit(&self, draft: &mut Draft) -> Result<SubmitOutcome, SyncError> {
        match draft {
            Draft::Invoice(invoice) => self.submit_invoice(invoice).await,
            Draft::Payment(payment) => self.submit_payment(payment).await,
        }
    }
}

fn failed(source: ApiError, fallback: &str) -> SyncError {
    let err = SyncError::api(source, fallback);
    error!("{}", err);
    err
}

/// Identity to keep after a successful write.
///
/// The server's id and token win. An update response that omits them keeps
/// the id and token that were sent. A create response without an id is
/// `SyncError::MissingIdentity`: the record may exist remotely, so the user
/// is told to refresh rather than resubmit.
fn reconcile(
    current: Option<&RemoteIdentity>,
    response_id: &str,
    response_token: Option<&str>,
    entity: &'static str,
) -> Result<RemoteIdentity, SyncError> {
    let id = if response_id.trim().is_empty() {
        match current {
            Some(current) => current.id.clone(),
            None => {
                error!("Created {} but the response carried no id", entity);
                return Err(SyncError::MissingIdentity);
            }
        }
    } else {
        response_id.to_string()
    };

    let token = match (response_token, current) {
        (Some(token), _) if !token.trim().is_empty() => ConcurrencyToken::new(token),
        (_, Some(current)) => {
            warn!("{} {} response carried no sync token", entity, id);
            current.token.clone()
        }
        (_, None) => ConcurrencyToken::initial(),
    };

    Ok(RemoteIdentity::new(id, token))
}
