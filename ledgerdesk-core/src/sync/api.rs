use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::auth::Session;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::customer::{Customer, CustomerInput, CustomerListResponse};
use crate::models::invoice::{InvoiceList, InvoiceQuery, InvoiceRecord};
use crate::models::payment::{PaymentList, PaymentQuery, PaymentRecord};
use crate::sync::types::{InvoicePayload, PaymentPayload};

/// Operations the client needs from the remote accounting API.
///
/// Implemented over HTTP by [`HttpApi`]; tests substitute an in-memory fake.
#[async_trait]
pub trait RecordsApi: Send + Sync {
    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError>;

    async fn get_customer(&self, id: &str) -> Result<Customer, ApiError>;

    async fn create_customer(&self, input: &CustomerInput) -> Result<Customer, ApiError>;

    async fn update_customer(&self, id: &str, input: &CustomerInput)
        -> Result<Customer, ApiError>;

    async fn list_invoices(&self, query: &InvoiceQuery) -> Result<InvoiceList, ApiError>;

    async fn get_invoice(&self, id: &str) -> Result<InvoiceRecord, ApiError>;

    async fn create_invoice(&self, payload: &InvoicePayload) -> Result<InvoiceRecord, ApiError>;

    async fn update_invoice(
        &self,
        id: &str,
        payload: &InvoicePayload,
    ) -> Result<InvoiceRecord, ApiError>;

    async fn list_payments(&self, query: &PaymentQuery) -> Result<PaymentList, ApiError>;

    async fn get_payment(&self, id: &str) -> Result<PaymentRecord, ApiError>;

    async fn create_payment(&self, payload: &PaymentPayload) -> Result<PaymentRecord, ApiError>;

    async fn update_payment(
        &self,
        id: &str,
        payload: &PaymentPayload,
    ) -> Result<PaymentRecord, ApiError>;
}

/// [`RecordsApi`] over HTTP with JSON bodies.
///
/// Every request carries `Authorization: Bearer <token>` when the shared
/// session holds a token; without one the request is still sent and the
/// server decides.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
    session: Session,
}

impl HttpApi {
    /// Builds the client for `config.api_base_url`.
    ///
    /// No timeout is set unless the config carries one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` if the base URL does not parse or
    /// the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            ApiError::InvalidConfig(format!("Invalid API URL {}: {}", config.api_base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidConfig(format!(
                "Invalid API URL {}",
                config.api_base_url
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// Base URL every request path is appended to.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Session whose token is attached to each request.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Appends `segments` to the base URL, percent-encoding each one so a
    /// record id can never reach another path or the query string.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!("{} {}", method, url.path());
        let request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        match self.session.bearer_header() {
            Some(bearer) => request.header(AUTHORIZATION, bearer),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        entity: &'static str,
        id: Option<&str>,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(network_error)?;
        let response = check_status(response, entity, id).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        entity: &'static str,
        id: Option<&str>,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, segments), entity, id)
            .await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
        entity: &'static str,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, segments).json(body), entity, None)
            .await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
        entity: &'static str,
        id: &str,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::PUT, segments).json(body), entity, Some(id))
            .await
    }
}

fn network_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Network(format!("request timed out: {}", error))
    } else {
        ApiError::Network(error.to_string())
    }
}

/// Maps non-success statuses to `ApiError`, keeping any JSON error body.
async fn check_status(
    response: Response,
    entity: &'static str,
    id: Option<&str>,
) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(ApiError::NotFound {
                entity,
                id: id.to_string(),
            });
        }
    }

    let text = response.text().await.unwrap_or_default();
    warn!("{} request failed with status {}", entity, status);
    Err(ApiError::Server {
        status: status.as_u16(),
        body: serde_json::from_str::<Value>(&text).ok(),
    })
}

#[async_trait]
impl RecordsApi for HttpApi {
    #[instrument(skip(self))]
    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        let response: CustomerListResponse = self.get(&["customers"], "customer", None).await?;
        let customers = response.into_customers();
        debug!("Fetched {} customers", customers.len());
        Ok(customers)
    }

    #[instrument(skip(self))]
    async fn get_customer(&self, id: &str) -> Result<Customer, ApiError> {
        self.get(&["customers", id], "customer", Some(id)).await
    }

    #[instrument(skip(self, input))]
    async fn create_customer(&self, input: &CustomerInput) -> Result<Customer, ApiError> {
        self.post(&["customers", "create-customer"], input, "customer")
            .await
    }

    #[instrument(skip(self, input))]
    async fn update_customer(
        &self,
        id: &str,
        input: &CustomerInput,
    ) -> Result<Customer, ApiError> {
        self.put(&["customers", id], input, "customer", id).await
    }

    #[instrument(skip(self))]
    async fn list_invoices(&self, query: &InvoiceQuery) -> Result<InvoiceList, ApiError> {
        let request = self
            .request(Method::GET, &["invoices"])
            .query(&query.to_pairs());
        let list: InvoiceList = self.send(request, "invoice", None).await?;
        debug!("Fetched {} invoices", list.invoices.len());
        Ok(list)
    }

    #[instrument(skip(self))]
    async fn get_invoice(&self, id: &str) -> Result<InvoiceRecord, ApiError> {
        self.get(&["invoices", id], "invoice", Some(id)).await
    }

    #[instrument(skip(self, payload))]
    async fn create_invoice(&self, payload: &InvoicePayload) -> Result<InvoiceRecord, ApiError> {
        self.post(&["invoices", "create-invoice"], payload, "invoice")
            .await
    }

    #[instrument(skip(self, payload))]
    async fn update_invoice(
        &self,
        id: &str,
        payload: &InvoicePayload,
    ) -> Result<InvoiceRecord, ApiError> {
        self.put(&["invoices", id], payload, "invoice", id).await
    }

    #[instrument(skip(self))]
    async fn list_payments(&self, query: &PaymentQuery) -> Result<PaymentList, ApiError> {
        let request = self
            .request(Method::GET, &["payments"])
            .query(&query.to_pairs());
        let list: PaymentList = self.send(request, "payment", None).await?;
        debug!("Fetched {} payments", list.payments.len());
        Ok(list)
    }

    #[instrument(skip(self))]
    async fn get_payment(&self, id: &str) -> Result<PaymentRecord, ApiError> {
        self.get(&["payments", id], "payment", Some(id)).await
    }

    #[instrument(skip(self, payload))]
    async fn create_payment(&self, payload: &PaymentPayload) -> Result<PaymentRecord, ApiError> {
        self.post(&["payments"], payload, "payment").await
    }

    #[instrument(skip(self, payload))]
    async fn update_payment(
        &self,
        id: &str,
        payload: &PaymentPayload,
    ) -> Result<PaymentRecord, ApiError> {
        self.put(&["payments", id], payload, "payment", id).await
    }
}
