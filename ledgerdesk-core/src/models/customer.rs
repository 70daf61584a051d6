use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::reference::Reference;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct EmailAddress {
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PhoneNumber {
    pub free_form_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Address {
    pub line1: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

/// Customer record as returned by the remote API.
///
/// The remote shape is the accounting platform's PascalCase object. Only the
/// fields the client reads are modelled; everything is optional except the id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Customer {
    #[serde(alias = "id", alias = "value")]
    pub id: String,

    pub sync_token: Option<String>,

    #[serde(alias = "name")]
    pub display_name: Option<String>,

    pub given_name: Option<String>,

    pub family_name: Option<String>,

    pub company_name: Option<String>,

    pub primary_email_addr: Option<EmailAddress>,

    pub primary_phone: Option<PhoneNumber>,

    pub bill_addr: Option<Address>,

    pub notes: Option<String>,

    pub active: Option<bool>,

    pub balance: Option<Decimal>,
}

impl Customer {
    /// Name to show for this customer, falling back to `Customer <id>`.
    pub fn name(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Customer {}", self.id),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false)
    }

    pub fn email(&self) -> Option<&str> {
        self.primary_email_addr
            .as_ref()
            .and_then(|addr| addr.address.as_deref())
    }

    pub fn as_reference(&self) -> Reference {
        Reference::new(self.id.clone(), self.name())
    }
}

/// Body of `GET /customers`: either a bare array or `{ "customers": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CustomerListResponse {
    Wrapped { customers: Vec<Customer> },
    Bare(Vec<Customer>),
}

impl CustomerListResponse {
    pub fn into_customers(self) -> Vec<Customer> {
        match self {
            CustomerListResponse::Wrapped { customers } => customers,
            CustomerListResponse::Bare(customers) => customers,
        }
    }
}

/// Entry of a customer picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerOption {
    pub id: String,
    pub name: String,
}

/// Picker options for the given customers, skipping entries without an id.
pub fn customer_options(customers: &[Customer]) -> Vec<CustomerOption> {
    customers
        .iter()
        .filter(|customer| !customer.id.trim().is_empty())
        .map(|customer| CustomerOption {
            id: customer.id.clone(),
            name: customer.name(),
        })
        .collect()
}

/// Fields sent when creating or updating a customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerInput {
    pub display_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_email_addr: Option<EmailAddress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_phone: Option<PhoneNumber>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_addr: Option<Address>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl From<&Customer> for CustomerInput {
    fn from(customer: &Customer) -> Self {
        CustomerInput {
            display_name: customer.name(),
            given_name: customer.given_name.clone(),
            family_name: customer.family_name.clone(),
            company_name: customer.company_name.clone(),
            primary_email_addr: customer.primary_email_addr.clone(),
            primary_phone: customer.primary_phone.clone(),
            bill_addr: customer.bill_addr.clone(),
            notes: customer.notes.clone(),
            active: customer.active,
        }
    }
}
