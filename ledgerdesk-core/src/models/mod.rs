pub mod customer;
pub mod invoice;
pub mod item;
pub mod payment;
pub mod reference;

pub use customer::{Customer, CustomerInput, CustomerListResponse, CustomerOption};
pub use invoice::{InvoiceLineRecord, InvoiceList, InvoiceQuery, InvoiceRecord};
pub use item::{Item, ItemType};
pub use payment::{AppliedInvoiceRecord, PaymentList, PaymentQuery, PaymentRecord};
pub use reference::{NamedRef, Reference};
