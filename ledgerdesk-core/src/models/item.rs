use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::reference::Reference;

/// Kind of sellable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    Service,
    Inventory,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Service => write!(f, "Service"),
            ItemType::Inventory => write!(f, "Inventory"),
        }
    }
}

/// Product or service that can be put on an invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
    #[serde(rename = "Type")]
    pub kind: ItemType,
}

impl Item {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        unit_price: i64,
        kind: ItemType,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            unit_price: Decimal::from(unit_price),
            kind,
        }
    }

    pub fn as_reference(&self) -> Reference {
        Reference::new(self.id.clone(), self.name.clone())
    }
}

/// Items offered on invoice lines.
///
/// The remote API has no item endpoint, so the catalog ships with the client.
pub fn catalog() -> Vec<Item> {
    vec![
        Item::new("1", "Web Design Service", "Professional website design", 500, ItemType::Service),
        Item::new("2", "Website Hosting", "Annual hosting package", 200, ItemType::Service),
        Item::new("3", "Consulting", "Hourly consulting rate", 150, ItemType::Service),
        Item::new("4", "Laptop", "High-performance laptop", 1200, ItemType::Inventory),
        Item::new("5", "Monitor", "27-inch 4K monitor", 400, ItemType::Inventory),
    ]
}

pub fn find_item(id: &str) -> Option<Item> {
    catalog().into_iter().find(|item| item.id == id)
}
