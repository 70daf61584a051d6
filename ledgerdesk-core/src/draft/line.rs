use std::fmt;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::DraftError;
use crate::models::item::Item;
use crate::models::reference::Reference;

/// Locally generated identity of a draft line.
///
/// Lines are addressed by this id, never by their position, so removing
/// one line cannot hit its neighbour after a reorder or a concurrent edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(Uuid);

impl LineId {
    /// Fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One line of a draft invoice.
///
/// `amount` is derived: it is recomputed from `quantity` and `unit_price`
/// on every mutation and cannot be set directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLineItem {
    id: LineId,
    item: Reference,
    quantity: u32,
    unit_price: Decimal,
    description: String,
    amount: Decimal,
}

impl DraftLineItem {
    /// Builds a line, failing if no item is selected or the numbers are out of range.
    ///
    /// An empty `description` defaults to the item's display name.
    pub fn new(
        item: Reference,
        quantity: u32,
        unit_price: Decimal,
        description: impl Into<String>,
    ) -> Result<Self, DraftError> {
        if !item.is_set() {
            return Err(DraftError::ItemSelectionRequired);
        }
        check_quantity(quantity)?;
        check_unit_price(unit_price)?;
        Ok(Self::restore(item, quantity, unit_price, description.into()))
    }

    /// Builds a line from already-persisted values without validating them.
    pub(crate) fn restore(
        item: Reference,
        quantity: u32,
        unit_price: Decimal,
        description: String,
    ) -> Self {
        let description = if description.trim().is_empty() {
            item.display_name.clone()
        } else {
            description
        };
        let mut line = Self {
            id: LineId::new(),
            item,
            quantity,
            unit_price,
            description,
            amount: Decimal::ZERO,
        };
        line.recompute();
        line
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn item(&self) -> &Reference {
        &self.item
    }

    /// Whole units sold, at least 1.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Line total, always `quantity × unit_price`.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// `quantity × unit_price`, computed fresh rather than read from the cached `amount`.
    pub fn computed_amount(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }

    /// # Errors
    ///
    /// Returns `DraftError::InvalidQuantity` for zero; the line is left unchanged.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), DraftError> {
        check_quantity(quantity)?;
        self.quantity = quantity;
        self.recompute();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DraftError::InvalidUnitPrice` for negative prices.
    pub fn set_unit_price(&mut self, unit_price: Decimal) -> Result<(), DraftError> {
        check_unit_price(unit_price)?;
        self.unit_price = unit_price;
        self.recompute();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub(crate) fn recompute(&mut self) {
        self.amount = self.computed_amount();
    }
}

fn check_quantity(quantity: u32) -> Result<(), DraftError> {
    if quantity == 0 {
        return Err(DraftError::InvalidQuantity(i64::from(quantity)));
    }
    Ok(())
}

fn check_unit_price(unit_price: Decimal) -> Result<(), DraftError> {
    if unit_price < Decimal::ZERO {
        return Err(DraftError::InvalidUnitPrice);
    }
    Ok(())
}

/// Line being composed in the "add item" row before it is committed.
///
/// Selecting an item pre-fills its unit price and description; the
/// preview amount follows quantity and price edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLine {
    pub item: Reference,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub description: String,
}

impl Default for PendingLine {
    fn default() -> Self {
        Self {
            item: Reference::default(),
            quantity: 1,
            unit_price: Decimal::ZERO,
            description: String::new(),
        }
    }
}

impl PendingLine {
    /// Picks `item` from the catalog, pre-filling its price and description.
    pub fn select_item(&mut self, item: &Item) {
        self.item = item.as_reference();
        self.unit_price = item.unit_price;
        self.description = item.name.clone();
    }

    pub fn preview_amount(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }

    /// Commits the row as a draft line.
    pub fn build(&self) -> Result<DraftLineItem, DraftError> {
        DraftLineItem::new(
            self.item.clone(),
            self.quantity,
            self.unit_price,
            self.description.clone(),
        )
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
