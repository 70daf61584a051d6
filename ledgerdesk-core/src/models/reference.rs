use serde::{Deserialize, Serialize};

/// Pointer to another entity: its remote id plus a name for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub display_name: String,
}

impl Reference {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// A reference is set once it carries a non-blank id.
    pub fn is_set(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// Nested `{ id, name }` object as the remote API returns it on reads
/// (`customer`, `paymentMethod`, ...). Missing fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedRef {
    #[serde(alias = "value", alias = "Id")]
    pub id: String,
    #[serde(alias = "Name", alias = "DisplayName")]
    pub name: String,
}

impl From<NamedRef> for Reference {
    fn from(named: NamedRef) -> Self {
        Reference::new(named.id, named.name)
    }
}

impl From<&NamedRef> for Reference {
    fn from(named: &NamedRef) -> Self {
        Reference::new(named.id.clone(), named.name.clone())
    }
}
