//! Result ordering

use serde_json::{json, Value as JsonValue};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

impl Direction {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        }
    }
}

/// One ordering clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Property name
    pub property: String,
    /// Sort direction
    pub direction: Direction,
}

impl Order {
    /// Parse `"field"` (ascending) or `"-field"` (descending).
    pub fn parse(field: &str) -> Self {
        let field = field.trim();
        match field.strip_prefix('-') {
            Some(rest) => Self {
                property: rest.trim().to_string(),
                direction: Direction::Descending,
            },
            None => Self {
                property: field.to_string(),
                direction: Direction::Ascending,
            },
        }
    }

    /// Render as an order document
    pub fn to_json(&self) -> JsonValue {
        json!({
            "property": {"name": self.property},
            "direction": self.direction.as_str(),
        })
    }
}
