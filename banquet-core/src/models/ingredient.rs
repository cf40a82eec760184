use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw material in the ingredient catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub unit: String,
    /// Price per unit.
    #[serde(default)]
    pub price: f64,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            price,
        }
    }

    /// Cost of `quantity` units of this ingredient.
    pub fn cost_of(&self, quantity: f64) -> f64 {
        quantity * self.price
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) @ {:.2}", self.name, self.unit, self.price)
    }
}
