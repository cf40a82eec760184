use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A recipe: ingredient quantities for a single serving.
///
/// `ingredients` maps an ingredient id to the amount used per serving, in
/// that ingredient's unit. The ids are not checked against the catalog; a
/// dish may keep pointing at an ingredient that no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dish {
    pub name: String,
    #[serde(default)]
    pub ingredients: BTreeMap<String, f64>,
}

impl Dish {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ingredients: BTreeMap::new(),
        }
    }

    pub fn with_ingredients(mut self, ingredients: BTreeMap<String, f64>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_ingredient(mut self, ingredient_id: impl Into<String>, amount: f64) -> Self {
        self.ingredients.insert(ingredient_id.into(), amount);
        self
    }

    pub fn uses_ingredient(&self, ingredient_id: &str) -> bool {
        self.ingredients.contains_key(ingredient_id)
    }
}

impl fmt::Display for Dish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.chars().count()))?;

        if self.ingredients.is_empty() {
            writeln!(f, "No ingredients")?;
        } else {
            writeln!(f, "Ingredients (per serving):")?;
            for (id, amount) in &self.ingredients {
                writeln!(f, "  - #{}: {}", id, amount)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dish_new() {
        let dish = Dish::new("Braised Pork");
        assert_eq!(dish.name, "Braised Pork");
        assert!(dish.ingredients.is_empty());
    }

    #[test]
    fn test_dish_builder() {
        let dish = Dish::new("Fried Rice")
            .with_ingredient("1", 0.2)
            .with_ingredient("2", 0.05);

        assert_eq!(dish.ingredients.len(), 2);
        assert!(dish.uses_ingredient("1"));
        assert!(!dish.uses_ingredient("3"));
    }

    #[test]
    fn test_dish_with_ingredients_replaces() {
        let mut replacement = BTreeMap::new();
        replacement.insert("7".to_string(), 1.0);

        let dish = Dish::new("Soup")
            .with_ingredient("1", 0.5)
            .with_ingredients(replacement);

        assert_eq!(dish.ingredients.len(), 1);
        assert!(dish.uses_ingredient("7"));
    }

    #[test]
    fn test_dish_json_shape() {
        let dish = Dish::new("Braised Pork").with_ingredient("1", 0.5);
        let json = serde_json::to_value(&dish).unwrap();
        assert_eq!(json["name"], "Braised Pork");
        assert_eq!(json["ingredients"]["1"], 0.5);
    }

    #[test]
    fn test_dish_display() {
        let dish = Dish::new("Braised Pork").with_ingredient("1", 0.5);
        let output = format!("{}", dish);
        assert!(output.contains("Braised Pork"));
        assert!(output.contains("#1: 0.5"));
    }
}
