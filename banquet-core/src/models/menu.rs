use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

fn default_table_count() -> u32 {
    1
}

/// A banquet plan: dishes with per-table serving counts, scaled by the
/// number of tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Menu {
    pub name: String,
    /// Dish id -> servings per table.
    #[serde(default)]
    pub dishes: BTreeMap<String, u32>,
    /// Records written before table counts existed load as a single table.
    #[serde(default = "default_table_count")]
    pub table_count: u32,
}

impl Menu {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dishes: BTreeMap::new(),
            table_count: default_table_count(),
        }
    }

    pub fn with_dishes(mut self, dishes: BTreeMap<String, u32>) -> Self {
        self.dishes = dishes;
        self
    }

    pub fn with_dish(mut self, dish_id: impl Into<String>, servings: u32) -> Self {
        self.dishes.insert(dish_id.into(), servings);
        self
    }

    pub fn with_table_count(mut self, table_count: u32) -> Self {
        self.table_count = table_count;
        self
    }

    pub fn uses_dish(&self, dish_id: &str) -> bool {
        self.dishes.contains_key(dish_id)
    }

    /// Servings of a dish across every table.
    pub fn total_servings(&self, dish_id: &str) -> u64 {
        self.dishes
            .get(dish_id)
            .map(|servings| u64::from(*servings) * u64::from(self.table_count))
            .unwrap_or(0)
    }
}

impl fmt::Display for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.chars().count()))?;
        writeln!(f, "Tables: {}", self.table_count)?;

        if !self.dishes.is_empty() {
            writeln!(f, "\nDishes (servings per table):")?;
            for (id, servings) in &self.dishes {
                writeln!(f, "  - #{}: {}", id, servings)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_new_defaults_to_one_table() {
        let menu = Menu::new("Banquet A");
        assert_eq!(menu.name, "Banquet A");
        assert_eq!(menu.table_count, 1);
        assert!(menu.dishes.is_empty());
    }

    #[test]
    fn test_menu_builder() {
        let menu = Menu::new("Banquet A")
            .with_dish("1", 2)
            .with_dish("2", 1)
            .with_table_count(3);

        assert!(menu.uses_dish("1"));
        assert!(!menu.uses_dish("9"));
        assert_eq!(menu.table_count, 3);
    }

    #[test]
    fn test_total_servings() {
        let menu = Menu::new("Banquet A").with_dish("1", 2).with_table_count(3);
        assert_eq!(menu.total_servings("1"), 6);
        assert_eq!(menu.total_servings("2"), 0);
    }

    #[test]
    fn test_menu_without_table_count_loads_as_one() {
        let parsed: Menu =
            serde_json::from_str(r#"{"name": "Old Menu", "dishes": {"1": 4}}"#).unwrap();
        assert_eq!(parsed.table_count, 1);
        assert_eq!(parsed.dishes.get("1"), Some(&4));
    }

    #[test]
    fn test_menu_display() {
        let menu = Menu::new("Wedding").with_dish("3", 1).with_table_count(10);
        let output = format!("{}", menu);
        assert!(output.contains("Wedding"));
        assert!(output.contains("Tables: 10"));
        assert!(output.contains("#3: 1"));
    }
}
