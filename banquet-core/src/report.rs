//! Menu aggregation: ingredient totals, costs and dish breakdowns.
//!
//! Every figure here is derived from the document on demand; nothing is
//! cached or stored. References to dishes or ingredients that no longer
//! exist are skipped rather than treated as errors.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::document::{sorted_by_id, Document};
use crate::models::Dish;

/// Total quantity of each ingredient needed for a menu.
///
/// For every dish on the menu this adds
/// `per_serving_amount * servings * table_count` to the ingredient's total.
/// Returns an empty map when the menu does not exist.
pub fn calculate_ingredients_for_menu(doc: &Document, menu_id: &str) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();

    let Some(menu) = doc.menus.get(menu_id) else {
        return totals;
    };
    let tables = f64::from(menu.table_count);

    for (dish_id, servings) in &menu.dishes {
        let Some(dish) = doc.dishes.get(dish_id) else {
            continue;
        };
        for (ingredient_id, amount) in &dish.ingredients {
            *totals.entry(ingredient_id.clone()).or_insert(0.0) +=
                amount * f64::from(*servings) * tables;
        }
    }

    totals
}

/// Cost of one serving of a dish at current catalog prices.
///
/// Ingredients missing from the catalog contribute nothing.
pub fn dish_cost_per_serving(doc: &Document, dish: &Dish) -> f64 {
    dish.ingredients
        .iter()
        .filter_map(|(id, amount)| doc.ingredients.get(id).map(|i| i.cost_of(*amount)))
        .sum()
}

/// One priced ingredient line of a menu report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportLine {
    pub ingredient_id: String,
    pub name: String,
    pub unit: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub cost: f64,
}

/// Shopping list and cost estimate for a menu.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MenuReport {
    pub menu_id: String,
    pub menu_name: String,
    pub table_count: u32,
    /// Sorted by ingredient name.
    pub lines: Vec<ReportLine>,
    pub total_cost: f64,
}

impl MenuReport {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Resolves a menu's ingredient totals against the catalog and prices them.
///
/// Returns `None` when the menu does not exist. Totals for ingredients that
/// were deleted from the catalog are dropped.
pub fn menu_cost_report(doc: &Document, menu_id: &str) -> Option<MenuReport> {
    let menu = doc.menus.get(menu_id)?;
    let totals = calculate_ingredients_for_menu(doc, menu_id);

    let mut lines: Vec<ReportLine> = totals
        .into_iter()
        .filter_map(|(ingredient_id, quantity)| {
            let ingredient = doc.ingredients.get(&ingredient_id)?;
            Some(ReportLine {
                name: ingredient.name.clone(),
                unit: ingredient.unit.clone(),
                unit_price: ingredient.price,
                cost: ingredient.cost_of(quantity),
                quantity,
                ingredient_id,
            })
        })
        .collect();

    lines.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.ingredient_id.cmp(&b.ingredient_id))
    });

    let total_cost = lines.iter().map(|line| line.cost).sum();

    Some(MenuReport {
        menu_id: menu_id.to_string(),
        menu_name: menu.name.clone(),
        table_count: menu.table_count,
        lines,
        total_cost,
    })
}

/// Servings of one dish on a menu.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DishServings {
    pub dish_id: String,
    pub name: String,
    pub servings_per_table: u32,
    pub total_servings: u64,
}

/// Per-dish serving breakdown of a menu in dish id order.
///
/// Dishes that no longer exist are skipped.
pub fn menu_dish_breakdown(doc: &Document, menu_id: &str) -> Vec<DishServings> {
    let Some(menu) = doc.menus.get(menu_id) else {
        return Vec::new();
    };

    sorted_by_id(&menu.dishes)
        .into_iter()
        .filter_map(|(dish_id, servings)| {
            let dish = doc.dishes.get(dish_id)?;
            Some(DishServings {
                dish_id: dish_id.to_string(),
                name: dish.name.clone(),
                servings_per_table: *servings,
                total_servings: menu.total_servings(dish_id),
            })
        })
        .collect()
}
