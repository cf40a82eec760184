//! Spreadsheet export.
//!
//! Sheets are first built as plain rows from the document, then written to
//! an `.xlsx` workbook. Rows referring to records that no longer exist are
//! left out.

use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;
use thiserror::Error;

use crate::document::{sorted_by_id, Document};
use crate::report::{menu_cost_report, menu_dish_breakdown};

pub const INGREDIENTS_SHEET: &str = "Ingredients";
pub const DISHES_SHEET: &str = "Dish Recipes";
pub const MENUS_SHEET: &str = "Menus";
pub const TOTALS_SHEET: &str = "Ingredient Totals";
pub const BREAKDOWN_SHEET: &str = "Dish Breakdown";
pub const SUMMARY_SHEET: &str = "Summary";

/// Errors that can occur while exporting.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: the catalog is empty")]
    NothingToExport,

    #[error("Menu not found: {0}")]
    MenuNotFound(String),

    #[error("Menu {0} has no ingredients to export")]
    NoIngredients(String),

    #[error("Failed to write workbook: {0}")]
    Workbook(#[from] XlsxError),
}

/// A single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Number(value as f64)
    }
}

/// A named sheet with a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

/// Builds the full catalog export: ingredients, dish recipes and menus.
///
/// Sheets without rows are omitted.
pub fn catalog_sheets(doc: &Document) -> Vec<Sheet> {
    let mut ingredients = Sheet::new(INGREDIENTS_SHEET, &["ID", "Name", "Unit", "Unit Price"]);
    for (id, ingredient) in sorted_by_id(&doc.ingredients) {
        ingredients.push(vec![
            id.into(),
            ingredient.name.clone().into(),
            ingredient.unit.clone().into(),
            ingredient.price.into(),
        ]);
    }

    let mut dishes = Sheet::new(
        DISHES_SHEET,
        &[
            "Dish ID",
            "Dish",
            "Ingredient",
            "Quantity",
            "Unit",
            "Unit Price",
            "Subtotal",
        ],
    );
    for (dish_id, dish) in sorted_by_id(&doc.dishes) {
        for (ingredient_id, amount) in sorted_by_id(&dish.ingredients) {
            let Some(ingredient) = doc.ingredients.get(ingredient_id) else {
                continue;
            };
            dishes.push(vec![
                dish_id.into(),
                dish.name.clone().into(),
                ingredient.name.clone().into(),
                (*amount).into(),
                ingredient.unit.clone().into(),
                ingredient.price.into(),
                ingredient.cost_of(*amount).into(),
            ]);
        }
    }

    let mut menus = Sheet::new(
        MENUS_SHEET,
        &["Menu ID", "Menu", "Dish", "Servings", "Tables"],
    );
    for (menu_id, menu) in sorted_by_id(&doc.menus) {
        for (dish_id, servings) in sorted_by_id(&menu.dishes) {
            let Some(dish) = doc.dishes.get(dish_id) else {
                continue;
            };
            menus.push(vec![
                menu_id.into(),
                menu.name.clone().into(),
                dish.name.clone().into(),
                (*servings).into(),
                menu.table_count.into(),
            ]);
        }
    }

    [ingredients, dishes, menus]
        .into_iter()
        .filter(|sheet| !sheet.rows.is_empty())
        .collect()
}

/// Builds the statistics export for one menu: numbered ingredient totals,
/// dish breakdown and a summary.
///
/// Fails when the menu has no ingredient that still exists in the catalog.
pub fn menu_statistics_sheets(
    doc: &Document,
    menu_id: &str,
    menu_name: &str,
    exported_at: NaiveDateTime,
) -> Result<Vec<Sheet>, ExportError> {
    let report =
        menu_cost_report(doc, menu_id).ok_or_else(|| ExportError::MenuNotFound(menu_id.into()))?;
    if report.is_empty() {
        return Err(ExportError::NoIngredients(menu_id.to_string()));
    }

    let mut totals = Sheet::new(
        TOTALS_SHEET,
        &["No.", "Ingredient", "Quantity", "Unit", "Unit Price", "Cost"],
    );
    for (index, line) in report.lines.iter().enumerate() {
        totals.push(vec![
            (index + 1).into(),
            line.name.clone().into(),
            line.quantity.into(),
            line.unit.clone().into(),
            line.unit_price.into(),
            line.cost.into(),
        ]);
    }
    totals.push(vec![
        "".into(),
        "Total".into(),
        "".into(),
        "".into(),
        "".into(),
        report.total_cost.into(),
    ]);

    let dishes = menu_dish_breakdown(doc, menu_id);
    let mut breakdown = Sheet::new(
        BREAKDOWN_SHEET,
        &["No.", "Dish", "Servings per Table", "Tables", "Total Servings"],
    );
    for (index, dish) in dishes.iter().enumerate() {
        breakdown.push(vec![
            (index + 1).into(),
            dish.name.clone().into(),
            dish.servings_per_table.into(),
            report.table_count.into(),
            dish.total_servings.into(),
        ]);
    }

    let mut summary = Sheet::new(SUMMARY_SHEET, &["Item", "Value"]);
    summary.push(vec!["Menu".into(), menu_name.into()]);
    summary.push(vec!["Tables".into(), report.table_count.into()]);
    summary.push(vec!["Dish Types".into(), dishes.len().into()]);
    summary.push(vec!["Ingredient Types".into(), report.lines.len().into()]);
    summary.push(vec!["Total Cost".into(), report.total_cost.into()]);
    summary.push(vec![
        "Exported At".into(),
        exported_at.format("%Y-%m-%d %H:%M:%S").to_string().into(),
    ]);

    Ok([totals, breakdown, summary]
        .into_iter()
        .filter(|sheet| !sheet.rows.is_empty())
        .collect())
}

/// Writes sheets to an `.xlsx` workbook at `path`.
pub fn write_workbook(path: &Path, sheets: &[Sheet]) -> Result<(), ExportError> {
    if sheets.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let decimal = Format::new().set_num_format("0.00");

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, title) in sheet.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, title, &header)?;
        }

        for (row_index, row) in sheet.rows.iter().enumerate() {
            let row_num = (row_index + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(row_num, col as u16, text)?;
                    }
                    Cell::Number(n) if n.fract() == 0.0 => {
                        worksheet.write_number(row_num, col as u16, *n)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number_with_format(row_num, col as u16, *n, &decimal)?;
                    }
                }
            }
        }

        worksheet.autofit();
    }

    workbook.save(path)?;
    tracing::info!("Exported {} sheet(s) to {}", sheets.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dish, Ingredient, Menu};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn banquet_doc() -> Document {
        let mut doc = Document::new();
        doc.ingredients
            .insert("1".into(), Ingredient::new("Pork", "kg", 30.0));
        doc.ingredients
            .insert("2".into(), Ingredient::new("Ginger", "g", 0.02));
        doc.dishes.insert(
            "1".into(),
            Dish::new("Braised Pork")
                .with_ingredient("1", 0.5)
                .with_ingredient("2", 10.0),
        );
        doc.menus.insert(
            "1".into(),
            Menu::new("Banquet A").with_dish("1", 2).with_table_count(3),
        );
        doc
    }

    fn exported_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_catalog_sheets_cover_all_maps() {
        let sheets = catalog_sheets(&banquet_doc());
        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![INGREDIENTS_SHEET, DISHES_SHEET, MENUS_SHEET]);

        let dishes = &sheets[1];
        assert_eq!(dishes.rows.len(), 2);
        // Subtotal = quantity * unit price
        assert_eq!(dishes.rows[0][6], Cell::Number(15.0));
    }

    #[test]
    fn test_catalog_sheets_skip_empty() {
        let mut doc = Document::new();
        doc.ingredients
            .insert("1".into(), Ingredient::new("Salt", "g", 0.01));

        let sheets = catalog_sheets(&doc);
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, INGREDIENTS_SHEET);

        assert!(catalog_sheets(&Document::new()).is_empty());
    }

    #[test]
    fn test_catalog_sheets_skip_stale_references() {
        let mut doc = banquet_doc();
        doc.ingredients.remove("2");
        doc.menus.get_mut("1").unwrap().dishes.insert("9".into(), 1);

        let sheets = catalog_sheets(&doc);
        assert_eq!(sheets[1].rows.len(), 1);
        assert_eq!(sheets[2].rows.len(), 1);
    }

    #[test]
    fn test_menu_statistics_sheets() {
        let sheets = menu_statistics_sheets(&banquet_doc(), "1", "Banquet A", exported_at()).unwrap();
        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![TOTALS_SHEET, BREAKDOWN_SHEET, SUMMARY_SHEET]);

        let totals = &sheets[0];
        // Two ingredients sorted by name plus the total row.
        assert_eq!(totals.rows.len(), 3);
        assert_eq!(totals.rows[0][0], Cell::Number(1.0));
        assert_eq!(totals.rows[0][1], Cell::Text("Ginger".into()));
        assert_eq!(totals.rows[1][1], Cell::Text("Pork".into()));
        assert_eq!(totals.rows[1][5], Cell::Number(90.0));

        let summary = &sheets[2];
        assert_eq!(summary.rows[0][1], Cell::Text("Banquet A".into()));
        assert_eq!(summary.rows[1][1], Cell::Number(3.0));
        assert_eq!(summary.rows[2][1], Cell::Number(1.0));
        assert_eq!(summary.rows[3][1], Cell::Number(2.0));
        assert_eq!(summary.rows[5][1], Cell::Text("2025-06-01 18:30:00".into()));
    }

    #[test]
    fn test_menu_statistics_without_ingredients_fails() {
        let mut doc = banquet_doc();
        doc.menus.insert("2".into(), Menu::new("Empty"));

        let err = menu_statistics_sheets(&doc, "2", "Empty", exported_at()).unwrap_err();
        assert!(matches!(err, ExportError::NoIngredients(_)));

        let err = menu_statistics_sheets(&doc, "9", "Missing", exported_at()).unwrap_err();
        assert!(matches!(err, ExportError::MenuNotFound(_)));
    }

    #[test]
    fn test_write_workbook_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.xlsx");

        write_workbook(&path, &catalog_sheets(&banquet_doc())).unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_write_workbook_rejects_no_sheets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.xlsx");

        let err = write_workbook(&path, &[]).unwrap_err();
        assert!(matches!(err, ExportError::NothingToExport));
        assert!(!path.exists());
    }
}
