//! Banquet Core Library
//!
//! Ingredient, dish and menu catalogs kept in a single JSON document, with
//! menu aggregation, cost reports and spreadsheet export.

pub mod document;
pub mod export;
pub mod models;
pub mod report;
pub mod storage;
pub mod store;

pub use document::{sorted_by_id, Document, RecordKind, CURRENT_VERSION, DATA_FILE_NAME};
pub use export::{Cell, ExportError, Sheet};
pub use models::{Dish, Ingredient, Menu};
pub use report::{
    calculate_ingredients_for_menu, dish_cost_per_serving, DishServings, MenuReport, ReportLine,
};
pub use storage::{DocumentStorage, StorageError};
pub use store::{DataInfo, DataStore, Dependent, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
