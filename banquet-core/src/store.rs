//! The data store: in-memory document, CRUD, aggregation and export.
//!
//! Every mutating call rewrites the whole document to disk before it
//! returns. If that write fails the change stays applied in memory and the
//! error is returned to the caller.

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::document::{sorted_by_id, Document, RecordKind};
use crate::export::{self, ExportError};
use crate::models::{Dish, Ingredient, Menu};
use crate::report::{self, MenuReport};
use crate::storage::{DocumentStorage, StorageError};

/// A record that blocks a deletion by referencing the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependent {
    pub id: String,
    pub name: String,
}

impl fmt::Display for Dependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

fn join_dependents(dependents: &[Dependent]) -> String {
    dependents
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors returned by data store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Deletion refused because other records still reference the target.
    #[error(
        "Cannot delete {kind} {id}: used by {dependent_kind} {}",
        join_dependents(.dependents)
    )]
    InUse {
        kind: RecordKind,
        id: String,
        dependent_kind: RecordKind,
        dependents: Vec<Dependent>,
    },

    /// The document could not be written; the in-memory change is kept.
    #[error("Failed to save data: {0}")]
    Persist(#[from] StorageError),
}

/// Summary of the data file and its contents.
#[derive(Debug, Clone, Serialize)]
pub struct DataInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub ingredient_count: usize,
    pub dish_count: usize,
    pub menu_count: usize,
    pub version: String,
    pub last_modified: NaiveDateTime,
}

/// Single source of truth for ingredients, dishes and menus.
pub struct DataStore {
    storage: DocumentStorage,
    document: Document,
}

impl DataStore {
    /// Opens the document behind `storage`.
    ///
    /// Never fails: a missing, unreadable or corrupt file is replaced with a
    /// fresh document that is written out immediately. A legacy file is
    /// upgraded in memory and written on the next mutation.
    pub fn open(storage: DocumentStorage) -> Self {
        let document = match storage.load() {
            Ok(Some(decoded)) => {
                if decoded.migrated {
                    tracing::info!(
                        "Upgraded legacy data file {} to version {}",
                        storage.path().display(),
                        decoded.document.version
                    );
                }
                tracing::info!("Loaded data from {}", storage.path().display());
                decoded.document
            }
            Ok(None) => {
                tracing::info!(
                    "No data file at {}, creating a new one",
                    storage.path().display()
                );
                Self::fresh(&storage)
            }
            Err(e) => {
                tracing::warn!("{}; starting with an empty document", e);
                Self::fresh(&storage)
            }
        };

        Self { storage, document }
    }

    /// Opens the document at `path`, falling back to the temp directory when
    /// the path's directory is not writable.
    pub fn open_at(path: impl Into<PathBuf>) -> Self {
        Self::open(DocumentStorage::resolve(path))
    }

    fn fresh(storage: &DocumentStorage) -> Document {
        let document = Document::new();
        if let Err(e) = storage.save(&document) {
            tracing::error!("Failed to save data: {}", e);
        }
        document
    }

    /// Writes the full document to disk.
    pub fn save(&mut self) -> Result<(), StoreError> {
        self.document.touch();
        self.storage.save(&self.document).map_err(|e| {
            tracing::error!("Failed to save data: {}", e);
            StoreError::from(e)
        })?;
        tracing::debug!("Saved data to {}", self.storage.path().display());
        Ok(())
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn data_file_path(&self) -> &Path {
        self.storage.path()
    }

    pub fn data_info(&self) -> DataInfo {
        DataInfo {
            path: self.storage.path().to_path_buf(),
            file_size: self.storage.file_size(),
            ingredient_count: self.document.count(RecordKind::Ingredient),
            dish_count: self.document.count(RecordKind::Dish),
            menu_count: self.document.count(RecordKind::Menu),
            version: self.document.version.clone(),
            last_modified: self.document.last_modified,
        }
    }

    // Ingredients

    pub fn ingredients(&self) -> &BTreeMap<String, Ingredient> {
        &self.document.ingredients
    }

    pub fn ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.document.ingredients.get(id)
    }

    /// Ingredients in id order.
    pub fn list_ingredients(&self) -> Vec<(&str, &Ingredient)> {
        sorted_by_id(&self.document.ingredients)
    }

    pub fn add_ingredient(
        &mut self,
        name: impl Into<String>,
        unit: impl Into<String>,
        price: f64,
    ) -> Result<String, StoreError> {
        let id = self.document.allocate_id(RecordKind::Ingredient);
        self.document
            .ingredients
            .insert(id.clone(), Ingredient::new(name, unit, price));
        self.save()?;
        Ok(id)
    }

    /// Overwrites an ingredient. Returns `false` without saving if the id is unknown.
    pub fn update_ingredient(
        &mut self,
        id: &str,
        name: impl Into<String>,
        unit: impl Into<String>,
        price: f64,
    ) -> Result<bool, StoreError> {
        let Some(ingredient) = self.document.ingredients.get_mut(id) else {
            return Ok(false);
        };
        *ingredient = Ingredient::new(name, unit, price);
        self.save()?;
        Ok(true)
    }

    /// Dishes that use an ingredient, in id order.
    pub fn dishes_using_ingredient(&self, ingredient_id: &str) -> Vec<Dependent> {
        sorted_by_id(&self.document.dishes)
            .into_iter()
            .filter(|(_, dish)| dish.uses_ingredient(ingredient_id))
            .map(|(id, dish)| Dependent {
                id: id.to_string(),
                name: dish.name.clone(),
            })
            .collect()
    }

    /// Removes an ingredient unless a dish still uses it.
    ///
    /// Returns `false` if the id is unknown.
    pub fn delete_ingredient(&mut self, id: &str) -> Result<bool, StoreError> {
        if !self.document.ingredients.contains_key(id) {
            return Ok(false);
        }

        let dependents = self.dishes_using_ingredient(id);
        if !dependents.is_empty() {
            return Err(StoreError::InUse {
                kind: RecordKind::Ingredient,
                id: id.to_string(),
                dependent_kind: RecordKind::Dish,
                dependents,
            });
        }

        self.document.ingredients.remove(id);
        self.save()?;
        Ok(true)
    }

    // Dishes

    pub fn dishes(&self) -> &BTreeMap<String, Dish> {
        &self.document.dishes
    }

    pub fn dish(&self, id: &str) -> Option<&Dish> {
        self.document.dishes.get(id)
    }

    /// Dishes in id order.
    pub fn list_dishes(&self) -> Vec<(&str, &Dish)> {
        sorted_by_id(&self.document.dishes)
    }

    pub fn add_dish(
        &mut self,
        name: impl Into<String>,
        ingredients: BTreeMap<String, f64>,
    ) -> Result<String, StoreError> {
        let id = self.document.allocate_id(RecordKind::Dish);
        self.document
            .dishes
            .insert(id.clone(), Dish::new(name).with_ingredients(ingredients));
        self.save()?;
        Ok(id)
    }

    /// Overwrites a dish. Returns `false` without saving if the id is unknown.
    pub fn update_dish(
        &mut self,
        id: &str,
        name: impl Into<String>,
        ingredients: BTreeMap<String, f64>,
    ) -> Result<bool, StoreError> {
        let Some(dish) = self.document.dishes.get_mut(id) else {
            return Ok(false);
        };
        *dish = Dish::new(name).with_ingredients(ingredients);
        self.save()?;
        Ok(true)
    }

    /// Menus that serve a dish, in id order.
    pub fn menus_using_dish(&self, dish_id: &str) -> Vec<Dependent> {
        sorted_by_id(&self.document.menus)
            .into_iter()
            .filter(|(_, menu)| menu.uses_dish(dish_id))
            .map(|(id, menu)| Dependent {
                id: id.to_string(),
                name: menu.name.clone(),
            })
            .collect()
    }

    /// Removes a dish unless a menu still serves it.
    ///
    /// Returns `false` if the id is unknown.
    pub fn delete_dish(&mut self, id: &str) -> Result<bool, StoreError> {
        if !self.document.dishes.contains_key(id) {
            return Ok(false);
        }

        let dependents = self.menus_using_dish(id);
        if !dependents.is_empty() {
            return Err(StoreError::InUse {
                kind: RecordKind::Dish,
                id: id.to_string(),
                dependent_kind: RecordKind::Menu,
                dependents,
            });
        }

        self.document.dishes.remove(id);
        self.save()?;
        Ok(true)
    }

    // Menus

    pub fn menus(&self) -> &BTreeMap<String, Menu> {
        &self.document.menus
    }

    pub fn menu(&self, id: &str) -> Option<&Menu> {
        self.document.menus.get(id)
    }

    /// Menus in id order.
    pub fn list_menus(&self) -> Vec<(&str, &Menu)> {
        sorted_by_id(&self.document.menus)
    }

    pub fn add_menu(
        &mut self,
        name: impl Into<String>,
        dishes: BTreeMap<String, u32>,
        table_count: u32,
    ) -> Result<String, StoreError> {
        let id = self.document.allocate_id(RecordKind::Menu);
        let menu = Menu::new(name)
            .with_dishes(dishes)
            .with_table_count(table_count);
        self.document.menus.insert(id.clone(), menu);
        self.save()?;
        Ok(id)
    }

    /// Overwrites a menu. Returns `false` without saving if the id is unknown.
    pub fn update_menu(
        &mut self,
        id: &str,
        name: impl Into<String>,
        dishes: BTreeMap<String, u32>,
        table_count: u32,
    ) -> Result<bool, StoreError> {
        let Some(menu) = self.document.menus.get_mut(id) else {
            return Ok(false);
        };
        *menu = Menu::new(name)
            .with_dishes(dishes)
            .with_table_count(table_count);
        self.save()?;
        Ok(true)
    }

    /// Removes a menu. Nothing references menus, so this never refuses.
    pub fn delete_menu(&mut self, id: &str) -> Result<bool, StoreError> {
        if self.document.menus.remove(id).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    // Derived data

    pub fn calculate_ingredients_for_menu(&self, menu_id: &str) -> BTreeMap<String, f64> {
        report::calculate_ingredients_for_menu(&self.document, menu_id)
    }

    pub fn menu_cost_report(&self, menu_id: &str) -> Option<MenuReport> {
        report::menu_cost_report(&self.document, menu_id)
    }

    /// Writes the whole catalog to a workbook.
    pub fn export_to_spreadsheet(&self, path: &Path) -> Result<(), ExportError> {
        let sheets = export::catalog_sheets(&self.document);
        export::write_workbook(path, &sheets)
    }

    /// Writes a menu's aggregated statistics to a workbook.
    pub fn export_menu_statistics(
        &self,
        menu_id: &str,
        menu_name: &str,
        path: &Path,
    ) -> Result<(), ExportError> {
        let exported_at = Local::now().naive_local();
        let sheets = export::menu_statistics_sheets(&self.document, menu_id, menu_name, exported_at)?;
        export::write_workbook(path, &sheets)
    }
}
