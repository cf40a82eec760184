//! The persisted document: three record maps plus bookkeeping.
//!
//! On disk this is a single JSON object:
//!
//! ```json
//! {
//!   "version": "1.1",
//!   "created_time": "2025-01-01T12:00:00.000000",
//!   "last_modified": "2025-01-02T08:30:00.000000",
//!   "ingredients": { "1": { "name": "Pork", "unit": "kg", "price": 30.0 } },
//!   "dishes": { "1": { "name": "Braised Pork", "ingredients": { "1": 0.5 } } },
//!   "menus": { "1": { "name": "Banquet A", "dishes": { "1": 2 }, "table_count": 3 } },
//!   "next_ids": { "ingredients": 2, "dishes": 2, "menus": 2 }
//! }
//! ```
//!
//! Files written before versioning existed carry only the three maps.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::{Dish, Ingredient, Menu};

/// Version stamped on every document this crate writes.
pub const CURRENT_VERSION: &str = "1.1";

/// File name of the document inside the data directory.
pub const DATA_FILE_NAME: &str = "dish_data.json";

/// The three record maps of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Ingredient,
    Dish,
    Menu,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Ingredient => write!(f, "ingredient"),
            RecordKind::Dish => write!(f, "dish"),
            RecordKind::Menu => write!(f, "menu"),
        }
    }
}

/// Next id to hand out for each map.
///
/// Counters only move forward so ids of deleted records are never reissued.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdCounters {
    #[serde(default)]
    pub ingredients: u64,
    #[serde(default)]
    pub dishes: u64,
    #[serde(default)]
    pub menus: u64,
}

impl IdCounters {
    fn slot(&mut self, kind: RecordKind) -> &mut u64 {
        match kind {
            RecordKind::Ingredient => &mut self.ingredients,
            RecordKind::Dish => &mut self.dishes,
            RecordKind::Menu => &mut self.menus,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub version: String,
    #[serde(default = "now", with = "timestamp")]
    pub created_time: NaiveDateTime,
    #[serde(default = "now", with = "timestamp")]
    pub last_modified: NaiveDateTime,
    #[serde(default)]
    pub ingredients: BTreeMap<String, Ingredient>,
    #[serde(default)]
    pub dishes: BTreeMap<String, Dish>,
    #[serde(default)]
    pub menus: BTreeMap<String, Menu>,
    #[serde(default)]
    pub next_ids: IdCounters,
}

/// Result of decoding a document from disk.
#[derive(Debug)]
pub struct Decoded {
    pub document: Document,
    /// True when the file was in the pre-versioning layout and was upgraded.
    pub migrated: bool,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document stamped with the current version.
    pub fn new() -> Self {
        let now = now();
        Self {
            version: CURRENT_VERSION.to_string(),
            created_time: now,
            last_modified: now,
            ingredients: BTreeMap::new(),
            dishes: BTreeMap::new(),
            menus: BTreeMap::new(),
            next_ids: IdCounters::default(),
        }
    }

    /// Decodes a document, upgrading the legacy layout when `version` is absent.
    pub fn from_json(bytes: &[u8]) -> Result<Decoded, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;

        let Value::Object(ref object) = value else {
            return Err(serde::de::Error::custom("document root is not a JSON object"));
        };

        let (mut document, migrated) = if object.contains_key("version") {
            (serde_json::from_value::<Document>(value)?, false)
        } else {
            (Self::from_legacy(value)?, true)
        };

        document.reconcile_counters();
        Ok(Decoded { document, migrated })
    }

    /// Copies the three maps out of a legacy document into a fresh one.
    fn from_legacy(value: Value) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Legacy {
            #[serde(default)]
            ingredients: BTreeMap<String, Ingredient>,
            #[serde(default)]
            dishes: BTreeMap<String, Dish>,
            #[serde(default)]
            menus: BTreeMap<String, Menu>,
        }

        let legacy: Legacy = serde_json::from_value(value)?;
        let mut document = Self::new();
        document.ingredients = legacy.ingredients;
        document.dishes = legacy.dishes;
        document.menus = legacy.menus;
        Ok(document)
    }

    /// Pretty-printed JSON as written to disk.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Marks the document as modified now.
    pub fn touch(&mut self) {
        self.last_modified = now();
    }

    /// Raises each counter past the highest numeric id already in its map.
    pub fn reconcile_counters(&mut self) {
        let floors = [
            (RecordKind::Ingredient, max_numeric_id(&self.ingredients)),
            (RecordKind::Dish, max_numeric_id(&self.dishes)),
            (RecordKind::Menu, max_numeric_id(&self.menus)),
        ];
        for (kind, max_id) in floors {
            let slot = self.next_ids.slot(kind);
            *slot = (*slot).max(max_id.saturating_add(1)).max(1);
        }
    }

    /// Allocates the next id for a map and advances its counter.
    ///
    /// Once the counter is exhausted at `u64::MAX` the lowest unused id is
    /// handed out instead.
    pub fn allocate_id(&mut self, kind: RecordKind) -> String {
        self.reconcile_counters();
        loop {
            let slot = self.next_ids.slot(kind);
            let candidate = *slot;
            *slot = candidate.saturating_add(1);

            let id = candidate.to_string();
            if !self.contains(kind, &id) {
                return id;
            }
            if candidate == u64::MAX {
                break;
            }
        }

        tracing::warn!("{} id counter exhausted, reusing the lowest free id", kind);
        let mut n: u64 = 1;
        while self.contains(kind, &n.to_string()) {
            n += 1;
        }
        n.to_string()
    }

    pub fn contains(&self, kind: RecordKind, id: &str) -> bool {
        match kind {
            RecordKind::Ingredient => self.ingredients.contains_key(id),
            RecordKind::Dish => self.dishes.contains_key(id),
            RecordKind::Menu => self.menus.contains_key(id),
        }
    }

    pub fn count(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Ingredient => self.ingredients.len(),
            RecordKind::Dish => self.dishes.len(),
            RecordKind::Menu => self.menus.len(),
        }
    }
}

fn max_numeric_id<V>(map: &BTreeMap<String, V>) -> u64 {
    map.keys()
        .filter_map(|id| id.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Entries of a record map in numeric id order ("2" before "10").
///
/// Non-numeric ids sort after numeric ones, alphabetically.
pub fn sorted_by_id<V>(map: &BTreeMap<String, V>) -> Vec<(&str, &V)> {
    let mut entries: Vec<(&str, &V)> = map.iter().map(|(id, v)| (id.as_str(), v)).collect();
    entries.sort_by_key(|(id, _)| match id.parse::<u64>() {
        Ok(n) => (0, n, String::new()),
        Err(_) => (1, 0, id.to_string()),
    });
    entries
}

/// ISO-8601 timestamps without offset, tolerant on the way in.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(parse(&raw).unwrap_or_else(super::now))
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        raw.parse::<NaiveDateTime>().ok().or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_new_document_is_empty_and_current() {
        let doc = Document::new();
        assert_eq!(doc.version, CURRENT_VERSION);
        assert!(doc.ingredients.is_empty());
        assert!(doc.dishes.is_empty());
        assert!(doc.menus.is_empty());
        assert_eq!(doc.created_time, doc.last_modified);
    }

    #[test]
    fn test_allocate_id_is_sequential() {
        let mut doc = Document::new();
        assert_eq!(doc.allocate_id(RecordKind::Ingredient), "1");
        assert_eq!(doc.allocate_id(RecordKind::Ingredient), "2");
        assert_eq!(doc.allocate_id(RecordKind::Dish), "1");
    }

    #[test]
    fn test_allocate_id_skips_existing_keys() {
        let mut doc = Document::new();
        doc.ingredients
            .insert("1".into(), Ingredient::new("Pork", "kg", 30.0));
        doc.ingredients
            .insert("3".into(), Ingredient::new("Beef", "kg", 60.0));

        // Live size would suggest "3", which is taken.
        assert_eq!(doc.allocate_id(RecordKind::Ingredient), "4");
    }

    #[test]
    fn test_allocate_id_not_reused_after_removal() {
        let mut doc = Document::new();
        let first = doc.allocate_id(RecordKind::Menu);
        doc.menus.insert(first.clone(), Menu::new("A"));
        doc.menus.remove(&first);

        let second = doc.allocate_id(RecordKind::Menu);
        assert_ne!(first, second);
    }

    #[test]
    fn test_max_numeric_id_does_not_overflow_on_load() {
        let json = br#"{
            "version": "1.1",
            "ingredients": {"18446744073709551615": {"name": "Pork", "unit": "kg", "price": 30}}
        }"#;

        let mut doc = Document::from_json(json).unwrap().document;
        assert_eq!(doc.next_ids.ingredients, u64::MAX);

        // The counter cannot move past the top id, so the lowest free id is used.
        assert_eq!(doc.allocate_id(RecordKind::Ingredient), "1");
    }

    #[test]
    fn test_exhausted_counter_falls_back_to_free_id() {
        let json = br#"{
            "version": "1.1",
            "next_ids": {"ingredients": 18446744073709551615}
        }"#;
        let mut doc = Document::from_json(json).unwrap().document;

        let top = doc.allocate_id(RecordKind::Ingredient);
        assert_eq!(top, u64::MAX.to_string());
        doc.ingredients
            .insert(top, Ingredient::new("Pork", "kg", 30.0));
        doc.ingredients
            .insert("1".into(), Ingredient::new("Salt", "g", 0.01));

        assert_eq!(doc.allocate_id(RecordKind::Ingredient), "2");
        assert_eq!(doc.next_ids.ingredients, u64::MAX);
    }

    #[test]
    fn test_legacy_document_is_migrated() {
        let legacy = br#"{
            "ingredients": {"1": {"name": "Pork", "unit": "kg", "price": 30}},
            "dishes": {"1": {"name": "Braised Pork", "ingredients": {"1": 0.5}}},
            "menus": {"1": {"name": "Banquet A", "dishes": {"1": 2}}}
        }"#;

        let decoded = Document::from_json(legacy).unwrap();
        assert!(decoded.migrated);

        let doc = decoded.document;
        assert_eq!(doc.version, CURRENT_VERSION);
        assert_eq!(doc.ingredients["1"].name, "Pork");
        assert_eq!(doc.dishes["1"].ingredients["1"], 0.5);
        assert_eq!(doc.menus["1"].table_count, 1);
        assert_eq!(doc.next_ids.ingredients, 2);
    }

    #[test]
    fn test_versioned_document_without_counters() {
        let raw = br#"{
            "version": "1.0",
            "created_time": "2024-05-01T10:00:00.123456",
            "last_modified": "2024-05-02T10:00:00",
            "ingredients": {"2": {"name": "Tofu", "unit": "block", "price": 3.5}},
            "dishes": {},
            "menus": {}
        }"#;

        let decoded = Document::from_json(raw).unwrap();
        assert!(!decoded.migrated);

        let doc = decoded.document;
        assert_eq!(doc.version, "1.0");
        assert_eq!(
            doc.created_time.date(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert_eq!(doc.next_ids.ingredients, 3);
        assert_eq!(doc.next_ids.dishes, 1);
    }

    #[test]
    fn test_rfc3339_timestamp_accepted() {
        let raw = br#"{"version": "1.1", "created_time": "2024-05-01T10:00:00+08:00"}"#;
        let doc = Document::from_json(raw).unwrap().document;
        assert_eq!(doc.created_time.to_string(), "2024-05-01 10:00:00");
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        assert!(Document::from_json(b"[1, 2, 3]").is_err());
        assert!(Document::from_json(b"{not json").is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_maps() {
        let mut doc = Document::new();
        doc.ingredients
            .insert("1".into(), Ingredient::new("Pork", "kg", 30.0));
        doc.dishes
            .insert("1".into(), Dish::new("Braised Pork").with_ingredient("1", 0.5));
        doc.menus.insert(
            "1".into(),
            Menu::new("Banquet A").with_dish("1", 2).with_table_count(3),
        );
        doc.reconcile_counters();

        let bytes = doc.to_json().unwrap();
        let parsed = Document::from_json(&bytes).unwrap().document;

        assert_eq!(parsed.ingredients, doc.ingredients);
        assert_eq!(parsed.dishes, doc.dishes);
        assert_eq!(parsed.menus, doc.menus);
        assert_eq!(parsed.next_ids, doc.next_ids);
    }

    #[test]
    fn test_non_ascii_names_written_unescaped() {
        let mut doc = Document::new();
        doc.ingredients
            .insert("1".into(), Ingredient::new("五花肉", "斤", 18.0));

        let text = String::from_utf8(doc.to_json().unwrap()).unwrap();
        assert!(text.contains("五花肉"));
    }

    #[test]
    fn test_sorted_by_id_is_numeric() {
        let mut map = BTreeMap::new();
        map.insert("10".to_string(), 'c');
        map.insert("2".to_string(), 'b');
        map.insert("1".to_string(), 'a');
        map.insert("x".to_string(), 'z');

        let ids: Vec<&str> = sorted_by_id(&map).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["1", "2", "10", "x"]);
    }

    #[test]
    fn test_record_kind_display() {
        assert_eq!(RecordKind::Ingredient.to_string(), "ingredient");
        assert_eq!(RecordKind::Dish.to_string(), "dish");
        assert_eq!(RecordKind::Menu.to_string(), "menu");
    }
}
