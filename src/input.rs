//! Validation of user-typed values before they reach the data store.

use std::collections::BTreeMap;
use std::fmt;

use banquet_core::{sorted_by_id, RecordKind};

#[derive(Debug, PartialEq)]
pub enum InputError {
    Empty(&'static str),
    NotDecimal(&'static str, String),
    Negative(&'static str),
    NotPositiveDecimal(&'static str),
    NotPositiveInteger(&'static str, String),
    BadPair(String),
    NotFound(RecordKind, String),
    Ambiguous(RecordKind, String, Vec<String>),
    NoEntries(RecordKind, RecordKind),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Empty(field) => write!(f, "{} cannot be empty", field),
            InputError::NotDecimal(field, raw) => {
                write!(f, "{} must be a number, got '{}'", field, raw)
            }
            InputError::Negative(field) => write!(f, "{} cannot be negative", field),
            InputError::NotPositiveDecimal(field) => {
                write!(f, "{} must be greater than zero", field)
            }
            InputError::NotPositiveInteger(field, raw) => {
                write!(f, "{} must be a positive whole number, got '{}'", field, raw)
            }
            InputError::BadPair(raw) => {
                write!(f, "Expected ID=VALUE, got '{}'", raw)
            }
            InputError::NotFound(kind, identifier) => {
                let mut title = kind.to_string();
                if let Some(first) = title.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                write!(f, "{} not found: {}", title, identifier)
            }
            InputError::Ambiguous(kind, identifier, ids) => write!(
                f,
                "More than one {} is named '{}' (ids: {}). Use the id instead.",
                kind,
                identifier,
                ids.join(", ")
            ),
            InputError::NoEntries(owner, entry) => {
                write!(f, "A {} needs at least one {}", owner, entry)
            }
        }
    }
}

impl std::error::Error for InputError {}

/// Trims a required text field.
pub fn required_text(field: &'static str, value: &str) -> Result<String, InputError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty(field));
    }
    Ok(trimmed.to_string())
}

fn parse_decimal(field: &'static str, raw: &str) -> Result<f64, InputError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(InputError::NotDecimal(field, trimmed.to_string())),
    }
}

/// A unit price: any decimal that is not negative.
pub fn price(raw: &str) -> Result<f64, InputError> {
    let value = parse_decimal("Price", raw)?;
    if value < 0.0 {
        return Err(InputError::Negative("Price"));
    }
    Ok(value)
}

/// A per-serving ingredient amount: a decimal above zero.
pub fn amount(raw: &str) -> Result<f64, InputError> {
    let value = parse_decimal("Amount", raw)?;
    if value <= 0.0 {
        return Err(InputError::NotPositiveDecimal("Amount"));
    }
    Ok(value)
}

/// A serving or table count: a whole number above zero.
pub fn count(field: &'static str, raw: &str) -> Result<u32, InputError> {
    let trimmed = raw.trim();
    match trimmed.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(InputError::NotPositiveInteger(field, trimmed.to_string())),
    }
}

/// Splits `ID=VALUE`.
pub fn pair(raw: &str) -> Result<(&str, &str), InputError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Ok((key.trim(), value.trim()))
        }
        _ => Err(InputError::BadPair(raw.to_string())),
    }
}

/// Resolves an id or a case-insensitive exact name to a record id.
pub fn resolve<'a, V>(
    kind: RecordKind,
    identifier: &str,
    records: &'a BTreeMap<String, V>,
    name_of: impl Fn(&V) -> &str,
) -> Result<&'a str, InputError> {
    let identifier = identifier.trim();
    if let Some((id, _)) = records.get_key_value(identifier) {
        return Ok(id.as_str());
    }

    let wanted = identifier.to_lowercase();
    let matches: Vec<&str> = sorted_by_id(records)
        .into_iter()
        .filter(|(_, record)| name_of(record).to_lowercase() == wanted)
        .map(|(id, _)| id)
        .collect();

    match matches.as_slice() {
        [] => Err(InputError::NotFound(kind, identifier.to_string())),
        [id] => Ok(*id),
        many => Err(InputError::Ambiguous(
            kind,
            identifier.to_string(),
            many.iter().map(|id| id.to_string()).collect(),
        )),
    }
}

/// Applies an update to the entries of a dish recipe or a menu.
///
/// Each key in `remove` is dropped from `current`, either directly by id (so
/// ids of deleted records can still be removed) or through `resolve`. The
/// `set` entries are then added, replacing existing values. `owner` must end
/// up with at least one entry.
pub fn merge_entries<V, R>(
    owner: RecordKind,
    entry: RecordKind,
    current: BTreeMap<String, V>,
    remove: &[String],
    set: BTreeMap<String, V>,
    records: &BTreeMap<String, R>,
    name_of: impl Fn(&R) -> &str,
) -> Result<BTreeMap<String, V>, InputError> {
    let mut merged = current;
    for key in remove {
        if merged.remove(key.trim()).is_some() {
            continue;
        }
        let id = resolve(entry, key, records, &name_of)?;
        merged.remove(id);
    }
    merged.extend(set);

    if merged.is_empty() {
        return Err(InputError::NoEntries(owner, entry));
    }
    Ok(merged)
}
