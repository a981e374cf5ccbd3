use serde_json::Value;

use crate::{FileId, FileRecord};

/// Name given to list entries whose shape is not recognised.
pub const UNKNOWN_FILE_NAME: &str = "Unknown file";

/// Assigns the `id` of a normalized record.
pub trait IdStrategy {
    fn assign(&self, position: usize, name: &str) -> FileId;
}

/// 1-based list position. Ids shift whenever the order of the list changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionDerivedId;

impl IdStrategy for PositionDerivedId {
    fn assign(&self, position: usize, _name: &str) -> FileId {
        FileId::try_from(position + 1).unwrap_or(FileId::MAX)
    }
}

/// Normalizes raw server entries with [`PositionDerivedId`].
pub fn normalize(raw: &[Value]) -> Vec<FileRecord> {
    normalize_with(&PositionDerivedId, raw)
}

/// Normalizes raw server entries. Never fails: unknown shapes become
/// [`UNKNOWN_FILE_NAME`].
pub fn normalize_with(strategy: &dyn IdStrategy, raw: &[Value]) -> Vec<FileRecord> {
    raw.iter()
        .enumerate()
        .map(|(position, entry)| {
            let name = entry_name(entry).unwrap_or(UNKNOWN_FILE_NAME).to_owned();
            FileRecord {
                id: strategy.assign(position, &name),
                name,
            }
        })
        .collect()
}

/// Rebuilds records from names in order, re-deriving every id.
pub fn records_from_names<I>(names: I) -> Vec<FileRecord>
where
    I: IntoIterator<Item = String>,
{
    names
        .into_iter()
        .enumerate()
        .map(|(position, name)| FileRecord {
            id: PositionDerivedId.assign(position, &name),
            name,
        })
        .collect()
}

pub(crate) fn entry_name(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(name) => Some(name.as_str()),
        Value::Object(map) => map.get("name").and_then(Value::as_str),
        _ => None,
    }
}
