//! Enum tables
//!
//! Enum arguments travel as plain integers. A catalog may carry, for each
//! enum type, a table mapping values to symbol names so that the decoder can
//! print `VAL_E1` instead of `static_cast<ns::E1>(19)`.

use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Symbol names of one enum type, keyed by value
pub type EnumTable = BTreeMap<i64, String>;

/// Source of enum symbol names
///
/// Implement this to plug in enum introspection. Returning `None` is not an
/// error: arguments of that enum are rendered numerically.
pub trait EnumResolver {
    fn resolve(&self, name: &str) -> Option<EnumTable>;
}

/// Resolver that knows no enums
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnums;

impl EnumResolver for NoEnums {
    fn resolve(&self, _name: &str) -> Option<EnumTable> {
        None
    }
}

/// Enum tables by type name, serialized as `{"ns::E": {"0": "A", "1": "B"}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumTables(BTreeMap<String, EnumTable>);

impl EnumTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load tables from a JSON file of the same shape as a catalog's `enums`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        log::info!("Loading enum tables: {:?}", path);
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, table: EnumTable) {
        self.0.insert(name.into(), table);
    }

    pub fn get(&self, name: &str) -> Option<&EnumTable> {
        self.0.get(name)
    }

    /// Symbol name of `value` in enum `name`
    pub fn lookup(&self, name: &str, value: i64) -> Option<&str> {
        self.0.get(name)?.get(&value).map(String::as_str)
    }

    /// Position of `name` among the sorted enum names
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.keys().position(|key| key == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnumTable)> {
        self.0.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add tables from `other` for names not already present
    pub fn merge_under(&mut self, other: &EnumTables) {
        for (name, table) in &other.0 {
            self.0.entry(name.clone()).or_insert_with(|| table.clone());
        }
    }
}

impl EnumResolver for EnumTables {
    fn resolve(&self, name: &str) -> Option<EnumTable> {
        self.0.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> EnumTables {
        let mut tables = EnumTables::new();
        tables.insert("ns::E2", EnumTable::from([(23, "VAL_E2".to_string())]));
        tables.insert("ns::E1", EnumTable::from([(19, "VAL_E1".to_string())]));
        tables
    }

    #[test]
    fn test_lookup_and_index() {
        let tables = tables();
        assert_eq!(tables.lookup("ns::E1", 19), Some("VAL_E1"));
        assert_eq!(tables.lookup("ns::E1", 20), None);
        assert_eq!(tables.lookup("ns::E3", 0), None);
        assert_eq!(tables.index_of("ns::E1"), Some(0));
        assert_eq!(tables.index_of("ns::E2"), Some(1));
        assert!(NoEnums.resolve("ns::E1").is_none());
        assert!(tables.resolve("ns::E2").is_some());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&tables()).unwrap();
        assert_eq!(json, r#"{"ns::E1":{"19":"VAL_E1"},"ns::E2":{"23":"VAL_E2"}}"#);

        let parsed: EnumTables = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tables());
    }

    #[test]
    fn test_merge_under_keeps_current() {
        let mut current = EnumTables::new();
        current.insert("ns::E1", EnumTable::from([(19, "NEW".to_string())]));
        current.merge_under(&tables());

        assert_eq!(current.lookup("ns::E1", 19), Some("NEW"));
        assert_eq!(current.lookup("ns::E2", 23), Some("VAL_E2"));
    }
}
