//! Catalogs and their serialized forms
//!
//! A [`Catalog`] is the persisted cross-build state: every message and module
//! with its final ID, plus enum tables. It is written as JSON (the format the
//! decoder and later builds read back), as Sys-T XML collateral, and as a C++
//! patch that defines the ID of every declaration in the current build.

pub mod builder;
pub mod cpp;
pub mod enums;
pub mod json;
pub mod xml;

pub use builder::{CatalogBuilder, GeneratedCatalog};
pub use enums::{EnumResolver, EnumTable, EnumTables, NoEnums};

use crate::config::CollateralInfo;
use crate::types::{CatalogError, Message, Module, RecordKind, Result};
use std::path::Path;

/// Messages, modules and enum tables with final IDs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub messages: Vec<Message>,
    pub modules: Vec<Module>,
    pub enums: EnumTables,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        json::from_str(text)
    }

    /// Load a JSON catalog file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        log::info!("Loading catalog: {:?}", path);
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&text)?;
        log::debug!(
            "Loaded {} messages, {} modules, {} enums from {:?}",
            catalog.messages.len(),
            catalog.modules.len(),
            catalog.enums.len(),
            path
        );
        Ok(catalog)
    }

    /// Serialize as JSON with entries sorted by ID
    pub fn to_json_string(&self) -> Result<String> {
        let (messages, modules) = self.sorted();
        json::to_string(&messages, &modules, &self.enums)
    }

    /// Render XML collateral with entries sorted by ID
    pub fn to_xml_string(&self, collateral: &CollateralInfo) -> String {
        let (messages, modules) = self.sorted();
        xml::to_string(&messages, &modules, &self.enums, collateral)
    }

    pub fn message(&self, id: u32) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == Some(id))
    }

    pub fn module(&self, id: u32) -> Option<&Module> {
        self.modules.iter().find(|module| module.id == Some(id))
    }

    /// Fold another catalog into this one
    ///
    /// The first entry seen for an identity decides its ID. A later entry for
    /// the same identity under another ID is kept as an alias so that ID is
    /// never handed out again. An entry whose ID is already held by a
    /// different identity is an error. Enum tables from `other` only fill in
    /// names not already present.
    pub fn merge(&mut self, other: Catalog) -> Result<()> {
        for message in other.messages {
            let key = message.key();
            if let Some(owner) = message.id.and_then(|id| self.message(id)) {
                if owner.key() == key {
                    continue;
                }
                return Err(CatalogError::DuplicateId {
                    kind: RecordKind::Message,
                    id: message.id.unwrap_or_default(),
                    first: owner.text.clone(),
                    second: message.text,
                });
            }
            if let Some(existing) = self.messages.iter().find(|m| m.key() == key) {
                log::info!(
                    "Message {:?} has ID {:?} and {:?}, keeping {:?} and retaining {:?}",
                    message.text,
                    existing.id,
                    message.id,
                    existing.id,
                    message.id
                );
            }
            self.messages.push(message);
        }

        for module in other.modules {
            if let Some(owner) = module.id.and_then(|id| self.module(id)) {
                if owner.text == module.text {
                    continue;
                }
                return Err(CatalogError::DuplicateId {
                    kind: RecordKind::Module,
                    id: module.id.unwrap_or_default(),
                    first: owner.text.clone(),
                    second: module.text,
                });
            }
            if let Some(existing) = self.modules.iter().find(|m| m.text == module.text) {
                log::info!(
                    "Module {:?} has ID {:?} and {:?}, keeping {:?} and retaining {:?}",
                    module.text,
                    existing.id,
                    module.id,
                    existing.id,
                    module.id
                );
            }
            self.modules.push(module);
        }

        self.enums.merge_under(&other.enums);
        Ok(())
    }

    fn sorted(&self) -> (Vec<Message>, Vec<Module>) {
        let mut messages = self.messages.clone();
        messages.sort_by_key(|message| message.id);
        let mut modules = self.modules.clone();
        modules.sort_by_key(|module| module.id);
        (messages, modules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(messages: &[(&str, u32)], modules: &[(&str, u32)]) -> Catalog {
        Catalog {
            messages: messages
                .iter()
                .map(|(text, id)| Message::new(*text, vec![]).with_id(*id))
                .collect(),
            modules: modules
                .iter()
                .map(|(text, id)| Module::new(*text).with_id(*id))
                .collect(),
            enums: EnumTables::new(),
        }
    }

    #[test]
    fn test_merge_keeps_first_id() {
        let mut merged = catalog(&[("a", 1)], &[("core", 0)]);
        merged
            .merge(catalog(&[("a", 5), ("b", 2)], &[("core", 4), ("net", 1)]))
            .unwrap();

        assert_eq!(merged.message(1).unwrap().text, "a");
        assert_eq!(merged.message(2).unwrap().text, "b");
        assert_eq!(merged.messages[0].id, Some(1));
        // the second ID of "a" stays occupied
        assert_eq!(merged.message(5).unwrap().text, "a");
        assert_eq!(merged.module(1).unwrap().text, "net");
        assert_eq!(merged.modules.len(), 3);
    }

    #[test]
    fn test_merge_rejects_id_collision() {
        let mut merged = catalog(&[("a", 1)], &[]);
        let result = merged.merge(catalog(&[("b", 1)], &[]));
        assert!(matches!(
            result,
            Err(CatalogError::DuplicateId { kind: RecordKind::Message, id: 1, .. })
        ));
    }

    #[test]
    fn test_json_sorted_by_id() {
        let catalog = catalog(&[("b", 3), ("a", 1)], &[]);
        let json = catalog.to_json_string().unwrap();
        assert!(json.find("\"a\"").unwrap() < json.find("\"b\"").unwrap());

        let reloaded = Catalog::from_json_str(&json).unwrap();
        assert_eq!(reloaded.message(3).unwrap().text, "b");
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{"messages": [{"msg": "boot complete", "arg_types": [], "id": 9}]}"#,
        )
        .unwrap();

        let catalog = Catalog::from_json_file(file.path()).unwrap();
        assert_eq!(catalog.message(9).unwrap().text, "boot complete");
    }
}
