//! Catalog generation
//!
//! [`CatalogBuilder`] collects the current build's declarations and any
//! number of stable seed catalogs, runs the allocator and produces a
//! [`GeneratedCatalog`] ready to be written out in every format.

use super::enums::{EnumResolver, EnumTables, NoEnums};
use super::{cpp, json, xml, Catalog};
use crate::allocator::StableIdAllocator;
use crate::config::GeneratorConfig;
use crate::encoding::Encoding;
use crate::symbols::SymbolTable;
use crate::types::{Assigned, Message, Module, Result};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Builder for one catalog generation run
pub struct CatalogBuilder {
    config: GeneratorConfig,
    symbols: SymbolTable,
    seed: Catalog,
    resolver: Box<dyn EnumResolver>,
}

impl CatalogBuilder {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            symbols: SymbolTable::new(),
            seed: Catalog::new(),
            resolver: Box::new(NoEnums),
        }
    }

    /// Builder method: resolve enum symbol names through `resolver`
    pub fn with_enum_resolver(mut self, resolver: impl EnumResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Add declarations from a symbol dump file
    pub fn add_symbols_file(&mut self, path: &Path) -> Result<()> {
        self.symbols.add_file(path)
    }

    /// Add declarations from symbol dump text
    pub fn add_symbols(&mut self, text: &str, origin: &str) -> Result<usize> {
        self.symbols.add_text(text, origin)
    }

    /// Add a stable catalog file as a seed
    pub fn add_stable_catalog_file(&mut self, path: &Path) -> Result<()> {
        let catalog = Catalog::from_json_file(path)?;
        self.add_stable_catalog(catalog)
    }

    /// Add a seed catalog; earlier seeds win on conflicting IDs for the same identity
    pub fn add_stable_catalog(&mut self, catalog: Catalog) -> Result<()> {
        self.seed.merge(catalog)
    }

    /// Allocate IDs and assemble the output catalog
    pub fn build(self) -> Result<GeneratedCatalog> {
        let (messages, modules) = self.symbols.into_parts();
        log::info!(
            "Generating catalog for {} messages and {} modules ({} seed messages)",
            messages.len(),
            modules.len(),
            self.seed.messages.len()
        );

        let allocation = StableIdAllocator::new(&self.config, &self.seed)?.allocate(messages, modules)?;

        let mut messages = allocation.messages;
        messages.sort_by_key(|assigned| assigned.id);
        let mut modules = allocation.modules;
        modules.sort_by_key(|assigned| assigned.id);

        let (stale_messages, stale_modules) = if self.config.forget_old_ids {
            (Vec::new(), Vec::new())
        } else {
            stale_entries(&self.seed, &messages, &modules)
        };
        for key in &allocation.superseded {
            log::debug!("Seed message {:?} superseded by a corrected typo", key.text);
        }
        if !stale_messages.is_empty() || !stale_modules.is_empty() {
            log::info!(
                "Retaining {} stale messages and {} stale modules",
                stale_messages.len(),
                stale_modules.len()
            );
        }

        let mut enums = resolve_enums(self.resolver.as_ref(), &messages);
        enums.merge_under(&self.seed.enums);

        Ok(GeneratedCatalog {
            messages,
            modules,
            stale_messages,
            stale_modules,
            enums,
            config: self.config,
        })
    }
}

/// Seed entries whose ID the current build does not write out
///
/// This covers identities no longer declared and seed IDs of identities the
/// current build declares under a different ID. A seed message whose ID was
/// taken over by a corrected typo is written out under its new text only.
fn stale_entries(
    seed: &Catalog,
    messages: &[Assigned<Message>],
    modules: &[Assigned<Module>],
) -> (Vec<Message>, Vec<Module>) {
    let current_messages: HashSet<u32> = messages.iter().map(|assigned| assigned.id).collect();
    let current_modules: HashSet<u32> = modules.iter().map(|assigned| assigned.id).collect();

    let mut stale_messages: Vec<Message> = seed
        .messages
        .iter()
        .filter(|message| message.id.is_some_and(|id| !current_messages.contains(&id)))
        .cloned()
        .collect();
    stale_messages.sort_by_key(|message| message.id);

    let mut stale_modules: Vec<Module> = seed
        .modules
        .iter()
        .filter(|module| module.id.is_some_and(|id| !current_modules.contains(&id)))
        .cloned()
        .collect();
    stale_modules.sort_by_key(|module| module.id);

    (stale_messages, stale_modules)
}

/// Enum tables for every enum type the current messages use
fn resolve_enums(resolver: &dyn EnumResolver, messages: &[Assigned<Message>]) -> EnumTables {
    let names: BTreeSet<String> = messages
        .iter()
        .flat_map(|assigned| assigned.record.arg_types.iter())
        .filter_map(|tag| Encoding::parse(tag).ok())
        .filter_map(|encoding| encoding.enum_name().map(str::to_string))
        .collect();

    let mut enums = EnumTables::new();
    for name in names {
        match resolver.resolve(&name) {
            Some(table) => enums.insert(name, table),
            None => log::debug!("No symbols known for enum {}", name),
        }
    }
    enums
}

/// Outcome of a generation run
#[derive(Debug, Clone)]
pub struct GeneratedCatalog {
    messages: Vec<Assigned<Message>>,
    modules: Vec<Assigned<Module>>,
    stale_messages: Vec<Message>,
    stale_modules: Vec<Module>,
    enums: EnumTables,
    config: GeneratorConfig,
}

impl GeneratedCatalog {
    /// Current-build messages, sorted by ID
    pub fn messages(&self) -> &[Assigned<Message>] {
        &self.messages
    }

    /// Current-build modules, sorted by ID
    pub fn modules(&self) -> &[Assigned<Module>] {
        &self.modules
    }

    pub fn stale_messages(&self) -> &[Message] {
        &self.stale_messages
    }

    pub fn stale_modules(&self) -> &[Module] {
        &self.stale_modules
    }

    pub fn enums(&self) -> &EnumTables {
        &self.enums
    }

    /// ID allocated to the message with this text and these argument types
    pub fn message_id(&self, text: &str, arg_types: &[&str]) -> Option<u32> {
        self.messages
            .iter()
            .find(|assigned| {
                assigned.record.text == text
                    && assigned.record.arg_types.iter().map(String::as_str).eq(arg_types.iter().copied())
            })
            .map(|assigned| assigned.id)
    }

    pub fn module_id(&self, text: &str) -> Option<u32> {
        self.modules
            .iter()
            .find(|assigned| assigned.record.text == text)
            .map(|assigned| assigned.id)
    }

    /// The merged catalog: current entries first, then retained stale ones
    pub fn catalog(&self) -> Catalog {
        Catalog {
            messages: self
                .messages
                .iter()
                .map(|assigned| assigned.resolved())
                .chain(self.stale_messages.iter().cloned())
                .collect(),
            modules: self
                .modules
                .iter()
                .map(|assigned| assigned.resolved())
                .chain(self.stale_modules.iter().cloned())
                .collect(),
            enums: self.enums.clone(),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        let catalog = self.catalog();
        json::to_string(&catalog.messages, &catalog.modules, &catalog.enums)
    }

    pub fn to_xml_string(&self) -> String {
        let catalog = self.catalog();
        xml::to_string(
            &catalog.messages,
            &catalog.modules,
            &catalog.enums,
            &self.config.collateral,
        )
    }

    /// C++ definitions for the current build's declarations
    pub fn to_cpp_string(&self) -> String {
        cpp::to_string(&self.messages, &self.modules)
    }
}
