//! Stable catalog ID allocation
//!
//! Records already present in a seed catalog keep their seed ID across
//! rebuilds; everything else receives the smallest ID not taken by a seed,
//! an explicit declaration, a reserved interval or an earlier allocation in
//! the same run.
//!
//! Allocation is deterministic: records are processed in `(text, arg_types)`
//! order in three passes (explicit IDs, exact seed matches, new IDs), so two
//! runs over the same inputs always produce the same catalog.

pub mod generator;
pub mod typo;

pub use generator::IdGenerator;
pub use typo::{closest, levenshtein, TypoMatch};

use crate::catalog::Catalog;
use crate::config::{GeneratorConfig, TypoPolicy};
use crate::types::{Assigned, CatalogError, Message, MessageKey, Module, RecordKind, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Result of one allocation run
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    pub messages: Vec<Assigned<Message>>,
    pub modules: Vec<Assigned<Module>>,
    /// Seed messages whose ID was taken over by a corrected typo
    pub superseded: BTreeSet<MessageKey>,
}

/// A seed message as seen by typo detection
#[derive(Debug, Clone)]
struct SeedMessage {
    id: u32,
    key: MessageKey,
    typo_key: String,
}

/// Per-run allocation state
///
/// Owns the known identities, the IDs claimed so far and one generator per
/// record kind. Construct a fresh allocator for every generation run.
#[derive(Debug)]
pub struct StableIdAllocator<'a> {
    config: &'a GeneratorConfig,
    known_messages: BTreeMap<MessageKey, u32>,
    known_modules: BTreeMap<String, u32>,
    message_owners: BTreeMap<u32, MessageKey>,
    module_owners: BTreeMap<u32, String>,
    seed_messages: Vec<SeedMessage>,
    message_ids: IdGenerator,
    module_ids: IdGenerator,
}

impl<'a> StableIdAllocator<'a> {
    /// Create an allocator seeded with a previously emitted catalog
    pub fn new(config: &'a GeneratorConfig, seed: &Catalog) -> Result<Self> {
        let mut allocator = Self {
            config,
            known_messages: BTreeMap::new(),
            known_modules: BTreeMap::new(),
            message_owners: BTreeMap::new(),
            module_owners: BTreeMap::new(),
            seed_messages: Vec::new(),
            message_ids: IdGenerator::new(config.reserved_ids.clone()),
            module_ids: IdGenerator::new(config.reserved_ids.clone()),
        };

        for message in &seed.messages {
            let Some(id) = message.id else { continue };
            let key = message.key();
            allocator.claim_message_id(&key, id)?;
            // later entries for a known identity are aliases that only hold their ID
            allocator.known_messages.entry(key.clone()).or_insert(id);
            allocator.seed_messages.push(SeedMessage {
                id,
                key,
                typo_key: typo_key(message),
            });
        }
        allocator.seed_messages.sort_by_key(|seed| seed.id);

        for module in &seed.modules {
            let Some(id) = module.id else { continue };
            allocator.claim_module_id(&module.text, id)?;
            allocator.known_modules.entry(module.text.clone()).or_insert(id);
        }

        log::debug!(
            "Seeded allocator with {} messages and {} modules",
            allocator.known_messages.len(),
            allocator.known_modules.len()
        );
        Ok(allocator)
    }

    /// Assign final IDs to the current build's records
    pub fn allocate(mut self, messages: Vec<Message>, modules: Vec<Module>) -> Result<Allocation> {
        let mut allocation = Allocation::default();
        allocation.messages = self.allocate_messages(messages, &mut allocation.superseded)?;
        allocation.modules = self.allocate_modules(modules)?;

        log::info!(
            "Allocated IDs for {} messages and {} modules",
            allocation.messages.len(),
            allocation.modules.len()
        );
        Ok(allocation)
    }

    fn allocate_messages(
        &mut self,
        mut messages: Vec<Message>,
        superseded: &mut BTreeSet<MessageKey>,
    ) -> Result<Vec<Assigned<Message>>> {
        messages.sort_by_key(Message::key);
        messages.dedup_by_key(|message| message.key());

        let mut resolved: Vec<Option<u32>> = vec![None; messages.len()];
        let mut claimed: BTreeSet<u32> = BTreeSet::new();

        // Pass 0: explicit IDs from source
        for (slot, message) in resolved.iter_mut().zip(&messages) {
            let Some(id) = message.id else { continue };
            let key = message.key();
            if let Some(&seed_id) = self.known_messages.get(&key) {
                if seed_id != id {
                    log::warn!(
                        "Message {:?} declares ID {} but was previously cataloged as {}",
                        message.text,
                        id,
                        seed_id
                    );
                }
            }
            self.register_message(key, id)?;
            claimed.insert(id);
            *slot = Some(id);
        }

        // Pass 1: exact matches against known identities
        for (slot, message) in resolved.iter_mut().zip(&messages) {
            if slot.is_some() {
                continue;
            }
            if let Some(&id) = self.known_messages.get(&message.key()) {
                log::debug!("Message {:?} keeps ID {}", message.text, id);
                claimed.insert(id);
                *slot = Some(id);
            }
        }

        // Pass 2: new identities
        for (slot, message) in resolved.iter_mut().zip(&messages) {
            if slot.is_some() {
                continue;
            }

            let reused = match self.find_typo(message) {
                Some(found) => self.apply_typo_policy(message, &found, &claimed)?,
                None => None,
            };

            let id = match reused {
                Some(found) => {
                    if let Some(seed) = self.seed_messages.iter().find(|seed| seed.id == found) {
                        superseded.insert(seed.key.clone());
                    }
                    found
                }
                None => {
                    let id = self
                        .message_ids
                        .next()
                        .ok_or(CatalogError::IdSpaceExhausted(RecordKind::Message))?;
                    log::debug!("Message {:?} gets new ID {}", message.text, id);
                    id
                }
            };

            self.known_messages.insert(message.key(), id);
            self.message_owners.entry(id).or_insert_with(|| message.key());
            claimed.insert(id);
            *slot = Some(id);
        }

        Ok(messages
            .into_iter()
            .zip(resolved)
            .filter_map(|(record, id)| id.map(|id| Assigned { record, id }))
            .collect())
    }

    fn allocate_modules(&mut self, mut modules: Vec<Module>) -> Result<Vec<Assigned<Module>>> {
        modules.sort_by(|a, b| a.text.cmp(&b.text));
        modules.dedup_by(|a, b| a.text == b.text);

        let mut resolved: Vec<Option<u32>> = vec![None; modules.len()];

        for (slot, module) in resolved.iter_mut().zip(&modules) {
            if let Some(id) = module.id {
                self.register_module(&module.text, id)?;
                *slot = Some(id);
            }
        }

        for (slot, module) in resolved.iter_mut().zip(&modules) {
            if slot.is_none() {
                *slot = self.known_modules.get(&module.text).copied();
            }
        }

        for (slot, module) in resolved.iter_mut().zip(&modules) {
            if slot.is_some() {
                continue;
            }
            let id = self
                .module_ids
                .next()
                .ok_or(CatalogError::IdSpaceExhausted(RecordKind::Module))?;
            log::debug!("Module {:?} gets new ID {}", module.text, id);
            self.known_modules.insert(module.text.clone(), id);
            self.module_owners.insert(id, module.text.clone());
            *slot = Some(id);
        }

        let mut assigned = Vec::with_capacity(modules.len());
        for (record, id) in modules.into_iter().zip(resolved) {
            let Some(id) = id else { continue };
            if id > self.config.module_id_max {
                return Err(CatalogError::ModuleIdOutOfRange {
                    module: record.text,
                    id,
                    max: self.config.module_id_max,
                });
            }
            assigned.push(Assigned { record, id });
        }
        Ok(assigned)
    }

    /// Record that `key` owns message ID `id` and make it the identity's ID
    fn register_message(&mut self, key: MessageKey, id: u32) -> Result<()> {
        self.claim_message_id(&key, id)?;
        self.known_messages.insert(key, id);
        Ok(())
    }

    fn claim_message_id(&mut self, key: &MessageKey, id: u32) -> Result<()> {
        if let Some(owner) = self.message_owners.get(&id) {
            if owner != key {
                return Err(CatalogError::DuplicateId {
                    kind: RecordKind::Message,
                    id,
                    first: owner.text.clone(),
                    second: key.text.clone(),
                });
            }
        }
        self.message_ids.claim(id);
        self.message_owners.insert(id, key.clone());
        Ok(())
    }

    fn register_module(&mut self, text: &str, id: u32) -> Result<()> {
        self.claim_module_id(text, id)?;
        self.known_modules.insert(text.to_string(), id);
        Ok(())
    }

    fn claim_module_id(&mut self, text: &str, id: u32) -> Result<()> {
        if let Some(owner) = self.module_owners.get(&id) {
            if owner != text {
                return Err(CatalogError::DuplicateId {
                    kind: RecordKind::Module,
                    id,
                    first: owner.clone(),
                    second: text.to_string(),
                });
            }
        }
        self.module_ids.claim(id);
        self.module_owners.insert(id, text.to_string());
        Ok(())
    }

    fn find_typo(&self, message: &Message) -> Option<TypoMatch> {
        if !self.config.detects_typos() {
            return None;
        }
        let key = typo_key(message);
        closest(
            &key,
            self.seed_messages
                .iter()
                .map(|seed| (seed.id, seed.typo_key.as_str(), seed.key.text.as_str())),
            self.config.typo_threshold,
        )
    }

    /// Apply the configured policy, returning the seed ID to reuse, if any
    fn apply_typo_policy(
        &self,
        message: &Message,
        found: &TypoMatch,
        claimed: &BTreeSet<u32>,
    ) -> Result<Option<u32>> {
        let policy = self.config.typo_policy;
        match policy {
            TypoPolicy::Error => Err(CatalogError::TypoDetected {
                text: message.text.clone(),
                similar: found.text.clone(),
                similar_id: found.id,
                distance: found.distance,
            }),
            TypoPolicy::Warn => {
                log::warn!(
                    "Possible typo: {:?} is {} edit(s) away from {:?} (ID {}), allocating a new ID",
                    message.text,
                    found.distance,
                    found.text,
                    found.id
                );
                Ok(None)
            }
            TypoPolicy::Fix | TypoPolicy::FixQuiet if claimed.contains(&found.id) => {
                log::warn!(
                    "Possible typo: {:?} resembles {:?} but ID {} is already in use, allocating a new ID",
                    message.text,
                    found.text,
                    found.id
                );
                Ok(None)
            }
            TypoPolicy::Fix => {
                log::warn!(
                    "Possible typo: {:?} is {} edit(s) away from {:?}, reusing ID {}",
                    message.text,
                    found.distance,
                    found.text,
                    found.id
                );
                Ok(Some(found.id))
            }
            TypoPolicy::FixQuiet => Ok(Some(found.id)),
        }
    }
}

/// Text compared by typo detection: the message text followed by its argument types
fn typo_key(message: &Message) -> String {
    let mut key = message.text.clone();
    for arg in &message.arg_types {
        key.push_str(arg);
    }
    key
}
