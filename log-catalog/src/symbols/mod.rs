//! Extraction of catalog declarations from symbol table dumps
//!
//! This module turns the text output of a symbol dump tool into deduplicated
//! message and module records. Unrelated symbols are skipped; a malformed
//! catalog declaration fails the whole run.

pub mod declaration;
pub mod scanner;

pub use declaration::{parse_line, Declaration};

use crate::types::{CatalogError, Message, MessageKey, Module, Result};
use std::collections::HashSet;
use std::path::Path;

/// Declarations collected from one or more symbol dumps
#[derive(Debug, Default)]
pub struct SymbolTable {
    messages: Vec<Message>,
    modules: Vec<Module>,
    message_keys: HashSet<MessageKey>,
    module_keys: HashSet<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a symbol dump file and add its declarations
    pub fn add_file(&mut self, path: &Path) -> Result<()> {
        log::info!("Reading symbols: {:?}", path);
        let text = std::fs::read_to_string(path)?;
        let added = self.add_text(&text, &path.display().to_string())?;
        log::info!("Found {} new declarations in {:?}", added, path);
        Ok(())
    }

    /// Parse symbol dump text and add its declarations
    ///
    /// `origin` names the input in error messages. Returns the number of
    /// declarations that were not already known.
    pub fn add_text(&mut self, text: &str, origin: &str) -> Result<usize> {
        let mut added = 0;

        for (idx, line) in text.lines().enumerate() {
            let declaration = match parse_line(line) {
                None => continue,
                Some(Ok(declaration)) => declaration,
                Some(Err(reason)) => {
                    return Err(CatalogError::SymbolParse {
                        origin: origin.to_string(),
                        line: idx + 1,
                        text: line.to_string(),
                        reason,
                    });
                }
            };

            if self.insert(declaration) {
                added += 1;
            }
        }

        Ok(added)
    }

    /// Add one declaration, returning false if an identical one was already seen
    pub fn insert(&mut self, declaration: Declaration) -> bool {
        match declaration {
            Declaration::Message(message) => {
                if !self.message_keys.insert(message.key()) {
                    log::trace!("Duplicate message declaration: {:?}", message.text);
                    return false;
                }
                self.messages.push(message);
            }
            Declaration::Module(module) => {
                if !self.module_keys.insert(module.text.clone()) {
                    log::trace!("Duplicate module declaration: {:?}", module.text);
                    return false;
                }
                self.modules.push(module);
            }
        }
        true
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn into_parts(self) -> (Vec<Message>, Vec<Module>) {
        (self.messages, self.modules)
    }
}
