//! Core types for the log catalog library
//!
//! This module defines the two kinds of catalog records (messages and modules),
//! their identity keys, and the error type shared by the parser, the allocator,
//! the serializers and the binary decoder.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while generating a catalog or decoding a trace
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{origin}:{line}: malformed declaration ({reason}): {text}")]
    SymbolParse {
        origin: String,
        line: usize,
        text: String,
        reason: String,
    },

    #[error("Invalid argument type tag: {0}")]
    InvalidArgType(String),

    #[error("Invalid reserved ID list: {0}")]
    InvalidReservedIds(String),

    #[error("Module \"{module}\" has ID {id}, exceeding the maximum of {max}")]
    ModuleIdOutOfRange { module: String, id: u32, max: u32 },

    #[error("Duplicate {kind} ID {id}: \"{first}\" and \"{second}\"")]
    DuplicateId {
        kind: RecordKind,
        id: u32,
        first: String,
        second: String,
    },

    #[error("No free {0} IDs left")]
    IdSpaceExhausted(RecordKind),

    #[error("Possible typo: \"{text}\" is {distance} edit(s) away from \"{similar}\" (ID {similar_id})")]
    TypoDetected {
        text: String,
        similar: String,
        similar_id: u32,
        distance: usize,
    },

    #[error("Unknown record type {0}")]
    UnknownRecordType(u8),

    #[error("Catalog message subtype {0} not supported")]
    UnsupportedSubtype(u8),

    #[error("Message ID {0} not found in catalog")]
    UnknownMessage(u64),

    #[error("Module ID {0} not found in catalog")]
    UnknownModule(u8),

    #[error("Message ID {id} declares {count} argument(s) but arrived in a short record")]
    UnexpectedArguments { id: u64, count: usize },

    #[error("Stream truncated while reading {0}")]
    Truncated(&'static str),

    #[error("Invalid conversion spec \"{0}\"")]
    InvalidFormatSpec(String),

    #[error("Format string \"{text}\" needs more than {available} argument(s)")]
    MissingArgument { text: String, available: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The two kinds of catalog records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Message,
    Module,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Message => write!(f, "message"),
            RecordKind::Module => write!(f, "module"),
        }
    }
}

/// Classification of a message, derived from its text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Ordinary log message
    #[default]
    Msg,
    /// Flow step message (text starts with `flow.`)
    Flow,
}

/// Identity of a message: equal keys are the same message wherever declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageKey {
    pub text: String,
    pub arg_types: Vec<String>,
}

/// A named placeholder attached to a message
///
/// Compile-time arguments describe the character span `[begin:end]` of the
/// substituted text; runtime arguments (`end <= 0`) refer to argument `begin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedArg {
    pub name: String,
    pub begin: i64,
    pub end: i64,
}

impl NamedArg {
    pub fn new(name: impl Into<String>, begin: i64, end: i64) -> Self {
        Self {
            name: name.into(),
            begin,
            end,
        }
    }

    /// True if this argument refers to a runtime argument index
    pub fn is_runtime(&self) -> bool {
        self.end <= 0
    }
}

/// A log message declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Format text with `{}` / `{:spec}` placeholders
    pub text: String,
    /// Argument type tags, e.g. `encode_32<int>`
    pub arg_types: Vec<String>,
    /// Catalog ID, `None` until assigned
    pub id: Option<u32>,
    /// Suffix on the declared ID literal (`u` for unsigned)
    pub id_suffix: String,
    /// Named placeholders
    pub named_args: Vec<NamedArg>,
    /// The declaration carries an `sc::named_args<...>` parameter
    pub named_args_declared: bool,
}

impl Message {
    /// Create an unassigned message without named arguments
    pub fn new(text: impl Into<String>, arg_types: Vec<String>) -> Self {
        Self {
            text: text.into(),
            arg_types,
            id: None,
            id_suffix: String::new(),
            named_args: Vec::new(),
            named_args_declared: true,
        }
    }

    /// Builder method: set the ID
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn kind(&self) -> MessageKind {
        if self.text.starts_with("flow.") {
            MessageKind::Flow
        } else {
            MessageKind::Msg
        }
    }

    pub fn key(&self) -> MessageKey {
        MessageKey {
            text: self.text.clone(),
            arg_types: self.arg_types.clone(),
        }
    }

    pub fn arg_count(&self) -> usize {
        self.arg_types.len()
    }
}

/// A module (subsystem label) declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub text: String,
    pub id: Option<u32>,
    pub id_suffix: String,
}

impl Module {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            id: None,
            id_suffix: String::new(),
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }
}

/// A declaration paired with the ID the allocator resolved for it
///
/// The record itself is kept exactly as declared so that generated source can
/// still name the symbol the firmware referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assigned<T> {
    pub record: T,
    pub id: u32,
}

impl Assigned<Message> {
    /// The message as it appears in a finalized catalog
    pub fn resolved(&self) -> Message {
        self.record.clone().with_id(self.id)
    }
}

impl Assigned<Module> {
    pub fn resolved(&self) -> Module {
        self.record.clone().with_id(self.id)
    }
}

/// Log severity levels carried in the 3-bit header field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Max = 0,
    Fatal = 1,
    Error = 2,
    Warn = 3,
    Info = 4,
    User1 = 5,
    User2 = 6,
    Trace = 7,
}

impl Severity {
    /// Map the low three bits of `bits` to a severity
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x7 {
            0 => Severity::Max,
            1 => Severity::Fatal,
            2 => Severity::Error,
            3 => Severity::Warn,
            4 => Severity::Info,
            5 => Severity::User1,
            6 => Severity::User2,
            _ => Severity::Trace,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Max => "MAX",
            Severity::Fatal => "FATAL",
            Severity::Error => "ERROR",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
            Severity::User1 => "USER1",
            Severity::User2 => "USER2",
            Severity::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_message_type() {
        let m = Message::new("flow.step", vec![]);
        assert_eq!(m.kind(), MessageKind::Flow);
    }

    #[test]
    fn test_msg_message_type() {
        let m = Message::new("step", vec![]);
        assert_eq!(m.kind(), MessageKind::Msg);
    }

    #[test]
    fn test_message_key_ignores_id_and_named_args() {
        let a = Message::new("abc {}", vec!["encode_32<int>".into()]).with_id(3);
        let mut b = Message::new("abc {}", vec!["encode_32<int>".into()]);
        b.named_args.push(NamedArg::new("x", 0, 0));
        assert_eq!(a.key(), b.key());

        let c = Message::new("abc {}", vec!["encode_u32<unsigned int>".into()]);
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_severity_bits() {
        assert_eq!(Severity::from_bits(7), Severity::Trace);
        assert_eq!(Severity::from_bits(0), Severity::Max);
        assert_eq!(format!("{}", Severity::from_bits(3)), "WARN");
    }
}
