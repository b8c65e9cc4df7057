//! JSON catalog format
//!
//! ```json
//! {
//!     "messages": [
//!         {
//!             "msg": "value: {}",
//!             "type": "msg",
//!             "arg_types": ["encode_32<int>"],
//!             "arg_count": 1,
//!             "id": 5,
//!             "args": []
//!         }
//!     ],
//!     "modules": [{"string": "core", "id": 2}],
//!     "enums": {"ns::E": {"0": "A"}}
//! }
//! ```
//!
//! `modules`, `enums`, `type`, `arg_count` and `args` may be omitted when
//! loading. `enum_lookup` is derived from the enum tables on output and
//! ignored on input.

use super::enums::EnumTables;
use super::Catalog;
use crate::encoding::Encoding;
use crate::types::{Message, MessageKind, Module, NamedArg, Result};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    messages: Vec<MessageEntry>,
    #[serde(default)]
    modules: Vec<ModuleEntry>,
    #[serde(default)]
    enums: EnumTables,
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageEntry {
    msg: String,
    #[serde(rename = "type", default)]
    kind: MessageKind,
    arg_types: Vec<String>,
    #[serde(default)]
    arg_count: usize,
    id: u32,
    #[serde(default)]
    args: Vec<NamedArgEntry>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    enum_lookup: Vec<(usize, usize)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NamedArgEntry {
    name: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    reference: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    loc: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModuleEntry {
    string: String,
    id: u32,
}

impl NamedArgEntry {
    fn from_arg(arg: &NamedArg) -> Self {
        if arg.is_runtime() {
            Self {
                name: arg.name.clone(),
                reference: Some(arg.begin),
                loc: None,
            }
        } else {
            Self {
                name: arg.name.clone(),
                reference: None,
                loc: Some(format!("[{}:{}]", arg.begin, arg.end)),
            }
        }
    }

    fn into_arg(self) -> std::result::Result<NamedArg, serde_json::Error> {
        match (self.reference, self.loc) {
            (Some(index), _) => Ok(NamedArg::new(self.name, index, -1)),
            (None, Some(loc)) => {
                let (begin, end) = parse_loc(&loc).ok_or_else(|| {
                    serde_json::Error::custom(format!("bad named argument location '{}'", loc))
                })?;
                Ok(NamedArg::new(self.name, begin, end))
            }
            (None, None) => Err(serde_json::Error::custom(format!(
                "named argument '{}' has neither 'ref' nor 'loc'",
                self.name
            ))),
        }
    }
}

/// Parse `"[begin:end]"`
fn parse_loc(loc: &str) -> Option<(i64, i64)> {
    let inner = loc.trim().strip_prefix('[')?.strip_suffix(']')?;
    let (begin, end) = inner.split_once(':')?;
    Some((begin.trim().parse().ok()?, end.trim().parse().ok()?))
}

/// `(argument index, enum index)` for every argument of a known enum type
pub fn enum_lookup(arg_types: &[String], enums: &EnumTables) -> Vec<(usize, usize)> {
    arg_types
        .iter()
        .enumerate()
        .filter_map(|(arg, tag)| {
            let encoding = Encoding::parse(tag).ok()?;
            let index = enums.index_of(encoding.enum_name()?)?;
            Some((arg, index))
        })
        .collect()
}

/// Serialize messages and modules in the given order
///
/// Records without an ID are skipped.
pub fn to_string(messages: &[Message], modules: &[Module], enums: &EnumTables) -> Result<String> {
    let file = CatalogFile {
        messages: messages
            .iter()
            .filter_map(|message| {
                Some(MessageEntry {
                    msg: message.text.clone(),
                    kind: message.kind(),
                    arg_types: message.arg_types.clone(),
                    arg_count: message.arg_count(),
                    id: message.id?,
                    args: message.named_args.iter().map(NamedArgEntry::from_arg).collect(),
                    enum_lookup: enum_lookup(&message.arg_types, enums),
                })
            })
            .collect(),
        modules: modules
            .iter()
            .filter_map(|module| {
                Some(ModuleEntry {
                    string: module.text.clone(),
                    id: module.id?,
                })
            })
            .collect(),
        enums: enums.clone(),
    };

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    file.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Parse a catalog
pub fn from_str(text: &str) -> Result<Catalog> {
    let file: CatalogFile = serde_json::from_str(text)?;

    let messages = file
        .messages
        .into_iter()
        .map(|entry| -> Result<Message> {
            let named_args = entry
                .args
                .into_iter()
                .map(NamedArgEntry::into_arg)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let mut message = Message::new(entry.msg, entry.arg_types).with_id(entry.id);
            message.named_args = named_args;
            Ok(message)
        })
        .collect::<Result<Vec<_>>>()?;

    let modules = file
        .modules
        .into_iter()
        .map(|entry| Module::new(entry.string).with_id(entry.id))
        .collect();

    Ok(Catalog {
        messages,
        modules,
        enums: file.enums,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::enums::EnumTable;

    #[test]
    fn test_message_to_json() {
        let message = Message::new("abc {}", vec!["int".into()]).with_id(42);
        let json = to_string(&[message], &[], &EnumTables::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(
            value["messages"][0],
            serde_json::json!({
                "msg": "abc {}",
                "type": "msg",
                "arg_types": ["int"],
                "arg_count": 1,
                "id": 42,
                "args": [],
            })
        );
        assert!(json.contains("\n    \"messages\""));
    }

    #[test]
    fn test_named_args_to_json() {
        let mut message = Message::new("flow.x {}", vec!["int".into()]).with_id(1);
        message.named_args.push(NamedArg::new("def", 1, 2));
        message.named_args.push(NamedArg::new("ghi", 1, 0));

        let json = to_string(&[message], &[], &EnumTables::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["messages"][0]["type"], "flow");
        assert_eq!(
            value["messages"][0]["args"],
            serde_json::json!([{"name": "def", "loc": "[1:2]"}, {"name": "ghi", "ref": 1}])
        );
    }

    #[test]
    fn test_enum_lookup() {
        let mut enums = EnumTables::new();
        enums.insert("ns::A", EnumTable::new());
        enums.insert("ns::B", EnumTable::new());

        let arg_types = vec![
            "encode_32<int>".to_string(),
            "encode_enum<ns::B, int>".to_string(),
            "encode_32<ns::Unknown>".to_string(),
        ];
        assert_eq!(enum_lookup(&arg_types, &enums), vec![(1, 1)]);

        let message = Message::new("{} {} {}", arg_types).with_id(0);
        let json = to_string(&[message], &[], &enums).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["messages"][0]["enum_lookup"], serde_json::json!([[1, 1]]));
    }

    #[test]
    fn test_message_from_json() {
        let catalog = from_str(
            r#"{"messages": [{"msg": "abc {}", "type": "msg", "arg_types": ["int"],
                "arg_count": 1, "id": 42, "args": [{"name": "def", "loc": "[1:2]"},
                {"name": "ghi", "ref": 0}]}]}"#,
        )
        .unwrap();

        let message = &catalog.messages[0];
        assert_eq!(message.id, Some(42));
        assert_eq!(message.named_args[0], NamedArg::new("def", 1, 2));
        assert_eq!(message.named_args[1], NamedArg::new("ghi", 0, -1));
        assert!(catalog.modules.is_empty());
        assert!(catalog.enums.is_empty());
    }

    #[test]
    fn test_minimal_entries() {
        let catalog = from_str(
            r#"{"messages": [{"msg": "value: {}", "arg_types": ["int"], "id": 5}],
                "modules": [{"string": "core", "id": 2}]}"#,
        )
        .unwrap();
        assert_eq!(catalog.messages[0].arg_count(), 1);
        assert_eq!(catalog.modules[0], Module::new("core").with_id(2));
    }

    #[test]
    fn test_bad_named_arg() {
        let result = from_str(
            r#"{"messages": [{"msg": "x", "arg_types": [], "id": 1, "args": [{"name": "n", "loc": "1:2"}]}]}"#,
        );
        assert!(result.is_err());
    }
}
