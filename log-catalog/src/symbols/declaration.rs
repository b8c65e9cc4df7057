//! Parsing of individual catalog declarations
//!
//! A declaration line from a symbol table dump looks like
//!
//! ```text
//! 00001234 T unsigned int catalog<sc::message<sc::undefined<sc::args<encode_32<int>>, -1,
//!     sc::string<(char)118, (char)58, (char)32, (char)123, (char)125>, sc::named_args<>>>>()
//! ```
//!
//! (wrapped here for readability). Module declarations use `module<...>` with an
//! `sc::module_string<sc::undefined<void, ID, sc::string<...>>>` payload.

use super::scanner::{char_literal, decode_chars, id_literal, matching_close, split_top_level, template_args};
use crate::types::{Message, Module, NamedArg};

/// One parsed declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Message(Message),
    Module(Module),
}

/// Which accessor a declaration line names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accessor {
    Catalog,
    Module,
}

/// Recognize a declaration line and parse it
///
/// Returns `None` for lines that are not catalog declarations at all, and
/// `Some(Err(reason))` for lines that look like one but are malformed.
pub fn parse_line(line: &str) -> Option<std::result::Result<Declaration, String>> {
    let (accessor, type_expr) = outer_shape(line)?;
    Some(match accessor {
        Accessor::Catalog => parse_message(type_expr).map(Declaration::Message),
        Accessor::Module => parse_module(type_expr).map(Declaration::Module),
    })
}

/// Locate `unsigned (int|long) (catalog|module)<TYPE>()` at the end of a line
fn outer_shape(line: &str) -> Option<(Accessor, &str)> {
    let line = line.trim_end();
    let body = line.strip_suffix("()")?;

    const MARKERS: [(&str, Accessor); 4] = [
        ("unsigned int catalog<", Accessor::Catalog),
        ("unsigned long catalog<", Accessor::Catalog),
        ("unsigned int module<", Accessor::Module),
        ("unsigned long module<", Accessor::Module),
    ];

    let (start, marker, accessor) = MARKERS
        .iter()
        .filter_map(|(marker, accessor)| line.find(marker).map(|pos| (pos, *marker, *accessor)))
        .min_by_key(|(pos, _, _)| *pos)?;

    let open = start + marker.len() - 1;
    if !body.ends_with('>') || open >= body.len() {
        return None;
    }
    Some((accessor, &body[open + 1..body.len() - 1]))
}

/// Parse the `TYPE` of `catalog<TYPE>()`
fn parse_message(type_expr: &str) -> std::result::Result<Message, String> {
    check_balanced(type_expr)?;
    let message = template_args(type_expr, "message").ok_or("expected sc::message<...>")?;
    let undefined = template_args(message, "undefined").ok_or("expected sc::undefined<...>")?;

    let parts = split_top_level(undefined);
    if parts.len() != 3 && parts.len() != 4 {
        return Err(format!(
            "expected 3 or 4 message parameters, found {}",
            parts.len()
        ));
    }

    let args = template_args(parts[0], "args").ok_or("expected sc::args<...>")?;
    let arg_types = split_top_level(args)
        .into_iter()
        .filter(|arg| !arg.is_empty())
        .map(str::to_string)
        .collect();

    let (id, id_suffix) = id_literal(parts[1]).ok_or_else(|| format!("bad ID literal '{}'", parts[1]))?;
    let text = string_type(parts[2])?;

    let named_args = match parts.get(3) {
        Some(named) => parse_named_args(named)?,
        None => Vec::new(),
    };

    Ok(Message {
        text,
        arg_types,
        id,
        id_suffix,
        named_args,
        named_args_declared: parts.len() == 4,
    })
}

/// Parse the `TYPE` of `module<TYPE>()`
fn parse_module(type_expr: &str) -> std::result::Result<Module, String> {
    check_balanced(type_expr)?;
    let module = template_args(type_expr, "module_string").ok_or("expected sc::module_string<...>")?;
    let undefined = template_args(module, "undefined").ok_or("expected sc::undefined<...>")?;

    let parts = split_top_level(undefined);
    if parts.len() != 3 {
        return Err(format!("expected 3 module parameters, found {}", parts.len()));
    }

    let (id, id_suffix) = id_literal(parts[1]).ok_or_else(|| format!("bad ID literal '{}'", parts[1]))?;
    let text = string_type(parts[2])?;

    Ok(Module { text, id, id_suffix })
}

fn parse_named_args(text: &str) -> std::result::Result<Vec<NamedArg>, String> {
    let inner = template_args(text, "named_args").ok_or("expected sc::named_args<...>")?;

    split_top_level(inner)
        .into_iter()
        .map(|arg| {
            let fields = template_args(arg, "named_arg").ok_or("expected sc::named_arg<...>")?;
            let parts = split_top_level(fields);
            if parts.len() != 3 {
                return Err(format!("expected 3 named_arg parameters, found {}", parts.len()));
            }
            let name = string_type(parts[0])?;
            let begin = integer(parts[1])?;
            let end = integer(parts[2])?;
            Ok(NamedArg { name, begin, end })
        })
        .collect()
}

/// Decode `sc::string<(char)97, ...>` into the text it spells
fn string_type(text: &str) -> std::result::Result<String, String> {
    let chars = template_args(text, "string").ok_or("expected sc::string<...>")?;
    let literals = split_top_level(chars)
        .into_iter()
        .map(|c| char_literal(c).ok_or_else(|| format!("bad character literal '{}'", c)))
        .collect::<std::result::Result<Vec<_>, String>>()?;
    decode_chars(literals)
}

fn integer(text: &str) -> std::result::Result<i64, String> {
    let digits = text.trim().trim_end_matches(['u', 'U', 'l', 'L']);
    digits
        .parse()
        .map_err(|_| format!("bad integer literal '{}'", text.trim()))
}

fn check_balanced(text: &str) -> std::result::Result<(), String> {
    match text.find('<') {
        Some(open) if matching_close(text, open).is_none() => Err("unbalanced angle brackets".into()),
        _ => Ok(()),
    }
}
