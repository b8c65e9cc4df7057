//! C++ source patch
//!
//! The firmware references `catalog<T>()` and `module<T>()` for every message
//! and module it logs; the patch defines each of those specializations to
//! return the allocated ID. Type text is regenerated from the declaration
//! exactly as the compiler named it, so the declared ID literal is kept even
//! when it is the `-1` placeholder.

use crate::types::{Assigned, Message, Module, NamedArg};

const HEADER: &str = "#include <log_binary/catalog/catalog.hpp>\n\
#include <log_binary/catalog/arguments.hpp>\n\n";

fn string_type(text: &str) -> String {
    let chars: Vec<String> = text
        .chars()
        .map(|c| format!("static_cast<char>({})", u32::from(c)))
        .collect();
    format!("sc::string<{}>", chars.join(", "))
}

fn id_literal(id: Option<u32>, suffix: &str) -> String {
    match id {
        Some(id) => format!("{}{}", id, suffix),
        None => format!("-1{}", suffix),
    }
}

fn named_arg_type(arg: &NamedArg) -> String {
    format!(
        "sc::named_arg<{}, {}, {}>",
        string_type(&arg.name),
        arg.begin,
        arg.end
    )
}

/// Type text of a message declaration
pub fn message_type(message: &Message) -> String {
    let named = if message.named_args_declared {
        let args: Vec<String> = message.named_args.iter().map(named_arg_type).collect();
        format!(", sc::named_args<{}>", args.join(", "))
    } else {
        String::new()
    };
    format!(
        "sc::message<sc::undefined<sc::args<{}>, {}, {}{}>>",
        message.arg_types.join(", "),
        id_literal(message.id, &message.id_suffix),
        string_type(&message.text),
        named
    )
}

/// Type text of a module declaration
pub fn module_type(module: &Module) -> String {
    format!(
        "sc::module_string<sc::undefined<void, {}, {}>>",
        id_literal(module.id, &module.id_suffix),
        string_type(&module.text)
    )
}

/// Render the patch for the current build's records
pub fn to_string(messages: &[Assigned<Message>], modules: &[Assigned<Module>]) -> String {
    let mut out = String::from(HEADER);

    for assigned in messages {
        out.push_str(&format!(
            "/*\n    \"{}\"\n */\ntemplate <> auto catalog<{}>() -> string_id {{ return {}; }}\n\n",
            assigned.record.text,
            message_type(&assigned.record),
            assigned.id
        ));
    }

    for assigned in modules {
        out.push_str(&format!(
            "/*\n    \"{}\"\n */\ntemplate <> auto module<{}>() -> module_id {{ return {}; }}\n\n",
            assigned.record.text,
            module_type(&assigned.record),
            assigned.id
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC: &str =
        "sc::string<static_cast<char>(97), static_cast<char>(98), static_cast<char>(99)>";
    const DEF: &str =
        "sc::string<static_cast<char>(100), static_cast<char>(101), static_cast<char>(102)>";

    #[test]
    fn test_message_to_cpp_type() {
        let mut message = Message::new("abc", vec!["int".into()]).with_id(42);
        message.named_args.push(NamedArg::new("def", 1, 2));
        assert_eq!(
            message_type(&message),
            format!(
                "sc::message<sc::undefined<sc::args<int>, 42, {}, sc::named_args<sc::named_arg<{}, 1, 2>>>>",
                ABC, DEF
            )
        );

        message.id_suffix = "u".into();
        assert!(message_type(&message).contains("sc::args<int>, 42u, "));
    }

    #[test]
    fn test_three_parameter_declaration() {
        let mut message = Message::new("abc", vec![]);
        message.named_args_declared = false;
        assert_eq!(
            message_type(&message),
            format!("sc::message<sc::undefined<sc::args<>, -1, {}>>", ABC)
        );
    }

    #[test]
    fn test_non_ascii_text_as_code_points() {
        let module = Module::new("\u{C8}x").with_id(1);
        assert_eq!(
            module_type(&module),
            "sc::module_string<sc::undefined<void, 1, sc::string<static_cast<char>(200), static_cast<char>(120)>>>"
        );
    }

    #[test]
    fn test_module_to_cpp_type() {
        let mut module = Module::new("abc").with_id(42);
        assert_eq!(
            module_type(&module),
            format!("sc::module_string<sc::undefined<void, 42, {}>>", ABC)
        );
        module.id_suffix = "u".into();
        assert_eq!(
            module_type(&module),
            format!("sc::module_string<sc::undefined<void, 42u, {}>>", ABC)
        );
    }

    #[test]
    fn test_patch_keeps_declared_literal() {
        let messages = vec![Assigned {
            record: Message::new("abc", vec![]),
            id: 7,
        }];
        let modules = vec![Assigned {
            record: Module::new("abc"),
            id: 3,
        }];
        let patch = to_string(&messages, &modules);

        assert!(patch.starts_with("#include <log_binary/catalog/catalog.hpp>\n"));
        assert!(patch.contains(&format!(
            "/*\n    \"abc\"\n */\ntemplate <> auto catalog<sc::message<sc::undefined<sc::args<>, -1, {}, sc::named_args<>>>>() -> string_id {{ return 7; }}\n",
            ABC
        )));
        assert!(patch.contains(&format!(
            "template <> auto module<sc::module_string<sc::undefined<void, -1, {}>>>() -> module_id {{ return 3; }}\n",
            ABC
        )));
    }
}
