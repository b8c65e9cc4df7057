//! Angle-bracket aware scanning of demangled C++ type expressions
//!
//! Template argument lists nest (`array<array<char, 3>, 3>`), so a flat split on
//! commas is wrong. Everything here tracks bracket depth explicitly.

/// Split `text` on commas that are not nested inside angle brackets
///
/// Pieces are trimmed; an empty or all-whitespace input yields no pieces.
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                pieces.push(text[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }

    let last = text[start..].trim();
    if !last.is_empty() || !pieces.is_empty() {
        pieces.push(last);
    }
    pieces
}

/// Index of the `>` closing the `<` at `open`, if the brackets balance
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth: i32 = 0;
    for (idx, ch) in text[open..].char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// If `text` is exactly `name<...>` (optionally namespace qualified), return the
/// bracketed argument text
///
/// `template_args("sc::args<int, long>", "args")` yields `Some("int, long")`.
pub fn template_args<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let text = text.trim();
    let open = text.find('<')?;
    let head = text[..open].trim_end();

    let qualified = head == name
        || head
            .strip_suffix(name)
            .is_some_and(|prefix| prefix.ends_with("::"));
    if !qualified {
        return None;
    }

    let close = matching_close(text, open)?;
    if close != text.len() - 1 {
        return None;
    }
    Some(&text[open + 1..close])
}

/// One decoded character literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharLiteral {
    /// A non-negative value, taken as a code point
    CodePoint(char),
    /// A negative value: a signed `char` holding one byte of a UTF-8 sequence
    Byte(u8),
}

/// Decode one character literal as printed by a demangler
///
/// Accepts `(char)97`, `static_cast<char>(97)` and bare `97`.
pub fn char_literal(text: &str) -> Option<CharLiteral> {
    let text = text.trim();
    let digits = if let Some(rest) = text.strip_prefix("(char)") {
        rest
    } else if let Some(rest) = text.strip_prefix("static_cast<char>") {
        rest.strip_prefix('(')?.strip_suffix(')')?
    } else {
        text
    };

    let value: i64 = digits.trim().parse().ok()?;
    match value {
        -128..=-1 => Some(CharLiteral::Byte((value + 256) as u8)),
        _ => char::from_u32(u32::try_from(value).ok()?).map(CharLiteral::CodePoint),
    }
}

/// Assemble decoded literals into text
///
/// Runs of [`CharLiteral::Byte`] must form valid UTF-8.
pub fn decode_chars(literals: impl IntoIterator<Item = CharLiteral>) -> Result<String, String> {
    fn flush(text: &mut String, pending: &mut Vec<u8>) -> Result<(), String> {
        if !pending.is_empty() {
            let run = std::str::from_utf8(pending).map_err(|e| format!("string is not UTF-8: {}", e))?;
            text.push_str(run);
            pending.clear();
        }
        Ok(())
    }

    let mut text = String::new();
    let mut pending = Vec::new();
    for literal in literals {
        match literal {
            CharLiteral::Byte(byte) => pending.push(byte),
            CharLiteral::CodePoint(c) => {
                flush(&mut text, &mut pending)?;
                text.push(c);
            }
        }
    }
    flush(&mut text, &mut pending)?;
    Ok(text)
}

/// Parse a numeric ID literal such as `-1`, `42` or `42u`
///
/// Returns the ID (`None` for the `-1` sentinel) and the literal suffix.
pub fn id_literal(text: &str) -> Option<(Option<u32>, String)> {
    let text = text.trim();
    if text == "-1" {
        return Some((None, String::new()));
    }

    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, suffix) = text.split_at(split);
    if digits.is_empty() || !suffix.chars().all(|c| matches!(c, 'u' | 'U' | 'l' | 'L')) {
        return None;
    }

    let id = digits.parse().ok()?;
    Some((Some(id), suffix.to_string()))
}
