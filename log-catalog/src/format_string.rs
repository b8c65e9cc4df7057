//! Message format strings
//!
//! Catalog text uses `{}` and `{:spec}` placeholders with `{{` / `}}` as literal
//! braces. The conversion spec follows the familiar format mini-language:
//!
//! ```text
//! [[fill]align][sign][#][0][width][grouping][.precision][type]
//! ```
//!
//! The same grammar drives decoding (substituting decoded arguments) and the
//! printf rendering written into XML collateral.

use crate::types::{CatalogError, Result};

/// A piece of a parsed format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// A placeholder with its optional conversion spec
    Placeholder(Option<String>),
}

/// Split a format string into literals and placeholders
///
/// Field names before `:` are ignored; placeholders are always positional.
/// Unmatched braces are kept as literal text.
pub fn parse(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find(['{', '}']) {
        literal.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            literal.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            literal.push('}');
            rest = &tail[1..];
            continue;
        }

        match tail[1..].find(['{', '}']) {
            Some(close) if tail.as_bytes()[1 + close] == b'}' => {
                let field = &tail[1..1 + close];
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                let spec = field.split_once(':').map(|(_, spec)| spec.to_string());
                segments.push(Segment::Placeholder(spec));
                rest = &tail[close + 2..];
            }
            _ => {
                literal.push('{');
                rest = &tail[1..];
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// A value that can be substituted into a placeholder
pub trait FormatArg {
    fn format_with(&self, spec: Option<&FormatSpec>) -> Result<String>;
}

/// Substitute `args` into the placeholders of `text`, in order
pub fn render<A: FormatArg>(text: &str, args: &[A]) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut args_iter = args.iter();

    for segment in parse(text) {
        match segment {
            Segment::Literal(literal) => out.push_str(&literal),
            Segment::Placeholder(spec) => {
                let arg = args_iter.next().ok_or_else(|| CatalogError::MissingArgument {
                    text: text.to_string(),
                    available: args.len(),
                })?;
                let spec = spec.as_deref().map(FormatSpec::parse).transpose()?;
                out.push_str(&arg.format_with(spec.as_ref())?);
            }
        }
    }

    Ok(out)
}

/// Convert format text to printf syntax
///
/// `specs[i]` is the conversion for argument `i` when its placeholder is a
/// plain `{}`; explicit `{:spec}` placeholders become `%spec` verbatim.
pub fn to_printf(text: &str, specs: &[&str]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut next_arg = 0;

    for segment in parse(text) {
        match segment {
            Segment::Literal(literal) => out.push_str(&literal.replace('%', "%%")),
            Segment::Placeholder(Some(spec)) => {
                out.push('%');
                out.push_str(&spec);
                next_arg += 1;
            }
            Segment::Placeholder(None) => {
                out.push_str(specs.get(next_arg).copied().unwrap_or("%d"));
                next_arg += 1;
            }
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
    /// Padding between sign/prefix and digits
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    #[default]
    Minus,
    Plus,
    Space,
}

/// A parsed conversion spec
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatSpec {
    pub fill: Option<char>,
    pub align: Option<Align>,
    pub sign: Sign,
    pub alternate: bool,
    pub zero: bool,
    pub width: usize,
    pub grouping: Option<char>,
    pub precision: Option<usize>,
    pub ty: Option<char>,
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::AfterSign),
        _ => None,
    }
}

impl FormatSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || CatalogError::InvalidFormatSpec(spec.to_string());
        let chars: Vec<char> = spec.chars().collect();
        let mut out = FormatSpec::default();
        let mut i = 0;

        if let Some(align) = chars.get(1).copied().and_then(align_of) {
            out.fill = Some(chars[0]);
            out.align = Some(align);
            i = 2;
        } else if let Some(align) = chars.first().copied().and_then(align_of) {
            out.align = Some(align);
            i = 1;
        }

        let sign = match chars.get(i) {
            Some('+') => Some(Sign::Plus),
            Some('-') => Some(Sign::Minus),
            Some(' ') => Some(Sign::Space),
            _ => None,
        };
        if let Some(sign) = sign {
            out.sign = sign;
            i += 1;
        }

        if chars.get(i) == Some(&'#') {
            out.alternate = true;
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            out.zero = true;
            i += 1;
        }

        let digits_end = digits_from(&chars, i);
        if digits_end > i {
            out.width = collect(&chars[i..digits_end]).parse().map_err(|_| invalid())?;
            i = digits_end;
        }

        if let Some(&g @ (',' | '_')) = chars.get(i) {
            out.grouping = Some(g);
            i += 1;
        }

        if chars.get(i) == Some(&'.') {
            let end = digits_from(&chars, i + 1);
            if end == i + 1 {
                return Err(invalid());
            }
            out.precision = Some(collect(&chars[i + 1..end]).parse().map_err(|_| invalid())?);
            i = end;
        }

        match &chars[i..] {
            [] => {}
            [ty] if "bcdeEfFgGnosxX%".contains(*ty) => out.ty = Some(*ty),
            _ => return Err(invalid()),
        }

        Ok(out)
    }

    /// True if the spec asks for a numeric presentation
    pub fn is_numeric(&self) -> bool {
        matches!(self.ty, Some(ty) if ty != 's')
    }

    fn invalid(&self, what: &str) -> CatalogError {
        CatalogError::InvalidFormatSpec(format!("{:?} for {}", self, what))
    }

    pub fn format_int(&self, value: i128) -> Result<String> {
        let magnitude = value.unsigned_abs();
        if self.precision.is_some() && !matches!(self.ty, Some('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%')) {
            return Err(self.invalid("integer"));
        }

        let (prefix, body) = match self.ty {
            None | Some('d') | Some('n') => ("", self.group(magnitude.to_string(), 3)),
            Some('x') => ("0x", self.group(format!("{:x}", magnitude), 4)),
            Some('X') => ("0X", self.group(format!("{:X}", magnitude), 4)),
            Some('o') => ("0o", self.group(format!("{:o}", magnitude), 4)),
            Some('b') => ("0b", self.group(format!("{:b}", magnitude), 4)),
            Some('c') => {
                let c = u32::try_from(value)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.invalid("character"))?;
                return Ok(self.pad("", "", &c.to_string(), false));
            }
            Some('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') => return self.format_float(value as f64),
            _ => return Err(self.invalid("integer")),
        };

        let prefix = if self.alternate { prefix } else { "" };
        Ok(self.pad(self.sign_str(value < 0), prefix, &body, true))
    }

    pub fn format_float(&self, value: f64) -> Result<String> {
        let negative = value.is_sign_negative() && !value.is_nan();
        let magnitude = value.abs();
        let upper = matches!(self.ty, Some('E' | 'F' | 'G'));

        let body = if !magnitude.is_finite() {
            (if magnitude.is_nan() { "nan" } else { "inf" }).to_string()
        } else {
            match self.ty {
                None if self.precision.is_none() => float_repr(magnitude),
                None | Some('g' | 'G') => general(magnitude, self.precision.unwrap_or(6), self.alternate),
                Some('f' | 'F') => format!("{:.*}", self.precision.unwrap_or(6), magnitude),
                Some('e' | 'E') => exponential(magnitude, self.precision.unwrap_or(6)),
                Some('%') => format!("{:.*}%", self.precision.unwrap_or(6), magnitude * 100.0),
                _ => return Err(self.invalid("float")),
            }
        };

        let body = if upper { body.to_uppercase() } else { body };
        let body = match self.grouping {
            Some(_) => {
                let split = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
                let (int_part, frac) = body.split_at(split);
                format!("{}{}", self.group(int_part.to_string(), 3), frac)
            }
            None => body,
        };
        Ok(self.pad(self.sign_str(negative), "", &body, true))
    }

    pub fn format_str(&self, value: &str) -> Result<String> {
        if self.is_numeric() || self.sign != Sign::Minus || self.alternate {
            return Err(self.invalid("string"));
        }
        let truncated: String = match self.precision {
            Some(p) => value.chars().take(p).collect(),
            None => value.to_string(),
        };
        Ok(self.pad("", "", &truncated, false))
    }

    fn sign_str(&self, negative: bool) -> &'static str {
        match (negative, self.sign) {
            (true, _) => "-",
            (false, Sign::Plus) => "+",
            (false, Sign::Space) => " ",
            (false, Sign::Minus) => "",
        }
    }

    fn group(&self, digits: String, every: usize) -> String {
        let Some(sep) = self.grouping else {
            return digits;
        };
        let chars: Vec<char> = digits.chars().collect();
        let mut out = String::with_capacity(chars.len() + chars.len() / every);
        for (idx, c) in chars.iter().enumerate() {
            if idx > 0 && (chars.len() - idx) % every == 0 {
                out.push(sep);
            }
            out.push(*c);
        }
        out
    }

    fn pad(&self, sign: &str, prefix: &str, body: &str, numeric: bool) -> String {
        let len = sign.chars().count() + prefix.chars().count() + body.chars().count();
        if self.width <= len {
            return format!("{}{}{}", sign, prefix, body);
        }

        let fill = self.fill.unwrap_or(if self.zero { '0' } else { ' ' });
        let align = self.align.unwrap_or(match (numeric, self.zero) {
            (true, true) => Align::AfterSign,
            (true, false) => Align::Right,
            (false, _) => Align::Left,
        });
        let padding = self.width - len;
        let fill_n = |n: usize| fill.to_string().repeat(n);

        match align {
            Align::Left => format!("{}{}{}{}", sign, prefix, body, fill_n(padding)),
            Align::Right => format!("{}{}{}{}", fill_n(padding), sign, prefix, body),
            Align::Center => {
                let left = padding / 2;
                format!("{}{}{}{}{}", fill_n(left), sign, prefix, body, fill_n(padding - left))
            }
            Align::AfterSign => format!("{}{}{}{}", sign, prefix, fill_n(padding), body),
        }
    }
}

/// Shortest round-trip rendering of a float, always showing a fraction or exponent
///
/// `17.0`, `3.14`, `1e+16`, `1e-07`.
pub fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return (if value < 0.0 { "-inf" } else { "inf" }).to_string();
    }

    let abs = value.abs();
    let text = if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        format!("{:e}", value)
    } else {
        format!("{:?}", value)
    };
    normalize_exponent(&text)
}

fn exponential(value: f64, precision: usize) -> String {
    normalize_exponent(&format!("{:.*e}", precision, value))
}

/// Rewrite Rust's `1.5e-7` exponent style as `1.5e-07`
fn normalize_exponent(text: &str) -> String {
    match text.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => text.to_string(),
    }
}

fn general(value: f64, precision: usize, keep_zeros: bool) -> String {
    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let exp: i32 = scientific
        .split_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0);

    if value == 0.0 || (-4..precision as i32).contains(&exp) {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        let fixed = format!("{:.*}", decimals, value);
        if keep_zeros {
            fixed
        } else {
            strip_zeros(&fixed).to_string()
        }
    } else {
        let (mantissa, _) = scientific.split_once('e').unwrap_or((&scientific, ""));
        let mantissa = if keep_zeros { mantissa } else { strip_zeros(mantissa) };
        normalize_exponent(&format!("{}e{}", mantissa, exp))
    }
}

fn strip_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

fn digits_from(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while chars.get(end).is_some_and(|c| c.is_ascii_digit()) {
        end += 1;
    }
    end
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}
