//! Argument encodings
//!
//! Each runtime argument of a catalog message is declared with a type tag such
//! as `encode_32<int>`, `encode_u64<unsigned long>` or `encode_enum<ns::E, int>`.
//! The tag decides how many bytes the argument occupies on the wire and how
//! those bytes are interpreted.

use crate::symbols::scanner::{split_top_level, template_args};
use crate::types::{CatalogError, Result};
use std::str::FromStr;

/// Fixed-width numeric representation of an argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl Scalar {
    /// Width on the wire in bytes
    pub fn width(self) -> usize {
        match self {
            Scalar::I32 | Scalar::U32 | Scalar::F32 => 4,
            Scalar::I64 | Scalar::U64 | Scalar::F64 => 8,
        }
    }

    /// printf conversion used in XML collateral for a plain `{}`
    pub fn printf_spec(self) -> &'static str {
        match self {
            Scalar::I32 => "%d",
            Scalar::U32 => "%u",
            Scalar::I64 => "%lld",
            Scalar::U64 => "%llu",
            Scalar::F32 | Scalar::F64 => "%f",
        }
    }

    fn integer(signed: bool, bits: u32) -> Self {
        match (signed, bits) {
            (true, 64) => Scalar::I64,
            (false, 64) => Scalar::U64,
            (true, _) => Scalar::I32,
            (false, _) => Scalar::U32,
        }
    }
}

/// Decoded meaning of an argument type tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    Scalar(Scalar),
    /// Enumeration carried as its underlying integer
    Enum { name: String, repr: Scalar },
}

impl Encoding {
    /// Parse an argument type tag
    pub fn parse(tag: &str) -> Result<Self> {
        let invalid = || CatalogError::InvalidArgType(tag.to_string());

        if let Some(inner) = template_args(tag, "encode_enum") {
            let parts = split_top_level(inner);
            let [name, underlying] = parts.as_slice() else {
                return Err(invalid());
            };
            let (signed, bits) = integer_type(underlying).ok_or_else(invalid)?;
            return Ok(Encoding::Enum {
                name: name.to_string(),
                repr: Scalar::integer(signed, bits),
            });
        }

        const TAGS: [(&str, bool, u32); 4] = [
            ("encode_32", true, 32),
            ("encode_u32", false, 32),
            ("encode_64", true, 64),
            ("encode_u64", false, 64),
        ];

        for (name, signed, bits) in TAGS {
            let Some(inner) = template_args(tag, name) else {
                continue;
            };
            let inner = inner.trim();
            let repr = Scalar::integer(signed, bits);

            return Ok(match (inner, bits) {
                ("float", 32) => Encoding::Scalar(Scalar::F32),
                ("double", 64) => Encoding::Scalar(Scalar::F64),
                ("float", _) | ("double", _) | ("", _) => return Err(invalid()),
                _ if integer_type(inner).is_some() => Encoding::Scalar(repr),
                // unscoped enums are packed as their underlying integer, read unsigned
                _ => Encoding::Enum {
                    name: inner.to_string(),
                    repr: Scalar::integer(false, bits),
                },
            });
        }

        // catalogs written by hand may name the C++ type directly
        match tag.trim() {
            "float" => Ok(Encoding::Scalar(Scalar::F32)),
            "double" => Ok(Encoding::Scalar(Scalar::F64)),
            bare => integer_type(bare)
                .map(|(signed, bits)| Encoding::Scalar(Scalar::integer(signed, bits)))
                .ok_or_else(invalid),
        }
    }

    pub fn repr(&self) -> Scalar {
        match self {
            Encoding::Scalar(scalar) => *scalar,
            Encoding::Enum { repr, .. } => *repr,
        }
    }

    /// Width on the wire in bytes
    pub fn width(&self) -> usize {
        self.repr().width()
    }

    pub fn enum_name(&self) -> Option<&str> {
        match self {
            Encoding::Enum { name, .. } => Some(name),
            Encoding::Scalar(_) => None,
        }
    }

    pub fn printf_spec(&self) -> &'static str {
        match self {
            Encoding::Scalar(scalar) => scalar.printf_spec(),
            Encoding::Enum { .. } => "%d",
        }
    }
}

impl FromStr for Encoding {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        Encoding::parse(s)
    }
}

/// Signedness and packed width of a C++ integer type name
fn integer_type(name: &str) -> Option<(bool, u32)> {
    let name = name.trim().trim_start_matches("std::");
    let info = match name {
        "char" | "signed char" | "short" | "short int" | "signed short" | "int" | "signed"
        | "signed int" | "int8_t" | "int16_t" | "int32_t" => (true, 32),
        "long" | "long int" | "signed long" | "long long" | "long long int" | "signed long long"
        | "int64_t" | "intptr_t" | "ptrdiff_t" => (true, 64),
        "bool" | "unsigned char" | "char8_t" | "char16_t" | "char32_t" | "unsigned short"
        | "unsigned short int" | "unsigned" | "unsigned int" | "uint8_t" | "uint16_t"
        | "uint32_t" => (false, 32),
        "unsigned long" | "unsigned long int" | "unsigned long long" | "unsigned long long int"
        | "uint64_t" | "uintptr_t" | "size_t" => (false, 64),
        _ => return None,
    };
    Some(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_tags() {
        assert_eq!(Encoding::parse("encode_32<int>").unwrap(), Encoding::Scalar(Scalar::I32));
        assert_eq!(
            Encoding::parse("encode_u32<unsigned int>").unwrap(),
            Encoding::Scalar(Scalar::U32)
        );
        assert_eq!(Encoding::parse("encode_64<long>").unwrap(), Encoding::Scalar(Scalar::I64));
        assert_eq!(
            Encoding::parse("encode_u64<unsigned long long>").unwrap(),
            Encoding::Scalar(Scalar::U64)
        );
        assert_eq!(Encoding::parse("encode_u32<float>").unwrap(), Encoding::Scalar(Scalar::F32));
        assert_eq!(Encoding::parse("encode_u64<double>").unwrap(), Encoding::Scalar(Scalar::F64));
    }

    #[test]
    fn test_enum_tags() {
        let scoped = Encoding::parse("encode_enum<some_ns::E, int>").unwrap();
        assert_eq!(scoped.enum_name(), Some("some_ns::E"));
        assert_eq!(scoped.width(), 4);

        let wide = Encoding::parse("encode_enum<E, unsigned long>").unwrap();
        assert_eq!(wide.repr(), Scalar::U64);
        assert_eq!(wide.width(), 8);

        let unscoped = Encoding::parse("encode_32<ns::E2>").unwrap();
        assert_eq!(
            unscoped,
            Encoding::Enum {
                name: "ns::E2".into(),
                repr: Scalar::U32
            }
        );
        assert_eq!(Encoding::parse("encode_64<E3>").unwrap().repr(), Scalar::U64);
    }

    #[test]
    fn test_invalid_tags() {
        assert!(Encoding::parse("ns::E").is_err());
        assert!(Encoding::parse("encode_32<double>").is_err());
        assert!(Encoding::parse("encode_enum<E>").is_err());
        assert!(Encoding::parse("encode_enum<E, float>").is_err());
        assert!("encode_128<int>".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_bare_type_names() {
        assert_eq!(Encoding::parse("int").unwrap(), Encoding::Scalar(Scalar::I32));
        assert_eq!(Encoding::parse("unsigned long").unwrap(), Encoding::Scalar(Scalar::U64));
        assert_eq!(Encoding::parse("double").unwrap(), Encoding::Scalar(Scalar::F64));
    }

    #[test]
    fn test_printf_specs() {
        assert_eq!(Encoding::parse("encode_32<int>").unwrap().printf_spec(), "%d");
        assert_eq!(Encoding::parse("encode_u64<unsigned long>").unwrap().printf_spec(), "%llu");
        assert_eq!(Encoding::parse("encode_u32<float>").unwrap().printf_spec(), "%f");
        assert_eq!(Encoding::parse("encode_enum<E, int>").unwrap().printf_spec(), "%d");
    }
}
