//! Runtime argument decoding

use crate::catalog::EnumTables;
use crate::encoding::{Encoding, Scalar};
use crate::format_string::{float_repr, FormatArg, FormatSpec};
use crate::types::{CatalogError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::{ErrorKind, Read};

/// A decoded runtime argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Enum {
        type_name: String,
        value: i128,
        symbol: Option<String>,
    },
}

fn read_scalar<R: Read>(reader: &mut R, scalar: Scalar) -> std::io::Result<ArgValue> {
    Ok(match scalar {
        Scalar::I32 => ArgValue::Signed(reader.read_i32::<LittleEndian>()?.into()),
        Scalar::U32 => ArgValue::Unsigned(reader.read_u32::<LittleEndian>()?.into()),
        Scalar::I64 => ArgValue::Signed(reader.read_i64::<LittleEndian>()?),
        Scalar::U64 => ArgValue::Unsigned(reader.read_u64::<LittleEndian>()?),
        Scalar::F32 => ArgValue::Float(reader.read_f32::<LittleEndian>()?.into()),
        Scalar::F64 => ArgValue::Float(reader.read_f64::<LittleEndian>()?),
    })
}

/// Read one argument encoded as `encoding`
pub fn read_arg<R: Read>(reader: &mut R, encoding: &Encoding, enums: &EnumTables) -> Result<ArgValue> {
    let raw = read_scalar(reader, encoding.repr()).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => CatalogError::Truncated("message arguments"),
        _ => CatalogError::IoError(e),
    })?;

    let Some(type_name) = encoding.enum_name() else {
        return Ok(raw);
    };

    let value = match raw {
        ArgValue::Signed(v) => i128::from(v),
        ArgValue::Unsigned(v) => i128::from(v),
        // enum representations are always integral
        ArgValue::Float(_) | ArgValue::Enum { .. } => return Ok(raw),
    };
    let symbol = i64::try_from(value)
        .ok()
        .and_then(|v| enums.lookup(type_name, v))
        .map(str::to_string);

    Ok(ArgValue::Enum {
        type_name: type_name.to_string(),
        value,
        symbol,
    })
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Signed(v) => write!(f, "{}", v),
            ArgValue::Unsigned(v) => write!(f, "{}", v),
            ArgValue::Float(v) => f.write_str(&float_repr(*v)),
            ArgValue::Enum {
                symbol: Some(symbol),
                ..
            } => f.write_str(symbol),
            ArgValue::Enum {
                type_name, value, ..
            } => write!(f, "static_cast<{}>({})", type_name, value),
        }
    }
}

impl FormatArg for ArgValue {
    fn format_with(&self, spec: Option<&FormatSpec>) -> Result<String> {
        let Some(spec) = spec else {
            return Ok(self.to_string());
        };
        match self {
            ArgValue::Signed(v) => spec.format_int((*v).into()),
            ArgValue::Unsigned(v) => spec.format_int((*v).into()),
            ArgValue::Float(v) => spec.format_float(*v),
            ArgValue::Enum { value, .. } if spec.is_numeric() => spec.format_int(*value),
            ArgValue::Enum { .. } => spec.format_str(&self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EnumTable;
    use std::io::Cursor;

    fn read(bytes: &[u8], tag: &str, enums: &EnumTables) -> Result<ArgValue> {
        let encoding = Encoding::parse(tag).unwrap();
        read_arg(&mut Cursor::new(bytes), &encoding, enums)
    }

    #[test]
    fn test_integer_args() {
        let none = EnumTables::new();
        assert_eq!(read(&[0xff; 4], "encode_32<int>", &none).unwrap(), ArgValue::Signed(-1));
        assert_eq!(
            read(&[0xff; 4], "encode_u32<unsigned int>", &none).unwrap(),
            ArgValue::Unsigned(u32::MAX as u64)
        );
        assert_eq!(
            read(&2i64.to_le_bytes(), "encode_64<long>", &none).unwrap(),
            ArgValue::Signed(2)
        );
    }

    #[test]
    fn test_float_args() {
        let none = EnumTables::new();
        let f = read(&3.14f32.to_le_bytes(), "encode_u32<float>", &none).unwrap();
        assert_eq!(f.to_string(), "3.140000104904175");
        let d = read(&3.14f64.to_le_bytes(), "encode_u64<double>", &none).unwrap();
        assert_eq!(d.to_string(), "3.14");
    }

    #[test]
    fn test_enum_args() {
        let mut enums = EnumTables::new();
        enums.insert("ns::E1", EnumTable::from([(19, "VAL_E1".to_string())]));

        let known = read(&19i32.to_le_bytes(), "encode_enum<ns::E1, int>", &enums).unwrap();
        assert_eq!(known.to_string(), "VAL_E1");

        let unknown = read(&17i32.to_le_bytes(), "encode_enum<some_ns::E, int>", &enums).unwrap();
        assert_eq!(unknown.to_string(), "static_cast<some_ns::E>(17)");

        let unscoped = read(&23u32.to_le_bytes(), "encode_32<ns::E2>", &enums).unwrap();
        assert_eq!(unscoped.to_string(), "static_cast<ns::E2>(23)");

        let all_ones = read(&[0xff; 4], "encode_32<E>", &enums).unwrap();
        assert_eq!(all_ones.to_string(), "static_cast<E>(4294967295)");
        let wide = read(&[0xff; 8], "encode_64<E>", &enums).unwrap();
        assert_eq!(wide.to_string(), "static_cast<E>(18446744073709551615)");
    }

    #[test]
    fn test_truncated_arg() {
        let result = read(&[1, 2], "encode_32<int>", &EnumTables::new());
        assert!(matches!(result, Err(CatalogError::Truncated(_))));
    }

    #[test]
    fn test_format_with_spec() {
        let spec = FormatSpec::parse("08x").unwrap();
        assert_eq!(ArgValue::Signed(17).format_with(Some(&spec)).unwrap(), "00000011");

        let value = ArgValue::Enum {
            type_name: "E".into(),
            value: 5,
            symbol: Some("FIVE".into()),
        };
        assert_eq!(value.format_with(Some(&FormatSpec::parse("d").unwrap())).unwrap(), "5");
        assert_eq!(value.format_with(Some(&FormatSpec::parse(">6").unwrap())).unwrap(), "  FIVE");
    }
}
