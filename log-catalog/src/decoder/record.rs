//! Wire record framing
//!
//! Every record starts with a byte whose low nibble is the record type. All
//! multi-byte fields are little-endian.
//!
//! | type | record   | layout                                              |
//! |------|----------|-----------------------------------------------------|
//! | 1    | Short32  | `u32`: type:4, id:28                                |
//! | 3    | Catalog  | `u32` header, `u32` message id, arguments           |
//! | 7    | Short64  | `u64`: type:4, id:60                                |

use crate::types::{CatalogError, Result, Severity};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{ErrorKind, Read};

/// The record types carried in the low 4 bits of the first byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Short32 = 1,
    Catalog = 3,
    Short64 = 7,
}

impl RecordType {
    pub fn from_nibble(nibble: u8) -> Result<Self> {
        match nibble & 0xF {
            1 => Ok(RecordType::Short32),
            3 => Ok(RecordType::Catalog),
            7 => Ok(RecordType::Short64),
            other => Err(CatalogError::UnknownRecordType(other)),
        }
    }
}

/// The only catalog subtype carrying a message ID and arguments
pub const CATALOG_SUBTYPE_ID32: u8 = 1;

/// Bit-packed header of a Catalog record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogHeader {
    pub severity: Severity,
    pub opt_loc: bool,
    pub opt_len: bool,
    pub opt_chk: bool,
    pub opt_ts: bool,
    pub unit: u8,
    pub module: u8,
    pub opt_guid: bool,
    pub subtype: u8,
}

impl CatalogHeader {
    /// A plain header with all optional fields off
    pub fn new(severity: Severity, module: u8) -> Self {
        Self {
            severity,
            opt_loc: false,
            opt_len: false,
            opt_chk: false,
            opt_ts: false,
            unit: 0,
            module: module & 0x7F,
            opt_guid: false,
            subtype: CATALOG_SUBTYPE_ID32,
        }
    }

    pub fn from_word(word: u32) -> Self {
        let bit = |n: u32| (word >> n) & 1 == 1;
        Self {
            severity: Severity::from_bits((word >> 4) as u8),
            opt_loc: bit(8),
            opt_len: bit(9),
            opt_chk: bit(10),
            opt_ts: bit(11),
            unit: ((word >> 12) & 0xF) as u8,
            module: ((word >> 16) & 0x7F) as u8,
            opt_guid: bit(23),
            subtype: ((word >> 24) & 0x3F) as u8,
        }
    }

    /// Pack into a header word, including the Catalog type nibble
    pub fn to_word(&self) -> u32 {
        RecordType::Catalog as u32
            | (self.severity as u32) << 4
            | u32::from(self.opt_loc) << 8
            | u32::from(self.opt_len) << 9
            | u32::from(self.opt_chk) << 10
            | u32::from(self.opt_ts) << 11
            | u32::from(self.unit & 0xF) << 12
            | u32::from(self.module & 0x7F) << 16
            | u32::from(self.opt_guid) << 23
            | u32::from(self.subtype & 0x3F) << 24
    }
}

/// One record's fixed-size part; Catalog arguments follow in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireRecord {
    Short32 { id: u32 },
    Short64 { id: u64 },
    Catalog { header: CatalogHeader, id: u32 },
}

fn truncated(what: &'static str) -> impl Fn(std::io::Error) -> CatalogError {
    move |e| match e.kind() {
        ErrorKind::UnexpectedEof => CatalogError::Truncated(what),
        _ => CatalogError::IoError(e),
    }
}

impl WireRecord {
    /// Read the next record's fixed-size part
    ///
    /// Returns `Ok(None)` when the stream ends cleanly at a record boundary.
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let first = match reader.read_u8() {
            Ok(byte) => byte,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = match RecordType::from_nibble(first)? {
            RecordType::Short32 => {
                let mut buf = [first, 0, 0, 0];
                reader.read_exact(&mut buf[1..]).map_err(truncated("short32 record"))?;
                WireRecord::Short32 {
                    id: LittleEndian::read_u32(&buf) >> 4,
                }
            }
            RecordType::Short64 => {
                let mut buf = [first, 0, 0, 0, 0, 0, 0, 0];
                reader.read_exact(&mut buf[1..]).map_err(truncated("short64 record"))?;
                WireRecord::Short64 {
                    id: LittleEndian::read_u64(&buf) >> 4,
                }
            }
            RecordType::Catalog => {
                let mut buf = [first, 0, 0, 0];
                reader.read_exact(&mut buf[1..]).map_err(truncated("catalog header"))?;
                let header = CatalogHeader::from_word(LittleEndian::read_u32(&buf));
                if header.subtype != CATALOG_SUBTYPE_ID32 {
                    return Err(CatalogError::UnsupportedSubtype(header.subtype));
                }
                let id = reader
                    .read_u32::<LittleEndian>()
                    .map_err(truncated("catalog message id"))?;
                WireRecord::Catalog { header, id }
            }
        };

        log::trace!("Read {:?}", record);
        Ok(Some(record))
    }

    pub fn id(&self) -> u64 {
        match self {
            WireRecord::Short32 { id } | WireRecord::Catalog { id, .. } => u64::from(*id),
            WireRecord::Short64 { id } => *id,
        }
    }

    /// Encode the fixed-size part, as a firmware would emit it
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            WireRecord::Short32 { id } => ((id << 4) | RecordType::Short32 as u32).to_le_bytes().to_vec(),
            WireRecord::Short64 { id } => ((id << 4) | RecordType::Short64 as u64).to_le_bytes().to_vec(),
            WireRecord::Catalog { header, id } => {
                let mut out = header.to_word().to_le_bytes().to_vec();
                out.extend_from_slice(&id.to_le_bytes());
                out
            }
        }
    }
}
