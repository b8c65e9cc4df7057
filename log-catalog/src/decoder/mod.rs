//! Binary log decoding
//!
//! [`LogDecoder`] turns a captured trace into text using a JSON catalog from
//! a previous build. Decoding is lazy and forward-only: each item consumes
//! exactly one record from the underlying reader. Any error ends the stream,
//! since a reader that lost record sync cannot be trusted to resume.

pub mod args;
pub mod record;

pub use args::{read_arg, ArgValue};
pub use record::{CatalogHeader, RecordType, WireRecord, CATALOG_SUBTYPE_ID32};

use crate::catalog::{Catalog, EnumTables};
use crate::encoding::Encoding;
use crate::format_string::render;
use crate::types::{CatalogError, Message, Result, Severity};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One decoded log record
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub kind: RecordType,
    pub id: u64,
    /// Severity, module and unit are only carried by Catalog records
    pub severity: Option<Severity>,
    pub module: Option<String>,
    pub unit: Option<u8>,
    pub text: String,
}

impl fmt::Display for DecodedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.severity, &self.module) {
            (Some(severity), Some(module)) => write!(f, "{} [{}] {}", severity, module, self.text),
            _ => f.write_str(&self.text),
        }
    }
}

/// Decoder for binary logs described by one catalog
#[derive(Debug, Clone, Default)]
pub struct LogDecoder {
    messages: HashMap<u64, Message>,
    modules: HashMap<u32, String>,
    enums: EnumTables,
}

impl LogDecoder {
    pub fn new(catalog: Catalog) -> Self {
        let messages = catalog
            .messages
            .into_iter()
            .filter_map(|message| Some((u64::from(message.id?), message)))
            .collect();
        let modules = catalog
            .modules
            .into_iter()
            .filter_map(|module| Some((module.id?, module.text)))
            .collect();

        Self {
            messages,
            modules,
            enums: catalog.enums,
        }
    }

    /// Create a decoder from a JSON catalog file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        Ok(Self::new(Catalog::from_json_file(path)?))
    }

    /// Decode records from `reader`
    pub fn records<R: Read>(&self, reader: R) -> Records<'_, R> {
        Records {
            decoder: self,
            reader,
            done: false,
        }
    }

    /// Decode records from `reader` as formatted lines
    pub fn lines<'a, R: Read + 'a>(&'a self, reader: R) -> impl Iterator<Item = Result<String>> + 'a {
        self.records(reader).map(|record| record.map(|r| r.to_string()))
    }

    /// Open a trace file and decode it
    pub fn decode_file(&self, path: &Path) -> Result<Records<'_, BufReader<File>>> {
        log::info!("Decoding trace file: {:?}", path);
        let file = File::open(path)?;
        Ok(self.records(BufReader::new(file)))
    }

    /// Decode the next record, or `None` at a clean end of stream
    pub fn decode_record<R: Read>(&self, reader: &mut R) -> Result<Option<DecodedRecord>> {
        let Some(record) = WireRecord::read(reader)? else {
            return Ok(None);
        };

        let decoded = match record {
            WireRecord::Short32 { id } => self.decode_short(RecordType::Short32, u64::from(id))?,
            WireRecord::Short64 { id } => self.decode_short(RecordType::Short64, id)?,
            WireRecord::Catalog { header, id } => {
                let module = self
                    .modules
                    .get(&u32::from(header.module))
                    .ok_or(CatalogError::UnknownModule(header.module))?;
                let message = self.message(u64::from(id))?;
                let args = message
                    .arg_types
                    .iter()
                    .map(|tag| {
                        let encoding = Encoding::parse(tag)?;
                        read_arg(reader, &encoding, &self.enums)
                    })
                    .collect::<Result<Vec<_>>>()?;

                DecodedRecord {
                    kind: RecordType::Catalog,
                    id: u64::from(id),
                    severity: Some(header.severity),
                    module: Some(module.clone()),
                    unit: Some(header.unit),
                    text: render(&message.text, &args)?,
                }
            }
        };

        log::debug!("Decoded {:?} record {}", decoded.kind, decoded.id);
        Ok(Some(decoded))
    }

    fn message(&self, id: u64) -> Result<&Message> {
        self.messages.get(&id).ok_or(CatalogError::UnknownMessage(id))
    }

    fn decode_short(&self, kind: RecordType, id: u64) -> Result<DecodedRecord> {
        let message = self.message(id)?;
        if message.arg_count() > 0 {
            return Err(CatalogError::UnexpectedArguments {
                id,
                count: message.arg_count(),
            });
        }
        Ok(DecodedRecord {
            kind,
            id,
            severity: None,
            module: None,
            unit: None,
            text: message.text.clone(),
        })
    }
}

/// Iterator over the records of one stream
///
/// Yields `Err` at most once; the stream is finished after any error.
pub struct Records<'a, R> {
    decoder: &'a LogDecoder,
    reader: R,
    done: bool,
}

impl<'a, R: Read> Iterator for Records<'a, R> {
    type Item = Result<DecodedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decoder.decode_record(&mut self.reader) {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a, R: Read> std::iter::FusedIterator for Records<'a, R> {}
