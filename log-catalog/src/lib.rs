//! String Catalog Library
//!
//! Builds the string catalog for a firmware's binary logging. Log
//! statements in C++ are compiled into `catalog<...>()` declarations whose
//! template arguments carry the format string and argument encodings. The
//! firmware only emits a numeric ID plus raw argument bytes; this library
//! assigns those IDs and turns binary traces back into text.
//!
//! # Architecture
//!
//! - Parses symbol table dumps into message and module records
//! - Allocates IDs that stay stable across builds, seeded from earlier
//!   catalogs, with reserved ranges and typo detection
//! - Writes the catalog as JSON, Sys-T XML collateral and a C++ patch
//! - Decodes binary log streams using a JSON catalog
//!
//! Reading files, CLI flags and config files is left to the application
//! layer (log-catalog-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use log_catalog::{CatalogBuilder, GeneratorConfig, LogDecoder, TypoPolicy};
//! use std::path::Path;
//!
//! // Generate the catalog for the current build
//! let config = GeneratorConfig::new()
//!     .with_reserved_ids("100-199".parse().unwrap())
//!     .with_typo_detection(2, TypoPolicy::Warn);
//! let mut builder = CatalogBuilder::new(config);
//! builder.add_symbols_file(Path::new("firmware.syms")).unwrap();
//! builder.add_stable_catalog_file(Path::new("previous.json")).unwrap();
//!
//! let generated = builder.build().unwrap();
//! std::fs::write("catalog.json", generated.to_json_string().unwrap()).unwrap();
//! std::fs::write("catalog.cpp", generated.to_cpp_string()).unwrap();
//!
//! // Decode a captured trace
//! let decoder = LogDecoder::from_json_file(Path::new("catalog.json")).unwrap();
//! for line in decoder.lines(std::fs::File::open("trace.bin").unwrap()) {
//!     match line {
//!         Ok(text) => println!("{}", text),
//!         Err(e) => eprintln!("Decode error: {}", e),
//!     }
//! }
//! ```

// Public modules
pub mod allocator;
pub mod catalog;
pub mod config;
pub mod decoder;
pub mod encoding;
pub mod format_string;
pub mod symbols;
pub mod types;

// Re-export main types for convenience
pub use allocator::{Allocation, StableIdAllocator};
pub use catalog::{Catalog, CatalogBuilder, EnumResolver, EnumTable, EnumTables, GeneratedCatalog, NoEnums};
pub use config::{CollateralInfo, GeneratorConfig, ReservedIds, TypoPolicy};
pub use decoder::{ArgValue, DecodedRecord, LogDecoder, RecordType, WireRecord};
pub use encoding::{Encoding, Scalar};
pub use symbols::{Declaration, SymbolTable};
pub use types::{
    Assigned, CatalogError, Message, MessageKey, MessageKind, Module, NamedArg, RecordKind, Result, Severity,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: an empty build produces an empty catalog
        let generated = CatalogBuilder::new(GeneratorConfig::new()).build().unwrap();
        assert!(generated.messages().is_empty());
        assert_eq!(generated.catalog(), Catalog::new());
    }
}
