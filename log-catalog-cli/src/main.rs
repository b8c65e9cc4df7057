//! String Catalog CLI Application
//!
//! This is the command-line interface for the log-catalog library. It adds:
//! - Reading symbol dumps, seed catalogs and enum tables from disk
//! - TOML configuration with command-line overrides
//! - Writing JSON, XML and C++ outputs
//! - Decoding binary traces to text

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log_catalog::{CatalogBuilder, EnumTables, GeneratorConfig, LogDecoder, ReservedIds, TypoPolicy};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

mod config;

/// String Catalog - Stable IDs for binary logging
#[derive(Parser, Debug)]
#[command(name = "log-catalog")]
#[command(about = "Generate string catalogs and decode binary logs", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a catalog from symbol table dumps
    Generate(GenerateArgs),
    /// Decode a binary log using a JSON catalog
    Decode(DecodeArgs),
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Symbol table dump(s) of the current build
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Catalog(s) from previous builds to keep IDs stable (can be repeated)
    #[arg(long, alias = "stable_json", value_name = "FILE")]
    stable_json: Vec<PathBuf>,

    /// Write C++ ID definitions to FILE
    #[arg(long, value_name = "FILE")]
    cpp_output: Option<PathBuf>,

    /// Write the JSON catalog to FILE
    #[arg(long, value_name = "FILE")]
    json_output: Option<PathBuf>,

    /// Write Sys-T XML collateral to FILE
    #[arg(long, value_name = "FILE")]
    xml_output: Option<PathBuf>,

    /// Drop stable entries the current build no longer declares
    #[arg(long, alias = "forget_old_ids")]
    forget_old_ids: bool,

    /// Largest allowed module ID
    #[arg(long, alias = "module_id_max", value_name = "N")]
    module_id_max: Option<u32>,

    /// IDs never to allocate, e.g. "1-5,10-15,20"
    #[arg(long, alias = "reserved_ids", value_name = "LIST")]
    reserved_ids: Option<ReservedIds>,

    /// Edit distance at or below which a new message counts as a typo (0 = off)
    #[arg(long, alias = "typo_detect", value_name = "N")]
    typo_detect: Option<usize>,

    /// What to do on a typo: error, warn, fix or fix_quiet
    #[arg(long, alias = "typo_behavior", value_name = "POLICY")]
    typo_behavior: Option<TypoPolicy>,

    /// JSON file of enum tables keyed by qualified enum name
    #[arg(long, value_name = "FILE")]
    enums: Option<PathBuf>,

    /// Client name written into XML collateral
    #[arg(long, value_name = "NAME")]
    client_name: Option<String>,

    /// Firmware version written into XML collateral
    #[arg(long, value_name = "VER")]
    fw_version: Option<String>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct DecodeArgs {
    /// Binary log to decode
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// JSON catalog produced by `generate`
    #[arg(short, long, value_name = "FILE")]
    json: PathBuf,

    /// Output file for decoded lines (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("String Catalog CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using catalog library v{}", log_catalog::VERSION);

    match &args.command {
        Command::Generate(generate) => generate_mode(generate),
        Command::Decode(decode) => decode_mode(decode),
    }
}

/// Build the generator configuration: config file first, then flags on top
fn generator_config(args: &GenerateArgs) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?.generate
        }
        None => GeneratorConfig::new(),
    };

    if let Some(max) = args.module_id_max {
        config.module_id_max = max;
    }
    if let Some(reserved) = &args.reserved_ids {
        config.reserved_ids = reserved.clone();
    }
    if let Some(threshold) = args.typo_detect {
        config.typo_threshold = threshold;
    }
    if let Some(policy) = args.typo_behavior {
        config.typo_policy = policy;
    }
    if args.forget_old_ids {
        config.forget_old_ids = true;
    }
    if let Some(name) = &args.client_name {
        config.collateral.client_name = name.clone();
    }
    if let Some(version) = &args.fw_version {
        config.collateral.fw_version = version.clone();
    }

    Ok(config)
}

/// Generate mode - read symbols and seeds, allocate IDs, write outputs
fn generate_mode(args: &GenerateArgs) -> Result<()> {
    let config = generator_config(args)?;
    log::debug!("Generator configuration: {:?}", config);

    let mut builder = CatalogBuilder::new(config);
    if let Some(path) = &args.enums {
        let tables = EnumTables::from_json_file(path)
            .with_context(|| format!("Failed to load enum tables: {:?}", path))?;
        builder = builder.with_enum_resolver(tables);
    }

    for path in &args.inputs {
        builder
            .add_symbols_file(path)
            .with_context(|| format!("Failed to read symbols: {:?}", path))?;
    }
    for path in &args.stable_json {
        builder
            .add_stable_catalog_file(path)
            .with_context(|| format!("Failed to load stable catalog: {:?}", path))?;
    }

    let generated = builder.build().context("Catalog generation failed")?;
    log::info!(
        "Catalog has {} messages and {} modules ({} stale messages retained)",
        generated.messages().len(),
        generated.modules().len(),
        generated.stale_messages().len()
    );

    if args.cpp_output.is_none() && args.json_output.is_none() && args.xml_output.is_none() {
        log::warn!("No output file requested");
    }
    if let Some(path) = &args.json_output {
        write_output(path, &generated.to_json_string()?)?;
    }
    if let Some(path) = &args.xml_output {
        write_output(path, &generated.to_xml_string())?;
    }
    if let Some(path) = &args.cpp_output {
        write_output(path, &generated.to_cpp_string())?;
    }

    Ok(())
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write output file: {:?}", path))?;
    log::info!("Wrote {:?}", path);
    Ok(())
}

/// Decode mode - turn a binary log into text lines
fn decode_mode(args: &DecodeArgs) -> Result<()> {
    let decoder = LogDecoder::from_json_file(&args.json)
        .with_context(|| format!("Failed to load catalog: {:?}", args.json))?;
    let records = decoder
        .decode_file(&args.input)
        .with_context(|| format!("Failed to open log file: {:?}", args.input))?;

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(sink);

    let mut count = 0usize;
    for record in records {
        let record = record.with_context(|| format!("Decoding failed after {} records", count))?;
        writeln!(out, "{}", record)?;
        count += 1;
    }
    out.flush()?;

    log::info!("Decoded {} records from {:?}", count, args.input);
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
