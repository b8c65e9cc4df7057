// Generate catalogs from symbol dumps and decode traces against them
use log_catalog::decoder::CatalogHeader;
use log_catalog::{
    CatalogBuilder, CatalogError, EnumTable, EnumTables, GeneratedCatalog, GeneratorConfig, LogDecoder, Severity,
    TypoPolicy, WireRecord,
};
use std::io::{Cursor, Write};
use tempfile::{tempdir, NamedTempFile};

fn cpp_string(s: &str) -> String {
    let chars: Vec<String> = s.bytes().map(|b| format!("(char){}", b)).collect();
    format!("sc::string<{}>", chars.join(", "))
}

fn message_line(text: &str, args: &str) -> String {
    format!(
        "0000 T unsigned int catalog<sc::message<sc::undefined<sc::args<{}>, -1, {}, sc::named_args<>>>>()\n",
        args,
        cpp_string(text)
    )
}

fn module_line(text: &str) -> String {
    format!(
        "0000 T unsigned int module<sc::module_string<sc::undefined<void, -1, {}>>>()\n",
        cpp_string(text)
    )
}

fn symbols_file(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"0000 T main\n").unwrap();
    for line in lines {
        file.write_all(line.as_bytes()).unwrap();
    }
    file
}

fn generate(config: GeneratorConfig, lines: &[String], seed: Option<&NamedTempFile>) -> GeneratedCatalog {
    let symbols = symbols_file(lines);
    let mut builder = CatalogBuilder::new(config);
    builder.add_symbols_file(symbols.path()).unwrap();
    if let Some(seed) = seed {
        builder.add_stable_catalog_file(seed.path()).unwrap();
    }
    builder.build().unwrap()
}

fn json_file(generated: &GeneratedCatalog) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(generated.to_json_string().unwrap().as_bytes()).unwrap();
    file
}

fn catalog_record(severity: Severity, module: u32, id: u32, args: &[u8]) -> Vec<u8> {
    let mut bytes = WireRecord::Catalog {
        header: CatalogHeader::new(severity, module as u8),
        id,
    }
    .to_bytes();
    bytes.extend_from_slice(args);
    bytes
}

#[test]
fn test_generate_then_decode() {
    let _ = env_logger::builder().is_test(true).try_init();

    let generated = generate(
        GeneratorConfig::new(),
        &[
            message_line("value: {}", "encode_32<int>"),
            message_line("boot complete", ""),
            module_line("core"),
        ],
        None,
    );
    let value_id = generated.message_id("value: {}", &["encode_32<int>"]).unwrap();
    let boot_id = generated.message_id("boot complete", &[]).unwrap();
    let core_id = generated.module_id("core").unwrap();
    assert_ne!(value_id, boot_id);

    let catalog = json_file(&generated);
    let decoder = LogDecoder::from_json_file(catalog.path()).unwrap();

    let mut trace = catalog_record(Severity::Trace, core_id, value_id, &17i32.to_le_bytes());
    trace.extend(WireRecord::Short32 { id: boot_id }.to_bytes());

    let lines: Vec<String> = decoder
        .lines(Cursor::new(trace))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(lines, vec!["TRACE [core] value: 17", "boot complete"]);
}

#[test]
fn test_ids_stable_across_builds() {
    let first = generate(
        GeneratorConfig::new(),
        &[
            message_line("alpha", ""),
            message_line("beta", ""),
            message_line("gamma {}", "encode_32<int>"),
        ],
        None,
    );
    let seed = json_file(&first);

    let second = generate(
        GeneratorConfig::new(),
        &[
            message_line("delta", ""),
            message_line("gamma {}", "encode_32<int>"),
            message_line("beta", ""),
        ],
        Some(&seed),
    );

    assert_eq!(second.message_id("beta", &[]), first.message_id("beta", &[]));
    assert_eq!(
        second.message_id("gamma {}", &["encode_32<int>"]),
        first.message_id("gamma {}", &["encode_32<int>"])
    );

    let delta = second.message_id("delta", &[]).unwrap();
    assert!(first.messages().iter().all(|assigned| assigned.id != delta));

    // alpha is gone from the build but keeps its ID in the catalog
    let catalog = second.catalog();
    let alpha_id = first.message_id("alpha", &[]).unwrap();
    assert_eq!(catalog.message(alpha_id).unwrap().text, "alpha");
    assert!(!second.to_cpp_string().contains("\"alpha\""));
}

#[test]
fn test_reserved_ranges_skipped() {
    let config = GeneratorConfig::new().with_reserved_ids("0-9".parse().unwrap());
    let generated = generate(
        config,
        &[message_line("a", ""), message_line("b", ""), module_line("core")],
        None,
    );

    let ids: Vec<u32> = generated.messages().iter().map(|assigned| assigned.id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert_eq!(generated.module_id("core"), Some(10));
}

#[test]
fn test_typo_fixed_against_seed_file() {
    let mut seed = NamedTempFile::new().unwrap();
    seed.write_all(br#"{"messages": [{"msg": "confign applied", "arg_types": [], "id": 3}]}"#)
        .unwrap();

    let config = GeneratorConfig::new().with_typo_detection(2, TypoPolicy::Fix);
    let generated = generate(config, &[message_line("config applied", "")], Some(&seed));
    assert_eq!(generated.message_id("config applied", &[]), Some(3));
    assert!(generated.stale_messages().is_empty());

    let strict = GeneratorConfig::new().with_typo_detection(2, TypoPolicy::Error);
    let symbols = symbols_file(&[message_line("config applied", "")]);
    let mut builder = CatalogBuilder::new(strict);
    builder.add_symbols_file(symbols.path()).unwrap();
    builder.add_stable_catalog_file(seed.path()).unwrap();
    assert!(matches!(builder.build(), Err(CatalogError::TypoDetected { .. })));
}

#[test]
fn test_enum_arguments_decoded_by_name() {
    let mut tables = EnumTables::new();
    tables.insert("ns::State", EnumTable::from([(1, "RUNNING".to_string())]));

    let symbols = symbols_file(&[
        message_line("state: {}", "encode_enum<ns::State, int>"),
        module_line("core"),
    ]);
    let mut builder = CatalogBuilder::new(GeneratorConfig::new()).with_enum_resolver(tables);
    builder.add_symbols_file(symbols.path()).unwrap();
    let generated = builder.build().unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, generated.to_json_string().unwrap()).unwrap();
    let decoder = LogDecoder::from_json_file(&path).unwrap();

    let id = generated.message_id("state: {}", &["encode_enum<ns::State, int>"]).unwrap();
    let core = generated.module_id("core").unwrap();
    let mut trace = catalog_record(Severity::Info, core, id, &1i32.to_le_bytes());
    trace.extend(catalog_record(Severity::Info, core, id, &4i32.to_le_bytes()));

    let lines: Vec<String> = decoder
        .lines(Cursor::new(trace))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        lines,
        vec!["INFO [core] state: RUNNING", "INFO [core] state: static_cast<ns::State>(4)"]
    );
}

#[test]
fn test_truncated_trace_reports_error() {
    let generated = generate(
        GeneratorConfig::new(),
        &[message_line("value: {}", "encode_64<long>"), module_line("core")],
        None,
    );
    let catalog = json_file(&generated);
    let decoder = LogDecoder::from_json_file(catalog.path()).unwrap();

    let id = generated.message_id("value: {}", &["encode_64<long>"]).unwrap();
    let trace = catalog_record(Severity::Error, 0, id, &[1, 2, 3]);

    let results: Vec<_> = decoder.records(Cursor::new(trace)).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(CatalogError::Truncated(_))));
}
