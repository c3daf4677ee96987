use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cardforge_core::luhn;
use cardforge_core::{
    BatchGenerator, BatchSource, BinCatalog, BinSelector, CardError, CatalogSource, CatalogStore,
    DatasetColumns, Delivery, FieldRandomizer, GenerationSpec, LiteralShape, generate,
    parse_template, render_artifact, synthesize, write_artifact,
};

const DATASET: &str = "\
BIN,Brand,Type,Category,Issuer,IssuerPhone,IssuerUrl,CountryName,isoCode2
400000,VISA,CREDIT,CLASSIC,Test Bank,,,UNITED STATES,US
411111,VISA,DEBIT,GOLD,Sample Bank,,,UNITED KINGDOM,GB
510510,MASTERCARD,DEBIT,STANDARD,Other Bank,,,CANADA,CA
";

fn temp_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("cardforge_core_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn catalog() -> BinCatalog {
    BinCatalog::from_reader(DATASET.as_bytes(), &DatasetColumns::default()).expect("catalog")
}

#[test]
fn small_batch_yields_distinct_valid_numbers() {
    let randomizer = FieldRandomizer::default();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let spec = GenerationSpec::random("400000", 16);

    let records = generate(&spec, 3, &randomizer, &mut rng).expect("generate");

    assert_eq!(records.len(), 3);
    let unique: HashSet<_> = records.iter().map(|r| r.number.clone()).collect();
    assert_eq!(unique.len(), 3);
    for record in &records {
        assert_eq!(record.number.len(), 16);
        assert!(record.number.starts_with("400000"));
        assert!(luhn::is_valid(&luhn::digits_of(&record.number).expect("digits")));
    }
}

#[test]
fn large_batch_becomes_a_pipe_delimited_attachment() {
    let generator = BatchGenerator::default();
    let mut rng = ChaCha8Rng::seed_from_u64(25);
    let source = BatchSource::Selector(BinSelector::Explicit("400000".to_string()));

    let outcome = generator
        .run(&source, 25, &catalog(), &mut rng)
        .expect("run batch");

    let Delivery::Attachment { records, metadata } = outcome.delivery else {
        panic!("25 records should be delivered as a file");
    };
    let metadata = metadata.expect("metadata for 400000");
    assert_eq!(metadata.issuer.as_deref(), Some("Test Bank"));

    let dir = temp_dir("artifact");
    let path = dir.join("gen.txt");
    let bytes = write_artifact(&path, &records, None).expect("write artifact");
    let text = fs::read_to_string(&path).expect("read artifact");
    assert_eq!(bytes, text.len() as u64);
    assert_eq!(text, render_artifact(&records, None).expect("render"));

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 25);
    for line in lines {
        let fields: Vec<&str> = line.split('|').collect();
        assert_eq!(fields.len(), 4, "line {line}");
        assert!(fields[0].starts_with("400000"));
    }
}

#[test]
fn literal_template_is_not_randomized() {
    let template = parse_template("411111|12|29|123", LiteralShape::Full).expect("template");
    let spec = template.into_spec(16);
    let randomizer = FieldRandomizer::default();
    let mut rng = ChaCha8Rng::seed_from_u64(8);

    for _ in 0..20 {
        let record = synthesize(&spec, &randomizer, &mut rng).expect("synthesize");
        assert!(record.number.starts_with("411111"));
        assert_eq!(record.exp_month, "12");
        assert_eq!(record.exp_year, "29");
        assert_eq!(record.cvv, "123");
    }
}

#[test]
fn template_source_uses_full_prefix() {
    let generator = BatchGenerator::default();
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    let template =
        parse_template("41111122223333|xx|xx|xxx", LiteralShape::Full).expect("template");

    let outcome = generator
        .run(&BatchSource::Template(template), 4, &catalog(), &mut rng)
        .expect("run");

    assert_eq!(outcome.bin, "411111");
    for record in outcome.delivery.records() {
        assert!(record.number.starts_with("41111122223333"));
        assert_eq!(record.number.len(), 16);
    }
}

#[test]
fn prefix_too_long_produces_no_record() {
    let randomizer = FieldRandomizer::default();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let spec = GenerationSpec::random("4000001234", 8);

    let result = generate(&spec, 5, &randomizer, &mut rng);
    assert!(matches!(result, Err(CardError::PrefixTooLong { .. })));
}

#[test]
fn catalog_store_caches_until_refresh() {
    let dir = temp_dir("store");
    let path = dir.join("bins.csv");
    fs::write(&path, DATASET).expect("write dataset");
    let store = CatalogStore::new(CatalogSource {
        path: path.clone(),
        columns: DatasetColumns::default(),
    });

    assert_eq!(store.catalog().expect("load").len(), 3);

    fs::write(&path, "BIN,Brand\n601100,DISCOVER\n").expect("rewrite dataset");
    assert_eq!(store.catalog().expect("cached").len(), 3);

    let refreshed = store.refresh().expect("refresh");
    assert_eq!(refreshed.len(), 1);
    assert!(store.catalog().expect("reloaded").get("601100").is_some());
}

#[test]
fn seeded_runs_are_reproducible() {
    let generator = BatchGenerator::default();
    let source = BatchSource::Selector(BinSelector::Brand("visa".to_string()));
    let catalog = catalog();

    let mut rng_a = ChaCha8Rng::seed_from_u64(99);
    let mut rng_b = ChaCha8Rng::seed_from_u64(99);
    let a = generator.run(&source, 5, &catalog, &mut rng_a).expect("run a");
    let b = generator.run(&source, 5, &catalog, &mut rng_b).expect("run b");

    assert_eq!(a.bin, b.bin);
    assert_eq!(a.delivery, b.delivery);
}
