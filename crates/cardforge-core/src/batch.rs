use std::time::{Duration, Instant};

use rand::{Rng, RngCore};

use crate::catalog::{BinCatalog, BinRecord};
use crate::errors::{CardError, Result};
use crate::fields::FieldRandomizer;
use crate::synth::{CardRecord, GenerationSpec, card_length_for, synthesize, truncate_bin};
use crate::template::CardTemplate;

/// Batches at or above this size are delivered as a file.
pub const DEFAULT_INLINE_THRESHOLD: usize = 20;

/// How the BIN for a batch is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinSelector {
    Explicit(String),
    /// Any catalog BIN starting with one of these prefixes.
    Random(Vec<String>),
    Brand(String),
    Country(String),
}

impl BinSelector {
    fn label(&self) -> String {
        match self {
            BinSelector::Explicit(bin) => format!("BIN {bin}"),
            BinSelector::Random(_) => "the selected brands".to_string(),
            BinSelector::Brand(brand) => format!("the brand {brand}"),
            BinSelector::Country(code) => format!("the country code {code}"),
        }
    }
}

/// Pick a concrete BIN for `selector`, uniformly among matching catalog entries.
pub fn resolve_bin(
    selector: &BinSelector,
    catalog: &BinCatalog,
    rng: &mut dyn RngCore,
) -> Result<String> {
    let candidates: Vec<&BinRecord> = match selector {
        BinSelector::Explicit(bin) => return Ok(truncate_bin(bin.trim()).to_string()),
        BinSelector::Random(prefixes) => catalog.with_prefixes(prefixes).collect(),
        BinSelector::Brand(brand) => catalog.by_brand(brand).collect(),
        BinSelector::Country(code) => catalog.by_country(code).collect(),
    };
    if candidates.is_empty() {
        return Err(CardError::NoMatchingBin(selector.label()));
    }
    let idx = rng.random_range(0..candidates.len());
    Ok(candidates[idx].bin.clone())
}

/// Synthesize `count` records from the same spec; random fields are drawn per record.
pub fn generate(
    spec: &GenerationSpec,
    count: usize,
    randomizer: &FieldRandomizer,
    rng: &mut dyn RngCore,
) -> Result<Vec<CardRecord>> {
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(synthesize(spec, randomizer, rng)?);
    }
    Ok(records)
}

/// What the caller hands to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// One message per record.
    Inline(Vec<CardRecord>),
    /// A single text file plus the BIN's metadata, when the catalog has it.
    Attachment {
        records: Vec<CardRecord>,
        metadata: Option<BinRecord>,
    },
}

impl Delivery {
    pub fn records(&self) -> &[CardRecord] {
        match self {
            Delivery::Inline(records) => records,
            Delivery::Attachment { records, .. } => records,
        }
    }

    pub fn is_attachment(&self) -> bool {
        matches!(self, Delivery::Attachment { .. })
    }
}

/// Where the batch's prefix comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSource {
    Selector(BinSelector),
    Template(CardTemplate),
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub bin: String,
    pub length: usize,
    pub delivery: Delivery,
    pub elapsed: Duration,
}

/// Resolves a BIN, synthesizes a batch, and picks its delivery mode.
#[derive(Debug, Clone, Copy)]
pub struct BatchGenerator {
    randomizer: FieldRandomizer,
    inline_threshold: usize,
}

impl BatchGenerator {
    pub fn new(randomizer: FieldRandomizer, inline_threshold: usize) -> Self {
        Self {
            randomizer,
            inline_threshold,
        }
    }

    pub fn inline_threshold(&self) -> usize {
        self.inline_threshold
    }

    pub fn run(
        &self,
        source: &BatchSource,
        count: usize,
        catalog: &BinCatalog,
        rng: &mut dyn RngCore,
    ) -> Result<BatchOutcome> {
        let started = Instant::now();
        let spec = match source {
            BatchSource::Selector(selector) => {
                let bin = resolve_bin(selector, catalog, rng)?;
                let length = length_for(&bin, catalog);
                GenerationSpec::random(bin, length)
            }
            BatchSource::Template(template) => {
                let length = length_for(&template.prefix, catalog);
                template.clone().into_spec(length)
            }
        };

        let records = generate(&spec, count, &self.randomizer, rng)?;
        let bin = spec.bin().to_string();
        let delivery = self.plan_delivery(records, &bin, catalog);
        let elapsed = started.elapsed();

        tracing::info!(
            event = "batch_generated",
            bin = %bin,
            length = spec.length,
            count = count,
            attachment = delivery.is_attachment(),
            duration_ms = elapsed.as_millis() as u64
        );

        Ok(BatchOutcome {
            bin,
            length: spec.length,
            delivery,
            elapsed,
        })
    }

    pub fn plan_delivery(
        &self,
        records: Vec<CardRecord>,
        bin: &str,
        catalog: &BinCatalog,
    ) -> Delivery {
        if records.len() < self.inline_threshold {
            return Delivery::Inline(records);
        }
        let metadata = catalog.get(bin).cloned();
        if metadata.is_none() {
            tracing::warn!(event = "bin_metadata_missing", bin = %bin);
        }
        Delivery::Attachment { records, metadata }
    }
}

impl Default for BatchGenerator {
    fn default() -> Self {
        Self::new(FieldRandomizer::default(), DEFAULT_INLINE_THRESHOLD)
    }
}

fn length_for(prefix: &str, catalog: &BinCatalog) -> usize {
    let brand = catalog
        .get(truncate_bin(prefix))
        .and_then(|record| record.brand.as_deref());
    card_length_for(prefix, brand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn record(bin: &str, brand: &str, country: &str) -> BinRecord {
        BinRecord {
            bin: bin.to_string(),
            brand: Some(brand.to_string()),
            iso_country_code: Some(country.to_string()),
            ..BinRecord::default()
        }
    }

    fn catalog() -> BinCatalog {
        BinCatalog::from_records([
            record("400000", "VISA", "US"),
            record("411111", "Visa", "GB"),
            record("510510", "MASTERCARD", "US"),
            record("378282", "AMEX", "US"),
        ])
    }

    #[test]
    fn brand_resolution_only_returns_matching_entries() {
        let catalog = catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..100 {
            let bin = resolve_bin(&BinSelector::Brand("visa".to_string()), &catalog, &mut rng)
                .expect("resolve");
            assert!(bin == "400000" || bin == "411111", "unexpected {bin}");
        }
    }

    #[test]
    fn country_resolution_only_returns_matching_entries() {
        let catalog = catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        for _ in 0..100 {
            let bin = resolve_bin(&BinSelector::Country("us".to_string()), &catalog, &mut rng)
                .expect("resolve");
            let record = catalog.get(&bin).expect("catalog entry");
            assert_eq!(record.iso_country_code.as_deref(), Some("US"));
        }
    }

    #[test]
    fn empty_candidate_sets_are_no_matching_bin() {
        let catalog = catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for selector in [
            BinSelector::Brand("DISCOVER".to_string()),
            BinSelector::Country("BR".to_string()),
            BinSelector::Random(vec!["6".to_string()]),
        ] {
            assert!(matches!(
                resolve_bin(&selector, &catalog, &mut rng),
                Err(CardError::NoMatchingBin(_))
            ));
        }
        assert!(matches!(
            resolve_bin(&BinSelector::Brand("VISA".to_string()), &BinCatalog::default(), &mut rng),
            Err(CardError::NoMatchingBin(_))
        ));
    }

    #[test]
    fn explicit_bins_pass_through_truncated() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let bin = resolve_bin(
            &BinSelector::Explicit("123456789".to_string()),
            &BinCatalog::default(),
            &mut rng,
        )
        .expect("resolve");
        assert_eq!(bin, "123456");
    }

    #[test]
    fn amex_bins_produce_fifteen_digit_cards() {
        let generator = BatchGenerator::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let outcome = generator
            .run(
                &BatchSource::Selector(BinSelector::Brand("AMEX".to_string())),
                3,
                &catalog(),
                &mut rng,
            )
            .expect("run");
        assert_eq!(outcome.length, 15);
        assert!(outcome.delivery.records().iter().all(|c| c.number.len() == 15));
    }

    #[test]
    fn delivery_switches_at_threshold() {
        let generator = BatchGenerator::default();
        let catalog = catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let source = BatchSource::Selector(BinSelector::Explicit("400000".to_string()));

        let small = generator.run(&source, 19, &catalog, &mut rng).expect("run");
        assert!(matches!(small.delivery, Delivery::Inline(ref r) if r.len() == 19));

        let large = generator.run(&source, 20, &catalog, &mut rng).expect("run");
        match large.delivery {
            Delivery::Attachment { records, metadata } => {
                assert_eq!(records.len(), 20);
                assert_eq!(metadata.map(|m| m.bin), Some("400000".to_string()));
            }
            other => panic!("expected attachment, got {other:?}"),
        }
    }

    #[test]
    fn attachment_without_metadata_is_still_delivered() {
        let generator = BatchGenerator::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let source = BatchSource::Selector(BinSelector::Explicit("999999".to_string()));
        let outcome = generator
            .run(&source, 25, &catalog(), &mut rng)
            .expect("run");
        assert!(matches!(
            outcome.delivery,
            Delivery::Attachment { ref records, metadata: None } if records.len() == 25
        ));
    }
}
