use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::errors::{CardError, Result};

/// Marker rendered for metadata the dataset does not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Issuer metadata for one BIN.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinRecord {
    pub bin: String,
    pub brand: Option<String>,
    pub card_type: Option<String>,
    pub category: Option<String>,
    pub issuer: Option<String>,
    pub issuer_phone: Option<String>,
    pub issuer_url: Option<String>,
    pub country_name: Option<String>,
    pub iso_country_code: Option<String>,
}

impl BinRecord {
    /// Multi-line summary shown next to generated batches and lookups.
    pub fn describe(&self) -> String {
        format!(
            "BIN: {}\nBrand: {}\nType: {}\nCategory: {}\nIssuer: {}\nCountry: {}",
            self.bin,
            shown(&self.brand),
            shown(&self.card_type),
            shown(&self.category),
            shown(&self.issuer),
            shown(&self.country_name),
        )
    }

    /// Lookup view with contact details and the country code.
    pub fn describe_full(&self) -> String {
        format!(
            "{}\nCountry code: {}\nIssuer phone: {}\nIssuer URL: {}",
            self.describe(),
            shown(&self.iso_country_code),
            shown(&self.issuer_phone),
            shown(&self.issuer_url),
        )
    }
}

fn shown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_AVAILABLE)
}

/// Header names of the reference dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetColumns {
    pub bin: String,
    pub brand: String,
    pub card_type: String,
    pub category: String,
    pub issuer: String,
    pub issuer_phone: String,
    pub issuer_url: String,
    pub country_name: String,
    pub country_code: String,
}

impl Default for DatasetColumns {
    fn default() -> Self {
        Self {
            bin: "BIN".to_string(),
            brand: "Brand".to_string(),
            card_type: "Type".to_string(),
            category: "Category".to_string(),
            issuer: "Issuer".to_string(),
            issuer_phone: "IssuerPhone".to_string(),
            issuer_url: "IssuerUrl".to_string(),
            country_name: "CountryName".to_string(),
            country_code: "isoCode2".to_string(),
        }
    }
}

/// In-memory BIN metadata, ordered by BIN.
#[derive(Debug, Clone, Default)]
pub struct BinCatalog {
    records: BTreeMap<String, BinRecord>,
}

impl BinCatalog {
    pub fn from_records(records: impl IntoIterator<Item = BinRecord>) -> Self {
        let mut catalog = Self::default();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    pub fn load(path: &Path, columns: &DatasetColumns) -> Result<Self> {
        let file = File::open(path)?;
        let catalog = Self::from_reader(file, columns)?;
        tracing::info!(
            event = "catalog_loaded",
            path = %path.display(),
            bins = catalog.len()
        );
        Ok(catalog)
    }

    /// Parse a headed CSV table. Rows are not validated; missing or empty
    /// cells become `None`. A later row replaces an earlier one with the same BIN.
    pub fn from_reader<R: Read>(reader: R, columns: &DatasetColumns) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let index = |name: &str| headers.iter().position(|header| header == name);
        let bin_idx = index(&columns.bin).ok_or_else(|| {
            CardError::Catalog(format!("dataset is missing column {}", columns.bin))
        })?;
        let brand_idx = index(&columns.brand);
        let type_idx = index(&columns.card_type);
        let category_idx = index(&columns.category);
        let issuer_idx = index(&columns.issuer);
        let phone_idx = index(&columns.issuer_phone);
        let url_idx = index(&columns.issuer_url);
        let country_idx = index(&columns.country_name);
        let code_idx = index(&columns.country_code);
        if code_idx.is_none() {
            tracing::warn!(
                event = "dataset_column_missing",
                column = %columns.country_code
            );
        }

        let mut catalog = Self::default();
        let mut skipped = 0u64;
        for row in reader.records() {
            let row = row?;
            let cell = |idx: Option<usize>| {
                idx.and_then(|idx| row.get(idx))
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };
            let Some(bin) = cell(Some(bin_idx)) else {
                skipped += 1;
                continue;
            };
            catalog.insert(BinRecord {
                bin,
                brand: cell(brand_idx),
                card_type: cell(type_idx),
                category: cell(category_idx),
                issuer: cell(issuer_idx),
                issuer_phone: cell(phone_idx),
                issuer_url: cell(url_idx),
                country_name: cell(country_idx),
                iso_country_code: cell(code_idx),
            });
        }
        if skipped > 0 {
            tracing::warn!(event = "dataset_rows_skipped", reason = "empty_bin", count = skipped);
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, record: BinRecord) {
        self.records.insert(record.bin.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, bin: &str) -> Option<&BinRecord> {
        self.records.get(bin)
    }

    /// Like [`get`](Self::get), but a miss is an [`CardError::UnknownBin`].
    pub fn lookup(&self, bin: &str) -> Result<&BinRecord> {
        self.get(bin)
            .ok_or_else(|| CardError::UnknownBin(bin.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BinRecord> {
        self.records.values()
    }

    pub fn by_brand<'a>(&'a self, brand: &'a str) -> impl Iterator<Item = &'a BinRecord> {
        self.iter()
            .filter(move |record| matches_ignore_case(&record.brand, brand))
    }

    pub fn by_country<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a BinRecord> {
        self.iter()
            .filter(move |record| matches_ignore_case(&record.iso_country_code, code))
    }

    pub fn with_prefixes<'a, S: AsRef<str>>(
        &'a self,
        prefixes: &'a [S],
    ) -> impl Iterator<Item = &'a BinRecord> {
        self.iter().filter(move |record| {
            prefixes
                .iter()
                .any(|prefix| record.bin.starts_with(prefix.as_ref()))
        })
    }
}

fn matches_ignore_case(value: &Option<String>, wanted: &str) -> bool {
    value
        .as_deref()
        .is_some_and(|value| value.eq_ignore_ascii_case(wanted.trim()))
}

/// Where a [`CatalogStore`] reads its dataset from.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    pub path: PathBuf,
    pub columns: DatasetColumns,
}

/// Parsed catalog cached across commands until explicitly refreshed.
#[derive(Debug)]
pub struct CatalogStore {
    source: CatalogSource,
    cache: RwLock<Option<Arc<BinCatalog>>>,
}

impl CatalogStore {
    pub fn new(source: CatalogSource) -> Self {
        Self {
            source,
            cache: RwLock::new(None),
        }
    }

    /// Store pre-seeded with an already built catalog.
    pub fn with_catalog(source: CatalogSource, catalog: BinCatalog) -> Self {
        Self {
            source,
            cache: RwLock::new(Some(Arc::new(catalog))),
        }
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// Cached catalog, loading it on first use.
    pub fn catalog(&self) -> Result<Arc<BinCatalog>> {
        if let Ok(cache) = self.cache.read()
            && let Some(catalog) = cache.as_ref()
        {
            return Ok(Arc::clone(catalog));
        }
        self.refresh()
    }

    /// Re-read the dataset and replace the cached catalog.
    pub fn refresh(&self) -> Result<Arc<BinCatalog>> {
        let catalog = Arc::new(BinCatalog::load(&self.source.path, &self.source.columns)?);
        let mut cache = self
            .cache
            .write()
            .map_err(|_| CardError::Catalog("catalog cache poisoned".to_string()))?;
        *cache = Some(Arc::clone(&catalog));
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = "\
BIN,Brand,Type,Category,Issuer,IssuerPhone,IssuerUrl,CountryName,isoCode2
400000,VISA,CREDIT,CLASSIC,Test Bank,,,UNITED STATES,US
510510,MASTERCARD,DEBIT,STANDARD,Other Bank,+1 555,https://example.com,CANADA,CA
400000,VISA,DEBIT,GOLD,Replacement Bank,,,UNITED STATES,US
,VISA,CREDIT,,,,,,
378282,AMEX
";

    fn catalog() -> BinCatalog {
        BinCatalog::from_reader(DATASET.as_bytes(), &DatasetColumns::default())
            .expect("parse dataset")
    }

    #[test]
    fn last_duplicate_wins_and_empty_bins_are_skipped() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 3);
        let record = catalog.get("400000").expect("record");
        assert_eq!(record.issuer.as_deref(), Some("Replacement Bank"));
    }

    #[test]
    fn short_rows_leave_fields_unknown() {
        let catalog = catalog();
        let record = catalog.get("378282").expect("record");
        assert_eq!(record.brand.as_deref(), Some("AMEX"));
        assert!(record.issuer.is_none());
        assert!(record.describe().contains("Issuer: N/A"));
    }

    #[test]
    fn filters_ignore_case() {
        let catalog = catalog();
        let visa: Vec<_> = catalog.by_brand("visa").map(|r| r.bin.as_str()).collect();
        assert_eq!(visa, vec!["400000"]);
        let canada: Vec<_> = catalog.by_country("ca").map(|r| r.bin.as_str()).collect();
        assert_eq!(canada, vec!["510510"]);
        let prefixed: Vec<_> = catalog
            .with_prefixes(&["37", "51"])
            .map(|r| r.bin.as_str())
            .collect();
        assert_eq!(prefixed, vec!["378282", "510510"]);
    }

    #[test]
    fn lookup_miss_is_unknown_bin() {
        let catalog = catalog();
        assert!(matches!(catalog.lookup("999999"), Err(CardError::UnknownBin(_))));
    }

    #[test]
    fn country_column_is_configurable() {
        let data = "BIN,Brand,country_iso\n411111,VISA,GB\n";
        let columns = DatasetColumns {
            country_code: "country_iso".to_string(),
            ..DatasetColumns::default()
        };
        let catalog = BinCatalog::from_reader(data.as_bytes(), &columns).expect("parse");
        assert_eq!(catalog.by_country("gb").count(), 1);
    }

    #[test]
    fn missing_bin_column_is_rejected() {
        let data = "Brand,Type\nVISA,CREDIT\n";
        let result = BinCatalog::from_reader(data.as_bytes(), &DatasetColumns::default());
        assert!(matches!(result, Err(CardError::Catalog(_))));
    }
}
