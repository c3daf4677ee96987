//! Test-card synthesis engine for cardforge.
//!
//! This crate builds Luhn-valid card records from a BIN prefix, lets callers
//! pin or randomize expiration and CVV fields, and resolves brand, country,
//! or prefix selectors against a BIN metadata catalog.

pub mod artifact;
pub mod batch;
pub mod catalog;
pub mod errors;
pub mod fields;
pub mod luhn;
pub mod synth;
pub mod template;

pub use artifact::{render_artifact, write_artifact};
pub use batch::{
    BatchGenerator, BatchOutcome, BatchSource, BinSelector, DEFAULT_INLINE_THRESHOLD, Delivery,
    generate, resolve_bin,
};
pub use catalog::{BinCatalog, BinRecord, CatalogSource, CatalogStore, DatasetColumns};
pub use errors::{CardError, Result};
pub use fields::{FieldRandomizer, FieldValue, YearWindow};
pub use synth::{CardRecord, GenerationSpec, card_length_for, synthesize};
pub use template::{CardTemplate, LiteralShape, parse_template};
