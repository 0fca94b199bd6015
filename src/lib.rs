//! Convert diploid genotype calls in VCF/BCF records to haploid, driven by a
//! per-sample sex map.
//!
//! The transform itself lives in [`ploidy_map`], [`verify`] and [`rewrite`]
//! and works on a flat genotype array; [`genotype_codec`] moves that array in
//! and out of `noodles` records and [`conversion`] drives a whole file.

pub mod cli;
pub mod conversion;
pub mod error;
pub mod genotype_codec;
pub mod input;
pub mod output;
pub mod ploidy_map;
pub mod report;
pub mod rewrite;
pub mod sex_map;
pub mod smart_reader;
pub mod typed_value;
pub mod verify;

pub use conversion::{ConversionConfig, ConversionSummary, GenotypeTransformer, convert};
pub use error::HaploidizeError;
pub use input::InputFormat;
pub use output::OutputFormat;
pub use ploidy_map::PloidyMap;
pub use report::RunReport;
pub use rewrite::{RewriteStrategy, rewrite};
pub use verify::{VerificationFailure, verify};
