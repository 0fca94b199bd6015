//! Homozygosity check for haploid-designated samples.

use std::fmt;

use thiserror::Error;

use crate::ploidy_map::PloidyMap;
use crate::typed_value::GenotypeCell;

/// Borrowed identity of the variant being checked, used only for reporting.
#[derive(Debug, Clone, Copy)]
pub struct Locus<'a> {
    pub chromosome: &'a str,
    pub position: Option<usize>,
    pub reference: &'a str,
    pub alternates: &'a [String],
}

impl Locus<'_> {
    pub fn to_locus_id(&self) -> LocusId {
        LocusId {
            chromosome: self.chromosome.to_string(),
            position: self.position,
            reference: self.reference.to_string(),
            alternates: self.alternates.to_vec(),
        }
    }
}

/// Owned locus carried by errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocusId {
    pub chromosome: String,
    pub position: Option<usize>,
    pub reference: String,
    pub alternates: Vec<String>,
}

impl fmt::Display for LocusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.chromosome)?;
        match self.position {
            Some(position) => write!(f, "{position}")?,
            None => f.write_str(".")?,
        }
        write!(f, ":{}:{}", self.reference, self.alternates.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert heterozygous to haploid at {locus}:{sample_id}")]
pub struct VerificationFailure {
    pub locus: LocusId,
    pub sample_index: usize,
    pub sample_id: String,
}

/// Confirm every haploid-designated sample carries the same call at every
/// position of its row.
///
/// Samples are scanned in index order and the first mismatching sample is
/// reported. Nothing is mutated.
pub fn verify<T: GenotypeCell>(
    genotypes: &[T],
    stride: usize,
    ploidy: &PloidyMap,
    locus: &Locus<'_>,
    sample_ids: &[String],
) -> Result<(), VerificationFailure> {
    if stride < 2 || ploidy.haploid_count() == 0 {
        return Ok(());
    }

    for (sample, row) in genotypes.chunks_exact(stride).enumerate() {
        if !ploidy.is_haploid(sample) {
            continue;
        }

        let first = row[0];
        if row[1..].iter().any(|&call| call != first) {
            return Err(VerificationFailure {
                locus: locus.to_locus_id(),
                sample_index: sample,
                sample_id: sample_ids
                    .get(sample)
                    .cloned()
                    .unwrap_or_else(|| sample.to_string()),
            });
        }
    }

    Ok(())
}
