//! In-place rewriting of a flat genotype array to haploid layout.

use thiserror::Error;

use crate::ploidy_map::PloidyMap;
use crate::typed_value::{GenotypeCell, end_of_vector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("genotype array of {len} cells does not divide evenly among {sample_count} samples")]
pub struct GenotypeShapeError {
    pub len: usize,
    pub sample_count: usize,
}

/// Layout produced for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStrategy {
    /// Every sample is haploid: keep the first call of each row, stride 1.
    Collapse,
    /// Some samples stay diploid: keep the stride and pad haploid rows with
    /// end-of-vector after their first call.
    Pad,
}

impl RewriteStrategy {
    pub fn for_ploidy(ploidy: &PloidyMap) -> Self {
        if ploidy.is_all_haploid() {
            Self::Collapse
        } else {
            Self::Pad
        }
    }
}

/// Calls per sample for an array of `len` cells.
pub fn stride(len: usize, sample_count: usize) -> Result<usize, GenotypeShapeError> {
    let shape_error = GenotypeShapeError { len, sample_count };
    if sample_count == 0 {
        return if len == 0 { Ok(0) } else { Err(shape_error) };
    }
    if len % sample_count != 0 {
        return Err(shape_error);
    }
    Ok(len / sample_count)
}

/// Rewrite `genotypes` for the haploid samples in `ploidy` and return the
/// number of leading cells that make up the result.
///
/// Collapsing compacts in place, so the caller truncates its storage to the
/// returned length. Padding never changes the length.
pub fn rewrite<T: GenotypeCell>(
    genotypes: &mut [T],
    ploidy: &PloidyMap,
) -> Result<usize, GenotypeShapeError> {
    let sample_count = ploidy.len();
    let stride = stride(genotypes.len(), sample_count)?;
    if stride == 0 {
        return Ok(genotypes.len());
    }

    match RewriteStrategy::for_ploidy(ploidy) {
        RewriteStrategy::Collapse => {
            // i * stride >= i, so the source cell is never already overwritten
            for sample in 0..sample_count {
                genotypes[sample] = genotypes[sample * stride];
            }
            Ok(sample_count)
        }
        RewriteStrategy::Pad => {
            let eov = end_of_vector::<T>();
            for sample in ploidy.haploid_samples() {
                let row = &mut genotypes[sample * stride..(sample + 1) * stride];
                row[1..].fill(eov);
            }
            Ok(genotypes.len())
        }
    }
}

/// [`rewrite`] over an owned buffer, truncated to the result. Returns the
/// new stride.
pub fn rewrite_buffer<T: GenotypeCell>(
    genotypes: &mut Vec<T>,
    ploidy: &PloidyMap,
) -> Result<usize, GenotypeShapeError> {
    let len = rewrite(genotypes.as_mut_slice(), ploidy)?;
    genotypes.truncate(len);
    stride(len, ploidy.len())
}
