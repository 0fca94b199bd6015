//! Conversion between a record's `GT` sample field and a flat, row-major
//! genotype buffer.
//!
//! Rows shorter than the record's widest genotype are padded with
//! end-of-vector. Per-allele phasing is kept in a side table so a rewritten
//! buffer re-encodes with its original separators.

use noodles::vcf::variant::{
    record::samples::{keys::key as format_key, series::value::genotype::Phasing},
    record_buf::{
        Samples,
        samples::{
            Keys,
            sample::{
                Value as SampleValue,
                value::{
                    Genotype,
                    genotype::{Allele, ParseError},
                },
            },
        },
    },
};
use thiserror::Error;

use crate::rewrite::{self, GenotypeShapeError};
use crate::typed_value::GenotypeCell;

#[derive(Debug, Error)]
pub enum GenotypeCodecError {
    #[error("record has no GT field")]
    MissingGenotypeKey,
    #[error("allele index {index} does not fit the genotype cell width")]
    AlleleOutOfRange { index: usize },
    #[error("invalid genotype '{value}'")]
    InvalidGenotype {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("GT value is neither a genotype nor a string")]
    UnexpectedType,
    #[error("record has {found} samples, header declares {expected}")]
    SampleCount { expected: usize, found: usize },
    #[error(transparent)]
    Shape(#[from] GenotypeShapeError),
}

/// Index of `GT` among the record's FORMAT keys.
pub fn genotype_key_index(keys: &Keys) -> Option<usize> {
    keys.as_ref().iter().position(|key| key == format_key::GENOTYPE)
}

/// Reusable decode target for one record at a time.
#[derive(Debug, Clone)]
pub struct GenotypeBuffer<T> {
    cells: Vec<T>,
    phasing: Vec<Phasing>,
    decoded_stride: usize,
    sample_count: usize,
    scratch: Vec<(Option<usize>, Phasing)>,
    row_lengths: Vec<usize>,
}

impl<T: GenotypeCell> Default for GenotypeBuffer<T> {
    fn default() -> Self {
        Self {
            cells: Vec::new(),
            phasing: Vec::new(),
            decoded_stride: 0,
            sample_count: 0,
            scratch: Vec::new(),
            row_lengths: Vec::new(),
        }
    }
}

impl<T: GenotypeCell> GenotypeBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut Vec<T> {
        &mut self.cells
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Calls per sample as decoded, before any rewrite.
    pub fn decoded_stride(&self) -> usize {
        self.decoded_stride
    }

    /// Fill the buffer from `samples`. Returns `false`, leaving the buffer
    /// empty, when the record carries no `GT` field.
    pub fn decode(&mut self, samples: &Samples) -> Result<bool, GenotypeCodecError> {
        self.cells.clear();
        self.phasing.clear();
        self.scratch.clear();
        self.row_lengths.clear();
        self.decoded_stride = 0;
        self.sample_count = 0;

        let Some(gt_index) = genotype_key_index(samples.keys()) else {
            return Ok(false);
        };

        for sample in samples.values() {
            let value = sample.values().get(gt_index).and_then(Option::as_ref);
            let start = self.scratch.len();
            collect_alleles(value, &mut self.scratch)?;
            self.row_lengths.push(self.scratch.len() - start);
        }

        let stride = self.row_lengths.iter().copied().max().unwrap_or(0);
        self.sample_count = self.row_lengths.len();
        self.cells.reserve(stride * self.sample_count);
        self.phasing.reserve(stride * self.sample_count);

        let mut alleles = self.scratch.iter();
        for &len in &self.row_lengths {
            for &(position, phasing) in alleles.by_ref().take(len) {
                let cell = match position {
                    Some(index) => T::from_allele(index)
                        .ok_or(GenotypeCodecError::AlleleOutOfRange { index })?,
                    None => T::missing(),
                };
                self.cells.push(cell);
                self.phasing.push(phasing);
            }

            for _ in len..stride {
                self.cells.push(T::end_of_vector());
                self.phasing.push(Phasing::Unphased);
            }
        }

        self.decoded_stride = stride;
        Ok(true)
    }

    /// Build a copy of `samples` whose `GT` field reflects the current
    /// buffer contents. Every other field is carried over unchanged.
    pub fn encode(&self, samples: &Samples) -> Result<Samples, GenotypeCodecError> {
        let gt_index =
            genotype_key_index(samples.keys()).ok_or(GenotypeCodecError::MissingGenotypeKey)?;
        let stride = rewrite::stride(self.cells.len(), self.sample_count)?;

        let mut values = Vec::with_capacity(self.sample_count);
        for (sample_index, sample) in samples.values().enumerate() {
            let mut fields = sample.values().to_vec();
            if fields.len() <= gt_index {
                fields.resize(gt_index + 1, None);
            }

            let start = sample_index * stride;
            let row = self.cells.get(start..start + stride).unwrap_or_default();
            fields[gt_index] = self.row_genotype(sample_index, row).map(SampleValue::from);
            values.push(fields);
        }

        Ok(Samples::new(samples.keys().clone(), values))
    }

    fn row_genotype(&self, sample_index: usize, row: &[T]) -> Option<Genotype> {
        let phasing_offset = sample_index * self.decoded_stride;
        let mut genotype = Genotype::default();
        {
            let alleles = genotype.as_mut();
            for (offset, &cell) in row.iter().enumerate() {
                if cell.is_end_of_vector() {
                    break;
                }
                let phasing = self
                    .phasing
                    .get(phasing_offset + offset)
                    .copied()
                    .unwrap_or(Phasing::Unphased);
                alleles.push(Allele::new(cell.to_allele(), phasing));
            }
        }

        if genotype.as_ref().is_empty() {
            None
        } else {
            Some(genotype)
        }
    }
}

fn collect_alleles(
    value: Option<&SampleValue>,
    out: &mut Vec<(Option<usize>, Phasing)>,
) -> Result<(), GenotypeCodecError> {
    match value {
        None => Ok(()),
        Some(SampleValue::Genotype(genotype)) => {
            push_alleles(genotype, out);
            Ok(())
        }
        Some(SampleValue::String(raw)) => {
            let genotype: Genotype =
                raw.parse()
                    .map_err(|source| GenotypeCodecError::InvalidGenotype {
                        value: raw.clone(),
                        source,
                    })?;
            push_alleles(&genotype, out);
            Ok(())
        }
        Some(_) => Err(GenotypeCodecError::UnexpectedType),
    }
}

fn push_alleles(genotype: &Genotype, out: &mut Vec<(Option<usize>, Phasing)>) {
    out.extend(
        genotype
            .as_ref()
            .iter()
            .map(|allele| (allele.position(), allele.phasing())),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const EOV: i8 = -127;
    const MISSING: i8 = -128;

    fn genotype(alleles: &[(Option<usize>, Phasing)]) -> SampleValue {
        let mut genotype = Genotype::default();
        for &(position, phasing) in alleles {
            genotype.as_mut().push(Allele::new(position, phasing));
        }
        SampleValue::from(genotype)
    }

    fn unphased(positions: &[Option<usize>]) -> SampleValue {
        let alleles: Vec<_> = positions.iter().map(|&p| (p, Phasing::Unphased)).collect();
        genotype(&alleles)
    }

    fn gt_samples(values: Vec<Option<SampleValue>>) -> Samples {
        let keys: Keys = [String::from(format_key::GENOTYPE)].into_iter().collect();
        Samples::new(keys, values.into_iter().map(|v| vec![v]).collect())
    }

    fn positions(samples: &Samples) -> Vec<Option<Vec<Option<usize>>>> {
        samples
            .values()
            .map(|sample| match sample.values().first().and_then(Option::as_ref) {
                Some(SampleValue::Genotype(genotype)) => Some(
                    genotype
                        .as_ref()
                        .iter()
                        .map(|allele| allele.position())
                        .collect(),
                ),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn decodes_rows_and_pads_short_ones() {
        let samples = gt_samples(vec![
            Some(unphased(&[Some(0), Some(1)])),
            Some(unphased(&[Some(1)])),
            Some(unphased(&[None, None])),
            None,
        ]);

        let mut buffer = GenotypeBuffer::<i8>::new();
        assert!(buffer.decode(&samples).unwrap());
        assert_eq!(buffer.decoded_stride(), 2);
        assert_eq!(buffer.sample_count(), 4);
        assert_eq!(
            buffer.cells(),
            &[0, 1, 1, EOV, MISSING, MISSING, EOV, EOV]
        );
    }

    #[test]
    fn missing_gt_key_decodes_to_nothing() {
        let keys: Keys = [String::from("DP")].into_iter().collect();
        let samples = Samples::new(keys, vec![vec![Some(SampleValue::from(7))]]);

        let mut buffer = GenotypeBuffer::<i8>::new();
        assert!(!buffer.decode(&samples).unwrap());
        assert!(buffer.cells().is_empty());
        assert!(matches!(
            buffer.encode(&samples),
            Err(GenotypeCodecError::MissingGenotypeKey)
        ));
    }

    #[test]
    fn encode_truncates_at_end_of_vector() {
        let samples = gt_samples(vec![
            Some(unphased(&[Some(1), Some(1)])),
            Some(unphased(&[Some(0), Some(1)])),
        ]);
        let mut buffer = GenotypeBuffer::<i8>::new();
        buffer.decode(&samples).unwrap();
        buffer.cells_mut()[1] = EOV;

        let encoded = buffer.encode(&samples).unwrap();
        assert_eq!(
            positions(&encoded),
            vec![Some(vec![Some(1)]), Some(vec![Some(0), Some(1)])]
        );
    }

    #[test]
    fn encode_after_collapse_uses_stride_one() {
        let samples = gt_samples(vec![
            Some(unphased(&[Some(2), Some(2)])),
            Some(unphased(&[None, None])),
        ]);
        let mut buffer = GenotypeBuffer::<i32>::new();
        buffer.decode(&samples).unwrap();
        *buffer.cells_mut() = vec![2, i32::MIN];

        let encoded = buffer.encode(&samples).unwrap();
        assert_eq!(positions(&encoded), vec![Some(vec![Some(2)]), Some(vec![None])]);
    }

    #[test]
    fn encode_keeps_phasing_and_other_fields() {
        let keys: Keys = [String::from(format_key::GENOTYPE), String::from("DP")]
            .into_iter()
            .collect();
        let phased = genotype(&[(Some(0), Phasing::Phased), (Some(1), Phasing::Phased)]);
        let samples = Samples::new(keys, vec![vec![Some(phased), Some(SampleValue::from(12))]]);

        let mut buffer = GenotypeBuffer::<i8>::new();
        buffer.decode(&samples).unwrap();
        let encoded = buffer.encode(&samples).unwrap();

        let sample = encoded.values().next().unwrap();
        let fields = sample.values();
        assert_eq!(fields[1], Some(SampleValue::from(12)));
        match fields[0].as_ref() {
            Some(SampleValue::Genotype(genotype)) => {
                let phasing: Vec<_> = genotype.as_ref().iter().map(|a| a.phasing()).collect();
                assert_eq!(phasing, vec![Phasing::Phased, Phasing::Phased]);
            }
            other => panic!("expected genotype, got {other:?}"),
        }
    }

    #[test]
    fn empty_rows_encode_as_missing_field() {
        let samples = gt_samples(vec![None, Some(unphased(&[Some(0)]))]);
        let mut buffer = GenotypeBuffer::<i8>::new();
        buffer.decode(&samples).unwrap();
        assert_eq!(buffer.cells(), &[EOV, 0]);

        let encoded = buffer.encode(&samples).unwrap();
        assert_eq!(positions(&encoded), vec![None, Some(vec![Some(0)])]);
    }

    #[test]
    fn string_genotypes_are_decoded() {
        let samples = gt_samples(vec![
            Some(SampleValue::String(String::from("0|1"))),
            Some(SampleValue::String(String::from("."))),
        ]);
        let mut buffer = GenotypeBuffer::<i8>::new();
        buffer.decode(&samples).unwrap();
        assert_eq!(buffer.cells(), &[0, 1, MISSING, EOV]);
    }

    #[test]
    fn string_genotypes_keep_explicit_phasing() {
        let samples = gt_samples(vec![
            Some(SampleValue::String(String::from("|0/1"))),
            Some(SampleValue::String(String::from("/1|2"))),
            Some(SampleValue::String(String::from("0"))),
        ]);
        let mut buffer = GenotypeBuffer::<i8>::new();
        buffer.decode(&samples).unwrap();
        assert_eq!(buffer.decoded_stride(), 2);
        assert_eq!(buffer.cells(), &[0, 1, 1, 2, 0, EOV]);

        let encoded = buffer.encode(&samples).unwrap();
        let phasing: Vec<Vec<Phasing>> = encoded
            .values()
            .map(|sample| match sample.values()[0].as_ref() {
                Some(SampleValue::Genotype(genotype)) => {
                    genotype.as_ref().iter().map(|a| a.phasing()).collect()
                }
                other => panic!("expected genotype, got {other:?}"),
            })
            .collect();
        assert_eq!(
            phasing,
            vec![
                vec![Phasing::Phased, Phasing::Unphased],
                vec![Phasing::Unphased, Phasing::Phased],
                vec![Phasing::Phased],
            ]
        );
    }

    #[test]
    fn unparseable_string_genotype_is_rejected() {
        let samples = gt_samples(vec![Some(SampleValue::String(String::from("0/x")))]);
        let mut buffer = GenotypeBuffer::<i8>::new();
        assert!(matches!(
            buffer.decode(&samples),
            Err(GenotypeCodecError::InvalidGenotype { ref value, .. }) if value == "0/x"
        ));
    }

    #[test]
    fn oversized_allele_index_is_rejected() {
        let samples = gt_samples(vec![Some(unphased(&[Some(300), Some(0)]))]);
        let mut buffer = GenotypeBuffer::<i8>::new();
        assert!(matches!(
            buffer.decode(&samples),
            Err(GenotypeCodecError::AlleleOutOfRange { index: 300 })
        ));

        let mut wide = GenotypeBuffer::<i32>::new();
        assert!(wide.decode(&samples).is_ok());
    }
}
