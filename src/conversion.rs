use std::path::PathBuf;

use noodles::vcf::{
    self,
    header::record::{key, value::Collection},
    variant::RecordBuf,
};

use crate::{
    error::{HaploidizeError, Result},
    genotype_codec::{GenotypeBuffer, GenotypeCodecError},
    input::{self, InputFormat, VariantSource},
    output::{self, OutputFormat, VariantWriter},
    ploidy_map::PloidyMap,
    rewrite::{self, RewriteStrategy},
    sex_map,
    typed_value::GenotypeCell,
    verify::{self, Locus},
};

const VERSION_HEADER_KEY: &str = "haploidizeVersion";

/// Configuration required to drive a conversion.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Input path; `None` or `-` reads stdin.
    pub input: Option<PathBuf>,
    pub input_format: InputFormat,
    /// Output path; `None` or `-` writes stdout.
    pub output: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub sex_map: Option<PathBuf>,
    pub haploid_code: String,
    pub all_haploid: bool,
    pub verify: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            input: None,
            input_format: InputFormat::Auto,
            output: None,
            output_format: OutputFormat::Vcf,
            sex_map: None,
            haploid_code: String::from("0"),
            all_haploid: false,
            verify: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub sample_count: usize,
    pub haploid_samples: usize,
    pub unmatched_sex_map_ids: usize,
    pub total_records: usize,
    pub emitted_records: usize,
    pub collapsed_records: usize,
    pub padded_records: usize,
    pub passthrough_records: usize,
    pub records_without_genotypes: usize,
}

impl ConversionSummary {
    fn record_outcome(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Collapsed => self.collapsed_records += 1,
            RecordOutcome::Padded => self.padded_records += 1,
            RecordOutcome::PassThrough => self.passthrough_records += 1,
            RecordOutcome::NoGenotypes => self.records_without_genotypes += 1,
        }
    }
}

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Collapsed,
    Padded,
    /// No sample is haploid; the record was not touched.
    PassThrough,
    /// The record has no GT field.
    NoGenotypes,
}

impl From<RewriteStrategy> for RecordOutcome {
    fn from(strategy: RewriteStrategy) -> Self {
        match strategy {
            RewriteStrategy::Collapse => Self::Collapsed,
            RewriteStrategy::Pad => Self::Padded,
        }
    }
}

/// Per-run genotype transform: the ploidy map, the sample identifiers used
/// in diagnostics and the reusable decode buffers.
///
/// Records are decoded into 8-bit cells; a record whose allele indices do
/// not fit is retried with 32-bit cells.
pub struct GenotypeTransformer {
    ploidy: PloidyMap,
    sample_ids: Vec<String>,
    verify: bool,
    narrow: GenotypeBuffer<i8>,
    wide: GenotypeBuffer<i32>,
}

impl GenotypeTransformer {
    pub fn new(ploidy: PloidyMap, sample_ids: Vec<String>, verify: bool) -> Self {
        Self {
            ploidy,
            sample_ids,
            verify,
            narrow: GenotypeBuffer::new(),
            wide: GenotypeBuffer::new(),
        }
    }

    /// Verify (when enabled) and rewrite the `GT` field of `record` in place.
    pub fn transform(&mut self, record: &mut RecordBuf) -> Result<RecordOutcome> {
        if self.ploidy.haploid_count() == 0 {
            return Ok(RecordOutcome::PassThrough);
        }

        let narrow = transform_with(
            &mut self.narrow,
            record,
            &self.ploidy,
            &self.sample_ids,
            self.verify,
        );

        match narrow {
            Err(HaploidizeError::Genotype {
                source: GenotypeCodecError::AlleleOutOfRange { .. },
                ..
            }) => transform_with(
                &mut self.wide,
                record,
                &self.ploidy,
                &self.sample_ids,
                self.verify,
            ),
            other => other,
        }
    }
}

fn transform_with<T: GenotypeCell>(
    buffer: &mut GenotypeBuffer<T>,
    record: &mut RecordBuf,
    ploidy: &PloidyMap,
    sample_ids: &[String],
    verify_calls: bool,
) -> Result<RecordOutcome> {
    let decoded = buffer
        .decode(record.samples())
        .map_err(|source| genotype_error(record, source))?;
    if !decoded {
        return Ok(RecordOutcome::NoGenotypes);
    }

    if buffer.sample_count() != ploidy.len() {
        return Err(genotype_error(
            record,
            GenotypeCodecError::SampleCount {
                expected: ploidy.len(),
                found: buffer.sample_count(),
            },
        ));
    }

    let stride = buffer.decoded_stride();
    if verify_calls {
        verify::verify(buffer.cells(), stride, ploidy, &locus_of(record), sample_ids)?;
    }

    let strategy = RewriteStrategy::for_ploidy(ploidy);
    let new_stride = rewrite::rewrite_buffer(buffer.cells_mut(), ploidy)
        .map_err(|source| genotype_error(record, source.into()))?;
    tracing::trace!(?strategy, stride, new_stride, "rewrote genotypes");

    let samples = buffer
        .encode(record.samples())
        .map_err(|source| genotype_error(record, source))?;
    *record.samples_mut() = samples;

    Ok(strategy.into())
}

fn locus_of(record: &RecordBuf) -> Locus<'_> {
    Locus {
        chromosome: record.reference_sequence_name(),
        position: record.variant_start().map(usize::from),
        reference: record.reference_bases(),
        alternates: record.alternate_bases().as_ref(),
    }
}

fn genotype_error(record: &RecordBuf, source: GenotypeCodecError) -> HaploidizeError {
    HaploidizeError::Genotype {
        locus: locus_of(record).to_locus_id(),
        source,
    }
}

/// Build the run's ploidy map from the configuration and the input samples.
/// Returns the map and the sex-map identifiers that matched no sample.
pub fn build_ploidy_map(
    config: &ConversionConfig,
    sample_ids: &[String],
) -> Result<(PloidyMap, Vec<String>)> {
    match (&config.sex_map, config.all_haploid) {
        (Some(_), true) => Err(HaploidizeError::configuration(
            "--all-haploid cannot be combined with --sex-map",
        )),
        (Some(path), false) => {
            let entries = sex_map::load_sex_map(path)?;
            Ok(PloidyMap::from_sex_map(
                sample_ids,
                &entries,
                &config.haploid_code,
            ))
        }
        (None, true) => Ok((PloidyMap::all_haploid(sample_ids.len()), Vec::new())),
        (None, false) => Ok((PloidyMap::diploid(sample_ids.len()), Vec::new())),
    }
}

/// Convert the configured input into haploid output.
pub fn convert(config: &ConversionConfig) -> Result<ConversionSummary> {
    tracing::info!(
        input = ?config.input,
        output = ?config.output,
        output_format = config.output_format.name(),
        verify = config.verify,
        "starting conversion",
    );

    let mut source = input::open_source(config.input.as_deref(), config.input_format)
        .map_err(HaploidizeError::Source)?;

    let sample_ids: Vec<String> = source.header().sample_names().iter().cloned().collect();
    let (ploidy, unmatched) = build_ploidy_map(config, &sample_ids)?;
    tracing::info!(
        samples = ploidy.len(),
        "converting {} samples to haploid",
        ploidy.haploid_count()
    );

    let mut header = source.header().clone();
    insert_other_record(
        &mut header,
        VERSION_HEADER_KEY,
        env!("CARGO_PKG_VERSION").to_string(),
    )?;

    let mut sink = output::open_sink(config.output.as_deref(), config.output_format)
        .map_err(HaploidizeError::Sink)?;
    sink.write_header(&header).map_err(HaploidizeError::Sink)?;

    let mut summary = ConversionSummary {
        sample_count: ploidy.len(),
        haploid_samples: ploidy.haploid_count(),
        unmatched_sex_map_ids: unmatched.len(),
        ..Default::default()
    };

    let mut transformer = GenotypeTransformer::new(ploidy, sample_ids, config.verify);
    process_records(
        &mut source,
        sink.as_mut(),
        &header,
        &mut transformer,
        &mut summary,
    )?;
    sink.finish().map_err(HaploidizeError::Sink)?;

    tracing::info!(
        total = summary.total_records,
        emitted = summary.emitted_records,
        collapsed = summary.collapsed_records,
        padded = summary.padded_records,
        "conversion finished",
    );

    Ok(summary)
}

/// Pull records one at a time, transform them and hand them to `writer`.
/// Stops at the first error.
pub fn process_records<S, W>(
    source: &mut S,
    writer: &mut W,
    header: &vcf::Header,
    transformer: &mut GenotypeTransformer,
    summary: &mut ConversionSummary,
) -> Result<()>
where
    S: VariantSource + ?Sized,
    W: VariantWriter + ?Sized,
{
    let mut record = RecordBuf::default();

    while source
        .next_variant(&mut record)
        .map_err(HaploidizeError::Source)?
    {
        summary.total_records += 1;

        let outcome = transformer.transform(&mut record)?;
        summary.record_outcome(outcome);

        writer
            .write_variant(header, &record)
            .map_err(HaploidizeError::Sink)?;
        summary.emitted_records += 1;
    }

    Ok(())
}

fn insert_other_record(header: &mut vcf::Header, key: &str, value: String) -> Result<()> {
    let key: key::Other = key
        .parse()
        .map_err(|e| HaploidizeError::configuration(format!("invalid header key {key}: {e}")))?;
    header
        .other_records_mut()
        .insert(key, Collection::Unstructured(vec![value]));
    Ok(())
}
