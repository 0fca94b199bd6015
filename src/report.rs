//! Structured run report for downstream tool consumption.

use std::path::Path;

use serde::Serialize;

use crate::conversion::{ConversionConfig, ConversionSummary};

/// Complete report of a conversion run, serialized to JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Tool version
    pub version: String,
    /// Timestamp of run (RFC 3339)
    pub timestamp: String,

    pub input: String,
    pub output: OutputInfo,
    pub ploidy: PloidyInfo,
    pub verify: bool,

    pub statistics: Statistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputInfo {
    pub path: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PloidyInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex_map: Option<String>,
    pub haploid_code: String,
    pub all_haploid: bool,
    pub sample_count: usize,
    pub haploid_samples: usize,
    pub unmatched_sex_map_ids: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_records: usize,
    pub emitted_records: usize,
    pub collapsed_records: usize,
    pub padded_records: usize,
    pub passthrough_records: usize,
    pub records_without_genotypes: usize,
}

impl From<&ConversionSummary> for Statistics {
    fn from(s: &ConversionSummary) -> Self {
        Statistics {
            total_records: s.total_records,
            emitted_records: s.emitted_records,
            collapsed_records: s.collapsed_records,
            padded_records: s.padded_records,
            passthrough_records: s.passthrough_records,
            records_without_genotypes: s.records_without_genotypes,
        }
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map_or_else(|| String::from("-"), |p| p.display().to_string())
}

impl RunReport {
    pub fn new(config: &ConversionConfig, summary: &ConversionSummary) -> Self {
        let timestamp = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());

        RunReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp,
            input: display_path(config.input.as_deref()),
            output: OutputInfo {
                path: display_path(config.output.as_deref()),
                format: config.output_format.name().to_string(),
            },
            ploidy: PloidyInfo {
                sex_map: config
                    .sex_map
                    .as_ref()
                    .map(|path| path.display().to_string()),
                haploid_code: config.haploid_code.clone(),
                all_haploid: config.all_haploid,
                sample_count: summary.sample_count,
                haploid_samples: summary.haploid_samples,
                unmatched_sex_map_ids: summary.unmatched_sex_map_ids,
            },
            verify: config.verify,
            statistics: Statistics::from(summary),
        }
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        tracing::info!("wrote run report to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn report_serializes_statistics() {
        let config = ConversionConfig {
            input: Some(PathBuf::from("in.vcf")),
            sex_map: Some(PathBuf::from("sex.tsv")),
            ..Default::default()
        };
        let summary = ConversionSummary {
            sample_count: 3,
            haploid_samples: 1,
            total_records: 10,
            emitted_records: 10,
            padded_records: 10,
            ..Default::default()
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        RunReport::new(&config, &summary).write(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["input"], "in.vcf");
        assert_eq!(json["output"]["path"], "-");
        assert_eq!(json["output"]["format"], "vcf");
        assert_eq!(json["ploidy"]["haploid_samples"], 1);
        assert_eq!(json["ploidy"]["sex_map"], "sex.tsv");
        assert_eq!(json["statistics"]["padded_records"], 10);
    }
}
