//! Tab-delimited sex map loading.
//!
//! Each line holds a sample identifier and a ploidy code; further fields are
//! ignored. A line with fewer than two fields makes the whole map unusable.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SexMapError {
    #[error("failed to open sex map {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read sex map line {line}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("malformed sex map at line {line}: expected at least two tab-separated fields")]
    Malformed { line: usize },
}

/// One `(sample_id, code)` line of a sex map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SexMapEntry {
    pub sample_id: String,
    pub code: String,
}

impl SexMapEntry {
    pub fn is_haploid(&self, haploid_code: &str) -> bool {
        self.code == haploid_code
    }
}

pub fn load_sex_map<P: AsRef<Path>>(path: P) -> Result<Vec<SexMapEntry>, SexMapError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SexMapError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_sex_map(BufReader::new(file))
}

pub fn read_sex_map<R: BufRead>(reader: R) -> Result<Vec<SexMapEntry>, SexMapError> {
    let mut entries = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line.map_err(|source| SexMapError::Read {
            line: line_number,
            source,
        })?;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        let mut fields = line.split('\t');
        let (Some(sample_id), Some(code)) = (fields.next(), fields.next()) else {
            return Err(SexMapError::Malformed { line: line_number });
        };

        entries.push(SexMapEntry {
            sample_id: sample_id.to_string(),
            code: code.to_string(),
        });
    }

    tracing::debug!(entries = entries.len(), "loaded sex map");
    Ok(entries)
}
