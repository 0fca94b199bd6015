//! Run-level error type. Every variant is fatal for the whole run.

use std::io;

use thiserror::Error;

use crate::genotype_codec::GenotypeCodecError;
use crate::sex_map::SexMapError;
use crate::verify::{LocusId, VerificationFailure};

#[derive(Debug, Error)]
pub enum HaploidizeError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    SexMap(#[from] SexMapError),

    #[error(transparent)]
    Verification(#[from] VerificationFailure),

    #[error("failed to read input")]
    Source(#[source] io::Error),

    #[error("failed to write output")]
    Sink(#[source] io::Error),

    #[error("invalid genotypes at {locus}")]
    Genotype {
        locus: LocusId,
        #[source]
        source: GenotypeCodecError,
    },
}

pub type Result<T> = std::result::Result<T, HaploidizeError>;

impl HaploidizeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) | Self::SexMap(_) => 2,
            Self::Verification(_) => 3,
            Self::Source(_) | Self::Genotype { .. } => 4,
            Self::Sink(_) => 5,
        }
    }
}
