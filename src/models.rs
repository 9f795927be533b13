// ==============================================================================
// models.rs - LD Conversion Data Models
// ==============================================================================
// Description: Marker, pairwise LD and configuration types shared by all stages
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{LdmatError, LdmatResult};

/// Default ceiling for the dense matrix (4 GiB ≈ 32,768 markers)
pub const DEFAULT_MAX_MATRIX_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Default gzip level for container datasets
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// A genomic marker (SNP)
///
/// Two markers are the same marker iff chromosome and position match;
/// the name is carried along but takes no part in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerRecord {
    /// Chromosome label as written in the input (e.g., "1", "X")
    pub chromosome: String,
    /// Base pair position
    pub position: u64,
    /// Marker identifier (e.g., "rs12345")
    pub name: String,
}

impl MarkerRecord {
    pub fn new(chromosome: impl Into<String>, position: u64, name: impl Into<String>) -> Self {
        Self {
            chromosome: chromosome.into(),
            position,
            name: name.into(),
        }
    }

    /// Identity key: (chromosome, position)
    pub fn key(&self) -> (&str, u64) {
        (self.chromosome.as_str(), self.position)
    }
}

/// One row of a PLINK `.ld` table
///
/// The relation is symmetric: (a, b, r2) and (b, a, r2) state the same fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairwiseEntry {
    pub marker_a: MarkerRecord,
    pub marker_b: MarkerRecord,
    /// Squared correlation, expected in [0, 1]
    pub r2: f32,
    /// Minor allele frequency of marker A (present with `--r2 with-freqs`)
    pub maf_a: Option<f64>,
    /// Minor allele frequency of marker B
    pub maf_b: Option<f64>,
}

impl PairwiseEntry {
    pub fn new(marker_a: MarkerRecord, marker_b: MarkerRecord, r2: f32) -> Self {
        Self {
            marker_a,
            marker_b,
            r2,
            maf_a: None,
            maf_b: None,
        }
    }

    pub fn with_frequencies(mut self, maf_a: f64, maf_b: f64) -> Self {
        self.maf_a = Some(maf_a);
        self.maf_b = Some(maf_b);
        self
    }

    /// Whether both sides sit on `chromosome`
    pub fn on_chromosome(&self, chromosome: &str) -> bool {
        self.marker_a.chromosome == chromosome && self.marker_b.chromosome == chromosome
    }
}

/// Minor-allele-frequency filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MafFilter {
    /// Markers with MAF below this value are removed (range 0.0-0.5)
    pub min_maf: f64,
    /// PLINK `.frq` table; when absent, MAF_A/MAF_B columns of the LD table are used
    pub freq_file: Option<PathBuf>,
}

impl MafFilter {
    pub fn passes(&self, maf: f64) -> bool {
        maf >= self.min_maf
    }
}

/// Settings for one conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    pub maf_filter: Option<MafFilter>,
    /// Restrict the conversion to pairs lying entirely on this chromosome
    pub chromosome: Option<String>,
    /// Upper bound on N×N×4 bytes for the dense matrix
    pub max_matrix_bytes: u64,
    /// Gzip level for datasets, 0 stores them uncompressed
    pub compression_level: u32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            maf_filter: None,
            chromosome: None,
            max_matrix_bytes: DEFAULT_MAX_MATRIX_BYTES,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ConversionConfig {
    pub fn with_maf_filter(mut self, filter: MafFilter) -> Self {
        self.maf_filter = Some(filter);
        self
    }

    pub fn with_chromosome(mut self, chromosome: impl Into<String>) -> Self {
        self.chromosome = Some(chromosome.into());
        self
    }

    pub fn with_max_matrix_bytes(mut self, bytes: u64) -> Self {
        self.max_matrix_bytes = bytes;
        self
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Reject settings that can never produce a valid conversion
    pub fn validate(&self) -> LdmatResult<()> {
        if let Some(filter) = &self.maf_filter {
            if !filter.min_maf.is_finite() || !(0.0..=0.5).contains(&filter.min_maf) {
                return Err(LdmatError::InvalidConfig(format!(
                    "minimum MAF must be within 0.0-0.5, got {}",
                    filter.min_maf
                )));
            }
        }

        if self.compression_level > 9 {
            return Err(LdmatError::InvalidConfig(format!(
                "compression level must be within 0-9, got {}",
                self.compression_level
            )));
        }

        if let Some(chromosome) = &self.chromosome {
            if chromosome.trim().is_empty() {
                return Err(LdmatError::InvalidConfig(
                    "chromosome filter must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_identity_ignores_name() {
        let a = MarkerRecord::new("1", 100, "rs1");
        let b = MarkerRecord::new("1", 100, "rs1_alt");
        let c = MarkerRecord::new("2", 100, "rs1");

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_pair_on_chromosome() {
        let pair = PairwiseEntry::new(
            MarkerRecord::new("1", 100, "rs1"),
            MarkerRecord::new("2", 200, "rs2"),
            0.5,
        );
        assert!(!pair.on_chromosome("1"));
        assert!(!pair.on_chromosome("2"));
    }

    #[test]
    fn test_config_validation() {
        assert!(ConversionConfig::default().validate().is_ok());

        let bad_maf = ConversionConfig::default().with_maf_filter(MafFilter {
            min_maf: 0.7,
            freq_file: None,
        });
        assert!(matches!(bad_maf.validate(), Err(LdmatError::InvalidConfig(_))));

        let bad_level = ConversionConfig::default().with_compression_level(12);
        assert!(bad_level.validate().is_err());

        let blank_chr = ConversionConfig::default().with_chromosome("  ");
        assert!(blank_chr.validate().is_err());
    }

    #[test]
    fn test_maf_filter_passes() {
        let filter = MafFilter {
            min_maf: 0.05,
            freq_file: None,
        };
        assert!(filter.passes(0.05));
        assert!(filter.passes(0.3));
        assert!(!filter.passes(0.01));
    }
}
