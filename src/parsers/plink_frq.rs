// ==============================================================================
// parsers/plink_frq.rs - PLINK Allele Frequency Parser
// ==============================================================================
// Description: Per-marker minor allele frequencies from PLINK .frq / .afreq
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================
// Format (PLINK 1.9 --freq):
//    CHR          SNP   A1   A2          MAF  NCHROBS
//      1   rs58108140    A    G       0.1627      758
// Format (PLINK 2 --freq):
//   #CHROM  ID          REF  ALT  ALT_FREQS  OBS_CT
//   1       rs58108140  G    A    0.1627     758
// ==============================================================================

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::plink_ld::open_text;

/// Errors that can occur during frequency table parsing
#[derive(Error, Debug)]
pub enum FrqParseError {
    #[error("IO error reading {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Required column '{column}' missing from header of {path:?}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid row at line {line} of {path:?}: {details}")]
    InvalidRow {
        path: PathBuf,
        line: usize,
        details: String,
    },
}

/// Which frequency column the table carries
#[derive(Debug, Clone, Copy, PartialEq)]
enum FrequencyColumn {
    /// Already folded to the minor allele
    Minor(usize),
    /// Alternate allele frequency, folded on read
    Alternate(usize),
}

/// Minor allele frequency per marker name
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    by_name: HashMap<String, f64>,
}

impl FrequencyTable {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, maf: f64) {
        self.by_name.insert(name.into(), maf);
    }
}

/// Parser for PLINK frequency reports
pub struct PlinkFrqParser;

impl PlinkFrqParser {
    /// Parse a `.frq` or `.afreq` file (plain or gzip)
    pub fn parse(path: impl AsRef<Path>) -> Result<FrequencyTable, FrqParseError> {
        let path = path.as_ref();
        let reader = open_text(path).map_err(|source| FrqParseError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_reader(reader, path)
    }

    pub fn parse_reader<R: BufRead>(reader: R, source: &Path) -> Result<FrequencyTable, FrqParseError> {
        let mut table = FrequencyTable::default();
        let mut layout: Option<(usize, FrequencyColumn)> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| FrqParseError::IoError {
                path: source.to_path_buf(),
                source: e,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let (name_col, freq_col) = match layout {
                Some(layout) => layout,
                None => {
                    layout = Some(Self::header_layout(&fields, source)?);
                    continue;
                }
            };

            let freq_idx = match freq_col {
                FrequencyColumn::Minor(i) | FrequencyColumn::Alternate(i) => i,
            };
            let invalid = |details: String| FrqParseError::InvalidRow {
                path: source.to_path_buf(),
                line: idx + 1,
                details,
            };

            if fields.len() <= name_col.max(freq_idx) {
                return Err(invalid(format!("too few fields ({})", fields.len())));
            }

            // PLINK writes NA for markers with no observed alleles
            if fields[freq_idx].eq_ignore_ascii_case("na") {
                continue;
            }
            let value: f64 = fields[freq_idx]
                .parse()
                .map_err(|_| invalid(format!("frequency is not a number: '{}'", fields[freq_idx])))?;
            if value.is_nan() {
                continue;
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("frequency out of range: {}", value)));
            }

            let maf = match freq_col {
                FrequencyColumn::Minor(_) => value,
                FrequencyColumn::Alternate(_) => value.min(1.0 - value),
            };
            table.insert(fields[name_col], maf);
        }

        if layout.is_none() {
            return Err(FrqParseError::MissingColumn {
                path: source.to_path_buf(),
                column: "SNP".to_string(),
            });
        }

        debug!("Loaded {} marker frequencies from {:?}", table.len(), source);
        Ok(table)
    }

    fn header_layout(
        fields: &[&str],
        source: &Path,
    ) -> Result<(usize, FrequencyColumn), FrqParseError> {
        let position = |names: &[&str]| fields.iter().position(|f| names.contains(f));

        let name_col = position(&["SNP", "ID"]).ok_or_else(|| FrqParseError::MissingColumn {
            path: source.to_path_buf(),
            column: "SNP".to_string(),
        })?;

        let freq_col = if let Some(i) = position(&["MAF"]) {
            FrequencyColumn::Minor(i)
        } else if let Some(i) = position(&["ALT_FREQS"]) {
            FrequencyColumn::Alternate(i)
        } else {
            return Err(FrqParseError::MissingColumn {
                path: source.to_path_buf(),
                column: "MAF".to_string(),
            });
        };

        Ok((name_col, freq_col))
    }
}
