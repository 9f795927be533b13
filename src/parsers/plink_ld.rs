// ==============================================================================
// parsers/plink_ld.rs - PLINK Pairwise LD Table Parser
// ==============================================================================
// Description: Parser for PLINK `--r2` output (.ld), plain text or gzip
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================
// Format: Whitespace-delimited text with one header row
// Example:
//    CHR_A         BP_A        SNP_A  CHR_B         BP_B        SNP_B           R2
//        1        10583  rs58108140      1        10611  rs189107123     0.158
//        1        10583  rs58108140      1        13302  rs180734498     0.0263
// With `--r2 with-freqs`, MAF_A and MAF_B columns are also present.
// ==============================================================================

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::models::{MarkerRecord, PairwiseEntry};

/// Columns every LD table must carry
pub const REQUIRED_COLUMNS: [&str; 7] = ["CHR_A", "BP_A", "SNP_A", "CHR_B", "BP_B", "SNP_B", "R2"];

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors that can occur during LD table parsing
#[derive(Error, Debug)]
pub enum LdParseError {
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

    #[error("File {path:?} is empty (no header row)")]
    EmptyFile { path: PathBuf },
}

/// Parsed LD table
#[derive(Debug, Clone, Default)]
pub struct LdTable {
    pub entries: Vec<PairwiseEntry>,
    /// Data rows read (blank lines excluded)
    pub rows_read: usize,
    /// Whether MAF_A/MAF_B columns were present
    pub has_frequencies: bool,
}

/// Header column positions
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    chr_a: usize,
    bp_a: usize,
    snp_a: usize,
    chr_b: usize,
    bp_b: usize,
    snp_b: usize,
    r2: usize,
    maf: Option<(usize, usize)>,
}

impl ColumnLayout {
    fn from_header(header: &str, path: &Path) -> Result<Self, LdParseError> {
        let names: Vec<&str> = header.split_whitespace().collect();
        let find = |column: &str| -> Result<usize, LdParseError> {
            names
                .iter()
                .position(|name| *name == column)
                .ok_or_else(|| LdParseError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
        };

        let maf_a = names.iter().position(|name| *name == "MAF_A");
        let maf_b = names.iter().position(|name| *name == "MAF_B");

        Ok(Self {
            chr_a: find("CHR_A")?,
            bp_a: find("BP_A")?,
            snp_a: find("SNP_A")?,
            chr_b: find("CHR_B")?,
            bp_b: find("BP_B")?,
            snp_b: find("SNP_B")?,
            r2: find("R2")?,
            maf: maf_a.zip(maf_b),
        })
    }

    fn min_fields(&self) -> usize {
        let mut highest = [self.chr_a, self.bp_a, self.snp_a, self.chr_b, self.bp_b, self.snp_b, self.r2]
            .into_iter()
            .max()
            .unwrap_or(0);
        if let Some((maf_a, maf_b)) = self.maf {
            highest = highest.max(maf_a).max(maf_b);
        }
        highest + 1
    }
}

/// Parser for PLINK pairwise LD tables
#[derive(Debug, Clone, Default)]
pub struct PlinkLdParser;

impl PlinkLdParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse an LD table from disk
    ///
    /// Gzip input is detected by its magic bytes, not its extension.
    /// A header-only file yields an empty table; deciding whether that is
    /// an error belongs to the caller.
    pub fn parse(&self, path: impl AsRef<Path>) -> Result<LdTable, LdParseError> {
        let path = path.as_ref();
        let reader = open_text(path).map_err(|source| LdParseError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_reader(reader, path)
    }

    /// Parse an LD table from any buffered reader; `source` is used in errors
    pub fn parse_reader<R: BufRead>(&self, reader: R, source: &Path) -> Result<LdTable, LdParseError> {
        let mut lines = reader.lines().enumerate();
        let io_err = |e: std::io::Error| LdParseError::IoError {
            path: source.to_path_buf(),
            source: e,
        };

        // Header is the first non-blank line
        let layout = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line.map_err(io_err)?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    break ColumnLayout::from_header(&line, source)?;
                }
                None => {
                    return Err(LdParseError::EmptyFile {
                        path: source.to_path_buf(),
                    })
                }
            }
        };
        debug!("LD table column layout: {:?}", layout);

        let mut table = LdTable {
            has_frequencies: layout.maf.is_some(),
            ..LdTable::default()
        };

        for (idx, line) in lines {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            table.rows_read += 1;
            table
                .entries
                .push(parse_row(&line, idx + 1, &layout, source)?);
        }

        Ok(table)
    }
}

fn parse_row(
    line: &str,
    line_number: usize,
    layout: &ColumnLayout,
    source: &Path,
) -> Result<PairwiseEntry, LdParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let invalid = |details: String| LdParseError::InvalidRow {
        path: source.to_path_buf(),
        line: line_number,
        details,
    };

    if fields.len() < layout.min_fields() {
        return Err(invalid(format!(
            "expected at least {} fields, found {}",
            layout.min_fields(),
            fields.len()
        )));
    }

    let position = |column: &str, value: &str| -> Result<u64, LdParseError> {
        value
            .parse::<u64>()
            .ok()
            .filter(|bp| i64::try_from(*bp).is_ok())
            .ok_or_else(|| invalid(format!("{} is not a valid position: '{}'", column, value)))
    };
    let frequency = |column: &str, value: &str| -> Result<f64, LdParseError> {
        value
            .parse::<f64>()
            .map_err(|_| invalid(format!("{} is not a number: '{}'", column, value)))
    };

    let marker_a = MarkerRecord::new(
        fields[layout.chr_a],
        position("BP_A", fields[layout.bp_a])?,
        fields[layout.snp_a],
    );
    let marker_b = MarkerRecord::new(
        fields[layout.chr_b],
        position("BP_B", fields[layout.bp_b])?,
        fields[layout.snp_b],
    );

    let r2_str = fields[layout.r2];
    let r2 = r2_str
        .parse::<f32>()
        .map_err(|_| invalid(format!("R2 is not a floating-point score: '{}'", r2_str)))?;

    let mut entry = PairwiseEntry::new(marker_a, marker_b, r2);
    if let Some((maf_a, maf_b)) = layout.maf {
        entry = entry.with_frequencies(
            frequency("MAF_A", fields[maf_a])?,
            frequency("MAF_B", fields[maf_b])?,
        );
    }

    Ok(entry)
}

/// Open a text file, transparently decoding gzip
pub(crate) fn open_text(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let read = read_prefix(&mut file, &mut magic)?;
    let file = File::open(path)?;

    if read == GZIP_MAGIC.len() && magic == GZIP_MAGIC {
        debug!("Detected gzip input: {:?}", path);
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn read_prefix(file: &mut File, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = file.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
