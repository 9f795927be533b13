// ==============================================================================
// converter.rs - LD Table to ldmat Conversion Pipeline
// ==============================================================================
// Description: Validates, parses, filters, unifies and encodes one LD table
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::encoder::MatrixEncoder;
use crate::error::{LdmatError, LdmatResult};
use crate::models::{ConversionConfig, MafFilter, PairwiseEntry};
use crate::parsers::{FrequencyTable, PlinkFrqParser, PlinkLdParser};
use crate::unifier::CoordinateIndex;
use crate::validator::FileValidator;

/// Summary of one conversion run
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub input_sha256: String,
    pub input_bytes: u64,
    pub input_compressed: bool,
    pub output: PathBuf,
    pub rows_read: usize,
    pub removed_by_chromosome: usize,
    pub removed_by_maf: usize,
    pub markers: usize,
    pub name_collisions: usize,
    pub pairs_written: usize,
    pub pairs_dropped: usize,
    pub self_pairs: usize,
    pub chromosome: String,
    pub start_locus: i64,
    pub end_locus: i64,
    pub matrix_bytes: u64,
    pub container_bytes: u64,
    pub config: ConversionConfig,
}

/// LD table to ldmat converter
pub struct LdmatConverter {
    config: ConversionConfig,
    validator: FileValidator,
}

impl LdmatConverter {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            validator: FileValidator::new(),
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Main conversion pipeline
    ///
    /// Fails without creating `output` on any error.
    pub fn convert(&self, input: &Path, output: &Path) -> LdmatResult<ConversionReport> {
        self.config.validate()?;

        // 1. Pre-flight checks
        let validated = self.validator.validate_ld_table(input)?;
        if validated.compressed {
            info!("Decompressing gzip input ({} bytes)", validated.size);
        }

        // 2. Parse pairwise LD
        info!("Reading {:?}...", input);
        let table = PlinkLdParser::new().parse(input)?;
        info!("Loaded {} LD pairs", table.rows_read);
        let mut entries = table.entries;

        // 3. Chromosome selection
        let removed_by_chromosome = match &self.config.chromosome {
            Some(chromosome) => retain_counting(&mut entries, |e| e.on_chromosome(chromosome)),
            None => 0,
        };
        if removed_by_chromosome > 0 {
            info!(
                "Removed {} pairs outside chromosome {}",
                removed_by_chromosome,
                self.config.chromosome.as_deref().unwrap_or_default()
            );
        }

        // 4. Minor allele frequency filter
        let removed_by_maf = match &self.config.maf_filter {
            Some(filter) => self.apply_maf_filter(&mut entries, filter, table.has_frequencies)?,
            None => 0,
        };

        // 5. Unify coordinates
        let index = CoordinateIndex::from_entries(&entries, input)?;

        // 6. Fill and write
        info!("Writing {:?}...", output);
        let encoder = MatrixEncoder::new(self.config.max_matrix_bytes, self.config.compression_level);
        let summary = encoder.encode(&index, &entries, output)?;

        info!("Done! Created {:?}", output);

        Ok(ConversionReport {
            input: input.to_path_buf(),
            input_sha256: validated.hash_sha256,
            input_bytes: validated.size,
            input_compressed: validated.compressed,
            output: output.to_path_buf(),
            rows_read: table.rows_read,
            removed_by_chromosome,
            removed_by_maf,
            markers: index.len(),
            name_collisions: index.name_collisions(),
            pairs_written: summary.fill.written,
            pairs_dropped: summary.fill.dropped,
            self_pairs: summary.fill.self_pairs,
            chromosome: summary.root.chromosome,
            start_locus: summary.root.start_locus,
            end_locus: summary.root.end_locus,
            matrix_bytes: summary.matrix_bytes,
            container_bytes: summary.container_bytes,
            config: self.config.clone(),
        })
    }

    fn apply_maf_filter(
        &self,
        entries: &mut Vec<PairwiseEntry>,
        filter: &MafFilter,
        has_frequency_columns: bool,
    ) -> LdmatResult<usize> {
        let removed = match &filter.freq_file {
            Some(freq_file) => {
                info!("Loading allele frequencies from {:?}", freq_file);
                let frequencies = PlinkFrqParser::parse(freq_file)?;
                let removed = retain_counting(entries, |e| {
                    passes_table(&frequencies, filter, &e.marker_a.name)
                        && passes_table(&frequencies, filter, &e.marker_b.name)
                });
                debug!("{} marker frequencies available", frequencies.len());
                removed
            }
            None if has_frequency_columns => retain_counting(entries, |e| {
                e.maf_a.map_or(false, |maf| filter.passes(maf))
                    && e.maf_b.map_or(false, |maf| filter.passes(maf))
            }),
            None => {
                return Err(LdmatError::InvalidConfig(
                    "a minimum MAF needs MAF_A/MAF_B columns or a frequency file".to_string(),
                ))
            }
        };

        if removed > 0 {
            warn!(
                "Removed {} pairs with a marker below MAF {}",
                removed, filter.min_maf
            );
        }
        Ok(removed)
    }
}

fn passes_table(frequencies: &FrequencyTable, filter: &MafFilter, name: &str) -> bool {
    frequencies
        .get(name)
        .map_or(false, |maf| filter.passes(maf))
}

/// `Vec::retain` that reports how many items were removed
fn retain_counting<T>(items: &mut Vec<T>, keep: impl FnMut(&T) -> bool) -> usize {
    let before = items.len();
    items.retain(keep);
    before - items.len()
}
