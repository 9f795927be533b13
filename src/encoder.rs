// ==============================================================================
// encoder.rs - Matrix Encoder
// ==============================================================================
// Description: Builds the dense LD matrix and writes the ldmat container
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================

use std::path::Path;
use tracing::info;

use crate::container::format::{chunk_name, ChunkAttributes, RootAttributes};
use crate::container::writer::{ChunkPayload, LdmatWriter};
use crate::error::LdmatResult;
use crate::matrix::{FillStats, LdMatrix};
use crate::models::{PairwiseEntry, DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_MATRIX_BYTES};
use crate::unifier::CoordinateIndex;

/// What the encoder produced
#[derive(Debug, Clone)]
pub struct EncodeSummary {
    pub fill: FillStats,
    pub root: RootAttributes,
    pub chunk_name: String,
    pub matrix_bytes: u64,
    pub container_bytes: u64,
}

/// Fills the dense matrix over a CoordinateIndex and persists it
#[derive(Debug, Clone, Copy)]
pub struct MatrixEncoder {
    max_matrix_bytes: u64,
    compression_level: u32,
}

impl Default for MatrixEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MATRIX_BYTES, DEFAULT_COMPRESSION_LEVEL)
    }
}

impl MatrixEncoder {
    pub fn new(max_matrix_bytes: u64, compression_level: u32) -> Self {
        Self {
            max_matrix_bytes,
            compression_level,
        }
    }

    /// Build the matrix without writing it
    pub fn build_matrix(
        &self,
        index: &CoordinateIndex,
        entries: &[PairwiseEntry],
    ) -> LdmatResult<(LdMatrix, FillStats)> {
        let mut matrix = LdMatrix::allocate(index.len(), self.max_matrix_bytes)?;
        let stats = matrix.fill(index, entries);
        Ok((matrix, stats))
    }

    /// Build the matrix and write a single-chunk container to `output`
    pub fn encode(
        &self,
        index: &CoordinateIndex,
        entries: &[PairwiseEntry],
        output: &Path,
    ) -> LdmatResult<EncodeSummary> {
        let (matrix, fill) = self.build_matrix(index, entries)?;

        // Positions were range-checked against i64 when parsed
        let positions: Vec<i64> = index.positions().map(|p| p as i64).collect();
        let names: Vec<&str> = index.names().collect();

        let start_locus = index.start_locus() as i64;
        let end_locus = index.end_locus() as i64;
        let root = RootAttributes::new(index.chromosome(), start_locus, end_locus);
        let name = chunk_name(start_locus);

        info!(
            "Chromosome: {}, range: {}-{}",
            root.chromosome, start_locus, end_locus
        );

        let container_bytes = LdmatWriter::new(self.compression_level).write(
            output,
            &root,
            &[ChunkPayload {
                name: &name,
                attributes: ChunkAttributes {
                    start_locus,
                    end_locus,
                },
                ld_values: &matrix,
                positions: &positions,
                names: &names,
            }],
        )?;

        Ok(EncodeSummary {
            fill,
            root,
            chunk_name: name,
            matrix_bytes: matrix.byte_len(),
            container_bytes,
        })
    }
}
