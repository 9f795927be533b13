// ==============================================================================
// matrix.rs - Dense Symmetric LD Matrix
// ==============================================================================
// Description: N×N float32 LD matrix filled from sparse pairwise measurements
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================
// Memory: N² × 4 bytes, allocated once and never resized. The allocation is
// checked against a configured ceiling before anything is reserved.
// ==============================================================================

use tracing::{debug, info, warn};

use crate::error::{LdmatError, LdmatResult};
use crate::models::PairwiseEntry;
use crate::unifier::CoordinateIndex;

const CELL_BYTES: u64 = std::mem::size_of::<f32>() as u64;

/// Bytes needed for an N×N float32 matrix, None on overflow
pub fn required_bytes(markers: usize) -> Option<u64> {
    let n = u64::try_from(markers).ok()?;
    n.checked_mul(n)?.checked_mul(CELL_BYTES)
}

/// Largest N whose matrix fits in `limit` bytes
pub fn max_markers_for(limit: u64) -> usize {
    let cells = limit / CELL_BYTES;
    let mut n = (cells as f64).sqrt() as u64;
    // Correct float rounding at the boundary
    while n.saturating_mul(n) > cells {
        n -= 1;
    }
    while (n + 1).saturating_mul(n + 1) <= cells {
        n += 1;
    }
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Outcome of filling the matrix from pairs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    /// Pairs written to both [i, j] and [j, i]
    pub written: usize,
    /// Pairs naming a marker absent from the index
    pub dropped: usize,
    /// Pairs of a marker with itself (the diagonal stays 1.0)
    pub self_pairs: usize,
}

/// Dense symmetric LD matrix, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct LdMatrix {
    n: usize,
    values: Vec<f32>,
}

impl LdMatrix {
    /// Allocate an N×N matrix of zeros with a unit diagonal
    ///
    /// # Errors
    /// * `Allocation` - N² × 4 bytes exceeds `max_bytes` or the allocator refuses
    pub fn allocate(n: usize, max_bytes: u64) -> LdmatResult<Self> {
        let bytes = required_bytes(n).ok_or(LdmatError::Allocation {
            markers: n,
            bytes: u64::MAX,
            limit: max_bytes,
        })?;

        if bytes > max_bytes {
            warn!(
                "{} markers exceed the matrix limit (at most {} markers for {} bytes)",
                n,
                max_markers_for(max_bytes),
                max_bytes
            );
            return Err(LdmatError::Allocation {
                markers: n,
                bytes,
                limit: max_bytes,
            });
        }

        let cells = n * n;
        let mut values: Vec<f32> = Vec::new();
        values
            .try_reserve_exact(cells)
            .map_err(|_| LdmatError::Allocation {
                markers: n,
                bytes,
                limit: max_bytes,
            })?;
        values.resize(cells, 0.0);

        let mut matrix = Self { n, values };
        for i in 0..n {
            matrix.values[i * n + i] = 1.0;
        }

        debug!("Allocated {}x{} LD matrix ({} bytes)", n, n, bytes);
        Ok(matrix)
    }

    /// Wrap decoded row-major values
    pub fn from_values(n: usize, values: Vec<f32>) -> LdmatResult<Self> {
        if Some(values.len()) != n.checked_mul(n) {
            return Err(LdmatError::InvalidContainer(format!(
                "LD_values holds {} cells, expected {}x{}",
                values.len(),
                n,
                n
            )));
        }
        Ok(Self { n, values })
    }

    /// Fill from sparse pairs, in input order (last write wins)
    ///
    /// Pairs naming a marker the index does not know are skipped and counted.
    pub fn fill(&mut self, index: &CoordinateIndex, entries: &[PairwiseEntry]) -> FillStats {
        let mut stats = FillStats::default();

        for entry in entries {
            let ranks = index
                .rank_of(&entry.marker_a)
                .zip(index.rank_of(&entry.marker_b));

            match ranks {
                Some((i, j)) if i == j => stats.self_pairs += 1,
                Some((i, j)) => {
                    self.set_symmetric(i, j, entry.r2);
                    stats.written += 1;
                }
                None => stats.dropped += 1,
            }
        }

        if stats.dropped > 0 {
            warn!(
                "Dropped {} LD pairs referencing unresolved positions",
                stats.dropped
            );
        }
        info!(
            "Filled LD matrix: {} pairs written, {} self-pairs",
            stats.written, stats.self_pairs
        );
        stats
    }

    /// Write `value` at [i, j] and [j, i]
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: f32) {
        let n = self.n;
        self.values[i * n + j] = value;
        self.values[j * n + i] = value;
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i < self.n && j < self.n {
            Some(self.values[i * self.n + j])
        } else {
            None
        }
    }

    /// Matrix dimension N
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    /// Row-major cells
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn byte_len(&self) -> u64 {
        self.values.len() as u64 * CELL_BYTES
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (i + 1..self.n).all(|j| self.values[i * self.n + j] == self.values[j * self.n + i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarkerRecord;
    use std::path::Path;

    fn pair(a: u64, b: u64, r2: f32) -> PairwiseEntry {
        PairwiseEntry::new(
            MarkerRecord::new("1", a, format!("rs{}", a)),
            MarkerRecord::new("1", b, format!("rs{}", b)),
            r2,
        )
    }

    #[test]
    fn test_allocate_unit_diagonal() {
        let matrix = LdMatrix::allocate(3, 1024).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(matrix.get(i, j), Some(expected));
            }
        }
        assert_eq!(matrix.get(3, 0), None);
    }

    #[test]
    fn test_allocate_respects_limit() {
        // 10 markers need 400 bytes
        assert!(LdMatrix::allocate(10, 400).is_ok());
        match LdMatrix::allocate(10, 399) {
            Err(LdmatError::Allocation { markers, bytes, limit }) => {
                assert_eq!(markers, 10);
                assert_eq!(bytes, 400);
                assert_eq!(limit, 399);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_required_bytes_overflow() {
        assert_eq!(required_bytes(3), Some(36));
        assert_eq!(required_bytes(usize::MAX), None);
    }

    #[test]
    fn test_max_markers_for() {
        assert_eq!(max_markers_for(400), 10);
        assert_eq!(max_markers_for(399), 9);
        assert_eq!(max_markers_for(4 * 1024 * 1024 * 1024), 32768);
        assert_eq!(max_markers_for(0), 0);
    }

    #[test]
    fn test_fill_symmetric_last_write_wins() {
        let entries = vec![pair(100, 200, 0.5), pair(200, 300, 0.3), pair(200, 100, 0.9)];
        let index = CoordinateIndex::from_entries(&entries, Path::new("t.ld")).unwrap();
        let mut matrix = LdMatrix::allocate(index.len(), 1024).unwrap();

        let stats = matrix.fill(&index, &entries);

        assert_eq!(stats.written, 3);
        assert_eq!(stats.dropped, 0);
        assert_eq!(matrix.get(0, 1), Some(0.9));
        assert_eq!(matrix.get(1, 0), Some(0.9));
        assert_eq!(matrix.get(1, 2), Some(0.3));
        assert_eq!(matrix.get(0, 2), Some(0.0));
        assert!(matrix.is_symmetric());
    }

    #[test]
    fn test_fill_counts_unresolved_and_self_pairs() {
        let indexed = vec![pair(100, 200, 0.5)];
        let index = CoordinateIndex::from_entries(&indexed, Path::new("t.ld")).unwrap();
        let mut matrix = LdMatrix::allocate(index.len(), 1024).unwrap();

        let entries = vec![pair(100, 200, 0.5), pair(100, 999, 0.4), pair(200, 200, 0.2)];
        let stats = matrix.fill(&index, &entries);

        assert_eq!(
            stats,
            FillStats {
                written: 1,
                dropped: 1,
                self_pairs: 1
            }
        );
        assert_eq!(matrix.get(1, 1), Some(1.0));
    }

    #[test]
    fn test_from_values_checks_shape() {
        let values: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let matrix = LdMatrix::from_values(4, values).unwrap();

        assert_eq!(matrix.n(), 4);
        assert_eq!(matrix.row(1), &[4.0, 5.0, 6.0, 7.0]);
        assert!(LdMatrix::from_values(3, vec![0.0; 8]).is_err());
    }
}
