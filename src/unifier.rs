// ==============================================================================
// unifier.rs - Coordinate Unifier
// ==============================================================================
// Description: Derives the canonical, position-ordered marker set of an LD table
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================
// Algorithm:
//   1. Project the A side and the B side of every pair into marker candidates
//   2. Deduplicate by (chromosome, position) in input order: row by row, A
//      before B; the first name seen for a position wins
//   3. Stable-sort ascending by position; rank = index in the sorted order
// ==============================================================================

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{LdmatError, LdmatResult};
use crate::models::{MarkerRecord, PairwiseEntry};

/// Ordered, deduplicated markers with dense zero-based ranks
#[derive(Debug, Clone)]
pub struct CoordinateIndex {
    markers: Vec<MarkerRecord>,
    rank_by_position: HashMap<u64, usize>,
    name_collisions: usize,
}

impl CoordinateIndex {
    /// Build the index from the pairs of one LD table
    ///
    /// # Errors
    /// * `EmptyInput` - no pairs
    /// * `MalformedInput` - markers span more than one chromosome
    pub fn from_entries(entries: &[PairwiseEntry], source: &Path) -> LdmatResult<Self> {
        if entries.is_empty() {
            return Err(LdmatError::EmptyInput {
                path: source.to_path_buf(),
            });
        }

        let mut markers: Vec<MarkerRecord> = Vec::new();
        let mut seen: HashMap<(&str, u64), usize> = HashMap::new();
        let mut name_collisions = 0;

        for entry in entries {
            for candidate in [&entry.marker_a, &entry.marker_b] {
                match seen.get(&candidate.key()) {
                    Some(&idx) => {
                        if markers[idx].name != candidate.name {
                            debug!(
                                "Position {}:{} seen as '{}' and '{}', keeping '{}'",
                                candidate.chromosome,
                                candidate.position,
                                markers[idx].name,
                                candidate.name,
                                markers[idx].name
                            );
                            name_collisions += 1;
                        }
                    }
                    None => {
                        seen.insert(candidate.key(), markers.len());
                        markers.push(candidate.clone());
                    }
                }
            }
        }

        Self::ensure_single_chromosome(&markers, source)?;

        markers.sort_by_key(|marker| marker.position);

        let rank_by_position = markers
            .iter()
            .enumerate()
            .map(|(rank, marker)| (marker.position, rank))
            .collect();

        if name_collisions > 0 {
            warn!(
                "{} marker name collisions resolved (first name seen for a position wins)",
                name_collisions
            );
        }
        info!("Found {} unique markers", markers.len());

        Ok(Self {
            markers,
            rank_by_position,
            name_collisions,
        })
    }

    fn ensure_single_chromosome(markers: &[MarkerRecord], source: &Path) -> LdmatResult<()> {
        let Some(first) = markers.first() else {
            return Ok(());
        };

        if let Some(other) = markers.iter().find(|m| m.chromosome != first.chromosome) {
            return Err(LdmatError::MalformedInput {
                path: source.to_path_buf(),
                line: None,
                details: format!(
                    "markers span several chromosomes ('{}' and '{}'); \
                     select one with a chromosome filter",
                    first.chromosome, other.chromosome
                ),
            });
        }

        Ok(())
    }

    /// Number of distinct markers (N)
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Rank of the marker at `position`
    pub fn rank(&self, position: u64) -> Option<usize> {
        self.rank_by_position.get(&position).copied()
    }

    /// Rank of `marker`, also checking its chromosome
    pub fn rank_of(&self, marker: &MarkerRecord) -> Option<usize> {
        self.rank(marker.position)
            .filter(|&rank| self.markers[rank].chromosome == marker.chromosome)
    }

    pub fn markers(&self) -> &[MarkerRecord] {
        &self.markers
    }

    pub fn get(&self, rank: usize) -> Option<&MarkerRecord> {
        self.markers.get(rank)
    }

    /// Chromosome label shared by every marker
    pub fn chromosome(&self) -> &str {
        self.markers
            .first()
            .map(|m| m.chromosome.as_str())
            .unwrap_or_default()
    }

    /// Smallest position
    pub fn start_locus(&self) -> u64 {
        self.markers.first().map(|m| m.position).unwrap_or_default()
    }

    /// Largest position
    pub fn end_locus(&self) -> u64 {
        self.markers.last().map(|m| m.position).unwrap_or_default()
    }

    pub fn positions(&self) -> impl Iterator<Item = u64> + '_ {
        self.markers.iter().map(|m| m.position)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.markers.iter().map(|m| m.name.as_str())
    }

    /// Pairs of marker candidates that shared a position under different names
    pub fn name_collisions(&self) -> usize {
        self.name_collisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: (u64, &str), b: (u64, &str), r2: f32) -> PairwiseEntry {
        PairwiseEntry::new(
            MarkerRecord::new("1", a.0, a.1),
            MarkerRecord::new("1", b.0, b.1),
            r2,
        )
    }

    #[test]
    fn test_union_sorted_by_position() {
        let entries = vec![
            pair((300, "rs3"), (100, "rs1"), 0.8),
            pair((200, "rs2"), (300, "rs3"), 0.8),
        ];
        let index = CoordinateIndex::from_entries(&entries, Path::new("t.ld")).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.positions().collect::<Vec<_>>(), vec![100, 200, 300]);
        assert_eq!(index.names().collect::<Vec<_>>(), vec!["rs1", "rs2", "rs3"]);
        assert_eq!(index.rank(100), Some(0));
        assert_eq!(index.rank(300), Some(2));
        assert_eq!(index.rank(150), None);
        assert_eq!(index.start_locus(), 100);
        assert_eq!(index.end_locus(), 300);
        assert_eq!(index.chromosome(), "1");
    }

    #[test]
    fn test_first_name_wins_on_collision() {
        // rs2 appears on the B side of row 1 before rs2_dup on the A side of row 2
        let entries = vec![
            pair((100, "rs1"), (200, "rs2"), 0.5),
            pair((200, "rs2_dup"), (300, "rs3"), 0.5),
            pair((100, "rs1"), (300, "rs3"), 0.5),
        ];
        let index = CoordinateIndex::from_entries(&entries, Path::new("t.ld")).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.get(1).unwrap().name, "rs2");
        assert_eq!(index.name_collisions(), 1);
    }

    #[test]
    fn test_a_side_precedes_b_side_within_a_row() {
        let entries = vec![pair((100, "first"), (100, "second"), 1.0)];
        let index = CoordinateIndex::from_entries(&entries, Path::new("t.ld")).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(0).unwrap().name, "first");
    }

    #[test]
    fn test_empty_entries() {
        let result = CoordinateIndex::from_entries(&[], Path::new("t.ld"));
        assert!(matches!(result, Err(LdmatError::EmptyInput { .. })));
    }

    #[test]
    fn test_mixed_chromosomes_rejected() {
        let entries = vec![PairwiseEntry::new(
            MarkerRecord::new("1", 100, "rs1"),
            MarkerRecord::new("2", 200, "rs2"),
            0.3,
        )];
        let result = CoordinateIndex::from_entries(&entries, Path::new("t.ld"));
        assert!(matches!(
            result,
            Err(LdmatError::MalformedInput { line: None, .. })
        ));
    }

    #[test]
    fn test_rank_of_checks_chromosome() {
        let entries = vec![pair((100, "rs1"), (200, "rs2"), 0.5)];
        let index = CoordinateIndex::from_entries(&entries, Path::new("t.ld")).unwrap();

        assert_eq!(index.rank_of(&MarkerRecord::new("1", 200, "x")), Some(1));
        assert_eq!(index.rank_of(&MarkerRecord::new("2", 200, "x")), None);
    }
}
