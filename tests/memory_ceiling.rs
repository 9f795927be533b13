// ==============================================================================
// memory_ceiling.rs - Peak Memory During Conversion
// ==============================================================================
// Description: Checks that writing the container does not duplicate the matrix
// Author: Matt Barham
// Created: 2026-10-20
// Modified: 2026-10-20
// Version: 0.1.0
// ==============================================================================

#![cfg(target_os = "linux")]

use ldmat::{ConversionConfig, LdmatConverter};
use std::io::{BufWriter, Write};
use tempfile::{tempdir, NamedTempFile};

const MARKERS: u64 = 4000;
const MATRIX_BYTES: u64 = MARKERS * MARKERS * 4;

/// Read a `/proc/self/status` field in bytes
fn status_bytes(field: &str) -> u64 {
    let status = std::fs::read_to_string("/proc/self/status").unwrap();
    let line = status
        .lines()
        .find(|line| line.starts_with(field))
        .unwrap();
    let kb: u64 = line
        .split_whitespace()
        .nth(1)
        .unwrap()
        .parse()
        .unwrap();
    kb * 1024
}

fn create_chain(markers: u64) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let mut writer = BufWriter::new(file.as_file());
    writeln!(writer, "CHR_A BP_A SNP_A CHR_B BP_B SNP_B R2").unwrap();
    for i in 0..markers - 1 {
        let (a, b) = (10_000 + i * 10, 10_000 + (i + 1) * 10);
        writeln!(writer, "1 {} rs{} 1 {} rs{} 0.5", a, a, b, b).unwrap();
    }
    writer.flush().unwrap();
    drop(writer);
    file
}

#[test]
fn conversion_peak_memory_stays_near_matrix_size() {
    let input = create_chain(MARKERS);
    let dir = tempdir().unwrap();
    let output = dir.path().join("chain.ldmat");

    for level in [0, 6] {
        let config = ConversionConfig::default()
            .with_max_matrix_bytes(MATRIX_BYTES)
            .with_compression_level(level);

        let baseline = status_bytes("VmRSS:");
        let report = LdmatConverter::new(config)
            .convert(input.path(), &output)
            .unwrap();
        let peak = status_bytes("VmHWM:");

        assert_eq!(report.markers, MARKERS as usize);
        // One matrix plus parsing and HDF5 buffers, never a second copy
        let growth = peak.saturating_sub(baseline);
        assert!(
            growth < MATRIX_BYTES * 3 / 2,
            "level {}: peak grew by {} bytes for a {}-byte matrix",
            level,
            growth,
            MATRIX_BYTES
        );
    }
}
