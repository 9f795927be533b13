// ==============================================================================
// convert_demo.rs - Example of LD Table Conversion
// ==============================================================================
// Description: Converts a small PLINK LD table and reads the container back
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================

use ldmat::container::LdmatReader;
use ldmat::{ConversionConfig, LdmatConverter};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== ldmat Conversion Example ===\n");

    // PLINK --r2 output pads columns with runs of spaces
    let mut input = NamedTempFile::new()?;
    writeln!(input, " CHR_A         BP_A        SNP_A  CHR_B         BP_B        SNP_B           R2")?;
    writeln!(input, "    22     16050408  rs149201999     22     16050612  rs146752890     0.753914")?;
    writeln!(input, "    22     16050408  rs149201999     22     16051249   rs62224609     0.114252")?;
    writeln!(input, "    22     16050612  rs146752890     22     16051249   rs62224609     0.233183")?;
    writeln!(input, "    22     16051249   rs62224609     22     16052080  rs143559733     0.051822")?;
    input.flush()?;

    let dir = tempdir()?;
    let output = dir.path().join("chr22.ldmat");

    println!("Converting {:?}...", input.path());
    let report = LdmatConverter::new(ConversionConfig::default()).convert(input.path(), &output)?;

    println!("✓ {} markers, {} pairs written", report.markers, report.pairs_written);
    println!(
        "  chromosome {} [{} - {}], {} bytes on disk\n",
        report.chromosome, report.start_locus, report.end_locus, report.container_bytes
    );

    // Read the container back
    let reader = LdmatReader::open(&output)?;
    println!("--- Root Attributes ---");
    println!("{}\n", serde_json::to_string_pretty(reader.root())?);

    for chunk in reader.chunks() {
        let data = reader.read_chunk(&chunk.name)?;
        println!("--- {} ---", chunk.name);
        print!("{:<14}", "");
        for name in &data.names {
            print!("{:>13}", name);
        }
        println!();
        for (i, name) in data.names.iter().enumerate() {
            print!("{:<14}", name);
            for value in data.ld_values.row(i) {
                print!("{:>13.4}", value);
            }
            println!();
        }
    }

    // Region query
    let region = reader.query_region(16050500, 16051300)?;
    println!(
        "\nRegion 16050500-16051300: {} markers {:?}",
        region.len(),
        region.names
    );
    if let Some(r2) = reader.lookup(16050612, 16051249)? {
        println!("r² (rs146752890, rs62224609) = {:.6}", r2);
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
