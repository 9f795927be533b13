// ==============================================================================
// main.rs - plink2ldmat Entry Point
// ==============================================================================
// Description: Converts PLINK pairwise LD output into an ldmat container
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ldmat::models::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_MATRIX_BYTES};
use ldmat::{ConversionConfig, LdmatConverter, MafFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert PLINK .ld output to ldmat format", long_about = None)]
struct Args {
    /// PLINK pairwise LD table (plink --r2 output, plain or gzip)
    input: PathBuf,

    /// Output ldmat container
    output: PathBuf,

    /// Drop pairs where either marker has a minor allele frequency below this value
    #[arg(long, env = "LDMAT_MIN_MAF")]
    min_maf: Option<f64>,

    /// PLINK .frq/.afreq file supplying frequencies (default: MAF_A/MAF_B columns)
    #[arg(long, env = "LDMAT_FREQ_FILE", requires = "min_maf")]
    freq_file: Option<PathBuf>,

    /// Keep only pairs lying on this chromosome
    #[arg(long, env = "LDMAT_CHROMOSOME")]
    chromosome: Option<String>,

    /// Largest dense matrix to allocate, in bytes
    #[arg(long, env = "LDMAT_MAX_MATRIX_BYTES", default_value_t = DEFAULT_MAX_MATRIX_BYTES)]
    max_matrix_bytes: u64,

    /// Gzip level for container datasets (0 = uncompressed)
    #[arg(
        long,
        env = "LDMAT_COMPRESSION_LEVEL",
        default_value_t = DEFAULT_COMPRESSION_LEVEL,
        value_parser = clap::value_parser!(u32).range(0..=9)
    )]
    compression_level: u32,

    /// Write a JSON conversion report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> ConversionConfig {
        let mut config = ConversionConfig::default()
            .with_max_matrix_bytes(self.max_matrix_bytes)
            .with_compression_level(self.compression_level);

        if let Some(min_maf) = self.min_maf {
            config = config.with_maf_filter(MafFilter {
                min_maf,
                freq_file: self.freq_file.clone(),
            });
        }
        if let Some(chromosome) = &self.chromosome {
            config = config.with_chromosome(chromosome.clone());
        }
        config
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ldmat=info,plink2ldmat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let converter = LdmatConverter::new(args.config());

    let report = converter
        .convert(&args.input, &args.output)
        .with_context(|| format!("Failed to convert {:?} to {:?}", args.input, args.output))?;

    if let Some(report_path) = &args.report {
        let file = std::fs::File::create(report_path)
            .with_context(|| format!("Failed to create report file {:?}", report_path))?;
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("Failed to write report {:?}", report_path))?;
        info!("Conversion report written to {:?}", report_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_requires_two_paths() {
        assert!(Args::try_parse_from(["plink2ldmat", "in.ld"]).is_err());
        assert!(Args::try_parse_from(["plink2ldmat"]).is_err());
    }

    #[test]
    fn test_flags_build_config() {
        let args = Args::try_parse_from([
            "plink2ldmat",
            "in.ld",
            "out.ldmat",
            "--min-maf",
            "0.05",
            "--freq-file",
            "plink.frq",
            "--chromosome",
            "22",
            "--compression-level",
            "0",
        ])
        .unwrap();
        let config = args.config();

        let filter = config.maf_filter.unwrap();
        assert_eq!(filter.min_maf, 0.05);
        assert_eq!(filter.freq_file, Some(PathBuf::from("plink.frq")));
        assert_eq!(config.chromosome.as_deref(), Some("22"));
        assert_eq!(config.compression_level, 0);
        assert_eq!(config.max_matrix_bytes, DEFAULT_MAX_MATRIX_BYTES);
    }

    #[test]
    fn test_compression_level_range() {
        let result = Args::try_parse_from([
            "plink2ldmat",
            "in.ld",
            "out.ldmat",
            "--compression-level",
            "10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_freq_file_requires_min_maf() {
        let result = Args::try_parse_from(["plink2ldmat", "in.ld", "out.ldmat", "--freq-file", "x.frq"]);
        assert!(result.is_err());
    }
}
