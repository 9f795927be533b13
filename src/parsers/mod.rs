// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Parsers for PLINK LD and allele frequency reports
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================

pub mod plink_ld;
pub mod plink_frq;

pub use plink_ld::{LdParseError, LdTable, PlinkLdParser, REQUIRED_COLUMNS};
pub use plink_frq::{FrequencyTable, FrqParseError, PlinkFrqParser};
