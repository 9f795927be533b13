// ==============================================================================
// lib.rs - LD Matrix Converter Library
// ==============================================================================
// Description: Library interface for PLINK LD to ldmat conversion modules
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================

pub mod error;
pub mod models;
pub mod parsers;
pub mod validator;
pub mod unifier;
pub mod matrix;
pub mod container;
pub mod encoder;
pub mod converter;

pub use converter::{ConversionReport, LdmatConverter};
pub use error::{LdmatError, LdmatResult};
pub use models::{ConversionConfig, MafFilter, MarkerRecord, PairwiseEntry};
