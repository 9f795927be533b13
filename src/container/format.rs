// ==============================================================================
// format.rs - ldmat Container Layout
// ==============================================================================
// Description: Names, constants and HDF5 attribute blocks of ldmat v0.0.2
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-20
// Version: 0.1.0
// ==============================================================================
//
// File layout (HDF5):
//
//   /                    attrs: version, chromosome, start_locus, end_locus,
//                               min_score, kept_decimal_places
//   /chunk_<start>       attrs: start_locus, end_locus
//     LD_values          float32 [N, N], row-major, symmetric
//     positions          int64 [N], ascending
//     names              fixed-width ASCII [N], NUL-padded
//
// ==============================================================================

use hdf5::types::VarLenUnicode;
use hdf5::{H5Type, Location};
use serde::{Deserialize, Serialize};

use crate::error::{LdmatError, LdmatResult};

/// Layout version written to the root `version` attribute
pub const FORMAT_VERSION: &str = "0.0.2";

pub const MIN_SCORE: f64 = 0.0;
pub const KEPT_DECIMAL_PLACES: i64 = 4;

pub const CHUNK_PREFIX: &str = "chunk_";

pub const LD_VALUES: &str = "LD_values";
pub const POSITIONS: &str = "positions";
pub const NAMES: &str = "names";

/// Widest marker name a container can hold
pub const MAX_NAME_LEN: usize = 256;

/// First eight bytes of every HDF5 file
pub const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1a, b'\n'];

pub fn chunk_name(start_locus: i64) -> String {
    format!("{}{}", CHUNK_PREFIX, start_locus)
}

/// Root group attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootAttributes {
    pub version: String,
    pub chromosome: String,
    pub start_locus: i64,
    pub end_locus: i64,
    pub min_score: f64,
    pub kept_decimal_places: i64,
}

impl RootAttributes {
    pub fn new(chromosome: impl Into<String>, start_locus: i64, end_locus: i64) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            chromosome: chromosome.into(),
            start_locus,
            end_locus,
            min_score: MIN_SCORE,
            kept_decimal_places: KEPT_DECIMAL_PLACES,
        }
    }

    pub(crate) fn write_to(&self, location: &Location) -> LdmatResult<()> {
        write_string_attr(location, "version", &self.version)?;
        write_string_attr(location, "chromosome", &self.chromosome)?;
        write_scalar_attr(location, "start_locus", &self.start_locus)?;
        write_scalar_attr(location, "end_locus", &self.end_locus)?;
        write_scalar_attr(location, "min_score", &self.min_score)?;
        write_scalar_attr(location, "kept_decimal_places", &self.kept_decimal_places)
    }

    pub(crate) fn read_from(location: &Location) -> LdmatResult<Self> {
        Ok(Self {
            version: read_string_attr(location, "version")?,
            chromosome: read_string_attr(location, "chromosome")?,
            start_locus: read_scalar_attr(location, "start_locus")?,
            end_locus: read_scalar_attr(location, "end_locus")?,
            min_score: read_scalar_attr(location, "min_score")?,
            kept_decimal_places: read_scalar_attr(location, "kept_decimal_places")?,
        })
    }
}

/// Per-chunk group attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkAttributes {
    pub start_locus: i64,
    pub end_locus: i64,
}

impl ChunkAttributes {
    pub(crate) fn write_to(&self, location: &Location) -> LdmatResult<()> {
        write_scalar_attr(location, "start_locus", &self.start_locus)?;
        write_scalar_attr(location, "end_locus", &self.end_locus)
    }

    pub(crate) fn read_from(location: &Location) -> LdmatResult<Self> {
        Ok(Self {
            start_locus: read_scalar_attr(location, "start_locus")?,
            end_locus: read_scalar_attr(location, "end_locus")?,
        })
    }
}

/// A chunk group found when opening a container
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDescriptor {
    pub name: String,
    pub attributes: ChunkAttributes,
    /// Number of markers (N) in the chunk
    pub markers: usize,
}

fn write_scalar_attr<T: H5Type>(location: &Location, name: &str, value: &T) -> LdmatResult<()> {
    location
        .new_attr::<T>()
        .shape(())
        .create(name)
        .and_then(|attr| attr.write_scalar(value))
        .map_err(|e| LdmatError::hdf5(format!("writing attribute {}", name), e))
}

fn write_string_attr(location: &Location, name: &str, value: &str) -> LdmatResult<()> {
    let value: VarLenUnicode = value.parse().map_err(|e| {
        LdmatError::InvalidContainer(format!("attribute {} cannot hold {:?}: {}", name, value, e))
    })?;
    write_scalar_attr(location, name, &value)
}

fn read_scalar_attr<T: H5Type>(location: &Location, name: &str) -> LdmatResult<T> {
    location
        .attr(name)
        .and_then(|attr| attr.read_scalar::<T>())
        .map_err(|e| LdmatError::InvalidContainer(format!("attribute {}: {}", name, e)))
}

fn read_string_attr(location: &Location, name: &str) -> LdmatResult<String> {
    read_scalar_attr::<VarLenUnicode>(location, name).map(|value| value.as_str().to_string())
}
