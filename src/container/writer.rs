// ==============================================================================
// writer.rs - ldmat Container Writer
// ==============================================================================
// Description: Writes root attributes and chunk groups to an HDF5 ldmat file
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-20
// Version: 0.1.0
// ==============================================================================

use hdf5::types::FixedAscii;
use hdf5::{Extents, Group, H5Type};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::format::{ChunkAttributes, RootAttributes, LD_VALUES, MAX_NAME_LEN, NAMES, POSITIONS};
use crate::error::{LdmatError, LdmatResult};
use crate::matrix::LdMatrix;

/// Arrays and attributes of one chunk group
#[derive(Debug, Clone, Copy)]
pub struct ChunkPayload<'a> {
    pub name: &'a str,
    pub attributes: ChunkAttributes,
    pub ld_values: &'a LdMatrix,
    pub positions: &'a [i64],
    pub names: &'a [&'a str],
}

#[derive(Debug, Clone, Copy)]
pub struct LdmatWriter {
    compression_level: u32,
}

impl Default for LdmatWriter {
    fn default() -> Self {
        Self::new(crate::models::DEFAULT_COMPRESSION_LEVEL)
    }
}

impl LdmatWriter {
    /// `compression_level` 0 stores datasets contiguously, 1-9 selects deflate
    pub fn new(compression_level: u32) -> Self {
        Self {
            compression_level: compression_level.min(9),
        }
    }

    fn deflate_level(&self) -> Option<u8> {
        match self.compression_level {
            0 => None,
            level => u8::try_from(level).ok(),
        }
    }

    /// Write a complete container to `path`, replacing any existing file
    ///
    /// The file is built under a temporary name in the destination
    /// directory and renamed into place once HDF5 has flushed it.
    ///
    /// # Returns
    /// * Size of the finished file in bytes
    pub fn write(
        &self,
        path: &Path,
        root: &RootAttributes,
        chunks: &[ChunkPayload<'_>],
    ) -> LdmatResult<u64> {
        info!("Writing ldmat container: {:?}", path);

        for chunk in chunks {
            Self::check_shapes(chunk)?;
        }

        let parent = destination_dir(path);
        let temp = tempfile::Builder::new()
            .prefix(".ldmat-")
            .suffix(".h5.tmp")
            .tempfile_in(&parent)
            .map_err(|e| LdmatError::io(format!("creating temporary file in {:?}", parent), e))?;

        self.write_hdf5(temp.path(), root, chunks)?;

        temp.as_file()
            .sync_all()
            .map_err(|e| LdmatError::io(format!("syncing {:?}", temp.path()), e))?;
        temp.persist(path).map_err(|e| {
            LdmatError::io(format!("moving container into place at {:?}", path), e.error)
        })?;

        let bytes = std::fs::metadata(path)
            .map_err(|e| LdmatError::io(format!("reading metadata of {:?}", path), e))?
            .len();
        info!("Wrote {} bytes to {:?}", bytes, path);
        Ok(bytes)
    }

    /// Every HDF5 handle is dropped before this returns, closing the file
    fn write_hdf5(
        &self,
        target: &Path,
        root: &RootAttributes,
        chunks: &[ChunkPayload<'_>],
    ) -> LdmatResult<()> {
        let file = hdf5::File::create(target)
            .map_err(|e| LdmatError::hdf5(format!("creating {:?}", target), e))?;
        root.write_to(&file)?;

        for chunk in chunks {
            let group = file
                .create_group(chunk.name)
                .map_err(|e| LdmatError::hdf5(format!("creating group {}", chunk.name), e))?;
            chunk.attributes.write_to(&group)?;

            let n = chunk.ld_values.n();
            // Matrix cells go to HDF5 straight from the filled buffer
            self.write_dataset(&group, LD_VALUES, (n, n), chunk.ld_values.as_slice())?;
            self.write_dataset(&group, POSITIONS, n, chunk.positions)?;
            self.write_names(&group, chunk.names)?;
            debug!("Wrote chunk {} ({} markers)", chunk.name, n);
        }

        file.flush()
            .map_err(|e| LdmatError::hdf5(format!("flushing {:?}", target), e))
    }

    fn write_dataset<T: H5Type>(
        &self,
        group: &Group,
        name: &str,
        shape: impl Into<Extents>,
        data: &[T],
    ) -> LdmatResult<()> {
        let builder = group.new_dataset::<T>().shape(shape);
        let builder = match self.deflate_level() {
            Some(level) => builder.deflate(level),
            None => builder,
        };

        builder
            .create(name)
            .and_then(|dataset| dataset.write_raw(data))
            .map_err(|e| LdmatError::hdf5(format!("writing dataset {}", name), e))
    }

    /// Names are stored NUL-padded in the narrowest width that fits the longest
    fn write_names(&self, group: &Group, names: &[&str]) -> LdmatResult<()> {
        let longest = names.iter().map(|name| name.len()).max().unwrap_or(0);
        match longest {
            0..=16 => self.write_fixed_names::<16>(group, names),
            17..=32 => self.write_fixed_names::<32>(group, names),
            33..=64 => self.write_fixed_names::<64>(group, names),
            65..=128 => self.write_fixed_names::<128>(group, names),
            129..=MAX_NAME_LEN => self.write_fixed_names::<MAX_NAME_LEN>(group, names),
            _ => Err(LdmatError::InvalidContainer(format!(
                "marker name of {} bytes exceeds the {}-byte limit",
                longest, MAX_NAME_LEN
            ))),
        }
    }

    fn write_fixed_names<const N: usize>(&self, group: &Group, names: &[&str]) -> LdmatResult<()> {
        let values = names
            .iter()
            .map(|name| {
                FixedAscii::<N>::from_ascii(name.as_bytes()).map_err(|e| {
                    LdmatError::InvalidContainer(format!("marker name {:?} is not ASCII: {}", name, e))
                })
            })
            .collect::<LdmatResult<Vec<_>>>()?;
        self.write_dataset(group, NAMES, values.len(), &values)
    }

    fn check_shapes(chunk: &ChunkPayload<'_>) -> LdmatResult<()> {
        let n = chunk.ld_values.n();
        if chunk.positions.len() != n || chunk.names.len() != n {
            return Err(LdmatError::InvalidContainer(format!(
                "chunk {}: {}x{} matrix with {} positions and {} names",
                chunk.name,
                n,
                n,
                chunk.positions.len(),
                chunk.names.len()
            )));
        }
        Ok(())
    }
}

fn destination_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
