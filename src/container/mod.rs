// ==============================================================================
// container/mod.rs - ldmat Container Format
// ==============================================================================
// Description: ldmat v0.0.2 HDF5 layout for dense LD matrices
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-20
// Version: 0.1.0
// ==============================================================================

pub mod format;
pub mod writer;
pub mod reader;

pub use format::{
    chunk_name, ChunkAttributes, ChunkDescriptor, RootAttributes, FORMAT_VERSION, HDF5_SIGNATURE,
};
pub use reader::{ChunkData, LdmatReader, Region};
pub use writer::{ChunkPayload, LdmatWriter};
