// ==============================================================================
// validator.rs - Input File Validation
// ==============================================================================
// Description: Pre-flight checks for LD tables (existence, size, format, hash)
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{LdmatError, LdmatResult};
use crate::parsers::plink_ld::open_text;
use crate::parsers::REQUIRED_COLUMNS;

const MAX_FILE_SIZE: u64 = 8 * 1024 * 1024 * 1024; // 8 GiB

const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

#[derive(Debug, Clone)]
pub struct ValidatedFile {
    pub path: PathBuf,
    pub size: u64,
    /// Gzip-compressed input
    pub compressed: bool,
    pub hash_sha256: String,
}

pub struct FileValidator {
    max_file_size: u64,
}

impl FileValidator {
    pub fn new() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Validate an LD table before parsing
    pub fn validate_ld_table(&self, path: &Path) -> LdmatResult<ValidatedFile> {
        info!("Validating input: {:?}", path);

        // 1. Existence and type
        let metadata = std::fs::metadata(path)
            .map_err(|e| LdmatError::io(format!("reading metadata of {:?}", path), e))?;
        if !metadata.is_file() {
            return Err(LdmatError::io(
                format!("opening {:?}", path),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        // 2. Size check
        let size = metadata.len();
        if size > self.max_file_size {
            return Err(LdmatError::MalformedInput {
                path: path.to_path_buf(),
                line: None,
                details: format!(
                    "file too large: {} bytes (max: {} bytes)",
                    size, self.max_file_size
                ),
            });
        }
        debug!("Size check passed: {} bytes", size);

        // 3. Magic number sniff
        let compressed = self.read_magic_number(path)? == GZIP_MAGIC;
        debug!("Gzip input: {}", compressed);

        // 4. Header check (basic format)
        self.validate_header(path)?;
        debug!("Header check passed");

        // 5. Compute SHA-256 hash
        let hash = self.compute_sha256(path)?;
        debug!("SHA-256: {}", hash);

        Ok(ValidatedFile {
            path: path.to_path_buf(),
            size,
            compressed,
            hash_sha256: hash,
        })
    }

    fn read_magic_number(&self, path: &Path) -> LdmatResult<[u8; 3]> {
        let file = File::open(path).map_err(|e| LdmatError::io(format!("opening {:?}", path), e))?;
        let mut buffer = [0u8; 3];
        let mut filled = 0;
        for byte in file.bytes().take(3) {
            buffer[filled] = byte.map_err(|e| LdmatError::io(format!("reading {:?}", path), e))?;
            filled += 1;
        }
        Ok(buffer)
    }

    fn validate_header(&self, path: &Path) -> LdmatResult<()> {
        let reader = open_text(path).map_err(|e| LdmatError::io(format!("opening {:?}", path), e))?;

        for line in reader.lines() {
            let line = line.map_err(|e| LdmatError::io(format!("reading {:?}", path), e))?;
            if line.trim().is_empty() {
                continue;
            }

            let columns: Vec<&str> = line.split_whitespace().collect();
            let missing: Vec<&str> = REQUIRED_COLUMNS
                .iter()
                .copied()
                .filter(|c| !columns.contains(c))
                .collect();
            if !missing.is_empty() {
                return Err(LdmatError::MalformedInput {
                    path: path.to_path_buf(),
                    line: None,
                    details: format!("not a PLINK LD table, missing columns: {}", missing.join(", ")),
                });
            }
            return Ok(());
        }

        // No header at all: the required columns are absent
        Err(LdmatError::MalformedInput {
            path: path.to_path_buf(),
            line: None,
            details: format!(
                "no header row, expected columns: {}",
                REQUIRED_COLUMNS.join(", ")
            ),
        })
    }

    fn compute_sha256(&self, path: &Path) -> LdmatResult<String> {
        let read_err = |e: std::io::Error| LdmatError::io(format!("hashing {:?}", path), e);
        let mut file = File::open(path).map_err(read_err)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 8192];

        loop {
            let n = file.read(&mut buffer).map_err(read_err)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new()
    }
}
