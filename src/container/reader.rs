// ==============================================================================
// container/reader.rs - ldmat Container Reader
// ==============================================================================
// Description: Opens ldmat HDF5 files and answers genomic range queries
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-20
// Version: 0.1.0
// ==============================================================================

use hdf5::types::FixedAscii;
use hdf5::{Dataset, Group};
use ndarray::s;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::format::{
    ChunkAttributes, ChunkDescriptor, RootAttributes, CHUNK_PREFIX, FORMAT_VERSION, LD_VALUES,
    MAX_NAME_LEN, NAMES, POSITIONS,
};
use crate::error::{LdmatError, LdmatResult};
use crate::matrix::{max_markers_for, required_bytes, LdMatrix};
use crate::models::DEFAULT_MAX_MATRIX_BYTES;

/// Fully decoded chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkData {
    pub positions: Vec<i64>,
    pub names: Vec<String>,
    pub ld_values: LdMatrix,
}

/// Markers and LD block for a genomic range
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub chromosome: String,
    pub positions: Vec<i64>,
    pub names: Vec<String>,
    pub ld_values: LdMatrix,
}

impl Region {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Reader for ldmat containers
#[derive(Debug)]
pub struct LdmatReader {
    path: PathBuf,
    file: hdf5::File,
    root: RootAttributes,
    chunks: Vec<ChunkDescriptor>,
    max_matrix_bytes: u64,
}

impl LdmatReader {
    /// Open a container, refusing chunks larger than the default matrix limit
    pub fn open(path: impl AsRef<Path>) -> LdmatResult<Self> {
        Self::open_with_limit(path, DEFAULT_MAX_MATRIX_BYTES)
    }

    /// Open a container and load its root attributes and chunk list
    ///
    /// # Errors
    /// * `Io` - the path cannot be read
    /// * `InvalidContainer` - not HDF5, wrong version, or inconsistent datasets
    /// * `Allocation` - a chunk's N×N matrix would exceed `max_matrix_bytes`
    pub fn open_with_limit(path: impl AsRef<Path>, max_matrix_bytes: u64) -> LdmatResult<Self> {
        let path = path.as_ref();
        std::fs::metadata(path).map_err(|e| LdmatError::io(format!("opening {:?}", path), e))?;

        let file = hdf5::File::open(path).map_err(|e| {
            LdmatError::InvalidContainer(format!("{:?} is not a readable HDF5 file: {}", path, e))
        })?;

        let root = RootAttributes::read_from(&file)?;
        if root.version != FORMAT_VERSION {
            return Err(LdmatError::InvalidContainer(format!(
                "unsupported ldmat version {} (expected {})",
                root.version, FORMAT_VERSION
            )));
        }

        let members = file.member_names().map_err(invalid("listing chunks"))?;
        let mut chunks = Vec::new();
        for name in members.into_iter().filter(|m| m.starts_with(CHUNK_PREFIX)) {
            let group = file.group(&name).map_err(invalid(&name))?;
            let attributes = ChunkAttributes::read_from(&group)?;
            let markers = check_chunk(&name, &group, max_matrix_bytes)?;
            chunks.push(ChunkDescriptor {
                name,
                attributes,
                markers,
            });
        }
        chunks.sort_by_key(|chunk| chunk.attributes.start_locus);

        debug!("Opened ldmat container {:?}: {} chunk(s)", path, chunks.len());
        Ok(Self {
            path: path.to_path_buf(),
            file,
            root,
            chunks,
            max_matrix_bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &RootAttributes {
        &self.root
    }

    /// Chunks in ascending start_locus order
    pub fn chunks(&self) -> &[ChunkDescriptor] {
        &self.chunks
    }

    fn group(&self, name: &str) -> LdmatResult<Group> {
        if !self.chunks.iter().any(|c| c.name == name) {
            return Err(LdmatError::InvalidContainer(format!("no chunk named {}", name)));
        }
        self.file.group(name).map_err(invalid(name))
    }

    /// Decode every array of one chunk
    pub fn read_chunk(&self, name: &str) -> LdmatResult<ChunkData> {
        let group = self.group(name)?;
        let positions = read_positions(&group)?;
        let names = read_names(&group)?;
        let values = dataset(&group, LD_VALUES)?
            .read_raw::<f32>()
            .map_err(invalid(LD_VALUES))?;
        let ld_values = LdMatrix::from_values(positions.len(), values)?;

        Ok(ChunkData {
            positions,
            names,
            ld_values,
        })
    }

    /// LD block, positions and names for start <= position <= end
    ///
    /// Only the selected rows and columns of LD_values are read.
    pub fn query_region(&self, start: i64, end: i64) -> LdmatResult<Region> {
        let mut selected = Vec::new();
        let mut positions = Vec::new();

        for chunk in &self.chunks {
            if chunk.attributes.end_locus < start || chunk.attributes.start_locus > end {
                continue;
            }

            let group = self.group(&chunk.name)?;
            let chunk_positions = read_positions(&group)?;
            let range = marker_range(&chunk_positions, start, end);
            if range.is_empty() {
                continue;
            }

            positions.extend_from_slice(&chunk_positions[range.clone()]);
            selected.push((group, range));
        }

        // Checked before any LD values are read
        let total = positions.len();
        let bytes = required_bytes(total).unwrap_or(u64::MAX);
        if bytes > self.max_matrix_bytes {
            return Err(LdmatError::Allocation {
                markers: total,
                bytes,
                limit: self.max_matrix_bytes,
            });
        }

        let mut names = Vec::with_capacity(total);
        let mut blocks = Vec::with_capacity(selected.len());
        for (group, range) in selected {
            let chunk_names = read_names(&group)?;
            names.extend(chunk_names[range.clone()].iter().cloned());
            blocks.push(read_block(&group, range)?);
        }

        // Pairs across chunks are not stored
        let ld_values = match blocks.len() {
            0 => LdMatrix::from_values(0, Vec::new())?,
            1 => blocks.remove(0),
            _ => block_diagonal(&blocks)?,
        };

        Ok(Region {
            chromosome: self.root.chromosome.clone(),
            positions,
            names,
            ld_values,
        })
    }

    /// r² between the markers at two positions, None if either is absent
    pub fn lookup(&self, position_a: i64, position_b: i64) -> LdmatResult<Option<f32>> {
        for chunk in &self.chunks {
            let group = self.group(&chunk.name)?;
            let positions = read_positions(&group)?;
            let i = positions.binary_search(&position_a).ok();
            let j = positions.binary_search(&position_b).ok();
            if let Some((i, j)) = i.zip(j) {
                let cell = dataset(&group, LD_VALUES)?
                    .read_slice_2d::<f32, _>(s![i..i + 1, j..j + 1])
                    .map_err(invalid(LD_VALUES))?;
                return Ok(cell.iter().next().copied());
            }
        }
        Ok(None)
    }
}

fn invalid(context: &str) -> impl Fn(hdf5::Error) -> LdmatError + '_ {
    move |e| LdmatError::InvalidContainer(format!("{}: {}", context, e))
}

fn dataset(group: &Group, name: &str) -> LdmatResult<Dataset> {
    group.dataset(name).map_err(invalid(name))
}

/// Validate dataset shapes against each other and the matrix limit
fn check_chunk(name: &str, group: &Group, max_matrix_bytes: u64) -> LdmatResult<usize> {
    let positions = dataset(group, POSITIONS)?.shape();
    let ld = dataset(group, LD_VALUES)?.shape();
    let names = dataset(group, NAMES)?.shape();

    let n = match positions.as_slice() {
        [n] => *n,
        _ => {
            return Err(LdmatError::InvalidContainer(format!(
                "chunk {}: positions must be one-dimensional",
                name
            )))
        }
    };
    if ld != [n, n] || names != [n] {
        return Err(LdmatError::InvalidContainer(format!(
            "chunk {}: dataset shapes disagree (LD_values {:?}, positions {:?}, names {:?})",
            name, ld, positions, names
        )));
    }

    if n > max_markers_for(max_matrix_bytes) {
        return Err(LdmatError::Allocation {
            markers: n,
            bytes: required_bytes(n).unwrap_or(u64::MAX),
            limit: max_matrix_bytes,
        });
    }
    Ok(n)
}

fn read_positions(group: &Group) -> LdmatResult<Vec<i64>> {
    dataset(group, POSITIONS)?
        .read_raw::<i64>()
        .map_err(invalid(POSITIONS))
}

fn read_names(group: &Group) -> LdmatResult<Vec<String>> {
    let raw = dataset(group, NAMES)?
        .read_raw::<FixedAscii<MAX_NAME_LEN>>()
        .map_err(invalid(NAMES))?;
    Ok(raw.iter().map(|name| name.as_str().to_string()).collect())
}

/// Square LD block over `range` on both axes
fn read_block(group: &Group, range: Range<usize>) -> LdmatResult<LdMatrix> {
    let block = dataset(group, LD_VALUES)?
        .read_slice_2d::<f32, _>(s![range.clone(), range.clone()])
        .map_err(invalid(LD_VALUES))?;
    LdMatrix::from_values(range.len(), block.iter().copied().collect())
}

fn marker_range(positions: &[i64], start: i64, end: i64) -> Range<usize> {
    let lo = positions.partition_point(|p| *p < start);
    let hi = positions.partition_point(|p| *p <= end);
    lo..hi.max(lo)
}

fn block_diagonal(blocks: &[LdMatrix]) -> LdmatResult<LdMatrix> {
    let n: usize = blocks.iter().map(|b| b.n()).sum();
    let mut values = vec![0f32; n * n];
    let mut origin = 0;
    for block in blocks {
        for i in 0..block.n() {
            let row = block.row(i);
            let start = (origin + i) * n + origin;
            values[start..start + block.n()].copy_from_slice(row);
        }
        origin += block.n();
    }
    LdMatrix::from_values(n, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::format::chunk_name;
    use crate::container::writer::{ChunkPayload, LdmatWriter};
    use tempfile::{tempdir, TempDir};

    /// Four markers at 100..400 with r2 = (i + j) / 10 off the diagonal
    fn sample_matrix() -> LdMatrix {
        let mut matrix = LdMatrix::allocate(4, 1024).unwrap();
        for i in 0..4 {
            for j in i + 1..4 {
                matrix.set_symmetric(i, j, (i + j) as f32 / 10.0);
            }
        }
        matrix
    }

    fn write_sample(level: u32) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.ldmat");
        let matrix = sample_matrix();
        let name = chunk_name(100);

        LdmatWriter::new(level)
            .write(
                &path,
                &RootAttributes::new("7", 100, 400),
                &[ChunkPayload {
                    name: &name,
                    attributes: ChunkAttributes {
                        start_locus: 100,
                        end_locus: 400,
                    },
                    ld_values: &matrix,
                    positions: &[100, 200, 300, 400],
                    names: &["rs1", "rs22", "rs333", "rs4444"],
                }],
            )
            .unwrap();

        (dir, path)
    }

    #[test]
    fn test_read_chunk() {
        for level in [0, 6] {
            let (_dir, path) = write_sample(level);
            let reader = LdmatReader::open(&path).unwrap();

            assert_eq!(reader.root(), &RootAttributes::new("7", 100, 400));
            assert_eq!(reader.chunks().len(), 1);
            assert_eq!(reader.chunks()[0].name, "chunk_100");
            assert_eq!(reader.chunks()[0].markers, 4);

            let chunk = reader.read_chunk("chunk_100").unwrap();
            assert_eq!(chunk.positions, vec![100, 200, 300, 400]);
            assert_eq!(chunk.names, vec!["rs1", "rs22", "rs333", "rs4444"]);
            assert_eq!(chunk.ld_values.get(1, 3), Some(0.4));
            assert_eq!(chunk.ld_values.get(3, 1), Some(0.4));
            assert_eq!(chunk.ld_values.get(2, 2), Some(1.0));

            assert!(reader.read_chunk("chunk_999").is_err());
        }
    }

    #[test]
    fn test_query_region() {
        for level in [0, 6] {
            let (_dir, path) = write_sample(level);
            let reader = LdmatReader::open(&path).unwrap();

            let region = reader.query_region(150, 300).unwrap();
            assert_eq!(region.chromosome, "7");
            assert_eq!(region.positions, vec![200, 300]);
            assert_eq!(region.names, vec!["rs22", "rs333"]);
            assert_eq!(region.ld_values.n(), 2);
            assert_eq!(region.ld_values.as_slice(), &[1.0, 0.3, 0.3, 1.0]);

            let empty = reader.query_region(401, 900).unwrap();
            assert!(empty.is_empty());
            assert_eq!(empty.ld_values.n(), 0);
        }
    }

    #[test]
    fn test_query_region_across_chunks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("two.ldmat");
        let mut first = LdMatrix::allocate(2, 1024).unwrap();
        first.set_symmetric(0, 1, 0.6);
        let mut second = LdMatrix::allocate(2, 1024).unwrap();
        second.set_symmetric(0, 1, 0.7);

        // Directory order differs from genomic order
        LdmatWriter::default()
            .write(
                &path,
                &RootAttributes::new("3", 10, 40),
                &[
                    ChunkPayload {
                        name: "chunk_30",
                        attributes: ChunkAttributes {
                            start_locus: 30,
                            end_locus: 40,
                        },
                        ld_values: &second,
                        positions: &[30, 40],
                        names: &["c", "d"],
                    },
                    ChunkPayload {
                        name: "chunk_10",
                        attributes: ChunkAttributes {
                            start_locus: 10,
                            end_locus: 20,
                        },
                        ld_values: &first,
                        positions: &[10, 20],
                        names: &["a", "b"],
                    },
                ],
            )
            .unwrap();

        let reader = LdmatReader::open(&path).unwrap();
        let names: Vec<&str> = reader.chunks().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["chunk_10", "chunk_30"]);

        let region = reader.query_region(20, 30).unwrap();
        assert_eq!(region.positions, vec![20, 30]);
        assert_eq!(region.ld_values.as_slice(), &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(reader.lookup(30, 40).unwrap(), Some(0.7));
    }

    #[test]
    fn test_lookup() {
        let (_dir, path) = write_sample(0);
        let reader = LdmatReader::open(&path).unwrap();

        assert_eq!(reader.lookup(100, 300).unwrap(), Some(0.2));
        assert_eq!(reader.lookup(300, 100).unwrap(), Some(0.2));
        assert_eq!(reader.lookup(100, 150).unwrap(), None);
    }

    #[test]
    fn test_matrix_limit_checked_on_open() {
        let (_dir, path) = write_sample(6);

        // 4 markers need 64 bytes
        assert!(LdmatReader::open_with_limit(&path, 64).is_ok());
        match LdmatReader::open_with_limit(&path, 63) {
            Err(LdmatError::Allocation { markers, bytes, .. }) => {
                assert_eq!(markers, 4);
                assert_eq!(bytes, 64);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_inconsistent_shapes_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.ldmat");
        {
            let file = hdf5::File::create(&path).unwrap();
            RootAttributes::new("1", 1, 2).write_to(&file).unwrap();
            let group = file.create_group("chunk_1").unwrap();
            ChunkAttributes {
                start_locus: 1,
                end_locus: 2,
            }
            .write_to(&group)
            .unwrap();
            group
                .new_dataset::<i64>()
                .shape(3usize)
                .create(POSITIONS)
                .unwrap();
            group.new_dataset::<f32>().shape((2usize, 2usize)).create(LD_VALUES).unwrap();
            group
                .new_dataset::<FixedAscii<16>>()
                .shape(2usize)
                .create(NAMES)
                .unwrap();
        }

        assert!(matches!(
            LdmatReader::open(&path),
            Err(LdmatError::InvalidContainer(_))
        ));
    }

    #[test]
    fn test_non_hdf5_and_missing_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.ldmat");
        std::fs::write(&path, b"CHR_A BP_A SNP_A\n").unwrap();

        assert!(matches!(
            LdmatReader::open(&path),
            Err(LdmatError::InvalidContainer(_))
        ));
        assert!(matches!(
            LdmatReader::open(dir.path().join("missing.ldmat")),
            Err(LdmatError::Io { .. })
        ));
    }

    #[test]
    fn test_marker_range() {
        let positions = [100, 200, 300];
        assert_eq!(marker_range(&positions, 100, 300), 0..3);
        assert_eq!(marker_range(&positions, 101, 299), 1..2);
        assert_eq!(marker_range(&positions, 301, 400), 3..3);
        assert_eq!(marker_range(&positions, 300, 100), 2..2);
    }

    #[test]
    fn test_block_diagonal() {
        let a = LdMatrix::from_values(1, vec![1.0]).unwrap();
        let b = LdMatrix::from_values(2, vec![1.0, 0.5, 0.5, 1.0]).unwrap();
        let merged = block_diagonal(&[a, b]).unwrap();
        assert_eq!(
            merged.as_slice(),
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.5, 0.0, 0.5, 1.0]
        );
    }
}
