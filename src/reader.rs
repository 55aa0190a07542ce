// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The dataset-container reader — the "Dataset reader (consumed)" external
//! collaborator of spec.md §6. No production container format is named by
//! spec.md, so this module supplies a small, self-contained binary format
//! adequate for this crate's own round-trips: a production deployment
//! would swap this module for a reader over its own data lake format
//! without touching `dataset.rs` or anything downstream of it.
//!
//! Mirrors the teacher's `impl From<Lines<B>> for Knapsack` shape — a
//! small parser living next to the `RawDataset` it feeds, returning a
//! typed error rather than panicking on malformed input.
use std::convert::TryInto;
use std::fs;

use crate::error::{EngineError, Result};

const MAGIC: &[u8; 4] = b"LAID";

/// The raw materials the core assumes about a dataset, exactly the tuple
/// spec.md §6 names: `(N, W, data, K, A, C)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataset {
    pub n: usize,
    pub w: usize,
    pub a: usize,
    pub c: usize,
    pub k: usize,
    pub data: Vec<u64>,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.bytes.len() {
            return Err(EngineError::DatasetMalformed { reason: "unexpected end of container".into() });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn str(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| EngineError::DatasetMalformed { reason: "dataset name is not valid UTF-8".into() })
    }
}

/// Reads the container and returns the named dataset's raw materials.
pub struct DatasetContainer;

impl DatasetContainer {
    /// Opens `path`, scans its table of named datasets, and returns the
    /// one named `name`. `DatasetNotFound` if `path` cannot be read,
    /// `MissingAttribute` if no entry in the container matches `name`.
    pub fn open(path: &str, name: &str) -> Result<RawDataset> {
        let bytes = fs::read(path).map_err(|_| EngineError::DatasetNotFound { path: path.to_string() })?;
        Self::parse(&bytes, path, name)
    }

    fn parse(bytes: &[u8], path: &str, name: &str) -> Result<RawDataset> {
        let mut cursor = Cursor::new(bytes);
        let magic = cursor.take(4)?;
        if magic != MAGIC {
            return Err(EngineError::DatasetMalformed { reason: "bad container magic".into() });
        }
        let count = cursor.u32()?;

        for _ in 0..count {
            let name_len = cursor.u32()? as usize;
            let entry_name = cursor.str(name_len)?;
            let n = cursor.u64()? as usize;
            let a = cursor.u32()? as usize;
            let c = cursor.u32()? as usize;
            let k = cursor.u32()? as usize;
            let w = cursor.u32()? as usize;
            let expected_w = crate::bits::words_for_bits(a + c);
            if w != expected_w {
                return Err(EngineError::DatasetMalformed {
                    reason: format!("dataset '{}' declares w={} but a+c={} needs {}", entry_name, w, a + c, expected_w),
                });
            }

            let word_count = n * w;
            if entry_name != name {
                // Skip this entry's data block without materializing it.
                cursor.take(word_count * 8)?;
                continue;
            }

            if k < 2 {
                return Err(EngineError::DatasetMalformed { reason: "fewer than two classes".into() });
            }
            if n < 2 {
                return Err(EngineError::DatasetMalformed { reason: "fewer than two observations".into() });
            }
            if a < 1 {
                return Err(EngineError::DatasetMalformed { reason: "fewer than one attribute".into() });
            }

            let mut data = Vec::with_capacity(word_count);
            for _ in 0..word_count {
                data.push(cursor.u64()?);
            }
            return Ok(RawDataset { n, w, a, c, k, data });
        }

        Err(EngineError::MissingAttribute { dataset: path.to_string(), attribute: name.to_string() })
    }
}

/// Serializes a single named dataset into this module's container format.
/// Test-only support for building round-trip fixtures without hand-writing
/// byte offsets at every call site.
#[cfg(test)]
pub fn write_container(name: &str, dataset: &RawDataset) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&(name.len() as u32).to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&(dataset.n as u64).to_le_bytes());
    out.extend_from_slice(&(dataset.a as u32).to_le_bytes());
    out.extend_from_slice(&(dataset.c as u32).to_le_bytes());
    out.extend_from_slice(&(dataset.k as u32).to_le_bytes());
    out.extend_from_slice(&(dataset.w as u32).to_le_bytes());
    for word in &dataset.data {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawDataset {
        let a = 3;
        let c = 1;
        let w = crate::bits::words_for_bits(a + c);
        RawDataset { n: 2, w, a, c, k: 2, data: vec![0u64; 2 * w] }
    }

    #[test]
    fn round_trips_through_the_container_format() {
        let ds = sample();
        let bytes = write_container("iris", &ds);
        let parsed = DatasetContainer::parse(&bytes, "iris.bin", "iris").unwrap();
        assert_eq!(parsed, ds);
    }

    #[test]
    fn missing_dataset_name_is_reported() {
        let ds = sample();
        let bytes = write_container("iris", &ds);
        let err = DatasetContainer::parse(&bytes, "iris.bin", "wine").unwrap_err();
        assert!(matches!(err, EngineError::MissingAttribute { .. }));
    }

    #[test]
    fn bad_magic_is_malformed() {
        let err = DatasetContainer::parse(b"NOPE", "iris.bin", "iris").unwrap_err();
        assert!(matches!(err, EngineError::DatasetMalformed { .. }));
    }

    #[test]
    fn missing_file_is_dataset_not_found() {
        let err = DatasetContainer::open("/nonexistent/does-not-exist.laid", "iris").unwrap_err();
        assert!(matches!(err, EngineError::DatasetNotFound { .. }));
    }

    #[test]
    fn truncated_container_is_malformed_not_panicking() {
        let ds = sample();
        let bytes = write_container("iris", &ds);
        let truncated = &bytes[..bytes.len() - 3];
        let err = DatasetContainer::parse(truncated, "iris.bin", "iris").unwrap_err();
        assert!(matches!(err, EngineError::DatasetMalformed { .. }));
    }
}
