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

//! The dataset store: sort, dedupe and class-index the bit-packed
//! observation matrix produced by the reader.
//!
//! A row is `w` consecutive 64-bit words. Bits are addressed by a single
//! global, 0-based index that counts from the most significant bit of
//! word 0 onward (see `bits::word_and_bit`): attribute `j` lives at global
//! position `j`, and class bit `m` lives at global position `a + m` —
//! always the *current* attribute count, so the same formula keeps
//! working after the JNSQ stage grows `a`. Because each row is itself
//! packed most-significant-bit-first, comparing two rows' word slices
//! with the standard slice `Ord` already implements spec.md's
//! "lexicographic word comparison, most significant word first."
use crate::bits::{get_bit, leading_mask, set_bit, words_for_bits};
use crate::error::{EngineError, InvariantBreach, Result};

/// First-row pointer and observation count for one class.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassEntry {
    pub first_row: usize,
    pub count: usize,
}

/// Per-class occupancy of the sorted dataset. Rows of a given class are
/// guaranteed contiguous once the dataset is sorted, because class bits
/// are the lowest-order bits of the row.
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    pub entries: Vec<ClassEntry>,
}

impl ClassIndex {
    pub fn n_k(&self, class: usize) -> usize {
        self.entries[class].count
    }
}

/// The bit-packed observation matrix plus its class index.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub words: Vec<u64>,
    pub n: usize,
    pub w: usize,
    pub a: usize,
    pub c: usize,
    pub k: usize,
    pub class_index: ClassIndex,
}

impl Dataset {
    /// Builds a dataset from already word-packed rows, without sorting,
    /// deduping or indexing classes (callers are expected to run
    /// `prepare` before using it in the cover loop).
    pub fn new(words: Vec<u64>, n: usize, w: usize, a: usize, c: usize, k: usize) -> Self {
        debug_assert_eq!(words.len(), n * w);
        debug_assert_eq!(w, words_for_bits(a + c));
        Dataset { words, n, w, a, c, k, class_index: ClassIndex::default() }
    }

    #[inline]
    pub fn row(&self, idx: usize) -> &[u64] {
        &self.words[idx * self.w..(idx + 1) * self.w]
    }

    #[inline]
    pub fn row_mut(&mut self, idx: usize) -> &mut [u64] {
        let w = self.w;
        &mut self.words[idx * w..(idx + 1) * w]
    }

    /// Row address for class-pair `(class, idx)`, resolving through the
    /// class index rather than a raw pointer chain (spec.md Design Notes
    /// §9: "index pairs that resolve to rows via a small lookup").
    #[inline]
    pub fn class_row(&self, class: usize, idx: usize) -> &[u64] {
        let base = self.class_index.entries[class].first_row;
        self.row(base + idx)
    }

    /// Reads the class field (the low `c` bits of the row, at global
    /// position `a..a+c`) as an unsigned integer.
    pub fn class_of_row(&self, idx: usize) -> usize {
        read_field(self.row(idx), self.a, self.c) as usize
    }

    /// Sorts rows lexicographically (whole row, attribute+JNSQ+class bits
    /// together) and drops rows that are equal on every bit to the row
    /// immediately preceding them. Returns the number of rows removed.
    ///
    /// Must be run once, before `build_class_index` and before the JNSQ
    /// stage (which itself assumes sorted, deduped input).
    pub fn sort_and_dedup(&mut self) -> usize {
        let w = self.w;
        let mut rows: Vec<&[u64]> = self.words.chunks(w).collect();
        rows.sort_unstable();

        let mut deduped: Vec<u64> = Vec::with_capacity(self.words.len());
        let mut kept = 0usize;
        for (i, row) in rows.iter().enumerate() {
            if i == 0 || *row != rows[i - 1] {
                deduped.extend_from_slice(row);
                kept += 1;
            }
        }
        let removed = self.n - kept;
        self.words = deduped;
        self.n = kept;
        removed
    }

    /// `true` iff two rows agree on every attribute bit (ignoring JNSQ and
    /// class bits), per spec.md §4.1's same-attribute test: compare whole
    /// words up to `a / 64`, then mask the leading `a % 64` bits of the
    /// boundary word.
    pub fn same_attributes(&self, row_a: &[u64], row_b: &[u64]) -> bool {
        let whole_words = self.a / 64;
        if row_a[..whole_words] != row_b[..whole_words] {
            return false;
        }
        let tail_bits = self.a % 64;
        if tail_bits == 0 {
            return true;
        }
        let mask = leading_mask(tail_bits);
        (row_a[whole_words] & mask) == (row_b[whole_words] & mask)
    }

    /// Builds the class index from the sorted, deduped dataset: a single
    /// forward pass recording each class's first row and occupancy.
    /// Fails with `ClassOutOfRange` the moment a row names a class `>= k`.
    pub fn build_class_index(&mut self) -> Result<()> {
        let mut entries = vec![ClassEntry::default(); self.k];
        let mut seen = vec![false; self.k];

        for idx in 0..self.n {
            let class = self.class_of_row(idx);
            if class >= self.k {
                return Err(EngineError::ClassOutOfRange { row: idx, class, k: self.k });
            }
            if !seen[class] {
                entries[class].first_row = idx;
                seen[class] = true;
            }
            entries[class].count += 1;
        }

        self.class_index = ClassIndex { entries };
        Ok(())
    }

    /// Total row count of the virtual disjoint matrix, `L = Σ_{a<b} n_a·n_b`.
    pub fn virtual_row_count(&self) -> u64 {
        let counts: Vec<u64> = (0..self.k).map(|c| self.class_index.n_k(c) as u64).collect();
        let mut l = 0u64;
        for a in 0..counts.len() {
            for b in (a + 1)..counts.len() {
                l += counts[a] * counts[b];
            }
        }
        l
    }

    /// Sum of per-class counts; should equal `n` after a correct
    /// `build_class_index` (spec.md §8 invariant 1).
    pub fn class_count_sum(&self) -> usize {
        self.class_index.entries.iter().map(|e| e.count).sum()
    }

    /// Rewrites the class field of row `idx` in place, used only by
    /// `reader`/test helpers that build datasets directly from class
    /// labels rather than pre-packed class bits.
    pub fn set_class(&mut self, idx: usize, class: usize) {
        let a = self.a;
        let c = self.c;
        write_field(self.row_mut(idx), a, c, class as u64, false);
    }

    /// Runs the full preparation pipeline: sort+dedup, then class index.
    /// Returns the number of rows removed by dedup.
    pub fn prepare(&mut self) -> Result<usize> {
        let removed = self.sort_and_dedup();
        self.build_class_index()?;
        let l = self.virtual_row_count();
        if self.class_count_sum() != self.n {
            return Err(InvariantBreach::SliceExceedsMatrix { s_size: self.n as u64, total_rows: l }.into());
        }
        Ok(removed)
    }
}

/// Reads `width` bits starting at global bit position `start` as an
/// unsigned integer (MSB of the field is the bit at `start`).
pub fn read_field(words: &[u64], start: usize, width: usize) -> u64 {
    let mut value = 0u64;
    for i in 0..width {
        value = (value << 1) | (get_bit(words, start + i) as u64);
    }
    value
}

/// Writes the low `width` bits of `value` into the field starting at
/// global bit position `start`. When `bit_reversed` is set, the field's
/// bit order is reversed before writing (used by the JNSQ stage). This
/// generic bit-by-bit writer naturally handles a field that straddles a
/// word boundary: the high bits land in the low end of the word holding
/// the previous field's tail, and the remaining bits land in the high end
/// of the following word, exactly as spec.md §4.2 describes.
pub fn write_field(words: &mut [u64], start: usize, width: usize, value: u64, bit_reversed: bool) {
    let value = if bit_reversed && width > 1 { crate::bits::reverse_bits(value, width) } else { value };
    for i in 0..width {
        let bit = (value >> (width - 1 - i)) & 1 == 1;
        set_bit(words, start + i, bit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset_from_rows(rows: &[(Vec<bool>, usize)], k: usize) -> Dataset {
        let a = rows[0].0.len();
        let c = crate::jnsq::bits_for_classes(k);
        let w = words_for_bits(a + c);
        let mut words = vec![0u64; rows.len() * w];
        for (i, (attrs, class)) in rows.iter().enumerate() {
            let row = &mut words[i * w..(i + 1) * w];
            for (j, bit) in attrs.iter().enumerate() {
                set_bit(row, j, *bit);
            }
            write_field(row, a, c, *class as u64, false);
        }
        Dataset::new(words, rows.len(), w, a, c, k)
    }

    #[test]
    fn sort_and_dedup_removes_exact_duplicates() {
        let mut ds = dataset_from_rows(
            &[
                (vec![true, false, false], 0),
                (vec![true, false, false], 0),
                (vec![false, true, true], 1),
            ],
            2,
        );
        let removed = ds.sort_and_dedup();
        assert_eq!(removed, 1);
        assert_eq!(ds.n, 2);
    }

    #[test]
    fn dedup_keeps_same_attributes_different_class() {
        let mut ds = dataset_from_rows(
            &[
                (vec![true, false, false], 0),
                (vec![true, false, false], 1),
            ],
            2,
        );
        let removed = ds.sort_and_dedup();
        assert_eq!(removed, 0);
        assert_eq!(ds.n, 2);
    }

    #[test]
    fn class_index_groups_contiguous_rows() {
        let mut ds = dataset_from_rows(
            &[
                (vec![true, false, false], 0),
                (vec![true, true, false], 0),
                (vec![false, true, true], 1),
                (vec![true, true, true], 1),
            ],
            2,
        );
        ds.sort_and_dedup();
        ds.build_class_index().unwrap();
        assert_eq!(ds.class_count_sum(), ds.n);
        assert_eq!(ds.virtual_row_count(), (ds.class_index.n_k(0) * ds.class_index.n_k(1)) as u64);
    }

    #[test]
    fn class_out_of_range_is_reported() {
        let mut ds = dataset_from_rows(&[(vec![true, false], 5)], 2);
        let err = ds.build_class_index().unwrap_err();
        matches!(err, EngineError::ClassOutOfRange { .. });
    }

    #[test]
    fn same_attributes_ignores_class_tail() {
        let ds = dataset_from_rows(&[(vec![true, false, true], 0), (vec![true, false, true], 1)], 2);
        assert!(ds.same_attributes(ds.row(0), ds.row(1)));
    }

    #[test]
    fn field_roundtrip_across_word_boundary() {
        let mut words = vec![0u64; 2];
        write_field(&mut words, 60, 8, 0b1010_1100, false);
        assert_eq!(read_field(&words, 60, 8), 0b1010_1100);
    }
}
