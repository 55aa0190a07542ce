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

//! The JNSQ ("join-not-same-question") disambiguation stage: makes the
//! projection onto attributes a function of class by encoding a running
//! inconsistency counter into a new field inserted between the attribute
//! bits and the class bits.
//!
//! Must run after `Dataset::sort_and_dedup` and before the cover loop: it
//! assumes rows are already sorted and free of exact duplicates, so that
//! "same attributes as the previous row" really does mean "an
//! inconsistency", not an unrelated repeated observation.
use crate::bits::{bits_to_represent, get_bit, set_bit, words_for_bits};
use crate::dataset::{read_field, write_field, Dataset};

/// Sizes the class field for `k` classes: `ceil(log2(k))` bits, the
/// smallest field that can hold every class id in `0..k`.
pub fn bits_for_classes(k: usize) -> usize {
    bits_to_represent(k as u64)
}

/// Tunable encoding details of the JNSQ field. The bit-reversal for
/// widths greater than one bit is an externally visible contract
/// (spec.md Design Notes §9) preserved here as the default; set
/// `bit_reversed: false` only to match a reference encoder that is known
/// to have dropped it.
#[derive(Debug, Clone, Copy)]
pub struct JnsqOptions {
    pub bit_reversed: bool,
}

impl Default for JnsqOptions {
    fn default() -> Self {
        JnsqOptions { bit_reversed: true }
    }
}

/// Outcome of running the JNSQ stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JnsqResult {
    pub max_inconsistency: u32,
    pub jnsq_width: usize,
    pub rows_touched: usize,
}

/// Runs the JNSQ stage on `dataset` in place. Rows that already have no
/// attribute-duplicate neighbor in different classes cause this to be a
/// true no-op: `jnsq_width` comes out as `0` and `dataset.a`/`dataset.w`
/// are left untouched.
pub fn apply_jnsq(dataset: &mut Dataset, options: JnsqOptions) -> JnsqResult {
    let mut inconsistency = vec![0u32; dataset.n];
    let mut max_inconsistency = 0u32;
    let mut rows_touched = 0usize;

    for i in 1..dataset.n {
        if dataset.same_attributes(dataset.row(i - 1), dataset.row(i)) {
            inconsistency[i] = inconsistency[i - 1] + 1;
            rows_touched += 1;
        } else {
            inconsistency[i] = 0;
        }
        max_inconsistency = max_inconsistency.max(inconsistency[i]);
    }

    let jnsq_width = bits_to_represent(max_inconsistency as u64 + 1);
    if jnsq_width == 0 {
        return JnsqResult { max_inconsistency, jnsq_width: 0, rows_touched: 0 };
    }

    let old_a = dataset.a;
    let old_w = dataset.w;
    let c = dataset.c;
    let new_a = old_a + jnsq_width;
    let new_w = words_for_bits(new_a + c);

    let mut new_words = vec![0u64; dataset.n * new_w];
    for i in 0..dataset.n {
        let old_row = &dataset.words[i * old_w..(i + 1) * old_w];
        let new_row = &mut new_words[i * new_w..(i + 1) * new_w];

        for bit in 0..old_a {
            let value = get_bit(old_row, bit);
            set_bit(new_row, bit, value);
        }
        write_field(new_row, old_a, jnsq_width, inconsistency[i] as u64, options.bit_reversed);
        let class_value = read_field(old_row, old_a, c);
        write_field(new_row, new_a, c, class_value, false);
    }

    dataset.words = new_words;
    dataset.a = new_a;
    dataset.w = new_w;

    JnsqResult { max_inconsistency, jnsq_width, rows_touched }
}
