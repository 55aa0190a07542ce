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

//! The virtual disjoint matrix: generates any line or column on demand by
//! XORing the two dataset rows an `Enumerator` tuple points at. No line or
//! column is ever materialized to disk or cached across calls (spec.md
//! Design Notes §9: "any caching strategy is an implementation choice, not
//! a contract").
use crate::bits::{transpose_rows_to_columns, word_and_bit, words_for_bits, WORD_BITS};
use crate::dataset::Dataset;
use crate::enumerator::Enumerator;
use crate::error::Result;

/// Walks exactly `s_size` class-pair rows starting at `start`, invoking
/// `f` with the 0-based position within the slice and the two rows' word
/// slices. This single traversal is reused by `get_column` and by every
/// entry point of the attribute-total engine, collapsing the
/// line-view/column-view duplication spec.md's Design Notes call out in
/// the original source.
pub fn for_each_pair<F>(dataset: &Dataset, counts: &[usize], start: Enumerator, s_size: u64, mut f: F) -> Result<()>
where
    F: FnMut(u64, &[u64], &[u64]) -> Result<()>,
{
    let mut e = start;
    for p in 0..s_size {
        let row_a = dataset.class_row(e.pos.class_a, e.pos.idx_a);
        let row_b = dataset.class_row(e.pos.class_b, e.pos.idx_b);
        f(p, row_a, row_b)?;
        if p + 1 < s_size {
            e.advance(counts)?;
        }
    }
    Ok(())
}

/// Generates the bit array of `s_size` bits where bit `p` is 1 iff the
/// pair at position `s_offset + p` differs in attribute `attribute`.
/// Packed most-significant-bit-first within each output word, since
/// downstream consumers depend on that convention (spec.md §4.4).
///
/// Pairs are batched 64 at a time and run through a block transpose
/// (`bits::transpose_rows_to_columns`) rather than tested bit by bit: each
/// batch's per-pair XOR word for `attribute`'s word-index already holds
/// every other attribute of that word too, so the transpose yields this
/// attribute's column for the whole batch in one step.
pub fn get_column(
    dataset: &Dataset,
    counts: &[usize],
    start: Enumerator,
    s_size: u64,
    attribute: usize,
) -> Result<Vec<u64>> {
    let (word, _) = word_and_bit(attribute);
    let k = attribute % WORD_BITS;
    let mut out = vec![0u64; words_for_bits(s_size as usize)];
    let mut batch = [0u64; WORD_BITS];

    for_each_pair(dataset, counts, start, s_size, |p, row_a, row_b| {
        let local = (p as usize) % WORD_BITS;
        batch[local] = row_a[word] ^ row_b[word];
        if local == WORD_BITS - 1 || p + 1 == s_size {
            let columns = transpose_rows_to_columns(&batch);
            out[(p as usize) / WORD_BITS] = columns[k];
            batch = [0u64; WORD_BITS];
        }
        Ok(())
    })?;

    Ok(out)
}
