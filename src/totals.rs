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

//! The attribute-total engine: bit-parallel computation of per-attribute
//! discrimination counts, with incremental add/subtract under a growing
//! covered-lines mask.
//!
//! Processing is tiled in groups of `N_WORDS_PER_CYCLE` words over the
//! pair loop for cache locality (outer loop walks word groups, inner loop
//! re-walks the pairs). This is a cache-tiling heuristic, not part of the
//! correctness contract (spec.md Design Notes §9): changing the constant
//! changes performance, never the result.
use crate::bits::get_bit;
use crate::dataset::Dataset;
use crate::enumerator::Enumerator;
use crate::error::{EngineError, InvariantBreach, Result};
use crate::matrix::for_each_pair;

pub const N_WORDS_PER_CYCLE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Add,
    Subtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    /// Process every pair (used for the initial totals computation).
    All,
    /// Skip pairs whose `covered_lines` bit is set.
    SkipCovered,
    /// Process only pairs whose `covered_lines` bit is set.
    OnlyCovered,
}

fn accumulate(
    dataset: &Dataset,
    counts: &[usize],
    start: Enumerator,
    s_size: u64,
    covered_lines: &[u64],
    filter: Filter,
    sign: Sign,
    totals: &mut [u64],
) -> Result<()> {
    let w = dataset.w;
    let a_prime = totals.len();
    let mut word_lo = 0usize;

    while word_lo < w {
        let word_hi = (word_lo + N_WORDS_PER_CYCLE).min(w);

        for_each_pair(dataset, counts, start, s_size, |p, row_a, row_b| {
            let covered = get_bit(covered_lines, p as usize);
            let process = match filter {
                Filter::All => true,
                Filter::SkipCovered => !covered,
                Filter::OnlyCovered => covered,
            };
            if !process {
                return Ok(());
            }

            for word in word_lo..word_hi {
                let lxor = row_a[word] ^ row_b[word];
                if lxor == 0 {
                    continue;
                }
                for bit in 0..64usize {
                    if (lxor >> bit) & 1 != 1 {
                        continue;
                    }
                    let attribute = word * 64 + (63 - bit);
                    if attribute >= a_prime {
                        continue;
                    }
                    match sign {
                        Sign::Add => totals[attribute] += 1,
                        Sign::Subtract => {
                            debug_assert!(totals[attribute] > 0, "attribute {} total went negative", attribute);
                            totals[attribute] = totals[attribute].checked_sub(1).ok_or_else(|| {
                                EngineError::from(InvariantBreach::NegativeTotal { attribute })
                            })?;
                        }
                    }
                }
            }
            Ok(())
        })?;

        word_lo = word_hi;
    }

    Ok(())
}

/// Resets `totals` to zero and computes the discrimination count of every
/// attribute over every pair in this rank's slice (spec.md §4.5.1).
pub fn initial_totals(
    dataset: &Dataset,
    counts: &[usize],
    start: Enumerator,
    s_size: u64,
    totals: &mut [u64],
) -> Result<()> {
    for t in totals.iter_mut() {
        *t = 0;
    }
    let empty_covered = vec![0u64; crate::bits::words_for_bits(s_size as usize)];
    accumulate(dataset, counts, start, s_size, &empty_covered, Filter::All, Sign::Add, totals)
}

/// Rebuilds `totals` by adding the contribution of every *uncovered* pair
/// — used after the covered-set grows, when it is cheaper to rescan the
/// uncovered majority than to have kept a stale total (spec.md §4.5.2).
pub fn incremental_add(
    dataset: &Dataset,
    counts: &[usize],
    start: Enumerator,
    s_size: u64,
    covered_lines: &[u64],
    totals: &mut [u64],
) -> Result<()> {
    for t in totals.iter_mut() {
        *t = 0;
    }
    accumulate(dataset, counts, start, s_size, covered_lines, Filter::SkipCovered, Sign::Add, totals)
}

/// Subtracts the contribution of every newly-covered pair from an
/// already-computed `totals` vector, without rescanning the uncovered
/// majority (spec.md §4.5.3).
pub fn incremental_subtract(
    dataset: &Dataset,
    counts: &[usize],
    start: Enumerator,
    s_size: u64,
    covered_lines: &[u64],
    totals: &mut [u64],
) -> Result<()> {
    accumulate(dataset, counts, start, s_size, covered_lines, Filter::OnlyCovered, Sign::Subtract, totals)
}

/// Index of the maximum total, tie-broken toward the lowest attribute
/// index (spec.md §4.5: "return the lowest index"). Returns `None` if
/// every total is zero.
pub fn argmax(totals: &[u64]) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (i, &t) in totals.iter().enumerate() {
        if t == 0 {
            continue;
        }
        match best {
            Some((_, best_t)) if t <= best_t => {}
            _ => best = Some((i, t)),
        }
    }
    best.map(|(i, _)| i)
}
