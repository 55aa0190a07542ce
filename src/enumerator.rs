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

//! The class-pair enumerator: maps a linear row index of the virtual
//! disjoint matrix to the `(classA, idxA, classB, idxB)` tuple the
//! nested-loop ordering of spec.md §3 would reach at that index, and can
//! step forward one tuple at a time in that same order.
//!
//! Row order is an external contract (the partitioner assumes it): outer
//! `classA`, then `idxA`, then `classB > classA`, then (fastest) `idxB`.
use crate::error::{EngineError, InvariantBreach, Result};

/// One row of the virtual disjoint matrix, as a pair of class-local
/// observation coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairIndex {
    pub class_a: usize,
    pub idx_a: usize,
    pub class_b: usize,
    pub idx_b: usize,
}

/// Stateful cursor over the virtual disjoint matrix's row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enumerator {
    pub pos: PairIndex,
}

impl Enumerator {
    /// Returns the tuple reached at linear index `l` by iterating the
    /// nested loop of spec.md §3 until its innermost counter equals `l`.
    /// `K = 2` is resolved in O(1); `K > 2` walks the loop in O(l) (the
    /// contract says this is only ever called once per rank, at setup).
    pub fn at(l: u64, counts: &[usize]) -> Result<Self> {
        let k = counts.len();
        if k < 2 {
            return Err(EngineError::DatasetMalformed { reason: "fewer than two classes".into() });
        }

        if k == 2 {
            let n1 = counts[1] as u64;
            if n1 == 0 {
                return Err(InvariantBreach::EnumeratorOutOfRange { linear_index: l, total_rows: 0 }.into());
            }
            let idx_a = (l / n1) as usize;
            let idx_b = (l % n1) as usize;
            if idx_a >= counts[0] {
                return Err(InvariantBreach::EnumeratorOutOfRange {
                    linear_index: l,
                    total_rows: counts[0] as u64 * n1,
                }
                .into());
            }
            return Ok(Enumerator { pos: PairIndex { class_a: 0, idx_a, class_b: 1, idx_b } });
        }

        let mut e = Enumerator { pos: PairIndex { class_a: 0, idx_a: 0, class_b: 1, idx_b: 0 } };
        for step in 0..l {
            e.advance(counts).map_err(|_| {
                EngineError::from(InvariantBreach::EnumeratorOutOfRange { linear_index: step + 1, total_rows: l })
            })?;
        }
        Ok(e)
    }

    /// Moves to the next tuple in nested-loop order: `idxB` advances
    /// fastest, then `classB`, then `idxA`, then (slowest) `classA`.
    pub fn advance(&mut self, counts: &[usize]) -> Result<()> {
        let k = counts.len();
        let p = &mut self.pos;

        p.idx_b += 1;
        if p.idx_b < counts[p.class_b] {
            return Ok(());
        }
        p.idx_b = 0;
        p.class_b += 1;
        if p.class_b < k {
            return Ok(());
        }

        p.idx_a += 1;
        if p.idx_a < counts[p.class_a] {
            p.class_b = p.class_a + 1;
            return Ok(());
        }
        p.idx_a = 0;
        p.class_a += 1;
        if p.class_a < k - 1 {
            p.class_b = p.class_a + 1;
            return Ok(());
        }

        Err(InvariantBreach::EnumeratorOutOfRange { linear_index: 0, total_rows: 0 }.into())
    }
}
