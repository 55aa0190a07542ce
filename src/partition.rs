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

//! The work partitioner: maps a rank to a contiguous row range of the
//! virtual disjoint matrix, ScaLAPACK-style (spec.md §4.7).
use crate::error::{EngineError, Result};

/// First row index assigned to rank `r` of `p`.
#[inline]
pub fn block_low(r: usize, p: usize, l: u64) -> u64 {
    (r as u64 * l) / p as u64
}

/// Number of rows assigned to rank `r` of `p`. May be zero when `p > l`.
#[inline]
pub fn block_size(r: usize, p: usize, l: u64) -> u64 {
    block_low(r + 1, p, l) - block_low(r, p, l)
}

/// The slice `[s_offset, s_offset + s_size)` assigned to rank `r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub s_offset: u64,
    pub s_size: u64,
}

/// Computes the partition for rank `r` of `p` ranks over `l` virtual rows,
/// validating `p > 0` and `r < p`.
pub fn partition_for(r: usize, p: usize, l: u64) -> Result<Partition> {
    if p == 0 {
        return Err(EngineError::DistributedInitFailure { reason: "zero ranks".into() });
    }
    if r >= p {
        return Err(EngineError::DistributedInitFailure {
            reason: format!("rank {} out of range for {} ranks", r, p),
        });
    }
    Ok(Partition { s_offset: block_low(r, p, l), s_size: block_size(r, p, l) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_contiguous_and_sum_to_l() {
        for p in 1..9usize {
            for l in [0u64, 1, 5, 7, 21, 1000] {
                let mut sum = 0u64;
                let mut prev_end = 0u64;
                for r in 0..p {
                    let lo = block_low(r, p, l);
                    let sz = block_size(r, p, l);
                    assert_eq!(lo, prev_end, "gap at rank {} for p={} l={}", r, p, l);
                    prev_end = lo + sz;
                    sum += sz;
                }
                assert_eq!(sum, l, "blocks don't sum to L for p={} l={}", p, l);
                assert_eq!(prev_end, l);
            }
        }
    }

    #[test]
    fn lopsided_partition_zeroes_high_ranks() {
        // L = 5, P = 8: ranks 5..7 must get size 0 (scenario 6 of spec.md §8).
        let p = 8;
        let l = 5u64;
        for r in 5..8 {
            assert_eq!(block_size(r, p, l), 0);
        }
        let nonzero: u64 = (0..p).map(|r| block_size(r, p, l)).sum();
        assert_eq!(nonzero, l);
    }

    #[test]
    fn rejects_zero_ranks_and_out_of_range_rank() {
        assert!(partition_for(0, 0, 10).is_err());
        assert!(partition_for(5, 3, 10).is_err());
        assert!(partition_for(0, 3, 10).is_ok());
    }
}
