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

//! The set-cover driver: the per-rank round loop that turns attribute
//! totals into a greedy cover, one bulk-synchronous superstep at a time.
//!
//! `RoundState` plays the same role the teacher's `WorkLoad` enum plays in
//! `parallel.rs` — "what should this thread do on its next iteration" —
//! except where the teacher's workers pull from a shared `Mutex`-guarded
//! fringe and wait on a `Condvar` for starvation, every rank here passes
//! through the same four states in lockstep, synchronized only by the
//! collective operations of `distributed.rs`.
use bitset_fixed::BitSet;
use log::{debug, info};

use crate::bits::{get_bit, set_bit, words_for_bits};
use crate::distributed::Collective;
use crate::enumerator::Enumerator;
use crate::error::{EngineError, InvariantBreach, Result};
use crate::matrix::get_column;
use crate::partition::Partition;
use crate::shared::SharedDatasetHandle;
use crate::totals::{argmax, incremental_add, incremental_subtract, initial_totals};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundState {
    Init,
    Reduce,
    Decide,
    Update,
    Done,
}

/// Rank-private round state (spec.md §5: "no sharing").
struct RankState {
    start: Enumerator,
    s_size: u64,
    attribute_totals: Vec<u64>,
    covered_lines: Vec<u64>,
}

impl RankState {
    fn uncovered(&self) -> u64 {
        let covered: u32 = self.covered_lines.iter().map(|w| w.count_ones()).sum();
        self.s_size - covered as u64
    }
}

/// Runs the full cover loop for one rank. `collective.rank() == 0` is the
/// root: it alone tracks `selected_attributes`/`global_uncovered` and
/// returns `Some(solution)`. Every other rank returns `None`.
pub fn run_rank<C: Collective>(
    shared: &SharedDatasetHandle,
    partition: Partition,
    collective: &C,
) -> Result<Option<Vec<usize>>> {
    let dataset = shared.dataset();
    let counts = shared.counts();
    let a_prime = dataset.a;
    let l = dataset.virtual_row_count();

    let mut state = RoundState::Init;
    let mut rank = RankState {
        start: Enumerator::at(partition.s_offset, counts)?,
        s_size: partition.s_size,
        attribute_totals: vec![0u64; a_prime],
        covered_lines: vec![0u64; words_for_bits(partition.s_size as usize).max(1)],
    };

    let mut selected_attributes = BitSet::new(a_prime.max(1));
    let mut global_uncovered = l;
    let mut pending_global_totals: Option<Vec<u64>> = None;
    let mut best: i64 = -1;

    loop {
        state = match state {
            RoundState::Init => {
                if rank.s_size > 0 {
                    initial_totals(dataset, counts, rank.start, rank.s_size, &mut rank.attribute_totals)?;
                }
                RoundState::Reduce
            }

            RoundState::Reduce => {
                debug!("rank {} local attribute totals this round: {:?}", collective.rank(), rank.attribute_totals);
                let global_totals = collective.reduce_sum_u64(&rank.attribute_totals);
                if collective.rank() == 0 {
                    let global_totals =
                        global_totals.ok_or_else(|| EngineError::from(InvariantBreach::ReduceMissingAtRoot))?;
                    if global_totals.len() != a_prime {
                        return Err(EngineError::from(InvariantBreach::SliceExceedsMatrix {
                            s_size: global_totals.len() as u64,
                            total_rows: a_prime as u64,
                        }));
                    }
                    pending_global_totals = Some(global_totals);
                }
                RoundState::Decide
            }

            RoundState::Decide => {
                let chosen = if collective.rank() == 0 {
                    let global_totals = pending_global_totals
                        .take()
                        .ok_or_else(|| EngineError::from(InvariantBreach::ReduceMissingAtRoot))?;
                    let chosen = match argmax(&global_totals) {
                        Some(attr) if global_totals[attr] > 0 && global_uncovered > 0 => attr as i64,
                        _ => -1,
                    };
                    if chosen >= 0 {
                        selected_attributes.set(chosen as usize, true);
                        global_uncovered = global_uncovered
                            .checked_sub(global_totals[chosen as usize])
                            .ok_or_else(|| InvariantBreach::NegativeTotal { attribute: chosen as usize })?;
                        info!(
                            "selected attribute {} (discriminated {} pairs), {} pairs remain uncovered",
                            chosen, global_totals[chosen as usize], global_uncovered
                        );
                    } else {
                        info!("cover complete: no remaining attribute discriminates an uncovered pair");
                    }
                    chosen
                } else {
                    -1 // overwritten by the broadcast below
                };

                best = collective.broadcast_i64(if collective.rank() == 0 { Some(chosen) } else { None });
                if best < 0 {
                    RoundState::Done
                } else {
                    RoundState::Update
                }
            }

            RoundState::Update => {
                rank_update(dataset, counts, &mut rank, best as usize)?;
                RoundState::Reduce
            }

            RoundState::Done => break,
        };
    }

    if collective.rank() == 0 {
        let mut solution: Vec<usize> = (0..a_prime).filter(|&i| selected_attributes[i]).collect();
        solution.sort_unstable();
        Ok(Some(solution))
    } else {
        Ok(None)
    }
}

/// Applies the chosen attribute to this rank's local state: generates the
/// discriminating column for its slice, then follows spec.md §4.5's
/// add/subtract policy to keep `attribute_totals` in sync with the grown
/// `covered_lines` at minimum recompute cost.
fn rank_update(
    dataset: &crate::dataset::Dataset,
    counts: &[usize],
    rank: &mut RankState,
    best: usize,
) -> Result<()> {
    if rank.s_size == 0 {
        return Ok(());
    }

    let column = get_column(dataset, counts, rank.start, rank.s_size, best)?;
    let mut newly_covered = vec![0u64; rank.covered_lines.len()];
    let mut newly_covered_count = 0u64;
    for p in 0..rank.s_size as usize {
        let discriminates = get_bit(&column, p);
        let already_covered = get_bit(&rank.covered_lines, p);
        let is_new = discriminates && !already_covered;
        set_bit(&mut newly_covered, p, is_new);
        newly_covered_count += is_new as u64;
    }

    let uncovered_remainder = rank.uncovered();

    if newly_covered_count < uncovered_remainder {
        incremental_subtract(dataset, counts, rank.start, rank.s_size, &newly_covered, &mut rank.attribute_totals)?;
        for p in 0..rank.s_size as usize {
            if get_bit(&newly_covered, p) {
                set_bit(&mut rank.covered_lines, p, true);
            }
        }
    } else {
        for p in 0..rank.s_size as usize {
            if get_bit(&newly_covered, p) {
                set_bit(&mut rank.covered_lines, p, true);
            }
        }
        incremental_add(dataset, counts, rank.start, rank.s_size, &rank.covered_lines, &mut rank.attribute_totals)?;
    }

    Ok(())
}
