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

//! The distributed-runtime abstraction: rank/size identity plus the three
//! collective operations the round loop needs (reduce, broadcast,
//! barrier). Modeled as a trait so the bulk-synchronous driver
//! (`driver.rs`) never depends on *how* ranks talk to each other — only
//! this module's `ThreadCollective` is shipped, an in-process
//! implementation where "ranks" are `crossbeam`-scoped OS threads sharing
//! state behind a `parking_lot::Mutex`/`Condvar`, directly generalizing
//! the `Shared<T>` / `Critical<T>` / `Condvar` triple the teacher's
//! `ParallelSolver` uses to coordinate its worker threads.
//!
//! A true multi-node MPI backend could implement the same `Collective`
//! trait without the rest of the crate changing; none is shipped because
//! no MPI crate is available in this crate's dependency set.
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// Rank identity, reduction, broadcast and barrier — the "Launcher
/// (consumed)" external interface of spec.md §6, generalized into a
/// trait so it can be swapped for a real distributed backend.
pub trait Collective: Send + Sync {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Sums `local` across all ranks element-wise. Only the root (rank 0)
    /// receives the sum; every other rank gets `None`, mirroring
    /// spec.md's "Reduce: all ranks contribute ... into
    /// global_attribute_totals at the root."
    fn reduce_sum_u64(&self, local: &[u64]) -> Option<Vec<u64>>;

    /// Broadcasts a value from the root to every rank. Only the root
    /// should pass `Some(value)`; every other rank must pass `None`. All
    /// ranks, including the root, receive the same returned value.
    fn broadcast_i64(&self, value: Option<i64>) -> i64;

    /// Blocks every rank until all ranks have called `barrier` for this
    /// round.
    fn barrier(&self);
}

/// Generic rendezvous state: every rank posts a contribution, the last
/// arriving rank computes a per-rank result vector, and every rank reads
/// its own slot before the round resets for reuse. This is the same
/// "two-phase" (arrive, then depart) barrier shape the teacher's
/// `get_workload`/`notify_node_finished` pair implements for its fringe,
/// generalized from "wait for a shared queue" to "wait for every rank's
/// contribution."
struct Inner<T, R> {
    contributions: Vec<Option<T>>,
    arrived: usize,
    results: Option<Vec<R>>,
    departed: usize,
}

struct Rendezvous<T, R> {
    size: usize,
    state: Mutex<Inner<T, R>>,
    cv: Condvar,
}

impl<T, R: Clone> Rendezvous<T, R> {
    fn new(size: usize) -> Self {
        Rendezvous {
            size,
            state: Mutex::new(Inner { contributions: (0..size).map(|_| None).collect(), arrived: 0, results: None, departed: 0 }),
            cv: Condvar::new(),
        }
    }

    fn round<F>(&self, rank: usize, value: T, finish: F) -> R
    where
        F: FnOnce(Vec<T>) -> Vec<R>,
    {
        let mut guard = self.state.lock();
        guard.contributions[rank] = Some(value);
        guard.arrived += 1;

        if guard.arrived == self.size {
            let contributions: Vec<T> = guard.contributions.iter_mut().map(|v| v.take().unwrap()).collect();
            let results = finish(contributions);
            debug_assert_eq!(results.len(), self.size);
            guard.results = Some(results);
            self.cv.notify_all();
        } else {
            while guard.results.is_none() {
                self.cv.wait(&mut guard);
            }
        }

        let result = guard.results.as_ref().unwrap()[rank].clone();
        guard.departed += 1;
        if guard.departed == self.size {
            guard.results = None;
            guard.arrived = 0;
            guard.departed = 0;
            self.cv.notify_all();
        } else {
            // Wait until the last rank has cleared `results` so that no
            // rank can race ahead into the *next* round's `contributions`
            // slot before every rank has read the current one.
            while guard.results.is_some() {
                self.cv.wait(&mut guard);
            }
        }
        result
    }
}

/// In-process `Collective` implementation: one OS thread per rank,
/// sharing an `Arc<Rendezvous<..>>` per kind of collective operation.
pub struct ThreadCollective {
    rank: usize,
    size: usize,
    reduce: Arc<Rendezvous<Vec<u64>, Option<Vec<u64>>>>,
    broadcast: Arc<Rendezvous<Option<i64>, i64>>,
    barrier: Arc<Rendezvous<(), ()>>,
}

impl ThreadCollective {
    /// Builds the `size` per-rank handles sharing the three rendezvous
    /// points this collective needs. Call once before spawning rank
    /// threads, then move one handle into each spawned closure.
    pub fn build(size: usize) -> Vec<ThreadCollective> {
        let reduce = Arc::new(Rendezvous::new(size));
        let broadcast = Arc::new(Rendezvous::new(size));
        let barrier = Arc::new(Rendezvous::new(size));

        (0..size)
            .map(|rank| ThreadCollective {
                rank,
                size,
                reduce: Arc::clone(&reduce),
                broadcast: Arc::clone(&broadcast),
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }
}

impl Collective for ThreadCollective {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn reduce_sum_u64(&self, local: &[u64]) -> Option<Vec<u64>> {
        self.reduce.round(self.rank, local.to_vec(), |contributions| {
            let width = contributions.iter().map(|v| v.len()).max().unwrap_or(0);
            let mut sum = vec![0u64; width];
            for local in &contributions {
                for (i, v) in local.iter().enumerate() {
                    sum[i] += v;
                }
            }
            let size = contributions.len();
            let mut results = vec![None; size];
            results[0] = Some(sum);
            results
        })
    }

    fn broadcast_i64(&self, value: Option<i64>) -> i64 {
        self.broadcast.round(self.rank, value, |contributions| {
            let root_value = contributions
                .iter()
                .find_map(|v| *v)
                .expect("broadcast called without exactly one rank supplying a value");
            vec![root_value; contributions.len()]
        })
    }

    fn barrier(&self) {
        self.barrier.round(self.rank, (), |contributions| vec![(); contributions.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn reduce_sums_across_ranks_and_returns_only_to_root() {
        let handles = ThreadCollective::build(4);
        let results: Vec<Option<Vec<u64>>> = thread::scope(|s| {
            let joins: Vec<_> = handles
                .into_iter()
                .map(|h| {
                    s.spawn(move || {
                        let local = vec![h.rank() as u64 + 1, 10];
                        h.reduce_sum_u64(&local)
                    })
                })
                .collect();
            joins.into_iter().map(|j| j.join().unwrap()).collect()
        });

        assert_eq!(results[0], Some(vec![1 + 2 + 3 + 4, 40]));
        for r in &results[1..] {
            assert_eq!(r, &None);
        }
    }

    #[test]
    fn broadcast_delivers_root_value_to_everyone() {
        let handles = ThreadCollective::build(5);
        let results: Vec<i64> = thread::scope(|s| {
            let joins: Vec<_> = handles
                .into_iter()
                .map(|h| {
                    s.spawn(move || {
                        let contribution = if h.rank() == 0 { Some(42) } else { None };
                        h.broadcast_i64(contribution)
                    })
                })
                .collect();
            joins.into_iter().map(|j| j.join().unwrap()).collect()
        });
        assert!(results.iter().all(|&v| v == 42));
    }

    #[test]
    fn repeated_rounds_do_not_deadlock_or_leak_state() {
        let handles = ThreadCollective::build(3);
        thread::scope(|s| {
            for h in handles {
                s.spawn(move || {
                    for round in 0..20u64 {
                        let sum = h.reduce_sum_u64(&[round]).unwrap_or_default();
                        if h.rank() == 0 {
                            assert_eq!(sum, vec![round * 3]);
                        }
                        h.barrier();
                    }
                });
            }
        });
    }
}
