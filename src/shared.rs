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

//! The shared-memory coordinator: the orchestrator builds the prepared
//! dataset exactly once, on its own thread, then hands every rank thread a
//! read-only `Arc` clone before entering the collective scope — the same
//! `Arc::clone(&self.shared)` hand-off the teacher's `ParallelSolver::maximize`
//! does for its node pool, just pointed at a `Dataset` instead of a fringe.
//!
//! Because the `Arc` is built and fully prepared (sorted, deduped, JNSQ
//! expanded, class-indexed) before `crossbeam::thread::scope` spawns a
//! single rank closure, Rust's ownership rules already guarantee every
//! rank sees a stable, read-only dataset — no explicit barrier is needed
//! between "mutable setup" and "read-only round loop."
use std::sync::Arc;

use crate::dataset::Dataset;

/// Owns the one live copy of a prepared dataset plus its per-class row
/// counts, and hands out cheap `Arc` handles to rank threads.
pub struct SharedDataset {
    dataset: Arc<Dataset>,
    counts: Arc<Vec<usize>>,
}

impl SharedDataset {
    /// Takes ownership of an already-`prepare`d dataset. Callers build the
    /// `counts` vector once from `dataset.class_index` since every rank
    /// needs it to seed its own `Enumerator`.
    pub fn new(dataset: Dataset, counts: Vec<usize>) -> Self {
        SharedDataset { dataset: Arc::new(dataset), counts: Arc::new(counts) }
    }

    /// A cheap, `'static`-free handle suitable for moving into a
    /// `crossbeam::thread::scope`-spawned closure.
    pub fn handle(&self) -> SharedDatasetHandle {
        SharedDatasetHandle { dataset: Arc::clone(&self.dataset), counts: Arc::clone(&self.counts) }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
}

/// Per-rank read-only view into the shared dataset.
#[derive(Clone)]
pub struct SharedDatasetHandle {
    dataset: Arc<Dataset>,
    counts: Arc<Vec<usize>>,
}

impl SharedDatasetHandle {
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
}
