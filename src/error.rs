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

//! Error kinds for the dataset reader, dataset preparation and the
//! distributed cover loop. Every fallible function in the crate returns
//! `Result<_, EngineError>` and propagates with `?`; only an
//! `InvariantBreach` is ever allowed to additionally panic (in debug
//! builds, via a `debug_assert!` guard close to the hot loop it protects).
use std::fmt;
use thiserror::Error;

/// The errors this crate can report, grouped the way spec.md §7 groups
/// them: reader-level, dataset-preparation-level, distributed-runtime
/// init, and internal invariant breaches.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The dataset container file could not be found or opened.
    #[error("dataset not found: {path}")]
    DatasetNotFound { path: String },

    /// The container was opened but a required metadata attribute (attribute
    /// count, observation count, class count or word count) is missing.
    #[error("dataset '{dataset}' is missing required attribute: {attribute}")]
    MissingAttribute { dataset: String, attribute: String },

    /// The dataset has too few classes, too few observations, too few
    /// attributes, or an unreadable data block.
    #[error("dataset malformed: {reason}")]
    DatasetMalformed { reason: String },

    /// A row's class field names a class `>= K`.
    #[error("row {row} has class {class} but dataset only declares {k} classes")]
    ClassOutOfRange { row: usize, class: usize, k: usize },

    /// The distributed runtime failed to initialize, or a communicator
    /// split (node-local vs. global) failed.
    #[error("distributed runtime initialization failed: {reason}")]
    DistributedInitFailure { reason: String },

    /// Internal, fatal invariant breach: an enumerator tuple fell out of
    /// range, a totals counter went negative, or a rank's slice exceeded
    /// the virtual matrix's row count. Never expected in a correct build;
    /// always a programmer error rather than a recoverable condition.
    #[error("invariant breach: {0}")]
    InvariantBreach(InvariantBreach),
}

/// The specific invariant that was found broken. Kept separate from
/// `EngineError` so call sites constructing one don't need to repeat the
/// `EngineError::InvariantBreach` wrapper at every `debug_assert!` site.
#[derive(Debug)]
pub enum InvariantBreach {
    /// `enumerator.advance()` stepped past the last valid row of the
    /// virtual matrix.
    EnumeratorOutOfRange { linear_index: u64, total_rows: u64 },
    /// A per-attribute total went negative during an incremental
    /// subtract, which can only happen if `covered_lines` and
    /// `attribute_totals` have drifted out of sync.
    NegativeTotal { attribute: usize },
    /// A rank's assigned slice size exceeds the total row count of the
    /// virtual matrix.
    SliceExceedsMatrix { s_size: u64, total_rows: u64 },
    /// `reduce_sum_u64` returned `None` at rank 0, which the `Collective`
    /// contract promises never happens (only the root gets `Some`).
    ReduceMissingAtRoot,
    /// The round loop reached `Done` without rank 0 ever producing a
    /// solution vector.
    SolutionMissingAtRoot,
}

impl fmt::Display for InvariantBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantBreach::EnumeratorOutOfRange { linear_index, total_rows } => write!(
                f,
                "enumerator advanced to linear index {} but the virtual matrix only has {} rows",
                linear_index, total_rows
            ),
            InvariantBreach::NegativeTotal { attribute } => {
                write!(f, "attribute {} total went negative", attribute)
            }
            InvariantBreach::SliceExceedsMatrix { s_size, total_rows } => write!(
                f,
                "rank slice of size {} exceeds the virtual matrix row count {}",
                s_size, total_rows
            ),
            InvariantBreach::ReduceMissingAtRoot => {
                write!(f, "root rank received no reduced totals from the collective")
            }
            InvariantBreach::SolutionMissingAtRoot => {
                write!(f, "round loop finished without the root rank producing a solution")
            }
        }
    }
}

impl From<InvariantBreach> for EngineError {
    fn from(breach: InvariantBreach) -> Self {
        EngineError::InvariantBreach(breach)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
