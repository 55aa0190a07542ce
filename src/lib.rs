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

//! A distributed LAID (Logical Analysis of Inconsistent Data) engine: it
//! turns a bit-packed observation matrix into a small set of attributes
//! that jointly discriminate every pair of observations from different
//! classes, computed as a greedy set cover over the virtual "disjoint
//! matrix" of class-pair XOR rows.
//!
//! The matrix is never materialized: every row is generated on demand by
//! `matrix::get_column`/`enumerator::Enumerator` from the two dataset rows
//! it pairs. Work is split across ranks (`partition::block_low`), and
//! ranks coordinate through the `distributed::Collective` abstraction
//! rather than shared mutable state.
pub mod bits;
pub mod dataset;
pub mod distributed;
pub mod driver;
pub mod enumerator;
pub mod error;
pub mod jnsq;
pub mod matrix;
pub mod orchestrator;
pub mod partition;
pub mod reader;
pub mod shared;
pub mod totals;
