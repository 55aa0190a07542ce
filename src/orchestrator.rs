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

//! Wires the pipeline end to end: read the container, prepare the
//! dataset, run JNSQ, partition the virtual matrix, spawn one thread per
//! rank, run the cover loop, print the result.
//!
//! Grounded on the teacher's `examples::knapsack::knapsack()`/`solve()`
//! pair — "build the problem, build the solver, run it" — generalized
//! from a single-threaded MDD solve into a `crossbeam::thread::scope`
//! fan-out over ranks, matching `ParallelSolver::maximize`'s own use of
//! scoped threads.
use log::{debug, info, warn};

use crate::dataset::Dataset;
use crate::distributed::ThreadCollective;
use crate::driver::run_rank;
use crate::error::Result;
use crate::jnsq::{apply_jnsq, JnsqOptions};
use crate::partition::partition_for;
use crate::reader::DatasetContainer;
use crate::shared::SharedDataset;

/// Command-line configuration, decoupled from `clap` so this function is
/// testable without going through argument parsing.
#[derive(Debug, Clone)]
pub struct Config {
    pub file: String,
    pub dataset: String,
    pub ranks: usize,
}

/// The information printed to the user: the selected attribute indices
/// and the totals needed to render spec.md §6's summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverReport {
    pub selected: Vec<usize>,
    pub total_attributes: usize,
}

impl CoverReport {
    pub fn percentage(&self) -> f64 {
        if self.total_attributes == 0 {
            0.0
        } else {
            100.0 * self.selected.len() as f64 / self.total_attributes as f64
        }
    }
}

/// Runs the full pipeline for `config` and returns the report the caller
/// should print (spec.md §6's `Solution: { ... }` plus summary line).
pub fn run(config: &Config) -> Result<CoverReport> {
    info!("reading dataset '{}' from {}", config.dataset, config.file);
    let raw = DatasetContainer::open(&config.file, &config.dataset)?;

    let mut dataset = Dataset::new(raw.data, raw.n, raw.w, raw.a, raw.c, raw.k);
    let removed = dataset.prepare()?;
    info!("prepared dataset: n={} a={} c={} k={}, {} duplicate rows removed", dataset.n, dataset.a, dataset.c, dataset.k, removed);

    let jnsq_result = apply_jnsq(&mut dataset, JnsqOptions::default());
    if jnsq_result.jnsq_width > 0 {
        info!(
            "JNSQ stage widened attributes by {} bits (max inconsistency {}, {} rows touched)",
            jnsq_result.jnsq_width, jnsq_result.max_inconsistency, jnsq_result.rows_touched
        );
        dataset.build_class_index()?;
    } else {
        debug!("JNSQ stage was a no-op");
    }

    let total_attributes = dataset.a;
    let l = dataset.virtual_row_count();
    let ranks = config.ranks.max(1);
    info!("partitioning {} virtual rows across {} rank(s)", l, ranks);

    let counts: Vec<usize> = (0..dataset.k).map(|c| dataset.class_index.n_k(c)).collect();
    let shared = SharedDataset::new(dataset, counts);
    let collectives = ThreadCollective::build(ranks);

    let mut solution: Option<Vec<usize>> = None;
    let mut first_error: Option<crate::error::EngineError> = None;
    crossbeam::thread::scope(|scope| {
        let mut joins = Vec::with_capacity(ranks);
        for (r, collective) in collectives.into_iter().enumerate() {
            let partition = match partition_for(r, ranks, l) {
                Ok(partition) => partition,
                Err(err) => {
                    first_error.get_or_insert(err);
                    continue;
                }
            };
            if partition.s_size == 0 {
                warn!("rank {} of {} was assigned an empty slice", r, ranks);
            }
            debug!("rank {} assigned slice [{}, {})", r, partition.s_offset, partition.s_offset + partition.s_size);
            let handle = shared.handle();
            joins.push(scope.spawn(move |_| run_rank(&handle, partition, &collective)));
        }
        for join in joins {
            match join.join().expect("rank thread panicked") {
                Ok(Some(result)) => solution = Some(result),
                Ok(None) => {}
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
    })
    .expect("rank thread pool panicked");

    if let Some(err) = first_error {
        return Err(err);
    }

    let selected = solution.ok_or_else(|| {
        crate::error::EngineError::from(crate::error::InvariantBreach::SolutionMissingAtRoot)
    })?;
    info!("cover complete: {} of {} attributes selected", selected.len(), total_attributes);
    Ok(CoverReport { selected, total_attributes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::write_container;
    use std::io::Write;

    fn write_fixture(path: &std::path::Path) {
        // spec.md §8 scenario 1: rows [1,0,0],[1,1,0],[0,1,1],[1,1,1], 2
        // classes of 2 each; A=3, C=1, K=2.
        let a = 3;
        let c = 1;
        let w = crate::bits::words_for_bits(a + c);
        let rows: [(u64, usize); 4] = [(0b100, 0), (0b110, 0), (0b011, 1), (0b111, 1)];
        let mut data = vec![0u64; rows.len() * w];
        for (i, (attrs, class)) in rows.iter().enumerate() {
            let row = &mut data[i * w..(i + 1) * w];
            for bit in 0..a {
                let value = (attrs >> (a - 1 - bit)) & 1 == 1;
                crate::bits::set_bit(row, bit, value);
            }
            crate::dataset::write_field(row, a, c, *class as u64, false);
        }
        let raw = crate::reader::RawDataset { n: rows.len(), w, a, c, k: 2, data };
        let bytes = write_container("scenario_one", &raw);
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(&bytes).unwrap();
    }

    #[test]
    fn end_to_end_pipeline_produces_a_discriminating_cover() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("laid-cover-orchestrator-test-{}.bin", std::process::id()));
        write_fixture(&path);

        let config = Config { file: path.to_str().unwrap().to_string(), dataset: "scenario_one".to_string(), ranks: 2 };
        let report = run(&config).unwrap();

        assert!(!report.selected.is_empty());
        assert!(report.percentage() > 0.0);
        assert!(report.selected.iter().all(|&a| a < report.total_attributes));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unknown_dataset_name_surfaces_as_missing_attribute() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("laid-cover-orchestrator-missing-{}.bin", std::process::id()));
        write_fixture(&path);

        let config = Config { file: path.to_str().unwrap().to_string(), dataset: "not_present".to_string(), ranks: 1 };
        let err = run(&config).unwrap_err();
        assert!(matches!(err, crate::error::EngineError::MissingAttribute { .. }));

        std::fs::remove_file(&path).ok();
    }
}
