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

use std::process::ExitCode;

use clap::Parser;

use laid_cover::orchestrator::{self, Config};

/// Selects a minimal-effort attribute set that discriminates every pair of
/// observations from different classes, via a distributed greedy set
/// cover over a bit-packed observation matrix.
#[derive(Parser, Debug)]
#[command(name = "laid-cover", about, version)]
struct Cli {
    /// Dataset container file.
    #[arg(short, long)]
    file: String,

    /// Dataset name within the container.
    #[arg(short, long)]
    dataset: String,

    /// Number of simulated ranks (threads); defaults to the number of
    /// logical CPUs.
    #[arg(short, long)]
    ranks: Option<usize>,

    /// Log the progression; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config { file: cli.file, dataset: cli.dataset, ranks: cli.ranks.unwrap_or_else(num_cpus::get) };

    match orchestrator::run(&config) {
        Ok(report) => {
            let indices: Vec<String> = report.selected.iter().map(|i| i.to_string()).collect();
            println!("Solution: {{ {} }}", indices.join(" "));
            println!("{} of {} attributes selected ({:.1}%)", report.selected.len(), report.total_attributes, report.percentage());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("laid-cover: {}", err);
            ExitCode::FAILURE
        }
    }
}
