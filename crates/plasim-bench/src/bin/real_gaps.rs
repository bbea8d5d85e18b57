//! OPT segment lengths on real datasets.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin real-gaps -- data/books.txt data/fb.txt -m 1 -M 64
//! cargo run --release --bin real-gaps -- --binary data/osm_cellids_200M_uint64
//! ```

use clap::Parser;
use plasim_bench::cli;
use plasim_bench::config::RealDataConfig;
use plasim_bench::output::{write_csv, write_json, Preamble};
use plasim_bench::real_data;
use plasim_core::constants::{DEFAULT_MAX_EPSILON, DEFAULT_MIN_EPSILON, DEFAULT_THREADS};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Simulate the OPT algorithm on real data
#[derive(Parser, Debug)]
#[command(name = "real-gaps")]
#[command(about = "Segment real key datasets with the optimal algorithm")]
#[command(version)]
struct Args {
    /// Input files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Minimum ε value
    #[arg(short = 'm', long, default_value_t = DEFAULT_MIN_EPSILON)]
    min_epsilon: u64,

    /// Maximum ε value (exclusive)
    #[arg(short = 'M', long, default_value_t = DEFAULT_MAX_EPSILON)]
    max_epsilon: u64,

    /// Number of threads
    #[arg(short = 't', long, default_value_t = DEFAULT_THREADS)]
    threads: usize,

    /// Interpret the input files as binary files rather than text files with
    /// numbers separated by newlines
    #[arg(short = 'b', long)]
    binary: bool,

    /// Print the report as JSON instead of CSV
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_tracing();

    let config = RealDataConfig {
        min_epsilon: args.min_epsilon,
        max_epsilon: args.max_epsilon,
        threads: args.threads,
        binary: args.binary,
    };

    let table = match real_data::run(&args.files, &config) {
        Ok(table) => table,
        Err(e) => return cli::fail(e),
    };

    let preamble = Preamble::default();
    let mut stdout = io::stdout().lock();
    let written = if args.json {
        write_json(&mut stdout, &preamble, &table, None)
    } else {
        write_csv(&mut stdout, &preamble, &table)
    };
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => cli::fail(e),
    }
}
