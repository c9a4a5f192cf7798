//! Time an outcome sweep and optionally append one line to a log file for balance tracking.
//!
//! Usage:
//!   cargo run --release --bin sweep_outcomes
//!   cargo run --release --bin sweep_outcomes -- --log
//!
//! --log  Append one row to sweep_log.csv (date, runs, rounds_per_sec, cult_major, crew_major, other).

use std::fs::OpenOptions;
use std::io::Write;
use std::process::ExitCode;
use std::time::Instant;

use cultists::data::config::CultistsConfig;
use cultists::logging::{init_logging, LogFormat};
use cultists::parallel::WorkerPool;
use cultists::rule::outcome::Outcome;
use cultists::sim::{run_sweep, Scenario, ScenarioSetup, SweepConfig};

const LOG_PATH: &str = "sweep_log.csv";
const LOG_HEADER: &[u8] = b"date,runs,rounds_per_sec,cult_major,crew_major,other\n";

fn main() -> ExitCode {
    init_logging(LogFormat::Human, 0);
    let log = std::env::args().any(|arg| arg == "--log");

    let sweep = SweepConfig {
        setup: ScenarioSetup {
            scenario: Scenario::Skirmish,
            ..ScenarioSetup::default()
        },
        runs: 2_000,
        pool: WorkerPool::default(),
    };

    let start = Instant::now();
    let summary = match run_sweep(&CultistsConfig::default(), &sweep) {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("sweep failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    let elapsed_secs = start.elapsed().as_secs_f64();
    let rounds_per_sec = summary.runs as f64 / elapsed_secs.max(f64::EPSILON);
    let cult_major = summary.count(Outcome::CultMajor);
    let crew_major = summary.count(Outcome::CrewMajor);
    let other = summary.runs - cult_major - crew_major;

    println!("Skirmish sweep ({} workers):", summary.workers);
    println!("  Rounds:      {}", summary.runs);
    println!("  Duration:    {elapsed_secs:.2} s");
    println!("  Rounds/s:    {rounds_per_sec:.2}");
    println!("  Cult major:  {cult_major}");
    println!("  Crew major:  {crew_major}");
    println!("  Other:       {other}");

    if log {
        let date = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let line = format!(
            "{date},{},{rounds_per_sec:.4},{cult_major},{crew_major},{other}\n",
            summary.runs
        );
        if let Err(err) = append_line(&line) {
            eprintln!("failed to append to {LOG_PATH}: {err}");
            return ExitCode::FAILURE;
        }
        println!("Appended to {LOG_PATH}");
    }
    ExitCode::SUCCESS
}

fn append_line(line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(LOG_PATH)?;
    if file.metadata().map(|meta| meta.len() == 0).unwrap_or(true) {
        file.write_all(LOG_HEADER)?;
    }
    file.write_all(line.as_bytes())?;
    file.flush()
}
