use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;

use crate::data::config::{
    load_cultists_config_or_default, load_rule_configuration, CultistsConfig, RuleConfiguration,
    DEFAULT_CONFIG_PATH,
};
use crate::logging::{init_logging, LogFormat};
use crate::parallel::WorkerPool;
use crate::rule::host::{SessionHandle, SessionId};
use crate::rule::rng::Rng;
use crate::rule::selector::{select_faction, AntagPreferences, Candidate, CULTIST_ANTAG_ID};
use crate::sim::scenario::{run_scenario, Scenario, ScenarioSetup};
use crate::sim::sweep::{run_sweep, SweepConfig};

#[derive(Debug, Parser)]
#[command(name = "cultists", version, about = "Hidden-cult round rule: simulate, select and sweep rounds")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Human, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Play one scripted round and print its report.
    Simulate(SimulateArgs),
    /// Run the cultist draw only.
    Select(SelectArgs),
    /// Play many seeded rounds in parallel and tally outcomes.
    Sweep(SweepArgs),
    /// Check a rule configuration file.
    Validate(ValidateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RosterArgs {
    #[arg(long, default_value_t = 30)]
    pub players: usize,

    /// How many of the players opted in to the cult.
    #[arg(long, default_value_t = 5)]
    pub opted_in: usize,

    #[arg(long, env = "CULTISTS_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = Scenario::Skirmish)]
    pub scenario: Scenario,

    /// Per-cultist death chance in a skirmish, in percent.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub lethality: u8,

    /// Start even below the configured minimum player count.
    #[arg(long)]
    pub forced: bool,

    /// Print a tab-separated summary instead of JSON.
    #[arg(long)]
    pub table: bool,
}

#[derive(Debug, Clone, Args)]
pub struct SelectArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Seed for the draw; drawn from OS entropy when omitted.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct SweepArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// First seed; round `n` uses `seed + n`.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    #[arg(long, default_value_t = 200)]
    pub runs: usize,

    #[arg(long, value_enum, default_value_t = Scenario::Skirmish)]
    pub scenario: Scenario,

    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub lethality: u8,

    /// Worker threads; 0 uses every core.
    #[arg(long, default_value_t = 0)]
    pub workers: usize,

    /// Also write one CSV row per round here.
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
struct SelectionOutput {
    target_count: usize,
    pool_size: usize,
    used_fallback: bool,
    chosen: Vec<String>,
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };
    init_logging(cli.log_format, cli.verbose);

    match cli.command {
        Command::Simulate(args) => handle_simulate(&args),
        Command::Select(args) => handle_select(&args),
        Command::Sweep(args) => handle_sweep(&args),
        Command::Validate(args) => handle_validate(&args.path),
    }
}

fn load_config(path: &Path) -> Option<CultistsConfig> {
    match load_cultists_config_or_default(path) {
        Ok(config) => Some(config),
        Err(err) => {
            eprintln!("config error: {err}");
            None
        }
    }
}

fn handle_simulate(args: &SimulateArgs) -> i32 {
    let Some(config) = load_config(&args.roster.config) else {
        return 1;
    };
    let setup = ScenarioSetup {
        players: args.roster.players,
        opted_in: args.roster.opted_in,
        seed: args.seed,
        forced: args.forced,
        scenario: args.scenario,
        lethality: args.lethality,
    };
    let report = match run_scenario(&config, &setup) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return 1;
        }
    };

    if args.table {
        println!("seed\tscenario\tstarted\toutcome\tcultists\tconditions");
        let conditions: Vec<&str> = report.conditions.iter().map(|tag| tag.as_str()).collect();
        println!(
            "{}\t{:?}\t{}\t{}\t{}\t{}",
            report.seed,
            report.scenario,
            report.started,
            report.outcome,
            report.cultists.len(),
            conditions.join(",")
        );
        return 0;
    }
    print_json(&report, "round report")
}

fn handle_select(args: &SelectArgs) -> i32 {
    let Some(config) = load_config(&args.roster.config) else {
        return 1;
    };
    let mut preferences = HashMap::new();
    let candidates: Vec<Candidate> = (0..args.roster.players)
        .map(|index| {
            let session = SessionHandle {
                id: SessionId(index as u64 + 1),
                user_name: format!("player{}", index + 1),
            };
            if index < args.roster.opted_in {
                preferences.insert(session.id, AntagPreferences::opted_in(CULTIST_ANTAG_ID));
            }
            Candidate {
                session,
                entity: None,
                can_be_antag: true,
            }
        })
        .collect();
    let mut rng = args.seed.map_or_else(Rng::from_entropy, Rng::new);

    let selection = select_faction(&candidates, &preferences, &config.selection_policy(), &mut rng);
    let output = SelectionOutput {
        target_count: selection.target_count,
        pool_size: selection.pool_size,
        used_fallback: selection.used_fallback,
        chosen: selection
            .chosen
            .into_iter()
            .map(|candidate| candidate.session.user_name)
            .collect(),
    };
    print_json(&output, "selection")
}

fn handle_sweep(args: &SweepArgs) -> i32 {
    let Some(config) = load_config(&args.roster.config) else {
        return 1;
    };
    let sweep = SweepConfig {
        setup: ScenarioSetup {
            players: args.roster.players,
            opted_in: args.roster.opted_in,
            seed: args.seed,
            forced: false,
            scenario: args.scenario,
            lethality: args.lethality,
        },
        runs: args.runs,
        pool: WorkerPool::with_workers(args.workers),
    };
    let summary = match run_sweep(&config, &sweep) {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("sweep failed: {err}");
            return 1;
        }
    };
    if let Some(path) = &args.csv {
        if let Err(err) = summary.write_csv(path) {
            eprintln!("failed to write {}: {err}", path.display());
            return 1;
        }
    }
    print_json(&summary, "sweep summary")
}

fn handle_validate(path: &Path) -> i32 {
    match load_rule_configuration(path) {
        Ok(RuleConfiguration::Cultists(_)) => {
            println!("validation passed: {}", path.display());
            0
        }
        Ok(other) => {
            eprintln!(
                "validation failed: {} holds '{}' rule configuration, not a cult one",
                path.display(),
                other.id()
            );
            1
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            1
        }
    }
}

fn print_json<T: Serialize>(value: &T, what: &str) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize {what}: {err}");
            1
        }
    }
}
