use cultists::data::config::CultistsConfig;
use cultists::parallel::WorkerPool;
use cultists::rule::Outcome;
use cultists::sim::{run_scenario, run_sweep, Scenario, ScenarioSetup, SweepConfig};
use tempfile::NamedTempFile;

fn sweep(scenario: Scenario, runs: usize, workers: usize) -> SweepConfig {
    SweepConfig {
        setup: ScenarioSetup {
            scenario,
            seed: 100,
            ..ScenarioSetup::default()
        },
        runs,
        pool: WorkerPool::with_workers(workers),
    }
}

#[test]
fn worker_count_does_not_change_results() {
    let config = CultistsConfig::default();
    let single = run_sweep(&config, &sweep(Scenario::Skirmish, 40, 1)).unwrap();
    let many = run_sweep(&config, &sweep(Scenario::Skirmish, 40, 4)).unwrap();

    assert_eq!(single.outcomes, many.outcomes);
    assert_eq!(single.conditions, many.conditions);
    let seeds = |summary: &cultists::sim::SweepSummary| {
        summary.rows.iter().map(|row| row.seed).collect::<Vec<_>>()
    };
    assert_eq!(seeds(&single), (100..140).collect::<Vec<_>>());
    assert_eq!(seeds(&single), seeds(&many));
}

#[test]
fn skirmish_rows_match_single_rounds() {
    let config = CultistsConfig::default();
    let summary = run_sweep(&config, &sweep(Scenario::Skirmish, 6, 2)).unwrap();
    for row in &summary.rows {
        let setup = ScenarioSetup {
            seed: row.seed,
            scenario: Scenario::Skirmish,
            ..ScenarioSetup::default()
        };
        let report = run_scenario(&config, &setup).unwrap();
        assert_eq!(row.outcome, report.outcome, "seed {}", row.seed);
    }
}

#[test]
fn understaffed_rounds_are_counted_as_cancelled() {
    let config = CultistsConfig {
        min_players: 50,
        ..CultistsConfig::default()
    };
    let summary = run_sweep(&config, &sweep(Scenario::Stalemate, 5, 2)).unwrap();
    assert_eq!(summary.cancelled, 5);
    assert_eq!(summary.count(Outcome::Neutral), 5);
}

#[test]
fn csv_export_has_one_row_per_round() {
    let config = CultistsConfig::default();
    let summary = run_sweep(&config, &sweep(Scenario::Attrition, 10, 3)).unwrap();
    let file = NamedTempFile::new().unwrap();
    summary.write_csv(file.path()).unwrap();

    let mut reader = csv::Reader::from_path(file.path()).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|row| &row[5] == "some_faction_alive"));
}
