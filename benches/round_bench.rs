//! Full scripted rounds against the sandbox host, sequential vs parallel sweep.
//!
//! Run with: `cargo bench --bench round`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use cultists::data::config::CultistsConfig;
use cultists::parallel::WorkerPool;
use cultists::sim::{run_scenario, run_sweep, Scenario, ScenarioSetup, SweepConfig};

fn bench_single_round(c: &mut Criterion) {
    let config = CultistsConfig::default();
    let mut group = c.benchmark_group("round");
    group.throughput(Throughput::Elements(1));

    for scenario in [Scenario::Stalemate, Scenario::Purge, Scenario::Skirmish] {
        let setup = ScenarioSetup {
            scenario,
            players: 60,
            opted_in: 10,
            ..ScenarioSetup::default()
        };
        group.bench_function(format!("{scenario:?}"), |b| {
            b.iter(|| black_box(run_scenario(&config, black_box(&setup))))
        });
    }
    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let config = CultistsConfig::default();
    let mut group = c.benchmark_group("sweep");
    group.sample_size(20);
    let runs = 256;
    group.throughput(Throughput::Elements(runs as u64));

    for (label, workers) in [("sequential", 1usize), ("parallel", 0)] {
        let sweep = SweepConfig {
            setup: ScenarioSetup::default(),
            runs,
            pool: WorkerPool::with_workers(workers),
        };
        group.bench_function(label, |b| b.iter(|| black_box(run_sweep(&config, &sweep))));
    }
    group.finish();
}

criterion_group!(benches, bench_single_round, bench_sweep);
criterion_main!(benches);
