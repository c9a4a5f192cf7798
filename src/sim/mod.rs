pub mod sandbox;
pub mod scenario;
pub mod sweep;

pub use sandbox::{PresentationRecord, Sandbox};
pub use scenario::{run_scenario, RoundReport, Scenario, ScenarioSetup};
pub use sweep::{run_sweep, SweepConfig, SweepRow, SweepSummary};
