pub mod controller;
pub mod dispatch;
pub mod evaluator;
pub mod host;
pub mod outcome;
pub mod registry;
pub mod report;
pub mod rng;
pub mod selector;

pub use controller::{PlayerSpawn, RoundController, StartDecision};
pub use dispatch::{Dispatcher, EventKind, GameEvent, Handler, Reaction, RunLevel};
pub use evaluator::{
    evaluate, evaluate_with, Evidence, MemberStatus, Trigger, WinRule, DEFAULT_RITUAL_QUORUM,
    WIN_RULES,
};
pub use host::{
    Audience, EntityId, MapId, Marker, MobState, PlayerDirectory, Presentation, RoundHost,
    RoundTerminator, SessionHandle, SessionId, Simulation, StationDirectory,
};
pub use outcome::{CommitResult, ConditionTag, Outcome, OutcomeLedger, RoundPhase, Verdict};
pub use registry::{FactionMember, FactionRegistry};
pub use report::{render_round_end, ROSTER_HEADER};
pub use rng::Rng;
pub use selector::{
    late_join_has_quota, select_faction, AntagPreferences, Candidate, FactionSelection,
    SelectionPolicy, CULTIST_ANTAG_ID,
};
