//! Library surface for the discrete-event constellation simulator
//! (C9–C12). `main.rs` is a thin CLI shim over [`Simulation`] and
//! [`RunMetrics`]; integration tests build a [`leo_scenario::ScenarioConfig`]
//! in-line and assert on the returned metrics the same way.

pub mod engine;
pub mod event;
pub mod metrics;
pub mod node;

pub use engine::Simulation;
pub use event::Event;
pub use metrics::RunMetrics;
