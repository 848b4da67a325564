//! Deterministic single-writer booking orchestrator.
//!
//! `taxi-core` owns the state machine only. It never performs I/O, never
//! spawns tasks, and holds no lock — the outer shell (out of scope here)
//! is responsible for sequencing calls to [`BookingOrchestrator::step`]
//! one at a time per call and for carrying out the `NextAction` it
//! returns (placing geocode/dispatch/amend calls, speaking `Ask` text,
//! tearing down on `Hangup`).

pub mod fare;
pub mod machine;
pub mod patch;
pub mod retry;

pub use machine::BookingOrchestrator;
