// src/engine/mod.rs

//! The orchestrator: a single event loop that reacts to watch-binding
//! triggers, runs the bound task sequences, and drives the dev server
//! bridge.

pub mod executor;
pub mod queue;
pub mod runtime;

pub use executor::{TaskOutcome, run_sequence};
pub use queue::PendingTriggers;
pub use runtime::{Runtime, RuntimeEvent, TaskName};
