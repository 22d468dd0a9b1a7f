// src/pipeline/mod.rs

//! The task registry and the long-lived pipeline session.
//!
//! A [`Task`](registry::Task) is declared once at startup and is stateless
//! between invocations; the [`PipelineSession`](session::PipelineSession)
//! carries the only cross-task state there is: the advisory "already running"
//! guard and the per-task input content hashes that suppress self-triggered
//! watch loops.

pub mod registry;
pub mod session;

pub use registry::{Task, TaskKind, TaskRegistry};
pub use session::PipelineSession;
