// src/assets/mod.rs

//! The artifact-producing pipelines: stylesheet compilation and the script
//! bundle. Both are ordered lists of transformation steps with one error
//! boundary per run; a [`StepError`](crate::errors::StepError) aborts only
//! the run it occurred in.

pub mod format;
pub mod scripts;
pub mod styles;

pub use scripts::ScriptBundle;
pub use styles::{StyleBuild, StylePipeline};
