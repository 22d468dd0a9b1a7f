// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling each watch binding's `patterns` / `exclude` globs.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Content hashing used to suppress re-runs when watched files haven't
//!   actually changed (which is what breaks self-triggered watch loops).
//!
//! It does **not** know about tasks or their dependencies; it only turns
//! filesystem changes into binding-level triggers.

pub mod hash;
pub mod patterns;
pub mod watcher;

pub use hash::hash_paths;
pub use patterns::{BindingProfile, build_binding_profiles};
pub use watcher::{WatcherHandle, spawn_watcher};
