// src/pipeline/session.rs

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::model::ConfigFile;
use crate::engine::TaskName;
use crate::files::collect_files;
use crate::pipeline::registry::{TaskKind, TaskRegistry};
use crate::watch::hash::hash_paths;
use crate::watch::patterns::{BindingProfile, build_binding_profiles};

/// The one long-lived object of a build/watch session.
///
/// Holds the named task registry, the compiled watch bindings, and the only
/// mutable cross-task state: an advisory "already running" set and the
/// per-task input content hashes. The hash cache is what breaks self-caused
/// watch loops: a task whose run rewrites one of its own watched inputs
/// (e.g. the style source reformat) records the fingerprint captured after
/// that rewrite, so the resulting watch event is a no-op.
pub struct PipelineSession {
    root: PathBuf,
    config: ConfigFile,
    registry: TaskRegistry,
    profiles: Vec<BindingProfile>,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    running: HashSet<TaskName>,
    clean: HashMap<TaskName, String>,
}

impl PipelineSession {
    /// Build a session from a validated config. Fails only on glob
    /// compilation, which validation has normally already caught.
    pub fn new(root: impl Into<PathBuf>, config: ConfigFile) -> Result<Self> {
        let profiles = build_binding_profiles(&config.watch)?;
        let registry = TaskRegistry::from_config(&config);

        Ok(Self {
            root: root.into(),
            config,
            registry,
            profiles,
            state: Mutex::new(SessionState::default()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn profiles(&self) -> &[BindingProfile] {
        &self.profiles
    }

    /// Mark a task as running. Returns false if it already was, in which case
    /// the caller must not start a second invocation.
    pub fn mark_running(&self, task: &str) -> bool {
        let mut state = self.state.lock();
        state.running.insert(task.to_string())
    }

    pub fn mark_idle(&self, task: &str) {
        let mut state = self.state.lock();
        state.running.remove(task);
    }

    pub fn is_running(&self, task: &str) -> bool {
        let state = self.state.lock();
        state.running.contains(task)
    }

    /// Decide whether a watch-triggered run of `task` would do new work.
    ///
    /// Returns false when the task's input file-set hashes to the value
    /// recorded when its last run completed. Manual invocations skip this
    /// check; it exists to suppress watch loops, not to cache builds.
    pub fn should_run(&self, task: &str) -> bool {
        let hash = match self.input_hash(task) {
            Ok(Some(h)) => h,
            Ok(None) => return true,
            Err(err) => {
                warn!(task = %task, error = %err, "input hashing failed; running anyway");
                return true;
            }
        };

        let state = self.state.lock();
        match state.clean.get(task) {
            Some(prev) if *prev == hash => {
                debug!(task = %task, "inputs unchanged since last run; skipping");
                false
            }
            _ => true,
        }
    }

    /// Aggregate content hash over the task's current input file-set, or
    /// `None` for tasks without one (or when hashing fails, which is logged).
    ///
    /// Executors capture this at the point the task reads its inputs and hand
    /// it back to [`record_clean`](Self::record_clean) when the run finishes.
    /// An edit that lands later in the run then differs from the recorded
    /// value and the queued replay is not suppressed.
    pub fn input_fingerprint(&self, task: &str) -> Option<String> {
        match self.input_hash(task) {
            Ok(fingerprint) => fingerprint,
            Err(err) => {
                warn!(task = %task, error = %err, "input hashing failed");
                None
            }
        }
    }

    /// Record a previously captured fingerprint as "clean". Called when a run
    /// completes (on failure too: re-running unchanged broken inputs would
    /// only repeat the same error).
    pub fn record_clean(&self, task: &str, fingerprint: Option<String>) {
        if let Some(hash) = fingerprint {
            let mut state = self.state.lock();
            state.clean.insert(task.to_string(), hash);
        }
    }

    /// Aggregate content hash over the task's input file-set, or `None` for
    /// tasks without one.
    fn input_hash(&self, task: &str) -> Result<Option<String>> {
        let (include, exclude): (Vec<String>, Vec<String>) = match self.registry.get(task) {
            Some(t) => match t.kind {
                TaskKind::Styles => (self.config.styles.sources.clone(), Vec::new()),
                TaskKind::Scripts => {
                    // The script list is explicit, not a glob: hash it directly.
                    let paths: Vec<PathBuf> = self
                        .config
                        .scripts
                        .sources
                        .iter()
                        .map(|s| self.root.join(s))
                        .collect();
                    return Ok(Some(hash_paths(paths)?));
                }
                TaskKind::Check => match self.config.check.get(task) {
                    Some(c) => (c.paths.clone(), c.exclude.clone()),
                    None => return Ok(None),
                },
            },
            None => return Ok(None),
        };

        if include.is_empty() {
            return Ok(None);
        }

        let files = collect_files(&self.root, &include, &exclude)?;
        let abs: Vec<PathBuf> = files.iter().map(|p| self.root.join(p)).collect();
        Ok(Some(hash_paths(abs)?))
    }
}
