// src/pipeline/registry.rs

use std::collections::BTreeMap;

use tracing::warn;

use crate::config::model::ConfigFile;
use crate::engine::TaskName;

/// What a task does when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Compile the entry stylesheet into both output variants.
    Styles,
    /// Concatenate + minify the script bundle.
    Scripts,
    /// Run an external checker and report, never writing artifacts.
    Check,
}

impl TaskKind {
    /// Checks are informational: their findings never abort a sequence.
    pub fn is_informational(self) -> bool {
        matches!(self, TaskKind::Check)
    }
}

/// A named unit of build work with explicit dependency data.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: TaskName,
    pub kind: TaskKind,
    /// Tasks that must run before this one when both appear in a sequence.
    pub after: Vec<TaskName>,
}

/// All named tasks declared by the config: `styles`, `js`, and one per
/// `[check.<name>]` section. Declared once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Task>,
}

impl TaskRegistry {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut tasks = BTreeMap::new();

        tasks.insert(
            "styles".to_string(),
            Task {
                name: "styles".to_string(),
                kind: TaskKind::Styles,
                after: cfg.styles.after.clone(),
            },
        );
        tasks.insert(
            "js".to_string(),
            Task {
                name: "js".to_string(),
                kind: TaskKind::Scripts,
                after: cfg.scripts.after.clone(),
            },
        );
        for (name, check) in cfg.check.iter() {
            tasks.insert(
                name.clone(),
                Task {
                    name: name.clone(),
                    kind: TaskKind::Check,
                    after: check.after.clone(),
                },
            );
        }

        Self { tasks }
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    /// Order a requested task sequence by its dependency data.
    ///
    /// Only `after` edges between tasks that are both part of `requested` are
    /// considered; a dependency outside the sequence is an ordering
    /// constraint that simply doesn't apply. Ties keep the declared order, so
    /// the result is deterministic.
    ///
    /// The config validator has already rejected cycles, so this always
    /// terminates; unknown names are dropped with a warning.
    pub fn sequence_order(&self, requested: &[TaskName]) -> Vec<TaskName> {
        let known: Vec<TaskName> = requested
            .iter()
            .filter(|name| {
                let ok = self.tasks.contains_key(*name);
                if !ok {
                    warn!(task = %name, "sequence references unknown task; dropping");
                }
                ok
            })
            .cloned()
            .collect();

        let mut ordered: Vec<TaskName> = Vec::with_capacity(known.len());
        let mut remaining = known.clone();

        while !remaining.is_empty() {
            // First task (in declared order) whose in-sequence deps are done.
            let pos = remaining.iter().position(|name| {
                let task = &self.tasks[name];
                task.after
                    .iter()
                    .all(|dep| !remaining.contains(dep) || ordered.contains(dep))
            });

            match pos {
                Some(p) => {
                    let name = remaining.remove(p);
                    ordered.push(name);
                }
                None => {
                    // Unreachable with a validated config; don't loop forever.
                    warn!("unsatisfiable ordering in sequence; appending remainder as declared");
                    ordered.extend(remaining.drain(..));
                }
            }
        }

        ordered
    }
}
