// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::model::WatchBinding;

/// Compiled watch/exclude glob patterns for a single watch binding.
///
/// The patterns are assumed to be relative to the project root directory.
/// The watcher passes relative paths (e.g. `"sass/base/global.scss"`) into
/// `matches`.
#[derive(Clone)]
pub struct BindingProfile {
    index: usize,
    run: Vec<String>,
    reload: bool,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for BindingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingProfile")
            .field("index", &self.index)
            .field("run", &self.run)
            .finish_non_exhaustive()
    }
}

impl BindingProfile {
    /// Position of this binding in the config's `[[watch]]` list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Task names this binding triggers, in declared order.
    pub fn run(&self) -> &[String] {
        &self.run
    }

    /// Whether a full browser reload is requested after the sequence.
    pub fn reload(&self) -> bool {
        self.reload
    }

    /// Returns true if this binding is interested in the given path
    /// (relative to project root).
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a compiled profile for each watch binding.
pub fn build_binding_profiles(bindings: &[WatchBinding]) -> Result<Vec<BindingProfile>> {
    let mut profiles = Vec::with_capacity(bindings.len());

    for (index, binding) in bindings.iter().enumerate() {
        let watch_set = build_globset(&binding.patterns)
            .with_context(|| format!("building watch globset for binding #{index}"))?;

        let exclude_set = if binding.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&binding.exclude)
                    .with_context(|| format!("building exclude globset for binding #{index}"))?,
            )
        };

        profiles.push(BindingProfile {
            index,
            run: binding.run.clone(),
            reload: binding.reload,
            watch_set,
            exclude_set,
        });
    }

    Ok(profiles)
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
