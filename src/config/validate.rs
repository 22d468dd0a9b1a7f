// src/config/validate.rs

use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow};
use globset::Glob;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::assets::styles::parse_browser_matrix;
use crate::config::model::ConfigFile;

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - the script bundle has at least one source, listed in a defined order
/// - all `after` dependencies refer to existing tasks (and not themselves)
/// - the task dependency graph has no cycles
/// - every watch binding runs at least one known task and its globs compile
/// - the browser support matrix parses
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_scripts(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    validate_watch_bindings(cfg)?;

    parse_browser_matrix(&cfg.styles.browsers)
        .map_err(|e| anyhow!(e))
        .context("invalid [styles].browsers")?;

    Ok(())
}

/// All task names the registry will expose for this config.
pub fn task_names(cfg: &ConfigFile) -> BTreeSet<String> {
    let mut names: BTreeSet<String> = cfg.check.keys().cloned().collect();
    names.insert("styles".to_string());
    names.insert("js".to_string());
    names
}

fn validate_scripts(cfg: &ConfigFile) -> Result<()> {
    if cfg.scripts.sources.is_empty() {
        return Err(anyhow!(
            "[scripts].sources must list at least one file (order is significant)"
        ));
    }
    Ok(())
}

/// Iterate every `(task, after)` pair declared in the config.
fn dependency_pairs(cfg: &ConfigFile) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for dep in &cfg.styles.after {
        pairs.push(("styles".to_string(), dep.clone()));
    }
    for dep in &cfg.scripts.after {
        pairs.push(("js".to_string(), dep.clone()));
    }
    for (name, check) in cfg.check.iter() {
        for dep in &check.after {
            pairs.push((name.clone(), dep.clone()));
        }
    }
    pairs
}

fn validate_task_dependencies(cfg: &ConfigFile) -> Result<()> {
    let names = task_names(cfg);

    for (task, dep) in dependency_pairs(cfg) {
        if !names.contains(&dep) {
            return Err(anyhow!(
                "task '{}' has unknown dependency '{}' in `after`",
                task,
                dep
            ));
        }
        if dep == task {
            return Err(anyhow!("task '{}' cannot depend on itself in `after`", task));
        }
    }
    Ok(())
}

fn validate_dag(cfg: &ConfigFile) -> Result<()> {
    // Edge direction: dep -> task, so a toposort failure pinpoints a cycle.
    let names = task_names(cfg);
    let pairs = dependency_pairs(cfg);

    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in &names {
        graph.add_node(name.as_str());
    }
    for (task, dep) in &pairs {
        graph.add_edge(dep.as_str(), task.as_str(), ());
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(anyhow!(
                "cycle detected in task dependencies involving task '{}'",
                node
            ))
        }
    }
}

fn validate_watch_bindings(cfg: &ConfigFile) -> Result<()> {
    let names = task_names(cfg);

    for (idx, binding) in cfg.watch.iter().enumerate() {
        if binding.run.is_empty() {
            return Err(anyhow!("watch binding #{} runs no tasks", idx));
        }
        if binding.patterns.is_empty() {
            return Err(anyhow!("watch binding #{} watches no patterns", idx));
        }
        for task in &binding.run {
            if !names.contains(task) {
                return Err(anyhow!(
                    "watch binding #{} runs unknown task '{}'",
                    idx,
                    task
                ));
            }
        }
        for pat in binding.patterns.iter().chain(binding.exclude.iter()) {
            Glob::new(pat)
                .with_context(|| format!("invalid glob '{}' in watch binding #{}", pat, idx))?;
        }
    }
    Ok(())
}
