// src/engine/executor.rs

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::assets::{ScriptBundle, StylePipeline};
use crate::checks::run_check;
use crate::engine::runtime::TaskName;
use crate::pipeline::{PipelineSession, TaskKind};
use crate::serve::DevServerBridge;

/// How one task run ended. Checks always report `Success`; their findings
/// are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Run an ordered task sequence, one task at a time.
///
/// A failing artifact task (styles, scripts) aborts the remainder of the
/// sequence; checks never do. When `check_hashes` is set, tasks whose input
/// file-set is unchanged since their last run are skipped; that is the
/// watch-loop guard, so manual invocations pass `false`.
pub async fn run_sequence(
    session: &Arc<PipelineSession>,
    bridge: Option<&DevServerBridge>,
    tasks: &[TaskName],
    changed: Option<&str>,
    check_hashes: bool,
) -> TaskOutcome {
    for name in tasks {
        let Some(task) = session.registry().get(name) else {
            continue;
        };
        let kind = task.kind;

        if check_hashes && !session.should_run(name) {
            continue;
        }
        if !session.mark_running(name) {
            debug!(task = %name, "already running; skipping");
            continue;
        }

        let (outcome, fingerprint) = run_task(session, bridge, name, kind, changed).await;

        // The fingerprint was captured when the task read its inputs (after
        // any rewrites of its own), so a self-caused watch event hashes
        // clean while an edit landing mid-run stays dirty.
        session.record_clean(name, fingerprint);
        session.mark_idle(name);

        if outcome == TaskOutcome::Failed && !kind.is_informational() {
            warn!(task = %name, "build step failed; aborting remainder of sequence");
            return TaskOutcome::Failed;
        }
    }

    TaskOutcome::Success
}

async fn run_task(
    session: &Arc<PipelineSession>,
    bridge: Option<&DevServerBridge>,
    name: &str,
    kind: TaskKind,
    changed: Option<&str>,
) -> (TaskOutcome, Option<String>) {
    match kind {
        TaskKind::Styles => run_styles(session, bridge, changed).await,
        TaskKind::Scripts => run_scripts(session, bridge).await,
        TaskKind::Check => {
            let Some(cfg) = session.config().check.get(name) else {
                warn!(task = %name, "check has no config section; skipping");
                return (TaskOutcome::Success, None);
            };
            // the checker enumerates the same file-set right after this
            let fingerprint = session.input_fingerprint(name);
            let report = run_check(session.root(), name, cfg).await;
            report.log();
            (TaskOutcome::Success, fingerprint)
        }
    }
}

/// Styles: reformat the touched sources in place, then compile both output
/// variants. Compilation runs on the blocking pool.
async fn run_styles(
    session: &Arc<PipelineSession>,
    bridge: Option<&DevServerBridge>,
    changed: Option<&str>,
) -> (TaskOutcome, Option<String>) {
    let worker = Arc::clone(session);
    let root = session.root().to_path_buf();
    let cfg = session.config().styles.clone();
    let changed = changed.map(str::to_string);

    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let pipeline = StylePipeline::new(root, cfg)?;
        let reformatted = pipeline.reformat_sources(changed.as_deref())?;
        if reformatted > 0 {
            info!(files = reformatted, "reformatted style sources");
        }
        // fingerprint at read time, once the reformat rewrites have landed
        let fingerprint = worker.input_fingerprint("styles");
        Ok((pipeline.build(), fingerprint))
    })
    .await;

    let (build, fingerprint) = match result {
        Ok(Ok(pair)) => pair,
        Ok(Err(err)) => {
            warn!(task = "styles", "style pipeline failed: {err:#}");
            return (TaskOutcome::Failed, None);
        }
        Err(err) => {
            warn!(task = "styles", "style worker panicked: {err}");
            return (TaskOutcome::Failed, None);
        }
    };

    if let Err(err) = &build.minified {
        warn!(task = "styles", variant = "minified", "{err}");
    }
    if let Err(err) = &build.expanded {
        warn!(task = "styles", variant = "expanded", "{err}");
    }

    let written = build.written();
    if !written.is_empty()
        && let Some(bridge) = bridge
    {
        bridge.inject_css(written);
    }

    if build.is_failure() {
        (TaskOutcome::Failed, fingerprint)
    } else {
        if let Some(bridge) = bridge {
            bridge.notify("styles rebuilt");
        }
        (TaskOutcome::Success, fingerprint)
    }
}

/// Scripts: concatenate the configured sources in order and write the
/// minified bundle.
async fn run_scripts(
    session: &Arc<PipelineSession>,
    bridge: Option<&DevServerBridge>,
) -> (TaskOutcome, Option<String>) {
    let worker = Arc::clone(session);
    let root = session.root().to_path_buf();
    let cfg = session.config().scripts.clone();

    let result = tokio::task::spawn_blocking(move || {
        let fingerprint = worker.input_fingerprint("js");
        (ScriptBundle::new(root, cfg).build(), fingerprint)
    })
    .await;

    match result {
        Ok((Ok(href), fingerprint)) => {
            info!(task = "js", bundle = %href, "script bundle written");
            if let Some(bridge) = bridge {
                bridge.notify("scripts rebuilt");
            }
            (TaskOutcome::Success, fingerprint)
        }
        Ok((Err(err), fingerprint)) => {
            warn!(task = "js", "{err}");
            (TaskOutcome::Failed, fingerprint)
        }
        Err(err) => {
            warn!(task = "js", "script worker panicked: {err}");
            (TaskOutcome::Failed, None)
        }
    }
}
