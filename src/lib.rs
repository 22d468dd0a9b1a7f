// src/lib.rs

pub mod assets;
pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod files;
pub mod logging;
pub mod pipeline;
pub mod serve;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{Runtime, RuntimeEvent, TaskOutcome, run_sequence};
use crate::pipeline::PipelineSession;
use crate::serve::DevServerBridge;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the pipeline session (task registry + watch-loop state)
/// - the dev server bridge
/// - the file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let root = config_root_dir(&config_path);
    let session = Arc::new(PipelineSession::new(root.clone(), cfg)?);

    match args.task.as_deref() {
        Some(task) if task != "watch" => run_single_task(&session, task).await,
        _ => run_watch_session(&session, &root).await,
    }
}

/// Run exactly one named task, then exit. No dev server, no watcher, no hash
/// guard; `after` ordering only matters inside watch sequences.
async fn run_single_task(session: &Arc<PipelineSession>, task: &str) -> Result<()> {
    if !session.registry().contains(task) {
        let known: Vec<&str> = session.registry().names().collect();
        bail!("unknown task {task:?}; known tasks: {known:?}");
    }

    match run_sequence(session, None, &[task.to_string()], None, false).await {
        TaskOutcome::Success => Ok(()),
        TaskOutcome::Failed => bail!("task {task:?} failed"),
    }
}

/// The full session: initial build of every task, dev server bridge, file
/// watcher, then the runtime loop until Ctrl-C.
async fn run_watch_session(session: &Arc<PipelineSession>, root: &Path) -> Result<()> {
    let bridge = DevServerBridge::spawn(&session.config().server).await?;

    // Initial build so the browser starts from fresh artifacts. The hash
    // guard is skipped: this run also seeds the "clean" hashes.
    let initial = session
        .registry()
        .sequence_order(&session.registry().names().map(str::to_string).collect::<Vec<_>>());
    info!(?initial, "initial build");
    run_sequence(session, Some(&bridge), &initial, None, false).await;

    let runtime = Runtime::new(Arc::clone(session), Some(bridge));
    let rt_tx = runtime.events_tx();

    let _watcher_handle =
        crate::watch::spawn_watcher(root, session.profiles().to_vec(), rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    runtime.run().await;
    Ok(())
}

/// Figure out a sensible project root for building and watching.
/// Currently: directory containing the config file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    let parent = config_path.parent().unwrap_or(Path::new(""));
    if parent.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        parent.to_path_buf()
    }
}

/// Simple dry-run output: print tasks, watch bindings and the server setup.
fn print_dry_run(cfg: &ConfigFile) {
    println!("themesmith dry-run");
    println!("  server.proxy = {}", cfg.server.proxy);
    println!("  server.port = {}", cfg.server.port);
    println!();

    println!("tasks:");
    println!("  - styles");
    println!("      entry: {}", cfg.styles.entry);
    println!("      dest: {}/", cfg.styles.dest);
    if !cfg.styles.after.is_empty() {
        println!("      after: {:?}", cfg.styles.after);
    }
    println!("  - js");
    println!("      sources: {} file(s)", cfg.scripts.sources.len());
    println!("      bundle: {}/{}", cfg.scripts.dest, cfg.scripts.bundle);
    if !cfg.scripts.after.is_empty() {
        println!("      after: {:?}", cfg.scripts.after);
    }
    for (name, check) in cfg.check.iter() {
        println!("  - {name}");
        println!("      cmd: {}", check.cmd);
        if !check.after.is_empty() {
            println!("      after: {:?}", check.after);
        }
        if !check.suppress.is_empty() {
            println!("      suppress: {} pattern(s)", check.suppress.len());
        }
        if let Some(ref severity) = check.severity {
            println!("      severity: {severity}");
        }
    }
    println!();

    println!("watch bindings ({}):", cfg.watch.len());
    for binding in cfg.watch.iter() {
        println!("  - {:?}", binding.patterns);
        println!("      run: {:?}", binding.run);
        if !binding.exclude.is_empty() {
            println!("      exclude: {:?}", binding.exclude);
        }
        if binding.reload {
            println!("      reload: true");
        }
    }
}
