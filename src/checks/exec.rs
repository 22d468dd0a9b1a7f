// src/checks/exec.rs

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::model::CheckConfig;
use crate::files::collect_files;

use super::report::{Report, SuppressionList, filter_lines};

/// Run one external checker over its configured file-set and return the
/// filtered report.
///
/// This never returns an error: a checker that can't be spawned, a non-zero
/// exit, or an unreadable file-set all end up inside the `Report`. Checks
/// are advisory and must not take down the watch session.
pub async fn run_check(root: &Path, name: &str, cfg: &CheckConfig) -> Report {
    let files = match collect_files(root, &cfg.paths, &cfg.exclude) {
        Ok(files) => files,
        Err(err) => {
            let mut report = Report::empty(name);
            report.error = Some(format!("enumerating files: {err}"));
            return report;
        }
    };

    if files.is_empty() {
        debug!(task = %name, "no files match; skipping checker invocation");
        return Report::empty(name);
    }

    let mut command_line = cfg.cmd.clone();
    for file in &files {
        command_line.push(' ');
        command_line.push_str(&shell_quote(&file.to_string_lossy()));
    }

    info!(task = %name, files = files.len(), "running checker");
    debug!(task = %name, cmd = %command_line, "checker command line");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&command_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&command_line);
        c
    };

    cmd.current_dir(root)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // `output()` drains both pipes concurrently, so a chatty checker can't
    // deadlock on a full stderr buffer.
    let output = match cmd.output().await {
        Ok(output) => output,
        Err(err) => {
            let mut report = Report::empty(name);
            report.error = Some(format!("running checker: {err}"));
            return report;
        }
    };

    let mut raw_lines: Vec<String> = Vec::new();
    raw_lines.extend(
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string),
    );
    raw_lines.extend(
        String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::to_string),
    );

    let exit_code = output.status.code();

    let suppress = SuppressionList::new(&cfg.suppress);
    let (lines, suppressed) = filter_lines(&raw_lines, &suppress, cfg.severity.as_deref());

    Report {
        task: name.to_string(),
        lines,
        suppressed,
        exit_code,
        error: None,
    }
}

/// Single-quote a path for `sh -c`; embedded quotes are closed, escaped and
/// reopened.
fn shell_quote(s: &str) -> String {
    if cfg!(windows) {
        format!("\"{s}\"")
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
