// src/checks/report.rs

use regex::Regex;
use tracing::{info, warn};

/// A suppression entry is tried as a regex first; if the pattern doesn't
/// compile it is used as a literal substring match. This is how
/// framework-specific false positives (e.g. a markup validator tripping over
/// template syntax embedded in HTML) are silenced.
pub struct SuppressionList {
    matchers: Vec<Matcher>,
}

enum Matcher {
    Pattern(Regex),
    Literal(String),
}

impl SuppressionList {
    pub fn new(entries: &[String]) -> Self {
        let matchers = entries
            .iter()
            .map(|entry| match Regex::new(entry) {
                Ok(re) => Matcher::Pattern(re),
                Err(_) => Matcher::Literal(entry.clone()),
            })
            .collect();
        Self { matchers }
    }

    pub fn is_suppressed(&self, line: &str) -> bool {
        self.matchers.iter().any(|m| match m {
            Matcher::Pattern(re) => re.is_match(line),
            Matcher::Literal(lit) => line.contains(lit),
        })
    }
}

/// Severity keywords in ascending order. A report line's severity is the
/// highest keyword it mentions; lines without one (file headers, summaries)
/// always pass the threshold.
const SEVERITIES: [&str; 4] = ["notice", "info", "warning", "error"];

fn severity_rank(s: &str) -> Option<usize> {
    let lower = s.to_lowercase();
    SEVERITIES.iter().position(|k| lower == *k)
}

fn line_rank(line: &str) -> Option<usize> {
    let lower = line.to_lowercase();
    SEVERITIES
        .iter()
        .enumerate()
        .filter(|(_, k)| lower.contains(*k))
        .map(|(i, _)| i)
        .max()
}

/// Filter raw report lines: drop suppressed entries and entries below the
/// severity threshold. Returns the kept lines and the suppressed count.
pub fn filter_lines(
    lines: &[String],
    suppress: &SuppressionList,
    severity: Option<&str>,
) -> (Vec<String>, usize) {
    let threshold = severity.and_then(severity_rank);

    let mut kept = Vec::new();
    let mut suppressed = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if suppress.is_suppressed(line) {
            suppressed += 1;
            continue;
        }
        if let (Some(threshold), Some(rank)) = (threshold, line_rank(line)) {
            if rank < threshold {
                suppressed += 1;
                continue;
            }
        }
        kept.push(line.clone());
    }

    (kept, suppressed)
}

/// The outcome of one check run.
#[derive(Debug)]
pub struct Report {
    pub task: String,
    pub lines: Vec<String>,
    pub suppressed: usize,
    pub exit_code: Option<i32>,
    /// Set when the checker could not run at all (missing binary, spawn
    /// failure). Still not an orchestrator error.
    pub error: Option<String>,
}

impl Report {
    pub fn empty(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            lines: Vec::new(),
            suppressed: 0,
            exit_code: None,
            error: None,
        }
    }

    /// Emit the report through the log. Findings are informational.
    pub fn log(&self) {
        if let Some(err) = &self.error {
            warn!(task = %self.task, error = %err, "check could not run");
            return;
        }
        for line in &self.lines {
            info!(task = %self.task, "{line}");
        }
        info!(
            task = %self.task,
            findings = self.lines.len(),
            suppressed = self.suppressed,
            "check finished"
        );
    }
}
