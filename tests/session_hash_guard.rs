use std::error::Error;
use std::fs;
use std::path::Path;

use tempfile::tempdir;

use themesmith::assets::StylePipeline;
use themesmith::config::model::{ConfigFile, StylesSection};
use themesmith::pipeline::PipelineSession;

type TestResult = Result<(), Box<dyn Error>>;

fn write_entry(root: &Path, contents: &str) -> TestResult {
    let entry = root.join("sass/base/global.scss");
    fs::create_dir_all(entry.parent().ok_or("no parent")?)?;
    fs::write(entry, contents)?;
    Ok(())
}

#[test]
fn watch_trigger_is_skipped_until_inputs_change() -> TestResult {
    let dir = tempdir()?;
    write_entry(dir.path(), "body {\n  margin: 0;\n}\n")?;

    let session = PipelineSession::new(dir.path(), ConfigFile::default())?;

    assert!(session.should_run("styles"));
    let fingerprint = session.input_fingerprint("styles");
    session.record_clean("styles", fingerprint);
    assert!(!session.should_run("styles"));

    write_entry(dir.path(), "body {\n  margin: 1px;\n}\n")?;
    assert!(session.should_run("styles"));

    Ok(())
}

#[test]
fn edit_landing_mid_run_keeps_the_inputs_dirty() -> TestResult {
    let dir = tempdir()?;
    write_entry(dir.path(), "body {\n  margin: 0;\n}\n")?;

    let session = PipelineSession::new(dir.path(), ConfigFile::default())?;

    // the run reads its inputs here
    let fingerprint = session.input_fingerprint("styles");

    // an edit lands while the run is still compiling
    write_entry(dir.path(), "body {\n  margin: 2px;\n}\n")?;

    // completion records the read-time fingerprint, not the current state,
    // so the queued replay is not suppressed
    session.record_clean("styles", fingerprint);
    assert!(session.should_run("styles"));

    Ok(())
}

#[test]
fn self_caused_rewrite_hashes_clean() -> TestResult {
    let dir = tempdir()?;
    // messy on purpose: the reformat step will rewrite this file
    write_entry(dir.path(), "body {   \n  margin: 0;\n}\n\n\n")?;

    let session = PipelineSession::new(dir.path(), ConfigFile::default())?;

    let styles = StylesSection {
        include_paths: Vec::new(),
        ..StylesSection::default()
    };
    let pipeline = StylePipeline::new(dir.path(), styles)?;
    assert_eq!(pipeline.reformat_sources(None)?, 1);

    // the fingerprint captured after the rewrite covers the rewritten file,
    // so the watch event caused by the rewrite is a no-op
    let fingerprint = session.input_fingerprint("styles");
    session.record_clean("styles", fingerprint);
    assert!(!session.should_run("styles"));

    Ok(())
}

#[test]
fn running_guard_is_exclusive() -> TestResult {
    let dir = tempdir()?;
    let session = PipelineSession::new(dir.path(), ConfigFile::default())?;

    assert!(session.mark_running("styles"));
    assert!(!session.mark_running("styles"));
    assert!(session.is_running("styles"));

    session.mark_idle("styles");
    assert!(!session.is_running("styles"));
    assert!(session.mark_running("styles"));

    Ok(())
}

#[test]
fn unknown_tasks_always_run() -> TestResult {
    let dir = tempdir()?;
    let session = PipelineSession::new(dir.path(), ConfigFile::default())?;
    // no input file-set to compare against, so never suppressed
    assert!(session.should_run("not-registered"));
    Ok(())
}
