use std::error::Error;
use std::fs;

use tempfile::tempdir;

use themesmith::config::loader::load_and_validate;
use themesmith::config::model::{ConfigFile, WatchBinding};
use themesmith::config::validate::{task_names, validate_config};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn missing_file_falls_back_to_defaults() -> TestResult {
    let dir = tempdir()?;
    let cfg = load_and_validate(dir.path().join("Themesmith.toml"))?;

    assert_eq!(cfg.styles.entry, "sass/base/global.scss");
    assert_eq!(cfg.scripts.bundle, "all.js");
    assert_eq!(cfg.server.reload_delay_ms, 1000);
    assert_eq!(cfg.check.len(), 4);
    assert!(cfg.check.contains_key("validate-markup"));
    assert_eq!(cfg.watch.len(), 3);

    let names = task_names(&cfg);
    assert!(names.contains("styles"));
    assert!(names.contains("js"));
    assert!(names.contains("check-accessibility"));

    Ok(())
}

#[test]
fn toml_overrides_merge_with_field_defaults() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Themesmith.toml");
    fs::write(
        &path,
        r#"
[server]
proxy = "http://mytheme.test"
port = 3100

[styles]
entry = "sass/site.scss"

[check.lint-styles]
cmd = "stylelint --formatter unix"
paths = ["sass/**/*.scss"]

[[watch]]
patterns = ["sass/**/*.scss"]
run = ["styles", "lint-styles"]
"#,
    )?;

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.server.proxy, "http://mytheme.test");
    assert_eq!(cfg.server.port, 3100);
    // unset fields within a declared section still take their defaults
    assert_eq!(cfg.server.reload_delay_ms, 1000);
    assert_eq!(cfg.styles.entry, "sass/site.scss");
    assert_eq!(cfg.styles.dest, "css");

    // declaring any [check.*] section replaces the built-in set
    assert_eq!(cfg.check.len(), 1);
    assert_eq!(cfg.watch.len(), 1);

    Ok(())
}

#[test]
fn watch_binding_referencing_unknown_task_is_rejected() {
    let mut cfg = ConfigFile::default();
    cfg.watch.push(WatchBinding {
        patterns: vec!["**/*.md".to_string()],
        exclude: Vec::new(),
        run: vec!["does-not-exist".to_string()],
        reload: false,
    });
    assert!(validate_config(&cfg).is_err());
}

#[test]
fn watch_binding_without_tasks_is_rejected() {
    let mut cfg = ConfigFile::default();
    cfg.watch.push(WatchBinding {
        patterns: vec!["**/*.md".to_string()],
        exclude: Vec::new(),
        run: Vec::new(),
        reload: false,
    });
    assert!(validate_config(&cfg).is_err());
}

#[test]
fn dependency_cycle_is_rejected() {
    // lint-styles already declares `after = ["styles"]` in the defaults
    let mut cfg = ConfigFile::default();
    cfg.styles.after = vec!["lint-styles".to_string()];
    assert!(validate_config(&cfg).is_err());
}

#[test]
fn invalid_watch_glob_is_rejected() {
    let mut cfg = ConfigFile::default();
    cfg.watch.push(WatchBinding {
        patterns: vec!["src/[".to_string()],
        exclude: Vec::new(),
        run: vec!["styles".to_string()],
        reload: false,
    });
    assert!(validate_config(&cfg).is_err());
}

#[test]
fn empty_script_sources_are_rejected() {
    let mut cfg = ConfigFile::default();
    cfg.scripts.sources = Vec::new();
    assert!(validate_config(&cfg).is_err());
}
