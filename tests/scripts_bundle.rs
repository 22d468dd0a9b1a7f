use std::error::Error;
use std::fs;

use tempfile::tempdir;

use themesmith::assets::ScriptBundle;
use themesmith::config::model::ScriptsSection;
use themesmith::errors::StepError;

type TestResult = Result<(), Box<dyn Error>>;

fn scripts_config(sources: &[&str]) -> ScriptsSection {
    ScriptsSection {
        sources: sources.iter().map(|s| s.to_string()).collect(),
        ..ScriptsSection::default()
    }
}

#[test]
fn bundle_preserves_source_order() -> TestResult {
    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("js/src"))?;
    // top-level vars are globals in the bundle and survive minification;
    // the string literals mark each source's position
    fs::write(
        dir.path().join("js/src/a.js"),
        "var first = \"alpha-marker\";\n",
    )?;
    fs::write(
        dir.path().join("js/src/b.js"),
        "var second = \"omega-marker\";\n",
    )?;

    let bundle = ScriptBundle::new(dir.path(), scripts_config(&["js/src/a.js", "js/src/b.js"]));
    let href = bundle.build()?;
    assert_eq!(href, "js/all.js");

    let out = fs::read_to_string(dir.path().join("js/all.js"))?;
    let first = out.find("alpha-marker").ok_or("first source missing")?;
    let second = out.find("omega-marker").ok_or("second source missing")?;
    assert!(first < second, "{out}");

    Ok(())
}

#[test]
fn missing_source_is_an_error_and_writes_nothing() -> TestResult {
    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("js/src"))?;
    fs::write(dir.path().join("js/src/a.js"), "var ok = 1;\n")?;

    let bundle = ScriptBundle::new(
        dir.path(),
        scripts_config(&["js/src/a.js", "js/src/missing.js"]),
    );

    match bundle.build() {
        Err(StepError::Io { path, .. }) => assert!(path.contains("missing.js"), "{path}"),
        other => panic!("expected io error, got {other:?}"),
    }
    assert!(!dir.path().join("js/all.js").exists());

    Ok(())
}
