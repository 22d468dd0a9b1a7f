use std::error::Error;
use std::fs;
use std::path::Path;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use tempfile::tempdir;

use themesmith::assets::StylePipeline;
use themesmith::config::model::StylesSection;

type TestResult = Result<(), Box<dyn Error>>;

fn styles_config() -> StylesSection {
    StylesSection {
        // no node_modules in the fixture
        include_paths: Vec::new(),
        ..StylesSection::default()
    }
}

fn write_entry(root: &Path, contents: &str) -> TestResult {
    let entry = root.join("sass/base/global.scss");
    fs::create_dir_all(entry.parent().ok_or("no parent")?)?;
    fs::write(entry, contents)?;
    Ok(())
}

#[test]
fn builds_both_variants_with_source_map() -> TestResult {
    let dir = tempdir()?;
    write_entry(
        dir.path(),
        "$space: 8px;\nbody {\n  margin: $space;\n}\n.intro {\n  font-size: 1rem;\n}\n",
    )?;

    let pipeline = StylePipeline::new(dir.path(), styles_config())?;
    let build = pipeline.build();

    assert!(!build.is_failure(), "{build:?}");
    assert_eq!(build.written(), ["css/global.min.css", "css/global.css"]);

    let minified = fs::read_to_string(dir.path().join("css/global.min.css"))?;
    let expanded = fs::read_to_string(dir.path().join("css/global.css"))?;

    // the variable is resolved by the compiler in both variants
    assert!(minified.contains("margin"), "{minified}");
    assert!(expanded.contains("8px"), "{expanded}");

    assert!(
        minified.contains("sourceMappingURL=global.min.css.map"),
        "{minified}"
    );
    assert!(dir.path().join("css/global.min.css.map").exists());
    // the expanded variant carries no map
    assert!(!dir.path().join("css/global.css.map").exists());

    Ok(())
}

#[test]
fn rem_values_carry_px_fallbacks_into_both_artifacts() -> TestResult {
    let dir = tempdir()?;
    write_entry(dir.path(), ".intro {\n  font-size: 1.5rem;\n}\n")?;

    let pipeline = StylePipeline::new(dir.path(), styles_config())?;
    let build = pipeline.build();
    assert!(!build.is_failure(), "{build:?}");

    // the fallback has to survive minification in the written artifacts,
    // with the px value first so the rem declaration wins where supported
    for rel in ["css/global.min.css", "css/global.css"] {
        let artifact = fs::read_to_string(dir.path().join(rel))?;
        let px = artifact.find("24px").ok_or_else(|| format!("no px fallback in {rel}: {artifact}"))?;
        let rem = artifact.find("1.5rem").ok_or_else(|| format!("no rem value in {rel}: {artifact}"))?;
        assert!(px < rem, "{rel}: {artifact}");
    }

    Ok(())
}

/// Parse an artifact and reprint it in its most compact form, dropping
/// comments and formatting, so the two variants can be compared.
fn canonical(css: &str) -> String {
    let sheet = StyleSheet::parse(css, ParserOptions::default()).expect("artifact parses");
    sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .expect("artifact prints")
        .code
}

#[test]
fn variants_are_css_equivalent_modulo_formatting() -> TestResult {
    let dir = tempdir()?;
    write_entry(
        dir.path(),
        "$space: 8px;\nbody {\n  margin: $space;\n  font-size: 1.25rem;\n}\n.intro {\n  padding: $space * 2;\n}\n",
    )?;

    let pipeline = StylePipeline::new(dir.path(), styles_config())?;
    assert!(!pipeline.build().is_failure());

    let minified = fs::read_to_string(dir.path().join("css/global.min.css"))?;
    let expanded = fs::read_to_string(dir.path().join("css/global.css"))?;

    assert_eq!(canonical(&minified), canonical(&expanded));

    Ok(())
}

#[test]
fn compile_failure_leaves_previous_artifacts_untouched() -> TestResult {
    let dir = tempdir()?;
    write_entry(dir.path(), "body {\n  margin: 0;\n}\n")?;

    let pipeline = StylePipeline::new(dir.path(), styles_config())?;
    assert!(!pipeline.build().is_failure());

    let min_path = dir.path().join("css/global.min.css");
    let good = fs::read_to_string(&min_path)?;

    // unclosed block
    write_entry(dir.path(), "body {\n  margin: 0;\n")?;
    let broken = pipeline.build();
    assert!(broken.is_failure());
    assert!(broken.written().is_empty());
    assert_eq!(fs::read_to_string(&min_path)?, good);

    // recovery on the next run, no restart needed
    write_entry(dir.path(), "body {\n  margin: 0;\n  padding: 4px;\n}\n")?;
    let fixed = pipeline.build();
    assert!(!fixed.is_failure());
    assert!(fs::read_to_string(&min_path)?.contains("padding"));

    Ok(())
}

#[test]
fn reformat_touches_each_file_at_most_once() -> TestResult {
    let dir = tempdir()?;
    write_entry(
        dir.path(),
        "body {  \r\n\r\n\r\n  margin: 0;   \n}\n\n\n",
    )?;

    let pipeline = StylePipeline::new(dir.path(), styles_config())?;

    assert_eq!(pipeline.reformat_sources(None)?, 1);
    // the rewritten text is already in its normal form
    assert_eq!(pipeline.reformat_sources(None)?, 0);

    let formatted = fs::read_to_string(dir.path().join("sass/base/global.scss"))?;
    assert!(!formatted.contains('\r'));
    assert!(!formatted.contains(" \n"));
    assert!(!formatted.contains("\n\n\n"));
    assert!(formatted.ends_with("}\n"));

    Ok(())
}

#[test]
fn reformat_of_a_single_changed_file_skips_the_rest() -> TestResult {
    let dir = tempdir()?;
    write_entry(dir.path(), "body {\n  margin: 0;\n}\n")?;
    let partial = dir.path().join("sass/base/_colors.scss");
    fs::write(&partial, "$ink: #222;   \n")?;

    let pipeline = StylePipeline::new(dir.path(), styles_config())?;
    assert_eq!(pipeline.reformat_sources(Some("sass/base/_colors.scss"))?, 1);

    assert_eq!(fs::read_to_string(&partial)?, "$ink: #222;\n");

    Ok(())
}
