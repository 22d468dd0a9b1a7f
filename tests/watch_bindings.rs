use std::error::Error;

use themesmith::config::model::ConfigFile;
use themesmith::watch::build_binding_profiles;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn default_bindings_route_paths_to_the_right_tasks() -> TestResult {
    let cfg = ConfigFile::default();
    let profiles = build_binding_profiles(&cfg.watch)?;
    assert_eq!(profiles.len(), 3);

    let sass = &profiles[0];
    assert!(sass.matches("sass/base/global.scss"));
    assert!(sass.matches("sass/navigation/_menu.sass"));
    assert!(!sass.matches("js/src/navigation.js"));
    assert_eq!(sass.run(), ["styles", "lint-styles"]);
    // style changes are injected, never a full reload
    assert!(!sass.reload());

    let php = &profiles[1];
    assert!(php.matches("header.php"));
    assert!(php.matches("template-parts/content.php"));
    assert!(!php.matches("node_modules/pkg/index.php"));
    assert!(!php.matches("inc/helpers.php"));
    assert!(php.reload());
    assert_eq!(php.run(), ["phpcs", "validate-markup", "check-accessibility"]);

    let js = &profiles[2];
    assert!(js.matches("js/src/scripts.js"));
    // the bundle output must not re-trigger its own binding
    assert!(!js.matches("js/all.js"));
    assert!(js.reload());
    assert_eq!(js.run(), ["js"]);

    Ok(())
}

#[test]
fn exclude_patterns_beat_watch_patterns() -> TestResult {
    let mut cfg = ConfigFile::default();
    cfg.watch[0].exclude = vec!["sass/vendor/**".to_string()];

    let profiles = build_binding_profiles(&cfg.watch)?;
    assert!(profiles[0].matches("sass/base/global.scss"));
    assert!(!profiles[0].matches("sass/vendor/_reset.scss"));

    Ok(())
}

#[test]
fn binding_indices_follow_declaration_order() -> TestResult {
    let cfg = ConfigFile::default();
    let profiles = build_binding_profiles(&cfg.watch)?;
    for (i, profile) in profiles.iter().enumerate() {
        assert_eq!(profile.index(), i);
    }
    Ok(())
}
