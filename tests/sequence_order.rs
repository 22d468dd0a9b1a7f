use themesmith::config::model::ConfigFile;
use themesmith::pipeline::TaskRegistry;

fn registry() -> TaskRegistry {
    TaskRegistry::from_config(&ConfigFile::default())
}

#[test]
fn checks_order_by_their_dependency_data() {
    let seq = registry().sequence_order(&[
        "check-accessibility".to_string(),
        "validate-markup".to_string(),
        "phpcs".to_string(),
    ]);
    assert_eq!(seq, ["phpcs", "validate-markup", "check-accessibility"]);
}

#[test]
fn styles_runs_before_its_linter() {
    let seq = registry().sequence_order(&["lint-styles".to_string(), "styles".to_string()]);
    assert_eq!(seq, ["styles", "lint-styles"]);
}

#[test]
fn unknown_names_are_dropped() {
    let seq = registry().sequence_order(&["styles".to_string(), "no-such-task".to_string()]);
    assert_eq!(seq, ["styles"]);
}

#[test]
fn dependency_outside_the_sequence_is_not_a_constraint() {
    // lint-styles depends on styles, but styles isn't part of this sequence
    let seq = registry().sequence_order(&["lint-styles".to_string()]);
    assert_eq!(seq, ["lint-styles"]);
}

#[test]
fn unconstrained_tasks_keep_declared_order() {
    let seq = registry().sequence_order(&["js".to_string(), "styles".to_string()]);
    assert_eq!(seq, ["js", "styles"]);
}
