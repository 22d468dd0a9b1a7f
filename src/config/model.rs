// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from `Themesmith.toml`.
///
/// Every section is optional; the defaults describe a conventional theme
/// layout (`sass/` sources compiled into `css/`, `js/src/` bundled into
/// `js/`, PHP templates at the project root):
///
/// ```toml
/// [server]
/// proxy = "http://mytheme.test"
/// reload_delay_ms = 1000
///
/// [styles]
/// entry = "sass/base/global.scss"
///
/// [check.lint-styles]
/// cmd = "stylelint"
/// paths = ["sass/**/*.{sass,scss}"]
///
/// [[watch]]
/// patterns = ["sass/**/*.{sass,scss}"]
/// run = ["styles", "lint-styles"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Dev server / live-reload bridge settings from `[server]`.
    #[serde(default)]
    pub server: ServerSection,

    /// Stylesheet pipeline settings from `[styles]`.
    #[serde(default)]
    pub styles: StylesSection,

    /// Script bundle settings from `[scripts]`.
    #[serde(default)]
    pub scripts: ScriptsSection,

    /// Informational checks from `[check.<name>]`, keyed by task name.
    #[serde(default = "default_checks")]
    pub check: BTreeMap<String, CheckConfig>,

    /// Watch bindings from `[[watch]]`: file-set globs mapped to the task
    /// sequence they trigger.
    #[serde(default = "default_watch_bindings")]
    pub watch: Vec<WatchBinding>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            styles: StylesSection::default(),
            scripts: ScriptsSection::default(),
            check: default_checks(),
            watch: default_watch_bindings(),
        }
    }
}

/// `[server]` section: proxy target and live-update behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Address of the already-running local server to proxy.
    #[serde(default = "default_proxy")]
    pub proxy: String,

    /// Port the bridge itself listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Browser command used when `open = true`. Empty means platform default.
    #[serde(default)]
    pub browser: String,

    /// Open a browser tab at startup.
    #[serde(default)]
    pub open: bool,

    /// Show an in-page notification when a reload/update is pushed.
    #[serde(default = "default_true")]
    pub notify: bool,

    /// Debounce window for coalescing rapid changes into one reload.
    #[serde(default = "default_reload_delay_ms")]
    pub reload_delay_ms: u64,
}

fn default_proxy() -> String {
    "http://localhost:8080".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_reload_delay_ms() -> u64 {
    1000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            proxy: default_proxy(),
            port: default_port(),
            browser: String::new(),
            open: false,
            notify: true,
            reload_delay_ms: default_reload_delay_ms(),
        }
    }
}

/// `[styles]` section.
///
/// The entry file aggregates all partials through its own import graph; the
/// compiler resolves those, we only hand it `include_paths`.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    /// Entry stylesheet compiled into both output variants.
    #[serde(default = "default_styles_entry")]
    pub entry: String,

    /// Globs describing every style source (partials included); used for
    /// watch-loop suppression hashing and the source reformat step.
    #[serde(default = "default_styles_sources")]
    pub sources: Vec<String>,

    /// Output directory for the compiled bundles.
    #[serde(default = "default_css_dest")]
    pub dest: String,

    /// Extra import lookup directories for the compiler.
    #[serde(default = "default_include_paths")]
    pub include_paths: Vec<String>,

    /// Browser support matrix for vendor prefixing and minifier
    /// compatibility, keyed by browser name (`ie = "11"`, `chrome = "90"`).
    #[serde(default = "default_browsers")]
    pub browsers: BTreeMap<String, String>,

    /// Root font size (px) used to compute legacy px fallbacks for `rem`.
    #[serde(default = "default_pixel_root")]
    pub pixel_root: f32,

    /// Tasks that must run before this one when they share a sequence.
    #[serde(default)]
    pub after: Vec<String>,
}

fn default_styles_entry() -> String {
    "sass/base/global.scss".to_string()
}

fn default_styles_sources() -> Vec<String> {
    vec!["sass/**/*.{sass,scss}".to_string()]
}

fn default_css_dest() -> String {
    "css".to_string()
}

fn default_include_paths() -> Vec<String> {
    vec!["node_modules".to_string()]
}

fn default_browsers() -> BTreeMap<String, String> {
    let mut m = BTreeMap::new();
    m.insert("ie".to_string(), "11".to_string());
    m
}

fn default_pixel_root() -> f32 {
    16.0
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            entry: default_styles_entry(),
            sources: default_styles_sources(),
            dest: default_css_dest(),
            include_paths: default_include_paths(),
            browsers: default_browsers(),
            pixel_root: default_pixel_root(),
            after: Vec::new(),
        }
    }
}

impl StylesSection {
    /// Stem of the entry file, used to name both output bundles.
    pub fn bundle_stem(&self) -> String {
        std::path::Path::new(&self.entry)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "global".to_string())
    }
}

/// `[scripts]` section.
///
/// `sources` order is semantically significant: later files may rely on
/// globals defined by earlier ones, so the bundle preserves this order.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    /// Ordered list of files concatenated into the bundle.
    #[serde(default = "default_script_sources")]
    pub sources: Vec<String>,

    /// Bundle file name.
    #[serde(default = "default_bundle")]
    pub bundle: String,

    /// Output directory for the bundle.
    #[serde(default = "default_js_dest")]
    pub dest: String,

    /// Tasks that must run before this one when they share a sequence.
    #[serde(default)]
    pub after: Vec<String>,
}

fn default_script_sources() -> Vec<String> {
    vec![
        "js/src/skip-link-focus-fix.js".to_string(),
        "node_modules/moveto/dist/moveTo.js".to_string(),
        "node_modules/what-input/dist/what-input.js".to_string(),
        "js/src/navigation.js".to_string(),
        "js/src/scripts.js".to_string(),
    ]
}

fn default_bundle() -> String {
    "all.js".to_string()
}

fn default_js_dest() -> String {
    "js".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            sources: default_script_sources(),
            bundle: default_bundle(),
            dest: default_js_dest(),
            after: Vec::new(),
        }
    }
}

/// `[check.<name>]` section: one external, read-only static analysis task.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CheckConfig {
    /// Checker command; matching files are appended as arguments.
    pub cmd: String,

    /// Globs selecting the files handed to the checker.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Globs excluded from `paths` (generated output, vendored code).
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Report lines matching any of these entries are silenced. Each entry is
    /// tried as a regex first and falls back to a literal substring match.
    #[serde(default)]
    pub suppress: Vec<String>,

    /// Minimum severity keyword to report (`"error"` reports errors only;
    /// unset reports everything the checker printed).
    #[serde(default)]
    pub severity: Option<String>,

    /// Tasks that must run before this one when they share a sequence.
    #[serde(default)]
    pub after: Vec<String>,
}

/// One `[[watch]]` binding: a file-set mapped to an ordered task sequence.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchBinding {
    /// Globs (relative to the project root) that trigger this binding.
    pub patterns: Vec<String>,

    /// Globs excluded from `patterns` (generated outputs and the like).
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Task names to run, ordered by the registry's dependency data.
    pub run: Vec<String>,

    /// Request a full browser reload once the sequence finishes.
    #[serde(default)]
    pub reload: bool,
}

/// Built-in checks mirroring a conventional theme setup: a style linter, a
/// PHP sniffer, an HTML validator and an accessibility checker. The suppress
/// lists silence template-language false positives (the validators see raw
/// `<?php` blocks inside markup) and framework-imposed document structure.
fn default_checks() -> BTreeMap<String, CheckConfig> {
    let mut checks = BTreeMap::new();

    checks.insert(
        "lint-styles".to_string(),
        CheckConfig {
            cmd: "stylelint".to_string(),
            paths: vec!["sass/**/*.{sass,scss}".to_string()],
            exclude: vec![
                "sass/navigation/_burger.scss".to_string(),
                "sass/base/_normalize.scss".to_string(),
            ],
            suppress: Vec::new(),
            severity: None,
            after: vec!["styles".to_string()],
        },
    );

    checks.insert(
        "phpcs".to_string(),
        CheckConfig {
            cmd: "phpcs --standard=phpcs.xml".to_string(),
            paths: vec!["**/*.php".to_string()],
            exclude: vec!["node_modules/**".to_string(), "inc/**".to_string()],
            suppress: Vec::new(),
            severity: None,
            after: Vec::new(),
        },
    );

    checks.insert(
        "validate-markup".to_string(),
        CheckConfig {
            cmd: "vnu --format text".to_string(),
            paths: vec!["**/*.php".to_string()],
            exclude: vec![
                "functions.php".to_string(),
                "node_modules/**".to_string(),
                "inc/**".to_string(),
            ],
            suppress: vec![
                "XML processing".to_string(),
                "role is unnecessary for element".to_string(),
                "Stray end tag".to_string(),
                "Stray start tag".to_string(),
                "Stray doctype".to_string(),
                "CSS:".to_string(),
                r"Attribute “<\?php”".to_string(),
                "Attribute “post_".to_string(),
                r"Bad value “<\?php".to_string(),
                "“echo”".to_string(),
                "Saw “<” when expecting an attribute name".to_string(),
                "Start tag seen without seeing a doctype first".to_string(),
                "End tag seen without seeing a doctype first".to_string(),
                "Non-space characters found without seeing a doctype first".to_string(),
                "End of file seen without seeing a doctype first".to_string(),
                "Element “head” is missing a required instance of child element".to_string(),
                "Consider adding a “lang” attribute to the “html”".to_string(),
                "The character encoding was not declared".to_string(),
                "Cannot recover after last error".to_string(),
                r"Bad value “mailto: ?<\?php".to_string(),
                r"Bad value “tel: ?<\?".to_string(),
                r"<\?php".to_string(),
                "This document appears to be written".to_string(),
                "The document is not mappable to XML".to_string(),
            ],
            severity: None,
            after: vec!["phpcs".to_string()],
        },
    );

    checks.insert(
        "check-accessibility".to_string(),
        CheckConfig {
            cmd: "pa11y --standard WCAG2A".to_string(),
            paths: vec!["**/*.php".to_string()],
            exclude: vec![
                "functions.php".to_string(),
                "node_modules/**".to_string(),
                "inc/**".to_string(),
            ],
            suppress: vec![
                "WCAG2A.Principle3.Guideline3_1.3_1_1.H57.2".to_string(),
                "WCAG2A.Principle2.Guideline2_4.2_4_2.H25.1.NoTitleEl".to_string(),
                "WCAG2A.Principle4.Guideline4_1.4_1_2.H91.A.NoContent".to_string(),
                "WCAG2A.Principle1.Guideline1_3.1_3_1.H42.2".to_string(),
                "WCAG2A.Principle2.Guideline2_4.2_4_1.G1,G123,G124.NoSuchID".to_string(),
            ],
            severity: Some("error".to_string()),
            after: vec!["validate-markup".to_string()],
        },
    );

    checks
}

fn default_watch_bindings() -> Vec<WatchBinding> {
    vec![
        WatchBinding {
            patterns: vec!["sass/**/*.{sass,scss}".to_string()],
            exclude: Vec::new(),
            run: vec!["styles".to_string(), "lint-styles".to_string()],
            reload: false,
        },
        WatchBinding {
            patterns: vec!["**/*.php".to_string()],
            exclude: vec![
                "node_modules/**".to_string(),
                "inc/**".to_string(),
                "css/**".to_string(),
                "js/**".to_string(),
            ],
            run: vec![
                "phpcs".to_string(),
                "validate-markup".to_string(),
                "check-accessibility".to_string(),
            ],
            reload: true,
        },
        WatchBinding {
            patterns: vec!["js/src/**/*.js".to_string()],
            exclude: Vec::new(),
            run: vec!["js".to_string()],
            reload: true,
        },
    ]
}
