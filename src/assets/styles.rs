// src/assets/styles.rs

//! The stylesheet pipeline.
//!
//! One entry file (which aggregates all partials through its own import
//! graph) is compiled twice per run:
//!
//! - compressed: compile -> vendor prefix -> minify -> px fallback, written
//!   with a `.min` suffix next to its source map;
//! - expanded: compile -> vendor prefix -> pretty print (the style-guide
//!   reformat) -> px fallback, written without the suffix.
//!
//! The px fallback step runs on the printed CSS, after the minifier: the
//! minifier collapses duplicate declarations of one property, so fallbacks
//! inserted any earlier would not survive into the artifacts.
//!
//! The two variants share the input but are independent runs: a failure in
//! one is reported without aborting the other. Compilation is delegated to
//! `grass`; prefixing, minification and printing to `lightningcss`.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use regex::Regex;
use tracing::{debug, info};

use crate::config::model::StylesSection;
use crate::errors::StepError;
use crate::files::{collect_files, write_artifact};

use super::format::format_stylesheet;

/// Parse the configured browser matrix (`ie = "11"`, `ios = "10.3"`) into
/// prefixing targets. Versions are `major[.minor]`.
pub fn parse_browser_matrix(matrix: &BTreeMap<String, String>) -> Result<Browsers, String> {
    let mut browsers = Browsers::default();

    for (name, version) in matrix {
        let v = parse_version(version)
            .map_err(|e| format!("browser '{name}' has invalid version '{version}': {e}"))?;
        match name.as_str() {
            "android" => browsers.android = Some(v),
            "chrome" => browsers.chrome = Some(v),
            "edge" => browsers.edge = Some(v),
            "firefox" => browsers.firefox = Some(v),
            "ie" => browsers.ie = Some(v),
            "ios" | "ios_saf" => browsers.ios_saf = Some(v),
            "opera" => browsers.opera = Some(v),
            "safari" => browsers.safari = Some(v),
            "samsung" => browsers.samsung = Some(v),
            other => return Err(format!("unknown browser name '{other}'")),
        }
    }

    Ok(browsers)
}

/// Versions are packed as `major << 16 | minor << 8`, so each component has
/// to fit its byte range.
fn parse_version(s: &str) -> Result<u32, String> {
    let mut parts = s.trim().splitn(2, '.');
    let major: u32 = parts
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(|_| "major version is not a number".to_string())?;
    let minor: u32 = match parts.next() {
        Some(m) => m
            .parse()
            .map_err(|_| "minor version is not a number".to_string())?,
        None => 0,
    };
    if major > 0xFFFF {
        return Err(format!("major version {major} out of range"));
    }
    if minor > 0xFF {
        return Err(format!("minor version {minor} out of range"));
    }
    Ok((major << 16) | (minor << 8))
}

/// Result of one style task invocation. The variants are independent; either
/// side can fail while the other completes.
#[derive(Debug)]
pub struct StyleBuild {
    /// Relative href of the minified bundle (e.g. `css/global.min.css`).
    pub minified: Result<String, StepError>,
    /// Relative href of the expanded bundle.
    pub expanded: Result<String, StepError>,
}

impl StyleBuild {
    /// Hrefs of the bundles that were actually written this run.
    pub fn written(&self) -> Vec<String> {
        self.minified
            .iter()
            .chain(self.expanded.iter())
            .cloned()
            .collect()
    }

    pub fn is_failure(&self) -> bool {
        self.minified.is_err() || self.expanded.is_err()
    }
}

/// The configured, reusable style pipeline.
pub struct StylePipeline {
    root: PathBuf,
    cfg: StylesSection,
    browsers: Browsers,
    rem_decl: Regex,
    rem_len: Regex,
}

impl StylePipeline {
    pub fn new(root: impl Into<PathBuf>, cfg: StylesSection) -> Result<Self> {
        let browsers = parse_browser_matrix(&cfg.browsers).map_err(|e| anyhow!(e))?;

        // Declarations whose value contains a rem length, and the lengths
        // themselves, for the legacy px fallback step. The leading `{`/`;`
        // keeps this off media-query conditions, which sit inside parens.
        let rem_decl = Regex::new(
            r"(?P<lead>[{;]\s*)(?P<prop>[-a-zA-Z]+)\s*:\s*(?P<value>[^;{}]*[\d.]rem\b[^;{}]*)",
        )
        .context("compiling rem declaration pattern")?;
        let rem_len =
            Regex::new(r"(?P<num>\d*\.?\d+)rem\b").context("compiling rem length pattern")?;

        Ok(Self {
            root: root.into(),
            cfg,
            browsers,
            rem_decl,
            rem_len,
        })
    }

    /// Run both output variants. Each failure is contained to its variant.
    pub fn build(&self) -> StyleBuild {
        StyleBuild {
            minified: self.build_minified(),
            expanded: self.build_expanded(),
        }
    }

    /// Compressed variant: compile, prefix + minify with stats, px fallback,
    /// write bundle + source map.
    fn build_minified(&self) -> Result<String, StepError> {
        let compiled = self.compile(grass::OutputStyle::Compressed)?;

        let started = Instant::now();
        let (code, map) = self.transform(&compiled, true, Some(&self.cfg.entry))?;
        let elapsed = started.elapsed();

        let efficiency = if compiled.is_empty() {
            0.0
        } else {
            (1.0 - code.len() as f64 / compiled.len() as f64) * 100.0
        };
        info!(
            "minification took {} ms, compression efficiency {:.1} %",
            elapsed.as_millis(),
            efficiency
        );

        let stem = self.cfg.bundle_stem();
        let css_rel = format!("{}/{}.min.css", self.cfg.dest, stem);
        let map_rel = format!("{}/{}.min.css.map", self.cfg.dest, stem);

        let mut code = self.pixel_fallbacks(&code);
        code.push_str(&format!("\n/*# sourceMappingURL={stem}.min.css.map */\n"));

        write_artifact(&self.root.join(&css_rel), code.as_bytes())
            .map_err(|e| StepError::io(&css_rel, e))?;
        if let Some(map) = map {
            write_artifact(&self.root.join(&map_rel), map.as_bytes())
                .map_err(|e| StepError::io(&map_rel, e))?;
        }

        Ok(css_rel)
    }

    /// Expanded variant: compile, prefix, pretty print, px fallback.
    fn build_expanded(&self) -> Result<String, StepError> {
        let compiled = self.compile(grass::OutputStyle::Expanded)?;
        let (code, _) = self.transform(&compiled, false, None)?;
        let code = self.pixel_fallbacks(&code);

        let css_rel = format!("{}/{}.css", self.cfg.dest, self.cfg.bundle_stem());
        write_artifact(&self.root.join(&css_rel), code.as_bytes())
            .map_err(|e| StepError::io(&css_rel, e))?;

        Ok(css_rel)
    }

    fn compile(&self, style: grass::OutputStyle) -> Result<String, StepError> {
        let load_paths: Vec<PathBuf> =
            self.cfg.include_paths.iter().map(|p| self.root.join(p)).collect();
        let options = grass::Options::default()
            .style(style)
            .load_paths(&load_paths);

        grass::from_path(self.root.join(&self.cfg.entry), &options)
            .map_err(|e| StepError::Compile(e.to_string()))
    }

    /// Duplicate declarations containing `rem` lengths with a px fallback so
    /// browsers without `rem` support still get a usable value. The fallback
    /// goes first; conforming browsers take the later `rem` declaration.
    /// Runs on printed CSS only, downstream of the minifier, which would
    /// otherwise strip the duplicated property.
    fn pixel_fallbacks(&self, css: &str) -> String {
        let root = self.cfg.pixel_root;
        self.rem_decl
            .replace_all(css, |caps: &regex::Captures<'_>| {
                let lead = &caps["lead"];
                let prop = &caps["prop"];
                let value = &caps["value"];
                let px_value = self.rem_len.replace_all(value, |lens: &regex::Captures<'_>| {
                    let n: f32 = lens["num"].parse().unwrap_or(0.0);
                    format_px(n * root)
                });
                format!("{lead}{prop}: {px_value}; {prop}: {value}")
            })
            .into_owned()
    }

    /// Parse, apply browser targets (vendor prefixing + compatibility-aware
    /// minification) and print, optionally emitting a source map.
    fn transform(
        &self,
        css: &str,
        minify: bool,
        map_source: Option<&str>,
    ) -> Result<(String, Option<String>), StepError> {
        let targets = Targets {
            browsers: Some(self.browsers),
            ..Targets::default()
        };

        let mut sheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| StepError::Transform(e.to_string()))?;

        sheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| if minify {
                StepError::Minify(e.to_string())
            } else {
                StepError::Transform(e.to_string())
            })?;

        let mut source_map = map_source.map(|src| {
            let mut map = SourceMap::new("/");
            map.add_source(src);
            map
        });

        let result = sheet
            .to_css(PrinterOptions {
                minify,
                targets,
                source_map: source_map.as_mut(),
                ..PrinterOptions::default()
            })
            .map_err(|e| StepError::Transform(e.to_string()))?;

        let map_json = match source_map.as_mut() {
            Some(map) => Some(
                map.to_json(None)
                    .map_err(|e| StepError::Transform(e.to_string()))?,
            ),
            None => None,
        };

        Ok((result.code, map_json))
    }

    /// Reformat changed style sources in place against the style guide.
    ///
    /// Writes only when the formatted text differs from what is on disk, so
    /// the watcher sees at most one self-caused event per genuine edit.
    /// Returns the number of files rewritten.
    pub fn reformat_sources(&self, changed: Option<&str>) -> Result<usize, StepError> {
        let files: Vec<PathBuf> = match changed {
            Some(rel) => vec![PathBuf::from(rel)],
            None => collect_files(&self.root, &self.cfg.sources, &[])
                .map_err(|e| StepError::Transform(e.to_string()))?,
        };

        let mut rewritten = 0usize;
        for rel in files {
            let path = self.root.join(&rel);
            if !path.is_file() {
                continue;
            }
            let original = fs::read_to_string(&path)
                .map_err(|e| StepError::io(rel.to_string_lossy(), e))?;
            let formatted = format_stylesheet(&original);
            if formatted != original {
                debug!(file = %rel.display(), "reformatting style source");
                fs::write(&path, &formatted)
                    .map_err(|e| StepError::io(rel.to_string_lossy(), e))?;
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }
}

/// Render a px length without a trailing `.0`.
fn format_px(px: f32) -> String {
    if (px - px.round()).abs() < f32::EPSILON {
        format!("{}px", px.round() as i64)
    } else {
        format!("{px}px")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> StylePipeline {
        StylePipeline::new(".", StylesSection::default()).unwrap()
    }

    #[test]
    fn rem_declarations_get_px_fallbacks() {
        let css = ".a{font-size:1.5rem;color:red}";
        let out = pipeline().pixel_fallbacks(css);
        assert!(out.contains("font-size: 24px"), "{out}");
        assert!(out.contains("font-size: 1.5rem"), "{out}");
        assert!(out.contains("color:red"), "{out}");
    }

    #[test]
    fn non_rem_values_untouched() {
        let css = ".a{margin:10px auto}";
        assert_eq!(pipeline().pixel_fallbacks(css), css);
    }

    #[test]
    fn version_packing() {
        assert_eq!(parse_version("11").unwrap(), 11 << 16);
        assert_eq!(parse_version("10.3").unwrap(), (10 << 16) | (3 << 8));
        assert!(parse_version("x").is_err());
    }

    #[test]
    fn out_of_range_versions_are_rejected() {
        assert!(parse_version("70000").is_err());
        assert!(parse_version("11.300").is_err());
        assert_eq!(parse_version("65535").unwrap(), 65535 << 16);
    }
}
