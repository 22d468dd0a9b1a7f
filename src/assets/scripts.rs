// src/assets/scripts.rs

//! The script bundle: concatenate a fixed, explicitly ordered list of files
//! and minify the result. Order is semantic (later files may rely on
//! globals defined by earlier ones), so the listed order is preserved
//! verbatim regardless of which file changed.

use std::fs;
use std::path::{Path, PathBuf};

use minify_js::{Session, TopLevelMode, minify};
use tracing::debug;

use crate::config::model::ScriptsSection;
use crate::errors::StepError;
use crate::files::write_artifact;

pub struct ScriptBundle {
    root: PathBuf,
    cfg: ScriptsSection,
}

impl ScriptBundle {
    pub fn new(root: impl Into<PathBuf>, cfg: ScriptsSection) -> Self {
        Self {
            root: root.into(),
            cfg,
        }
    }

    /// Build the bundle. Returns the relative href of the written artifact.
    ///
    /// A minification error (or an unreadable source) aborts only this run;
    /// the previous bundle on disk is left untouched.
    pub fn build(&self) -> Result<String, StepError> {
        let concatenated = self.concat()?;

        let session = Session::new();
        let mut minified = Vec::new();
        minify(
            &session,
            TopLevelMode::Global,
            concatenated.as_bytes(),
            &mut minified,
        )
        .map_err(|e| StepError::Minify(format!("{e:?}")))?;

        let rel = format!("{}/{}", self.cfg.dest, self.cfg.bundle);
        write_artifact(&self.root.join(&rel), &minified).map_err(|e| StepError::io(&rel, e))?;

        debug!(
            bundle = %rel,
            sources = self.cfg.sources.len(),
            bytes = minified.len(),
            "script bundle written"
        );
        Ok(rel)
    }

    /// Concatenate the sources in their listed order. A statement separator
    /// between files keeps one file's trailing expression from swallowing the
    /// next file's opening line.
    fn concat(&self) -> Result<String, StepError> {
        let mut out = String::new();
        for src in &self.cfg.sources {
            let path = self.root.join(src);
            let text = read_source(&path, src)?;
            out.push_str(&text);
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(";\n");
        }
        Ok(out)
    }
}

fn read_source(path: &Path, rel: &str) -> Result<String, StepError> {
    fs::read_to_string(path).map_err(|e| StepError::io(rel, e))
}
