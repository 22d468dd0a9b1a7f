// src/assets/format.rs

//! Style-guide reformatting of style sources.
//!
//! When a watched stylesheet changes, the changed file is rewritten in a
//! normalized form, the way the theme's style guide wants it. The formatter
//! is deliberately conservative (whitespace only) and idempotent: running it
//! on its own output changes nothing, which together with the session's
//! input-hash cache guarantees a reformat write can't loop the watcher.

/// Normalize a stylesheet source:
/// - CRLF line endings become LF
/// - trailing whitespace is stripped per line
/// - runs of blank lines collapse to a single blank line
/// - the file ends with exactly one newline
pub fn format_stylesheet(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut blank_run = 0usize;

    for line in src.replace("\r\n", "\n").split('\n') {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(trimmed);
        out.push('\n');
    }

    // Collapse the trailing blank run down to a single final newline.
    while out.ends_with("\n\n") {
        out.pop();
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::format_stylesheet;

    #[test]
    fn idempotent() {
        let src = ".a {\t\n  color: red;   \r\n}\n\n\n\n.b { color: blue; }";
        let once = format_stylesheet(src);
        assert_eq!(once, format_stylesheet(&once));
    }

    #[test]
    fn collapses_blank_runs_and_trailing_space() {
        let src = ".a {}\n\n\n\n.b {}   \n";
        assert_eq!(format_stylesheet(src), ".a {}\n\n.b {}\n");
    }
}
