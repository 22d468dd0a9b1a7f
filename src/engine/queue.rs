// src/engine/queue.rs

use std::collections::HashMap;

/// Pending re-triggers for bindings whose sequence is still running.
///
/// Events that arrive mid-run collapse into a single rerun per binding. The
/// changed path is kept only while every queued event names the same file;
/// once two distinct paths coalesce the rerun treats the whole file-set as
/// changed.
#[derive(Debug, Default)]
pub struct PendingTriggers {
    pending: HashMap<usize, Option<String>>,
}

impl PendingTriggers {
    pub fn note(&mut self, binding: usize, path: Option<String>) {
        match self.pending.get_mut(&binding) {
            Some(existing) => {
                if *existing != path {
                    *existing = None;
                }
            }
            None => {
                self.pending.insert(binding, path);
            }
        }
    }

    /// Take the queued rerun for a binding, if any. The outer `Option` says
    /// whether a rerun is due; the inner one carries the changed path.
    pub fn take(&mut self, binding: usize) -> Option<Option<String>> {
        self.pending.remove(&binding)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesces_same_path() {
        let mut q = PendingTriggers::default();
        q.note(0, Some("sass/a.scss".into()));
        q.note(0, Some("sass/a.scss".into()));
        assert_eq!(q.take(0), Some(Some("sass/a.scss".into())));
        assert_eq!(q.take(0), None);
    }

    #[test]
    fn distinct_paths_widen_to_whole_set() {
        let mut q = PendingTriggers::default();
        q.note(1, Some("sass/a.scss".into()));
        q.note(1, Some("sass/b.scss".into()));
        assert_eq!(q.take(1), Some(None));
    }

    #[test]
    fn bindings_are_independent() {
        let mut q = PendingTriggers::default();
        q.note(0, None);
        assert_eq!(q.take(1), None);
        assert_eq!(q.take(0), Some(None));
        assert!(q.is_empty());
    }
}
