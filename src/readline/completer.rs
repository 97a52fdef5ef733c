use crate::history::History;

/// Prefix completer over a prompt's answer history.
///
/// Completion follows a cycle protocol: at cycle index 0 the candidate list
/// is recomputed from the history, and later indices in the same cycle index
/// into that cached list. The editor starts a new cycle (index 0) whenever
/// the line changes.
pub struct HistoryCompleter {
    matches: Vec<String>,
}

impl HistoryCompleter {
    pub fn new() -> Self {
        Self {
            matches: Vec::new(),
        }
    }

    /// Return the candidate at `cycle`, or `None` once candidates are
    /// exhausted. A blank line offers no candidates.
    ///
    /// Candidates are the non-empty history entries with `text` as a
    /// case-sensitive prefix, shortest first and then by lowercase value;
    /// equal keys keep insertion order (the sort is stable).
    pub fn complete(&mut self, text: &str, cycle: usize, history: &History) -> Option<String> {
        if cycle == 0 {
            self.matches.clear();
            if !text.is_empty() {
                self.matches = history
                    .lines()
                    .iter()
                    .filter(|entry| !entry.is_empty() && entry.starts_with(text))
                    .cloned()
                    .collect();
                self.matches.sort_by_key(|m| (m.len(), m.to_lowercase()));
            }
        }

        self.matches.get(cycle).cloned()
    }
}
