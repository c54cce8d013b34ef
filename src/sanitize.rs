//! Strips provider-injected "skip sequences" from generated text.
//!
//! Some providers wrap reasoning or other commentary in marker pairs (e.g.
//! `<think>...</think>`) that must not reach the detectors. The markers are
//! literal strings, not patterns; they are escaped before being compiled
//! into a matcher so metacharacters in a marker cannot change its meaning.

use regex::Regex;

use crate::error::GeneratorError;

/// Compiled matcher for one `(start, end)` skip-sequence pair.
///
/// Built once per generator from its configuration; pruning itself is
/// infallible and never changes the number or nullness of outputs.
pub struct SkipPruner {
    start: String,
    spans: Regex,
}

impl SkipPruner {
    /// Compiles the matcher for a literal marker pair.
    ///
    /// An empty `start` models providers whose commentary block has no
    /// opening marker: everything up to and including `end` is removed.
    pub fn new(start: &str, end: &str) -> Result<Self, GeneratorError> {
        let pattern = if start.is_empty() {
            format!("(?s).*?{}", regex::escape(end))
        } else {
            format!("(?s){}.*?{}", regex::escape(start), regex::escape(end))
        };
        let spans = Regex::new(&pattern).map_err(|e| {
            GeneratorError::InvalidConfig(format!("skip sequence markers: {e}"))
        })?;
        Ok(Self {
            start: start.to_string(),
            spans,
        })
    }

    /// Prunes every non-null output in place; nulls pass through unchanged.
    pub fn prune(&self, outputs: Vec<Option<String>>) -> Vec<Option<String>> {
        outputs
            .into_iter()
            .map(|output| output.map(|text| self.prune_one(&text)))
            .collect()
    }

    fn prune_one(&self, text: &str) -> String {
        let mut pruned = self.spans.replace_all(text, "").into_owned();
        if !self.start.is_empty() {
            // A start marker with no matching end means the generation was
            // cut off mid-block; drop everything from the marker onward.
            if let Some(idx) = pruned.find(&self.start) {
                pruned.truncate(idx);
            }
        }
        pruned
    }
}
