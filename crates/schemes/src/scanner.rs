use std::collections::HashSet;

use crate::context::RunContext;
use crate::model::{DisplayCandidate, PreHandled, RawMatch};
use crate::registry::SchemeRegistry;

/// One deduplicated, pre-handled match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub pre_handled: DisplayCandidate,
    pub raw: RawMatch,
}

impl Candidate {
    /// Exact matched substring; unique within a run.
    pub fn raw_text(&self) -> &str {
        self.raw.as_str()
    }

    pub fn start_offset(&self) -> usize {
        self.raw.start()
    }

    pub fn tag(&self) -> &str {
        &self.pre_handled.tag
    }

    pub fn display_text(&self) -> &str {
        &self.pre_handled.display_text
    }
}

/// Apply every scheme to `text`, in registry order.
///
/// The first scheme that accepts a given raw substring claims it; later
/// matches of the same substring (from any scheme or pattern) are dropped.
/// A rejected match claims nothing, so a later scheme may still take it.
pub fn scan(text: &str, registry: &SchemeRegistry, ctx: &RunContext) -> Vec<Candidate> {
    let mut claimed: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for scheme in registry.schemes() {
        for pattern in scheme.patterns() {
            for raw in pattern.find_all(text) {
                if claimed.contains(raw.as_str()) {
                    continue;
                }
                let pre_handled = match scheme.pre_handle(&raw, ctx) {
                    PreHandled::Accepted(pre_handled) => pre_handled,
                    PreHandled::Rejected => continue,
                };
                if !scheme.has_tag(&pre_handled.tag) {
                    log::warn!(
                        "the tag returned dynamically '{}' is not included in: {:?}",
                        pre_handled.tag,
                        scheme.tags()
                    );
                    continue;
                }
                claimed.insert(raw.as_str().to_string());
                candidates.push(Candidate { pre_handled, raw });
            }
        }
    }

    log::debug!("{} candidates found", candidates.len());
    candidates
}
