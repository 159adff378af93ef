use crate::colors::Colors;
use crate::scanner::Candidate;

/// Candidates ordered bottom-of-buffer first, addressed by 1-based position.
#[derive(Clone, Debug, Default)]
pub struct CandidateIndex {
    candidates: Vec<Candidate>,
    tag_width: usize,
}

impl CandidateIndex {
    /// Sort by start offset, descending. The sort is stable, so candidates
    /// at the same offset keep their discovery order.
    pub fn new(mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| b.start_offset().cmp(&a.start_offset()));
        let tag_width = candidates
            .iter()
            .map(|c| c.tag().chars().count())
            .max()
            .unwrap_or(0);
        Self {
            candidates,
            tag_width,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate at 1-based `position`.
    pub fn get(&self, position: usize) -> Option<&Candidate> {
        position
            .checked_sub(1)
            .and_then(|idx| self.candidates.get(idx))
    }

    /// `(position, candidate)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Candidate)> {
        self.candidates.iter().enumerate().map(|(idx, c)| (idx + 1, c))
    }

    /// Widest tag in the set, without brackets.
    pub fn tag_width(&self) -> usize {
        self.tag_width
    }

    /// One display line per candidate:
    /// `<index:4> - [<tag>]<pad> - <display text>`.
    pub fn render(&self, colors: &Colors) -> Vec<String> {
        let index_color = colors.index_color();
        let tag_color = colors.tag_color();
        let dash_color = colors.dash_color();
        let reset = colors.reset();
        let width = self.tag_width + 2;

        self.iter()
            .map(|(position, candidate)| {
                let tag = format!("[{}]", candidate.tag());
                format!(
                    "{index_color}{position:4}{reset} {dash_color}-{reset} \
                     {tag_color}{tag:<width$}{reset} {dash_color}-{reset} {}",
                    candidate.display_text()
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DisplayCandidate, RawMatch};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn candidate(text: &str, start: usize, tag: &str) -> Candidate {
        Candidate {
            pre_handled: DisplayCandidate {
                display_text: text.to_string(),
                tag: tag.to_string(),
            },
            raw: RawMatch::new(start, vec![Some(text.to_string())], HashMap::new()),
        }
    }

    #[test]
    fn orders_by_offset_descending_and_keeps_ties_stable() {
        let index = CandidateIndex::new(vec![
            candidate("a", 3, "file"),
            candidate("b", 10, "url"),
            candidate("c", 3, "git"),
        ]);

        let order: Vec<_> = index.iter().map(|(pos, c)| (pos, c.raw_text())).collect();
        assert_eq!(order, vec![(1, "b"), (2, "a"), (3, "c")]);
        assert_eq!(index.get(0), None);
        assert_eq!(index.get(2).map(Candidate::raw_text), Some("a"));
        assert_eq!(index.get(4), None);
    }

    #[test]
    fn renders_aligned_lines() {
        let index = CandidateIndex::new(vec![
            candidate("/etc/hosts", 0, "file"),
            candidate("https://x.io", 20, "url"),
        ]);

        assert_eq!(
            index.render(&Colors::default()),
            vec![
                "   1 - [url]  - https://x.io".to_string(),
                "   2 - [file] - /etc/hosts".to_string(),
            ]
        );
    }
}
