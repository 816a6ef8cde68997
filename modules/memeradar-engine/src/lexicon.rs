//! Shared phrase-list matcher used by the sentiment, implicit, and
//! category scans. Matches are case-insensitive and word-bounded, so
//! "rug" never fires inside "drug".

use aho_corasick::AhoCorasick;

pub(crate) struct PhraseSet {
    ac: AhoCorasick,
    phrases: Vec<String>,
}

impl PhraseSet {
    pub(crate) fn new(phrases: &[String]) -> Self {
        let ac = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(phrases)
            .expect("phrase list builds");
        Self {
            ac,
            phrases: phrases.to_vec(),
        }
    }

    pub(crate) fn phrase(&self, id: usize) -> &str {
        &self.phrases[id]
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// All word-bounded matches, overlapping included, as
    /// (pattern id, start offset) pairs. Overlap matters: "to the moon"
    /// and "moon" are separate hits on the same text.
    pub(crate) fn matches(&self, text: &str) -> Vec<(usize, usize)> {
        let bytes = text.as_bytes();
        self.ac
            .find_overlapping_iter(text)
            .filter(|m| word_bounded(bytes, m.start(), m.end()))
            .map(|m| (m.pattern().as_usize(), m.start()))
            .collect()
    }

    /// Distinct pattern ids hit, in pattern order.
    pub(crate) fn distinct_hits(&self, text: &str) -> Vec<usize> {
        let mut seen = vec![false; self.phrases.len()];
        for (id, _) in self.matches(text) {
            seen[id] = true;
        }
        seen.iter()
            .enumerate()
            .filter(|(_, &hit)| hit)
            .map(|(id, _)| id)
            .collect()
    }

    /// Total word-bounded occurrences across all patterns.
    pub(crate) fn count(&self, text: &str) -> usize {
        self.matches(text).len()
    }
}

fn word_bounded(bytes: &[u8], start: usize, end: usize) -> bool {
    let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
    let after_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
    before_ok && after_ok
}
