//! Explicit candidate extraction: directly-named symbols, hashtags,
//! mentions, and *coin/*token suffix words.
//!
//! The pattern list is ordered, tagged data — new sources are added by
//! extending it, not by new branches. The stoplist runs after matching,
//! so updating it never touches extraction.

use std::collections::BTreeMap;

use regex::Regex;

use memeradar_common::{AnalysisConfig, MemeCategory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitHit {
    pub key: String,
    pub category: MemeCategory,
}

pub struct ExplicitExtractor {
    patterns: Vec<(MemeCategory, Regex)>,
    stoplist: Vec<String>,
}

impl ExplicitExtractor {
    pub fn new(config: &AnalysisConfig) -> Self {
        let patterns = vec![
            // Cashtag-style symbol: leading sigil + 2-10 uppercase letters.
            (MemeCategory::Symbol, Regex::new(r"\$([A-Z]{2,10})\b").expect("symbol pattern")),
            (
                MemeCategory::Hashtag,
                Regex::new(r"#([A-Za-z][A-Za-z0-9_]{1,29})").expect("hashtag pattern"),
            ),
            (
                MemeCategory::Handle,
                Regex::new(r"@([A-Za-z0-9_]{2,30})").expect("handle pattern"),
            ),
            (
                MemeCategory::SuffixWord,
                Regex::new(r"(?i)\b([a-z][a-z0-9]*(?:coin|token))\b").expect("suffix pattern"),
            ),
        ];
        let stoplist = config
            .meme_stoplist
            .iter()
            .map(|s| s.to_lowercase())
            .collect();
        Self { patterns, stoplist }
    }

    /// Union of all pattern matches, one hit per key per post, stoplist
    /// applied last. A key found by several patterns keeps the first
    /// pattern's tag.
    pub fn extract(&self, text: &str) -> Vec<ExplicitHit> {
        let mut found: BTreeMap<String, MemeCategory> = BTreeMap::new();
        for (category, pattern) in &self.patterns {
            for capture in pattern.captures_iter(text) {
                let raw = &capture[1];
                let key = match category {
                    MemeCategory::Symbol => raw.to_string(),
                    _ => raw.to_lowercase(),
                };
                found.entry(key).or_insert(*category);
            }
        }
        found
            .into_iter()
            .filter(|(key, _)| !self.stoplist.contains(&key.to_lowercase()))
            .map(|(key, category)| ExplicitHit { key, category })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ExplicitExtractor {
        ExplicitExtractor::new(&AnalysisConfig::default())
    }

    fn keys(text: &str) -> Vec<String> {
        extractor().extract(text).into_iter().map(|h| h.key).collect()
    }

    #[test]
    fn cashtag_keeps_uppercase_symbol() {
        let hits = extractor().extract("$DOGE to the moon");
        assert_eq!(
            hits,
            vec![ExplicitHit {
                key: "DOGE".to_string(),
                category: MemeCategory::Symbol,
            }]
        );
    }

    #[test]
    fn lowercase_cashtag_is_not_a_symbol() {
        assert!(keys("$doge is not a ticker").is_empty());
    }

    #[test]
    fn symbol_length_bounds_apply() {
        assert!(keys("$A").is_empty());
        assert_eq!(keys("$AB"), vec!["AB"]);
        assert!(keys("$ABCDEFGHIJK").is_empty()); // 11 letters
    }

    #[test]
    fn hashtags_and_handles_lowercase() {
        let mut got = keys("#MoonSeason with @DegenDave");
        got.sort();
        assert_eq!(got, vec!["degendave", "moonseason"]);
    }

    #[test]
    fn suffix_words_are_extracted() {
        let mut got = keys("stacking mooncoin and frogtoken today");
        got.sort();
        assert_eq!(got, vec!["frogtoken", "mooncoin"]);
    }

    #[test]
    fn bare_coin_word_is_not_a_candidate() {
        assert!(keys("a coin and a token walk into a bar").is_empty());
    }

    #[test]
    fn duplicates_within_one_post_collapse() {
        assert_eq!(keys("$PEPE $PEPE $PEPE"), vec!["PEPE"]);
    }

    #[test]
    fn stoplist_filters_after_matching() {
        // Majors disappear; the unlisted symbol stays.
        let got = keys("$BTC and $ETH vs $DOGE");
        assert_eq!(got, vec!["DOGE"]);
    }

    #[test]
    fn multiple_patterns_union_in_one_post() {
        let hits = extractor().extract("$WIF #wifhat via @wifdeployer plus hatcoin");
        let mut got: Vec<(String, MemeCategory)> =
            hits.into_iter().map(|h| (h.key, h.category)).collect();
        got.sort();
        assert_eq!(
            got,
            vec![
                ("WIF".to_string(), MemeCategory::Symbol),
                ("hatcoin".to_string(), MemeCategory::SuffixWord),
                ("wifdeployer".to_string(), MemeCategory::Handle),
                ("wifhat".to_string(), MemeCategory::Hashtag),
            ]
        );
    }
}
