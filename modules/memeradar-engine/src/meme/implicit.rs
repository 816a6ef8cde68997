//! Implicit scoring: how much a post *talks like* a meme push without
//! naming one. Three normalized sub-signals, fixed weights:
//!
//!   0.4 * sentiment (rescaled to [0,100])
//! + 0.4 * trend-phrase density (saturating)
//! + 0.2 * language pattern (superlatives + exclamations)
//!
//! Posts that clear the threshold with no explicit hit seed a *potential*
//! candidate keyed by their dominant trend phrase, or failing that their
//! most frequent non-stopword n-gram.

use std::collections::BTreeSet;

use memeradar_common::AnalysisConfig;

use crate::lexicon::PhraseSet;

const SENTIMENT_WEIGHT: f64 = 0.4;
const TREND_WEIGHT: f64 = 0.4;
const PATTERN_WEIGHT: f64 = 0.2;

const SUPERLATIVE_POINTS: f64 = 20.0;
const EXCLAMATION_POINTS: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct ImplicitSignal {
    pub score: f64,
    /// Distinct trend phrases found, in configuration order.
    pub trend_hits: Vec<String>,
    /// Key for an implicit-only candidate, when one can be formed.
    pub dominant_key: Option<String>,
}

pub struct ImplicitScorer {
    trend: PhraseSet,
    superlatives: PhraseSet,
    saturation: usize,
    stop_words: BTreeSet<String>,
}

impl ImplicitScorer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            trend: PhraseSet::new(&config.trend_phrases),
            superlatives: PhraseSet::new(&config.superlative_words),
            saturation: config.trend_saturation,
            stop_words: config.stop_words.clone(),
        }
    }

    /// Score one post. `sentiment` is the injected [-1, 1] signal.
    pub fn score(&self, text: &str, sentiment: f64) -> ImplicitSignal {
        let sentiment_component = (sentiment.clamp(-1.0, 1.0) + 1.0) * 50.0;

        let matches = self.trend.matches(text);
        let distinct = self.trend.distinct_hits(text);
        let trend_component =
            (distinct.len() as f64 / self.saturation as f64).min(1.0) * 100.0;

        let superlative_hits = self.superlatives.count(text) as f64;
        let exclamations = text.matches('!').count() as f64;
        let pattern_component =
            (superlative_hits * SUPERLATIVE_POINTS + exclamations * EXCLAMATION_POINTS).min(100.0);

        let score = (SENTIMENT_WEIGHT * sentiment_component
            + TREND_WEIGHT * trend_component
            + PATTERN_WEIGHT * pattern_component)
            .clamp(0.0, 100.0);

        let trend_hits: Vec<String> = distinct
            .iter()
            .map(|&id| self.trend.phrase(id).to_string())
            .collect();
        let dominant_key = self
            .dominant_phrase(&matches)
            .or_else(|| self.frequent_ngram(text));

        ImplicitSignal {
            score,
            trend_hits,
            dominant_key,
        }
    }

    /// Most frequent matched trend phrase; occurrence ties go to the
    /// phrase listed first in configuration.
    fn dominant_phrase(&self, matches: &[(usize, usize)]) -> Option<String> {
        if matches.is_empty() || self.trend.is_empty() {
            return None;
        }
        let mut counts: Vec<(usize, usize)> = Vec::new();
        for (id, _) in matches {
            match counts.iter_mut().find(|(c, _)| c == id) {
                Some((_, n)) => *n += 1,
                None => counts.push((*id, 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts.first().map(|&(id, _)| self.trend.phrase(id).to_string())
    }

    /// Fallback key: the most frequent bigram of consecutive non-stopword
    /// tokens, then the most frequent single token. First occurrence wins
    /// ties so keying stays deterministic.
    fn frequent_ngram(&self, text: &str) -> Option<String> {
        let tokens: Vec<String> = text
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| t.len() >= 2 && !t.chars().all(|c| c.is_ascii_digit()))
            .filter(|t| !self.stop_words.contains(*t))
            .map(|t| t.to_string())
            .collect();

        let mut bigrams: Vec<(String, usize)> = Vec::new();
        for window in tokens.windows(2) {
            let gram = format!("{} {}", window[0], window[1]);
            match bigrams.iter_mut().find(|(g, _)| *g == gram) {
                Some((_, n)) => *n += 1,
                None => bigrams.push((gram, 1)),
            }
        }
        let mut best: Option<(&str, usize)> = None;
        for (gram, n) in &bigrams {
            if best.map_or(true, |(_, m)| *n > m) {
                best = Some((gram, *n));
            }
        }
        if let Some((gram, _)) = best {
            return Some(gram.to_string());
        }
        tokens.first().cloned()
    }
}
