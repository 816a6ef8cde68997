//! Two-stage meme detection: explicit extraction and implicit scoring,
//! merged into per-key accumulators and quality-ranked.
//!
//! Accumulation is a pure fold with an explicit commutative merge, so the
//! batch can be sharded arbitrarily and folded in any order — the
//! accumulator for a key only ever grows by sums, unions, min(first_seen)
//! and max(last_seen).

pub mod explicit;
pub mod implicit;
pub mod quality;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use memeradar_common::{AnalysisConfig, MemeCategory, Post};

use crate::lexicon::PhraseSet;

pub use explicit::{ExplicitExtractor, ExplicitHit};
pub use implicit::{ImplicitScorer, ImplicitSignal};
pub use quality::ScoredCandidates;

/// Keyed by candidate key; BTreeMap keeps fold output deterministic.
pub type CandidateMap = BTreeMap<String, CandidateAccumulator>;

#[derive(Debug, Clone)]
pub struct CandidateAccumulator {
    pub key: String,
    pub category: MemeCategory,
    pub mention_count: u64,
    pub users: std::collections::BTreeSet<String>,
    pub sentiment_sum: f64,
    pub sentiment_posts: u64,
    pub explicit_hits: u64,
    pub implicit_hits: u64,
    /// Strongest implicit score seen for this key.
    pub implicit_score: f64,
    pub community_signals: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl CandidateAccumulator {
    fn seed(key: &str, category: MemeCategory, at: DateTime<Utc>) -> Self {
        Self {
            key: key.to_string(),
            category,
            mention_count: 0,
            users: Default::default(),
            sentiment_sum: 0.0,
            sentiment_posts: 0,
            explicit_hits: 0,
            implicit_hits: 0,
            implicit_score: 0.0,
            community_signals: 0,
            first_seen: at,
            last_seen: at,
        }
    }

    /// Fold `other` into `self`. Commutative and associative, so shard
    /// order never changes the result.
    pub fn merge(&mut self, other: &CandidateAccumulator) {
        self.mention_count += other.mention_count;
        self.users.extend(other.users.iter().cloned());
        self.sentiment_sum += other.sentiment_sum;
        self.sentiment_posts += other.sentiment_posts;
        self.explicit_hits += other.explicit_hits;
        self.implicit_hits += other.implicit_hits;
        self.implicit_score = self.implicit_score.max(other.implicit_score);
        self.community_signals += other.community_signals;
        self.first_seen = self.first_seen.min(other.first_seen);
        self.last_seen = self.last_seen.max(other.last_seen);
    }

    pub fn avg_sentiment(&self) -> f64 {
        if self.sentiment_posts == 0 {
            0.0
        } else {
            (self.sentiment_sum / self.sentiment_posts as f64).clamp(-1.0, 1.0)
        }
    }
}

pub struct MemeDetector {
    explicit: ExplicitExtractor,
    implicit: ImplicitScorer,
    community: PhraseSet,
    implicit_threshold: f64,
}

impl MemeDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            explicit: ExplicitExtractor::new(config),
            implicit: ImplicitScorer::new(config),
            community: PhraseSet::new(&config.community_phrases),
            implicit_threshold: config.implicit_threshold,
        }
    }

    /// Fold one post into the candidate map. `sentiment` is the injected
    /// [-1, 1] score for this post's text.
    pub fn fold(&self, candidates: &mut CandidateMap, post: &Post, sentiment: f64) {
        let hits = self.explicit.extract(&post.text);
        let signal = self.implicit.score(&post.text, sentiment);
        let community_hit = self.community.count(&post.text) > 0;

        if !hits.is_empty() {
            // Implicit language in an explicitly-named post attaches to
            // the named candidates rather than seeding a phrase key.
            let implied = !signal.trend_hits.is_empty();
            for hit in hits {
                let acc = candidates
                    .entry(hit.key.clone())
                    .or_insert_with(|| CandidateAccumulator::seed(&hit.key, hit.category, post.created_at));
                touch(acc, post, sentiment, community_hit);
                acc.explicit_hits += 1;
                if implied {
                    acc.implicit_hits += 1;
                    acc.implicit_score = acc.implicit_score.max(signal.score);
                }
            }
            return;
        }

        // No explicit hit: only a convincingly implicit post seeds a
        // potential candidate.
        if signal.score >= self.implicit_threshold {
            if let Some(key) = signal.dominant_key.as_deref() {
                let acc = candidates
                    .entry(key.to_string())
                    .or_insert_with(|| CandidateAccumulator::seed(key, MemeCategory::Phrase, post.created_at));
                touch(acc, post, sentiment, community_hit);
                acc.implicit_hits += 1;
                acc.implicit_score = acc.implicit_score.max(signal.score);
            }
        }
    }

    /// Merge two shard maps; used as the rayon reduce step.
    pub fn merge_maps(mut left: CandidateMap, right: CandidateMap) -> CandidateMap {
        for (key, acc) in right {
            match left.get_mut(&key) {
                Some(existing) => existing.merge(&acc),
                None => {
                    left.insert(key, acc);
                }
            }
        }
        left
    }
}

fn touch(acc: &mut CandidateAccumulator, post: &Post, sentiment: f64, community_hit: bool) {
    acc.mention_count += 1;
    acc.users.insert(post.author_id.clone());
    acc.sentiment_sum += sentiment;
    acc.sentiment_posts += 1;
    if community_hit {
        acc.community_signals += 1;
    }
    acc.first_seen = acc.first_seen.min(post.created_at);
    acc.last_seen = acc.last_seen.max(post.created_at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use memeradar_common::{DetectionType, EngagementCounts};

    fn post(id: &str, author: &str, text: &str, hour: u32) -> Post {
        Post {
            id: id.to_string(),
            author_id: author.to_string(),
            text: text.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, hour, 0, 0).unwrap(),
            tags: Default::default(),
            mentions: Default::default(),
            engagement: EngagementCounts::default(),
            content_hash: id.to_string(),
        }
    }

    fn detector() -> MemeDetector {
        MemeDetector::new(&AnalysisConfig::default())
    }

    #[test]
    fn doge_moon_post_detects_as_both() {
        let d = detector();
        let mut map = CandidateMap::new();
        d.fold(
            &mut map,
            &post("p1", "a1", "$DOGE to the moon! \u{1F680}", 12),
            0.0,
        );

        let acc = &map["DOGE"];
        assert_eq!(acc.explicit_hits, 1);
        assert_eq!(acc.implicit_hits, 1);
        assert_eq!(acc.category, MemeCategory::Symbol);

        let scored =
            quality::score_candidates(map, &AnalysisConfig::default(), Utc::now());
        let candidate = scored
            .ranked
            .iter()
            .chain(scored.noise.iter())
            .find(|c| c.key == "DOGE")
            .expect("DOGE candidate");
        assert_eq!(candidate.detection_type, DetectionType::Both);
    }

    #[test]
    fn stoplisted_symbol_never_enters_the_map() {
        let d = detector();
        let mut map = CandidateMap::new();
        d.fold(&mut map, &post("p1", "a1", "$BTC breaking out", 12), 0.0);
        assert!(map.is_empty());
    }

    #[test]
    fn implicit_only_post_keys_by_dominant_phrase() {
        let d = detector();
        let mut map = CandidateMap::new();
        // Heavy trend language, no explicit name anywhere.
        let text = "huge pump incoming! hodl! fomo is real, moon soon!";
        d.fold(&mut map, &post("p1", "a1", text, 12), 0.8);
        assert_eq!(map.len(), 1);
        let acc = map.values().next().unwrap();
        assert_eq!(acc.category, MemeCategory::Phrase);
        assert_eq!(acc.explicit_hits, 0);
        assert_eq!(acc.implicit_hits, 1);
    }

    #[test]
    fn weak_implicit_post_contributes_nothing() {
        let d = detector();
        let mut map = CandidateMap::new();
        d.fold(&mut map, &post("p1", "a1", "had soup for dinner", 12), 0.0);
        assert!(map.is_empty());
    }

    #[test]
    fn counts_are_monotonic_as_posts_fold_in() {
        let d = detector();
        let mut map = CandidateMap::new();
        let mut last = 0;
        for i in 0..4 {
            d.fold(
                &mut map,
                &post(&format!("p{i}"), &format!("a{i}"), "$PEPE wins", 12),
                0.0,
            );
            let count = map["PEPE"].mention_count;
            assert!(count > last);
            last = count;
        }
        assert_eq!(map["PEPE"].users.len(), 4);
    }

    #[test]
    fn fold_order_does_not_change_the_merge() {
        let d = detector();
        let posts = vec![
            post("p1", "a1", "$PEPE pumping hard!", 10),
            post("p2", "a2", "$PEPE community is strong", 11),
            post("p3", "a3", "huge pump! fomo! moon! hodl!", 12),
            post("p4", "a1", "$WIF flipping $PEPE", 13),
        ];

        let mut forward = CandidateMap::new();
        for p in &posts {
            d.fold(&mut forward, p, 0.5);
        }

        let mut backward = CandidateMap::new();
        for p in posts.iter().rev() {
            d.fold(&mut backward, p, 0.5);
        }

        // Shard into two halves and merge, as rayon would.
        let mut left = CandidateMap::new();
        let mut right = CandidateMap::new();
        for p in &posts[..2] {
            d.fold(&mut left, p, 0.5);
        }
        for p in &posts[2..] {
            d.fold(&mut right, p, 0.5);
        }
        let sharded = MemeDetector::merge_maps(left, right);

        for (a, b) in [(&forward, &backward), (&forward, &sharded)] {
            assert_eq!(a.len(), b.len());
            for (key, acc) in a.iter() {
                let other = &b[key];
                assert_eq!(acc.mention_count, other.mention_count);
                assert_eq!(acc.users, other.users);
                assert_eq!(acc.explicit_hits, other.explicit_hits);
                assert_eq!(acc.implicit_hits, other.implicit_hits);
                assert_eq!(acc.first_seen, other.first_seen);
                assert_eq!(acc.last_seen, other.last_seen);
            }
        }
    }
}
