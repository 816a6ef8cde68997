//! KOL influence scoring.
//!
//! Weighted linear combination over pre-clamped sub-scores:
//!
//!   follower_score   = min(follower_count / follower_norm * 100, 100)
//!   engagement_score = min(engagement_rate * 10, 100)
//!   coverage_score   = min(max(mention coverage, network reach), 100)
//!   activity_score   = min(tweet_count / activity_norm * 100, 100)
//!   base  = 0.4*follower + 0.3*engagement + 0.2*coverage + 0.1*activity
//!   final = min(base * 1.2 if verified else base, 100)
//!
//! Clamping before weighting keeps any single runaway metric inside its
//! assigned weight. The reach term substitutes for mention coverage when
//! the graph stage supplies it; scoring works without it.

use chrono::{DateTime, Utc};
use tracing::debug;

use memeradar_common::{AnalysisConfig, AuthorStats, KolCategory, KolProfile, Tier};

use crate::lexicon::PhraseSet;

const FOLLOWER_WEIGHT: f64 = 0.4;
const ENGAGEMENT_WEIGHT: f64 = 0.3;
const COVERAGE_WEIGHT: f64 = 0.2;
const ACTIVITY_WEIGHT: f64 = 0.1;
const VERIFIED_BOOST: f64 = 1.2;

pub struct KolScorer {
    follower_norm: f64,
    coverage_norm: f64,
    activity_norm: f64,
    vocab: Vec<(KolCategory, PhraseSet)>,
}

impl KolScorer {
    pub fn new(config: &AnalysisConfig) -> Self {
        let vocab = config
            .category_vocab
            .iter()
            .map(|v| (v.category, PhraseSet::new(&v.terms)))
            .collect();
        Self {
            follower_norm: config.follower_norm,
            coverage_norm: config.coverage_norm,
            activity_norm: config.activity_norm,
            vocab,
        }
    }

    /// Never fails for well-typed stats: absent or zero inputs just zero
    /// out their sub-score.
    pub fn score(&self, stats: &AuthorStats, computed_at: DateTime<Utc>) -> KolProfile {
        let influence_score = self.influence(stats);
        let tier = Tier::from_score(influence_score);
        let category = self.categorize(stats);
        debug!(
            author = stats.author.id.as_str(),
            influence = influence_score,
            %tier,
            "Author scored"
        );
        KolProfile {
            author_id: stats.author.id.clone(),
            influence_score,
            tier,
            category,
            computed_at,
        }
    }

    fn influence(&self, stats: &AuthorStats) -> f64 {
        let follower_score =
            (stats.author.follower_count as f64 / self.follower_norm * 100.0).min(100.0);
        let engagement_score = (stats.engagement_rate * 10.0).min(100.0);

        let mention_coverage = stats.unique_mentions as f64 / self.coverage_norm * 100.0;
        let reach_coverage = stats.network_reach.unwrap_or(0.0) * 100.0;
        let coverage_score = mention_coverage.max(reach_coverage).min(100.0);

        let activity_score =
            (stats.author.tweet_count as f64 / self.activity_norm * 100.0).min(100.0);

        let base = FOLLOWER_WEIGHT * follower_score
            + ENGAGEMENT_WEIGHT * engagement_score
            + COVERAGE_WEIGHT * coverage_score
            + ACTIVITY_WEIGHT * activity_score;
        let boosted = if stats.author.verified {
            base * VERIFIED_BOOST
        } else {
            base
        };
        boosted.min(100.0)
    }

    /// Keyword-bag category over description + sampled post text.
    /// Strict maximum wins; a tie between domains, or no hits at all,
    /// lands in `Other`.
    fn categorize(&self, stats: &AuthorStats) -> KolCategory {
        let mut text = stats.author.description.clone();
        for t in &stats.recent_texts {
            text.push(' ');
            text.push_str(t);
        }

        let mut best = KolCategory::Other;
        let mut best_hits = 0usize;
        let mut tied = false;
        for (category, phrases) in &self.vocab {
            let hits = phrases.count(&text);
            if hits > best_hits {
                best = *category;
                best_hits = hits;
                tied = false;
            } else if hits == best_hits && hits > 0 {
                tied = true;
            }
        }
        if best_hits == 0 || tied {
            KolCategory::Other
        } else {
            best
        }
    }
}
