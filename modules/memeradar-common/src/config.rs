use std::collections::BTreeSet;
use std::env;

use serde::{Deserialize, Serialize};

use crate::error::MemeRadarError;
use crate::types::KolCategory;

/// One tagged vocabulary for category matching. Adding a category is a
/// data change, not a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryVocab {
    pub category: KolCategory,
    pub terms: Vec<String>,
}

/// All tunables for one analysis run. Every field has a default and every
/// field is host-overridable; numeric knobs can also be overridden through
/// `MEMERADAR_*` environment variables.
///
/// Out-of-range values are a deployment mistake, not a data issue:
/// [`AnalysisConfig::validate`] fails the run at startup, before any batch
/// is processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Follower count that maps to a full follower sub-score.
    pub follower_norm: f64,
    /// Unique-mention count that maps to a full coverage sub-score.
    pub coverage_norm: f64,
    /// Lifetime tweet count that maps to a full activity sub-score.
    pub activity_norm: f64,
    /// Quality floor below which candidates go to the noise bucket.
    pub min_quality: f64,
    /// Implicit score a post must reach to seed an implicit-only candidate.
    pub implicit_threshold: f64,
    pub decay_half_life_hours: f64,
    /// Width of the dedup fingerprint window.
    pub dedup_window_hours: u64,
    /// Distinct trend-phrase hits that saturate the trend density signal.
    pub trend_saturation: usize,
    /// Seed for the community-detection visit-order shuffle.
    pub community_seed: u64,
    /// Authors with fewer surviving posts than this are left unranked.
    pub min_posts_analyzed: u64,
    /// Per-author cap on sampled post text kept for category matching.
    pub recent_text_sample: usize,

    /// Established assets excluded from meme candidacy, matched
    /// case-insensitively after extraction. Hand-maintained.
    pub meme_stoplist: BTreeSet<String>,
    pub trend_phrases: Vec<String>,
    pub community_phrases: Vec<String>,
    pub superlative_words: Vec<String>,
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
    /// Filler words skipped when keying implicit-only candidates.
    pub stop_words: BTreeSet<String>,
    pub category_vocab: Vec<CategoryVocab>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            follower_norm: 1_000_000.0,
            coverage_norm: 100.0,
            activity_norm: 1_000.0,
            min_quality: 20.0,
            implicit_threshold: 50.0,
            decay_half_life_hours: 72.0,
            dedup_window_hours: 1,
            trend_saturation: 5,
            community_seed: 42,
            min_posts_analyzed: 0,
            recent_text_sample: 50,
            meme_stoplist: to_set(&[
                "btc", "bitcoin", "eth", "ethereum", "usdt", "usdc", "dai", "busd", "bnb",
                "sol", "solana", "ada", "cardano", "dot", "polkadot", "link", "chainlink",
                "uni", "uniswap", "aave",
            ]),
            trend_phrases: to_vec(&[
                "to the moon",
                "moon shot",
                "moon",
                "mooning",
                "pump",
                "pumping",
                "fomo",
                "fud",
                "hodl",
                "diamond hands",
                "paper hands",
                "hidden gem",
                "undervalued",
                "next big thing",
                "blowing up",
                "viral",
                "trending",
                "rocket",
            ]),
            community_phrases: to_vec(&[
                "community",
                "holders",
                "fam",
                "family",
                "team",
                "squad",
                "gang",
                "whale",
                "early",
                "og",
                "hodl",
                "diamond hands",
            ]),
            superlative_words: to_vec(&[
                "best",
                "biggest",
                "huge",
                "massive",
                "insane",
                "incredible",
                "amazing",
                "legendary",
                "epic",
                "unreal",
            ]),
            positive_words: to_vec(&[
                "love",
                "amazing",
                "incredible",
                "fantastic",
                "brilliant",
                "genius",
                "perfect",
                "bullish",
                "gem",
            ]),
            negative_words: to_vec(&[
                "hate",
                "terrible",
                "awful",
                "horrible",
                "disaster",
                "scam",
                "rug",
                "dump",
                "bearish",
            ]),
            stop_words: to_set(&[
                "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "is",
                "are", "was", "were", "be", "been", "have", "has", "had", "this", "that",
                "these", "those", "it", "its", "they", "them", "a", "an", "my", "your", "we",
                "you", "i",
            ]),
            category_vocab: vec![
                CategoryVocab {
                    category: KolCategory::Tech,
                    terms: to_vec(&[
                        "ai",
                        "machine learning",
                        "startup",
                        "tech",
                        "innovation",
                        "software",
                        "developer",
                        "engineering",
                    ]),
                },
                CategoryVocab {
                    category: KolCategory::Finance,
                    terms: to_vec(&[
                        "trading",
                        "investment",
                        "stocks",
                        "finance",
                        "economy",
                        "markets",
                        "defi",
                    ]),
                },
                CategoryVocab {
                    category: KolCategory::Entertainment,
                    terms: to_vec(&[
                        "gaming", "art", "music", "film", "streamer", "esports", "celebrity",
                    ]),
                },
            ],
        }
    }
}

impl AnalysisConfig {
    /// Defaults with `MEMERADAR_*` numeric overrides applied, validated.
    pub fn from_env() -> Result<Self, MemeRadarError> {
        let mut cfg = Self::default();
        cfg.follower_norm = env_f64("MEMERADAR_FOLLOWER_NORM", cfg.follower_norm)?;
        cfg.coverage_norm = env_f64("MEMERADAR_COVERAGE_NORM", cfg.coverage_norm)?;
        cfg.activity_norm = env_f64("MEMERADAR_ACTIVITY_NORM", cfg.activity_norm)?;
        cfg.min_quality = env_f64("MEMERADAR_MIN_QUALITY", cfg.min_quality)?;
        cfg.implicit_threshold = env_f64("MEMERADAR_IMPLICIT_THRESHOLD", cfg.implicit_threshold)?;
        cfg.decay_half_life_hours =
            env_f64("MEMERADAR_DECAY_HALF_LIFE_HOURS", cfg.decay_half_life_hours)?;
        cfg.dedup_window_hours = env_u64("MEMERADAR_DEDUP_WINDOW_HOURS", cfg.dedup_window_hours)?;
        cfg.community_seed = env_u64("MEMERADAR_COMMUNITY_SEED", cfg.community_seed)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), MemeRadarError> {
        if self.follower_norm <= 0.0 {
            return Err(MemeRadarError::Config(format!(
                "follower_norm must be positive, got {}",
                self.follower_norm
            )));
        }
        if self.coverage_norm <= 0.0 {
            return Err(MemeRadarError::Config(format!(
                "coverage_norm must be positive, got {}",
                self.coverage_norm
            )));
        }
        if self.activity_norm <= 0.0 {
            return Err(MemeRadarError::Config(format!(
                "activity_norm must be positive, got {}",
                self.activity_norm
            )));
        }
        if !(0.0..=100.0).contains(&self.min_quality) {
            return Err(MemeRadarError::Config(format!(
                "min_quality must be in [0, 100], got {}",
                self.min_quality
            )));
        }
        if !(0.0..=100.0).contains(&self.implicit_threshold) {
            return Err(MemeRadarError::Config(format!(
                "implicit_threshold must be in [0, 100], got {}",
                self.implicit_threshold
            )));
        }
        if self.decay_half_life_hours <= 0.0 {
            return Err(MemeRadarError::Config(format!(
                "decay_half_life_hours must be positive, got {}",
                self.decay_half_life_hours
            )));
        }
        if self.dedup_window_hours == 0 {
            return Err(MemeRadarError::Config(
                "dedup_window_hours must be at least 1".to_string(),
            ));
        }
        if self.trend_saturation == 0 {
            return Err(MemeRadarError::Config(
                "trend_saturation must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_f64(key: &str, default: f64) -> Result<f64, MemeRadarError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| MemeRadarError::Config(format!("{key} must be a number, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64, MemeRadarError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| MemeRadarError::Config(format!("{key} must be an integer, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}

fn to_vec(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn to_set(words: &[&str]) -> BTreeSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}
