//! Quality scoring and ranking for accumulated candidates.
//!
//!   quality = 0.30 * mention_score
//!           + 0.25 * diversity_score
//!           + 0.20 * sentiment_score
//!           + 0.15 * community_score
//!           + 0.10 * decay_score
//!
//! Decay is a half-life on (now - first_seen): a candidate seen once long
//! ago drifts toward zero unless renewed mentions keep pulling
//! `last_seen` forward — the floor is 0, never negative.

use chrono::{DateTime, Utc};
use tracing::info;

use memeradar_common::{AnalysisConfig, DetectionType, MemeCandidate};

use super::{CandidateAccumulator, CandidateMap};

const MENTION_WEIGHT: f64 = 0.30;
const DIVERSITY_WEIGHT: f64 = 0.25;
const SENTIMENT_WEIGHT: f64 = 0.20;
const COMMUNITY_WEIGHT: f64 = 0.15;
const DECAY_WEIGHT: f64 = 0.10;

const MENTION_NORM: f64 = 100.0;
const DIVERSITY_NORM: f64 = 50.0;
const COMMUNITY_NORM: f64 = 10.0;

#[derive(Debug, Default)]
pub struct ScoredCandidates {
    /// Quality-sorted, descending; ties broken by mention count then key.
    pub ranked: Vec<MemeCandidate>,
    /// Below the quality floor. Kept for diagnostics, never ranked.
    pub noise: Vec<MemeCandidate>,
}

pub fn score_candidates(
    candidates: CandidateMap,
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> ScoredCandidates {
    let mut out = ScoredCandidates::default();

    for (_, acc) in candidates {
        let candidate = score_one(&acc, config, now);
        if candidate.quality_score >= config.min_quality {
            out.ranked.push(candidate);
        } else {
            out.noise.push(candidate);
        }
    }

    let by_rank = |a: &MemeCandidate, b: &MemeCandidate| {
        b.quality_score
            .total_cmp(&a.quality_score)
            .then(b.mention_count.cmp(&a.mention_count))
            .then(a.key.cmp(&b.key))
    };
    out.ranked.sort_by(by_rank);
    out.noise.sort_by(by_rank);

    info!(
        ranked = out.ranked.len(),
        noise = out.noise.len(),
        "Meme candidates scored"
    );
    out
}

fn score_one(
    acc: &CandidateAccumulator,
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> MemeCandidate {
    let mention_score = (acc.mention_count as f64 / MENTION_NORM * 100.0).min(100.0);
    let diversity_score = (acc.users.len() as f64 / DIVERSITY_NORM * 100.0).min(100.0);
    let sentiment_score = (acc.avg_sentiment() + 1.0) * 50.0;
    let community_score = (acc.community_signals as f64 / COMMUNITY_NORM * 100.0).min(100.0);
    let decay_score = time_decay(acc.first_seen, now, config.decay_half_life_hours);

    let quality = (MENTION_WEIGHT * mention_score
        + DIVERSITY_WEIGHT * diversity_score
        + SENTIMENT_WEIGHT * sentiment_score
        + COMMUNITY_WEIGHT * community_score
        + DECAY_WEIGHT * decay_score)
        .clamp(0.0, 100.0);

    let detection_type = match (acc.explicit_hits > 0, acc.implicit_hits > 0) {
        (true, true) => DetectionType::Both,
        (true, false) => DetectionType::Explicit,
        (false, _) => DetectionType::Implicit,
    };

    MemeCandidate {
        key: acc.key.clone(),
        category: acc.category,
        mention_count: acc.mention_count,
        unique_user_count: acc.users.len() as u64,
        sentiment_score: acc.avg_sentiment(),
        explicit_hits: acc.explicit_hits,
        implicit_score: acc.implicit_score.clamp(0.0, 100.0),
        quality_score: quality,
        detection_type,
        first_seen: acc.first_seen,
        last_seen: acc.last_seen,
    }
}

/// 100 at birth, halved every `half_life_hours`, monotonically
/// non-increasing in age. Future timestamps clamp to full freshness.
fn time_decay(first_seen: DateTime<Utc>, now: DateTime<Utc>, half_life_hours: f64) -> f64 {
    let age_hours = (now - first_seen).num_seconds() as f64 / 3600.0;
    if age_hours <= 0.0 {
        return 100.0;
    }
    100.0 * 0.5_f64.powf(age_hours / half_life_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use memeradar_common::MemeCategory;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn acc(key: &str, mentions: u64, users: usize, age_hours: i64) -> CandidateAccumulator {
        CandidateAccumulator {
            key: key.to_string(),
            category: MemeCategory::Symbol,
            mention_count: mentions,
            users: (0..users).map(|i| format!("u{i}")).collect(),
            sentiment_sum: 0.0,
            sentiment_posts: mentions,
            explicit_hits: mentions,
            implicit_hits: 0,
            implicit_score: 0.0,
            community_signals: 0,
            first_seen: now() - Duration::hours(age_hours),
            last_seen: now(),
        }
    }

    fn map_of(accs: Vec<CandidateAccumulator>) -> CandidateMap {
        accs.into_iter().map(|a| (a.key.clone(), a)).collect()
    }

    #[test]
    fn fresh_maxed_candidate_scores_near_100() {
        let mut a = acc("MAX", 100, 50, 0);
        a.sentiment_sum = a.sentiment_posts as f64; // all-positive posts
        a.community_signals = 10;
        let scored = score_candidates(map_of(vec![a]), &AnalysisConfig::default(), now());
        let q = scored.ranked[0].quality_score;
        assert!((q - 100.0).abs() < 1e-9, "got {q}");
    }

    #[test]
    fn quality_is_always_in_bounds() {
        let cases = vec![acc("A", 0, 0, 0), acc("B", 10_000, 10_000, 0), acc("C", 1, 1, 100_000)];
        let scored = score_candidates(map_of(cases), &AnalysisConfig::default(), now());
        for c in scored.ranked.iter().chain(scored.noise.iter()) {
            assert!((0.0..=100.0).contains(&c.quality_score));
            assert!((-1.0..=1.0).contains(&c.sentiment_score));
        }
    }

    #[test]
    fn decay_halves_at_half_life() {
        let fresh = time_decay(now(), now(), 72.0);
        let half = time_decay(now() - Duration::hours(72), now(), 72.0);
        let quarter = time_decay(now() - Duration::hours(144), now(), 72.0);
        assert_eq!(fresh, 100.0);
        assert!((half - 50.0).abs() < 1e-9);
        assert!((quarter - 25.0).abs() < 1e-9);
    }

    #[test]
    fn decay_never_goes_below_zero() {
        let ancient = time_decay(now() - Duration::days(3650), now(), 72.0);
        assert!(ancient >= 0.0);
        assert!(ancient < 1e-6);
    }

    #[test]
    fn low_quality_goes_to_noise_with_count_intact() {
        let scored = score_candidates(
            map_of(vec![acc("DUST", 1, 1, 10_000)]),
            &AnalysisConfig::default(),
            now(),
        );
        assert!(scored.ranked.is_empty());
        assert_eq!(scored.noise.len(), 1);
        assert_eq!(scored.noise[0].key, "DUST");
    }

    #[test]
    fn ranking_breaks_ties_by_mentions_then_key() {
        // Same quality inputs except mentions; then two identical shapes
        // differing only in key.
        let a = acc("BBB", 40, 20, 0);
        let b = acc("AAA", 40, 20, 0);
        let c = acc("CCC", 60, 20, 0);
        let scored = score_candidates(map_of(vec![a, b, c]), &AnalysisConfig::default(), now());
        let keys: Vec<&str> = scored.ranked.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["CCC", "AAA", "BBB"]);
    }

    #[test]
    fn renewed_candidates_keep_first_seen_decay() {
        // first_seen anchors decay even when last_seen is fresh.
        let aged = acc("OLD", 10, 5, 720);
        let scored = score_candidates(map_of(vec![aged]), &AnalysisConfig::default(), now());
        let c = scored
            .ranked
            .iter()
            .chain(scored.noise.iter())
            .next()
            .unwrap();
        assert_eq!(c.last_seen, now());
        assert!(c.first_seen < c.last_seen);
    }
}
