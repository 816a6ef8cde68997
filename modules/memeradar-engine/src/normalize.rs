//! Record canonicalization and batch deduplication.
//!
//! The fingerprint collapses near-duplicate reposts from the same author
//! inside one coarse time window, while genuinely repeated campaigns on
//! later days hash to new windows and survive. Normalization feeds the
//! hash only — the stored text keeps its original casing.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::info;
use url::Url;

use memeradar_common::{Post, RawPost};

/// Query parameters that identify a click, not a destination.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "igshid", "ref_src", "s", "t"];

#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub accepted: Vec<Post>,
    pub malformed: u64,
    pub duplicates: u64,
}

impl DedupOutcome {
    pub fn rejected(&self) -> u64 {
        self.malformed + self.duplicates
    }
}

/// Canonicalize and dedup one batch. `seen_hashes` is caller-owned and
/// mutated in place: a fingerprint is inserted if and only if its post is
/// kept in `accepted`, so persisting the set alongside the batch keeps
/// cross-run dedup exact. Malformed records are counted, never raised.
pub fn normalize_and_dedup(
    raw_posts: &[RawPost],
    seen_hashes: &mut HashSet<String>,
    window_hours: u64,
) -> DedupOutcome {
    let mut outcome = DedupOutcome::default();

    for raw in raw_posts {
        if raw.id.trim().is_empty() || raw.author_id.trim().is_empty() || raw.text.trim().is_empty()
        {
            outcome.malformed += 1;
            continue;
        }

        let normalized = normalize_text(&raw.text);
        let hash = fingerprint(&normalized, &raw.author_id, raw.created_at, window_hours);
        if seen_hashes.contains(&hash) {
            outcome.duplicates += 1;
            continue;
        }
        seen_hashes.insert(hash.clone());

        outcome.accepted.push(Post {
            id: raw.id.clone(),
            author_id: raw.author_id.clone(),
            text: raw.text.clone(),
            created_at: raw.created_at,
            tags: raw.tags.clone(),
            mentions: raw.mentions.clone(),
            engagement: raw.engagement,
            content_hash: hash,
        });
    }

    info!(
        accepted = outcome.accepted.len(),
        malformed = outcome.malformed,
        duplicates = outcome.duplicates,
        "Batch deduplicated"
    );
    outcome
}

/// Lowercase, collapse whitespace, and strip tracking query parameters
/// from any embedded URLs.
pub fn normalize_text(text: &str) -> String {
    let cleaned: Vec<String> = text
        .split_whitespace()
        .map(|token| {
            if token.starts_with("http://") || token.starts_with("https://") {
                strip_tracking_params(token)
            } else {
                token.to_string()
            }
        })
        .collect();
    cleaned.join(" ").to_lowercase()
}

fn strip_tracking_params(token: &str) -> String {
    let Ok(mut parsed) = Url::parse(token) else {
        return token.to_string();
    };
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| {
            !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&key.as_ref())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    parsed.to_string()
}

/// Hex sha-256 of the normalized text, author, and coarse time window.
pub fn fingerprint(
    normalized_text: &str,
    author_id: &str,
    created_at: chrono::DateTime<chrono::Utc>,
    window_hours: u64,
) -> String {
    let window_secs = window_hours.max(1) as i64 * 3600;
    let window = created_at.timestamp().div_euclid(window_secs);
    let mut hasher = Sha256::new();
    hasher.update(format!("{normalized_text}:{author_id}:{window}").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use memeradar_common::EngagementCounts;

    fn raw(id: &str, author: &str, text: &str, at: chrono::DateTime<Utc>) -> RawPost {
        RawPost {
            id: id.to_string(),
            author_id: author.to_string(),
            text: text.to_string(),
            created_at: at,
            tags: Default::default(),
            mentions: Default::default(),
            engagement: EngagementCounts::default(),
        }
    }

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn normalization_collapses_case_and_whitespace() {
        assert_eq!(normalize_text("  GM   Frens\n\tWAGMI "), "gm frens wagmi");
    }

    #[test]
    fn tracking_params_are_stripped() {
        let n = normalize_text("look https://example.com/a?utm_source=x&utm_medium=y&id=7 now");
        assert_eq!(n, "look https://example.com/a?id=7 now");
    }

    #[test]
    fn url_with_only_tracking_params_loses_its_query() {
        let n = normalize_text("https://example.com/a?utm_source=x&fbclid=abc");
        assert_eq!(n, "https://example.com/a");
    }

    #[test]
    fn three_identical_posts_in_one_hour_accept_one() {
        // Same author, same normalized text, all inside the same window.
        let posts = vec![
            raw("p1", "a1", "Gm frens", t0()),
            raw("p2", "a1", "gm  FRENS", t0() + Duration::minutes(10)),
            raw("p3", "a1", "GM FRENS", t0() + Duration::minutes(20)),
        ];
        let mut seen = HashSet::new();
        let outcome = normalize_and_dedup(&posts, &mut seen, 1);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.duplicates, 2);
        assert_eq!(outcome.accepted[0].id, "p1");
        // Stored text keeps its original casing.
        assert_eq!(outcome.accepted[0].text, "Gm frens");
    }

    #[test]
    fn same_text_in_a_later_window_survives() {
        let posts = vec![
            raw("p1", "a1", "daily alpha", t0()),
            raw("p2", "a1", "daily alpha", t0() + Duration::hours(3)),
        ];
        let mut seen = HashSet::new();
        let outcome = normalize_and_dedup(&posts, &mut seen, 1);
        assert_eq!(outcome.accepted.len(), 2);
    }

    #[test]
    fn same_text_from_different_authors_survives() {
        let posts = vec![
            raw("p1", "a1", "gm frens", t0()),
            raw("p2", "a2", "gm frens", t0()),
        ];
        let mut seen = HashSet::new();
        let outcome = normalize_and_dedup(&posts, &mut seen, 1);
        assert_eq!(outcome.accepted.len(), 2);
    }

    #[test]
    fn malformed_records_are_counted_not_raised() {
        let posts = vec![
            raw("", "a1", "text", t0()),
            raw("p2", "", "text", t0()),
            raw("p3", "a1", "   ", t0()),
            raw("p4", "a1", "fine", t0()),
        ];
        let mut seen = HashSet::new();
        let outcome = normalize_and_dedup(&posts, &mut seen, 1);
        assert_eq!(outcome.malformed, 3);
        assert_eq!(outcome.accepted.len(), 1);
    }

    #[test]
    fn dedup_is_idempotent_over_a_repeated_batch() {
        let batch = vec![
            raw("p1", "a1", "one", t0()),
            raw("p2", "a2", "two", t0()),
            raw("p3", "a3", "three", t0()),
        ];

        let mut seen_once = HashSet::new();
        let once = normalize_and_dedup(&batch, &mut seen_once, 1);

        let doubled: Vec<RawPost> = batch.iter().chain(batch.iter()).cloned().collect();
        let mut seen_twice = HashSet::new();
        let twice = normalize_and_dedup(&doubled, &mut seen_twice, 1);

        let ids = |posts: &[Post]| posts.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&once.accepted), ids(&twice.accepted));
        assert_eq!(twice.duplicates, 3);
        assert_eq!(seen_once, seen_twice);
    }

    #[test]
    fn fingerprint_inserted_only_for_accepted_posts() {
        let posts = vec![raw("", "a1", "broken", t0())];
        let mut seen = HashSet::new();
        normalize_and_dedup(&posts, &mut seen, 1);
        assert!(seen.is_empty());
    }

    #[test]
    fn distinct_ids_with_identical_hash_keep_the_first() {
        let posts = vec![
            raw("first", "a1", "same text", t0()),
            raw("second", "a1", "same text", t0()),
        ];
        let mut seen = HashSet::new();
        let outcome = normalize_and_dedup(&posts, &mut seen, 1);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].id, "first");
    }
}
