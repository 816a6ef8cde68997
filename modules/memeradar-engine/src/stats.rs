//! Per-author aggregates, recomputed from the post snapshot on every run.
//! Scoring is a pure function of these values — there is no incremental
//! mutation to go stale.

use std::collections::BTreeSet;

use memeradar_common::{Author, AuthorStats, Post};

/// Build the aggregate for one author from their surviving posts.
/// `sample` caps how much post text is retained for category matching.
pub fn collect(author: &Author, posts: &[&Post], sample: usize) -> AuthorStats {
    let total_engagement: u64 = posts.iter().map(|p| p.engagement.total()).sum();
    let engagement_rate = if posts.is_empty() {
        0.0
    } else {
        total_engagement as f64 / posts.len() as f64
    };

    let mentioned: BTreeSet<&String> = posts.iter().flat_map(|p| p.mentions.iter()).collect();

    let mut recent: Vec<&&Post> = posts.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    let recent_texts = recent
        .into_iter()
        .take(sample)
        .map(|p| p.text.clone())
        .collect();

    AuthorStats {
        author: author.clone(),
        engagement_rate,
        unique_mentions: mentioned.len(),
        posts_analyzed: posts.len() as u64,
        recent_texts,
        network_reach: None,
    }
}
