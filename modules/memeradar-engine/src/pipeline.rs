//! Two-phase batch orchestration.
//!
//! Phase 1 runs fully parallel over shards of the batch: normalization
//! and dedup, per-author aggregates with provisional KOL scores, and the
//! meme fold. Phase 2 runs the graph analyzer to completion as a single
//! unit, then re-scores authors with the reach signal it produced. A run
//! returns all three output collections or nothing.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::Utc;
use rayon::prelude::*;
use tracing::info;

use memeradar_common::{
    AnalysisBatch, AnalysisConfig, AnalysisReport, KolProfile, MemeRadarError, Post,
    RunDiagnostics, Tier,
};

use crate::kol::KolScorer;
use crate::meme::{quality, CandidateMap, MemeDetector};
use crate::normalize;
use crate::sentiment::{LexiconSentiment, SentimentScorer};
use crate::stats;

pub struct AnalysisEngine {
    config: AnalysisConfig,
    scorer: KolScorer,
    detector: MemeDetector,
    sentiment: Box<dyn SentimentScorer>,
}

impl AnalysisEngine {
    /// Validates configuration up front — a bad knob is a deployment
    /// mistake and fails here, before any batch is touched.
    pub fn new(config: AnalysisConfig) -> Result<Self, MemeRadarError> {
        let sentiment = Box::new(LexiconSentiment::from_config(&config));
        Self::with_sentiment(config, sentiment)
    }

    /// Same, with a host-supplied sentiment model.
    pub fn with_sentiment(
        config: AnalysisConfig,
        sentiment: Box<dyn SentimentScorer>,
    ) -> Result<Self, MemeRadarError> {
        config.validate()?;
        Ok(Self {
            scorer: KolScorer::new(&config),
            detector: MemeDetector::new(&config),
            sentiment,
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run one batch. `seen_hashes` is the caller-owned dedup index;
    /// fingerprints land in it only for accepted posts.
    pub fn run(&self, batch: &AnalysisBatch, seen_hashes: &mut HashSet<String>) -> AnalysisReport {
        let computed_at = Utc::now();

        // --- Phase 1: normalize, dedup, shardable scoring ---

        let dedup = normalize::normalize_and_dedup(
            &batch.posts,
            seen_hashes,
            self.config.dedup_window_hours,
        );

        let scored_posts: Vec<(Post, f64)> = dedup
            .accepted
            .into_par_iter()
            .map(|post| {
                let sentiment = self.sentiment.score(&post.text);
                (post, sentiment)
            })
            .collect();

        let candidates: CandidateMap = scored_posts
            .par_iter()
            .fold(CandidateMap::new, |mut map, (post, sentiment)| {
                self.detector.fold(&mut map, post, *sentiment);
                map
            })
            .reduce(CandidateMap::new, MemeDetector::merge_maps);

        let mut posts_by_author: BTreeMap<&str, Vec<&Post>> = BTreeMap::new();
        for (post, _) in &scored_posts {
            posts_by_author
                .entry(post.author_id.as_str())
                .or_default()
                .push(post);
        }

        let mut author_stats: Vec<_> = batch
            .authors
            .par_iter()
            .map(|author| {
                let posts = posts_by_author
                    .get(author.id.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                stats::collect(author, posts, self.config.recent_text_sample)
            })
            .collect();

        let provisional_t1 = author_stats
            .iter()
            .map(|s| self.scorer.score(s, computed_at))
            .filter(|p| p.tier == Tier::T1)
            .count();
        info!(
            authors = author_stats.len(),
            provisional_t1,
            candidates = candidates.len(),
            "Phase 1 complete"
        );

        // --- Phase 2: graph as one unit, then re-score with reach ---

        let author_ids: BTreeSet<String> =
            batch.authors.iter().map(|a| a.id.clone()).collect();
        let graph = memeradar_graph::analyze(&batch.edges, &author_ids, self.config.community_seed);
        let reach = memeradar_graph::network_reach(&graph.summary);

        for stats in &mut author_stats {
            stats.network_reach = reach.get(&stats.author.id).copied();
        }

        let mut kols: Vec<KolProfile> = author_stats
            .par_iter()
            .filter(|s| s.posts_analyzed >= self.config.min_posts_analyzed)
            .map(|s| self.scorer.score(s, computed_at))
            .collect();
        kols.sort_by(|a, b| {
            b.influence_score
                .total_cmp(&a.influence_score)
                .then(a.author_id.cmp(&b.author_id))
        });

        let scored = quality::score_candidates(candidates, &self.config, computed_at);

        let diagnostics = RunDiagnostics {
            malformed_posts: dedup.malformed,
            duplicate_posts: dedup.duplicates,
            noise_candidates: scored.noise.len() as u64,
            dangling_edges: graph.dangling_edges,
            eigenvector_fallback: !graph.summary.eigenvector_converged,
        };

        info!(
            kols = kols.len(),
            memes = scored.ranked.len(),
            communities = graph.summary.communities.len(),
            rejected = diagnostics.rejected_posts(),
            "Analysis run complete"
        );

        AnalysisReport {
            kols,
            memes: scored.ranked,
            graph: graph.summary,
            diagnostics,
        }
    }
}
