use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Ingested records ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub likes: u64,
    pub reposts: u64,
    pub replies: u64,
}

impl EngagementCounts {
    pub fn total(&self) -> u64 {
        self.likes + self.reposts + self.replies
    }
}

/// A post as handed over by the ingestion collaborator, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub mentions: BTreeSet<String>,
    #[serde(default)]
    pub engagement: EngagementCounts,
}

/// A validated, immutable post. Identity is `id`; `content_hash` is the
/// dedup key only — two distinct ids with the same hash are duplicates of
/// whichever was seen first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub tags: BTreeSet<String>,
    pub mentions: BTreeSet<String>,
    pub engagement: EngagementCounts,
    pub content_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub handle: String,
    pub follower_count: u64,
    pub verified: bool,
    pub tweet_count: u64,
    #[serde(default)]
    pub description: String,
}

// --- Derived author aggregates ---

/// Per-author aggregate recomputed from the post snapshot on every run.
/// Nothing here is stored or incrementally mutated.
#[derive(Debug, Clone)]
pub struct AuthorStats {
    pub author: Author,
    /// Mean engagement per analyzed post.
    pub engagement_rate: f64,
    /// Distinct accounts this author mentioned across the batch.
    pub unique_mentions: usize,
    /// Posts from this author that survived dedup this batch.
    pub posts_analyzed: u64,
    /// Sampled post text, used for category vocabulary matching.
    pub recent_texts: Vec<String>,
    /// Betweenness-derived reach from the graph analyzer, when available.
    pub network_reach: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    T1,
    T2,
    T3,
    T4,
}

impl Tier {
    /// Band boundaries evaluated high-to-low, first match wins.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Tier::T1
        } else if score >= 60.0 {
            Tier::T2
        } else if score >= 40.0 {
            Tier::T3
        } else {
            Tier::T4
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::T1 => write!(f, "T1"),
            Tier::T2 => write!(f, "T2"),
            Tier::T3 => write!(f, "T3"),
            Tier::T4 => write!(f, "T4"),
        }
    }
}

/// Advisory domain label. Downstream consumers must not treat this as
/// authoritative — it comes from keyword-bag matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KolCategory {
    Tech,
    Finance,
    Entertainment,
    Other,
}

impl std::fmt::Display for KolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KolCategory::Tech => write!(f, "tech"),
            KolCategory::Finance => write!(f, "finance"),
            KolCategory::Entertainment => write!(f, "entertainment"),
            KolCategory::Other => write!(f, "other"),
        }
    }
}

/// Fully recomputable influence record. Never edited independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KolProfile {
    pub author_id: String,
    pub influence_score: f64,
    pub tier: Tier,
    pub category: KolCategory,
    pub computed_at: DateTime<Utc>,
}

// --- Meme candidates ---

/// Lexical source of a candidate key. Patterns are configuration-tagged,
/// so new sources are additive data rather than new code branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemeCategory {
    /// Cashtag-style symbol ($DOGE).
    Symbol,
    Hashtag,
    /// @-mention of a project account.
    Handle,
    /// *coin / *token suffix word.
    SuffixWord,
    /// Implicit-only candidate keyed by a trend phrase or n-gram.
    Phrase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionType {
    Explicit,
    Implicit,
    Both,
}

/// One candidate per normalized key. Counts only grow as posts are folded
/// in during a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemeCandidate {
    pub key: String,
    pub category: MemeCategory,
    pub mention_count: u64,
    pub unique_user_count: u64,
    /// Mean sentiment of referencing posts, in [-1, 1].
    pub sentiment_score: f64,
    pub explicit_hits: u64,
    pub implicit_score: f64,
    pub quality_score: f64,
    pub detection_type: DetectionType,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

// --- Graph records ---

/// One follow/mention relation, pre-flattened by the ingestion collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationEdge {
    pub src: String,
    pub dst: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityRecord {
    pub author_id: String,
    pub degree: f64,
    /// None for nodes outside the largest weakly-connected component —
    /// undefined is not the same as measured-and-minimal.
    pub closeness: Option<f64>,
    pub betweenness: f64,
    pub eigenvector: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: usize,
    pub member_ids: BTreeSet<String>,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    pub centrality: BTreeMap<String, CentralityRecord>,
    pub communities: Vec<Community>,
    pub modularity: f64,
    pub eigenvector_converged: bool,
}

impl GraphSummary {
    pub fn empty() -> Self {
        Self {
            centrality: BTreeMap::new(),
            communities: Vec::new(),
            modularity: 0.0,
            eigenvector_converged: true,
        }
    }
}

// --- Run output ---

/// Data-quality issues recovered during a run. These are counters, not
/// errors: a rejected record or an unreachable node never fails the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub malformed_posts: u64,
    pub duplicate_posts: u64,
    /// Candidates below the quality floor, kept out of the ranked list.
    pub noise_candidates: u64,
    pub dangling_edges: u64,
    pub eigenvector_fallback: bool,
}

impl RunDiagnostics {
    pub fn rejected_posts(&self) -> u64 {
        self.malformed_posts + self.duplicate_posts
    }
}

/// Input snapshot for one analysis run. The core never reaches back to the
/// collaborators — everything it needs is in here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisBatch {
    pub posts: Vec<RawPost>,
    pub authors: Vec<Author>,
    #[serde(default)]
    pub edges: Vec<RelationEdge>,
}

/// The three output collections plus diagnostics. A run yields this whole
/// or nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub kols: Vec<KolProfile>,
    pub memes: Vec<MemeCandidate>,
    pub graph: GraphSummary,
    pub diagnostics: RunDiagnostics,
}
