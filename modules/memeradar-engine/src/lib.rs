//! The analysis core: record normalization and dedup, KOL influence
//! scoring, two-stage meme detection, and the two-phase pipeline that
//! ties them to the graph analyzer.
//!
//! Everything here is a pure, batch-oriented transformation over an
//! in-memory snapshot. I/O belongs to the ingestion and storage
//! collaborators on the other side of [`memeradar_common::AnalysisBatch`].

pub mod kol;
mod lexicon;
pub mod meme;
pub mod normalize;
pub mod pipeline;
pub mod sentiment;
pub mod stats;

pub use pipeline::AnalysisEngine;
pub use sentiment::{LexiconSentiment, SentimentScorer};
