//! Batch runner: read a snapshot from JSON files, run one analysis pass,
//! write the report to stdout. All logic lives in the library — this
//! binary only wires config, input, and logging together.
//!
//! Usage: memeradar <posts.json> <authors.json> [edges.json]

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use memeradar_common::{AnalysisBatch, AnalysisConfig, Author, RawPost, RelationEdge};
use memeradar_engine::AnalysisEngine;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("memeradar=info".parse()?))
        .init();

    info!("Meme Radar analysis starting...");

    let mut args = std::env::args().skip(1);
    let posts_path = args.next().context("usage: memeradar <posts.json> <authors.json> [edges.json]")?;
    let authors_path = args.next().context("missing <authors.json> argument")?;
    let edges_path = args.next();

    let config = AnalysisConfig::from_env()?;
    let engine = AnalysisEngine::new(config)?;

    let posts: Vec<RawPost> = read_json(&posts_path)?;
    let authors: Vec<Author> = read_json(&authors_path)?;
    let edges: Vec<RelationEdge> = match edges_path {
        Some(path) => read_json(&path)?,
        None => Vec::new(),
    };
    info!(
        posts = posts.len(),
        authors = authors.len(),
        edges = edges.len(),
        "Batch loaded"
    );

    let batch = AnalysisBatch {
        posts,
        authors,
        edges,
    };

    // Fresh dedup index per invocation; a host embedding the engine
    // persists this set across runs instead.
    let mut seen_hashes = HashSet::new();
    let report = engine.run(&batch, &mut seen_hashes);

    serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
    println!();
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}
