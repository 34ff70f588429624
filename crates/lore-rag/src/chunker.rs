//! Paragraph chunking
//!
//! Documents are split on blank lines into paragraphs. An optional overlap
//! ratio adds a bridging chunk between neighbouring paragraphs, built from
//! the tail of one and the head of the next. Chunks are deduplicated while
//! keeping first-occurrence order.

use lore_core::{LoreError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Output of chunking a single document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedDocument {
    /// Number of non-empty paragraphs in the source
    pub paragraphs: usize,
    /// Unique, non-empty chunks in document order
    pub chunks: Vec<String>,
}

fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").expect("paragraph break pattern is valid"))
}

/// Overlap ratio must lie in [0, 1)
pub fn validate_overlap_ratio(ratio: f64) -> Result<f64> {
    if ratio.is_nan() || !(0.0..1.0).contains(&ratio) {
        return Err(LoreError::Validation(format!(
            "overlap_ratio must be in [0, 1), got {ratio}"
        )));
    }
    Ok(ratio)
}

/// Split on runs of two or more newlines, trimming and dropping empty paragraphs
pub fn split_paragraphs(content: &str) -> Vec<String> {
    let normalized = content.replace("\r\n", "\n");
    paragraph_break()
        .split(&normalized)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Last ⌊ratio·n⌋ words of `current` followed by the first ⌊ratio·m⌋ words of `next`
pub fn overlap_chunk(current: &str, next: &str, ratio: f64) -> String {
    let tail_words: Vec<&str> = current.split_whitespace().collect();
    let head_words: Vec<&str> = next.split_whitespace().collect();

    let tail_len = word_share(tail_words.len(), ratio);
    let head_len = word_share(head_words.len(), ratio);

    tail_words[tail_words.len() - tail_len..]
        .iter()
        .chain(&head_words[..head_len])
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn word_share(len: usize, ratio: f64) -> usize {
    ((len as f64 * ratio).floor() as usize).min(len)
}

/// Paragraph chunks interleaved with overlap chunks when `ratio > 0`
pub fn build_chunks(paragraphs: &[String], ratio: f64) -> Vec<String> {
    let mut chunks = Vec::with_capacity(paragraphs.len() * 2);

    for (i, para) in paragraphs.iter().enumerate() {
        chunks.push(para.clone());
        if ratio > 0.0 {
            if let Some(next) = paragraphs.get(i + 1) {
                chunks.push(overlap_chunk(para, next, ratio));
            }
        }
    }

    chunks
}

/// Trim, drop empties and remove duplicates, keeping first occurrences in order
pub fn unique_preserve<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Full chunking pass over one document
pub fn chunk_document(content: &str, overlap_ratio: f64) -> Result<ChunkedDocument> {
    let ratio = validate_overlap_ratio(overlap_ratio)?;
    let paragraphs = split_paragraphs(content);
    let chunks = unique_preserve(build_chunks(&paragraphs, ratio));

    Ok(ChunkedDocument {
        paragraphs: paragraphs.len(),
        chunks,
    })
}
