//! Deduplication and preview truncation for retrieved document snippets.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Character bound for citation preview text.
pub const PREVIEW_MAX_CHARS: usize = 200;

/// Marker appended to a preview that was cut at the character bound.
const TRUNCATION_MARKER: &str = "...";

/// A raw snippet as returned by the document-search capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedSnippet {
    pub content: String,
    /// Source identifier, e.g. the uploaded filename.
    pub source: String,
    /// Index of the chunk within the source document.
    pub chunk: u32,
}

/// A deduplicated, truncated reference to a document fragment.
/// Uniqueness key is `(source, chunk)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    /// Snippet content truncated to [`PREVIEW_MAX_CHARS`].
    #[serde(rename = "content")]
    pub preview: String,
    pub source: String,
    pub chunk: u32,
}

fn truncate_preview(content: &str) -> String {
    let mut preview: String = content.chars().take(PREVIEW_MAX_CHARS).collect();
    if content.chars().count() > PREVIEW_MAX_CHARS {
        preview.push_str(TRUNCATION_MARKER);
    }
    preview
}

/// Turn an ordered snippet sequence into citations, keeping only the first
/// occurrence of each `(source, chunk)` key. Order is preserved.
pub fn dedup_snippets(snippets: &[RetrievedSnippet]) -> Vec<SourceCitation> {
    let mut seen: HashSet<(String, u32)> = HashSet::new();
    let mut citations = Vec::new();

    for snippet in snippets {
        let key = (snippet.source.clone(), snippet.chunk);
        if !seen.insert(key) {
            continue;
        }
        citations.push(SourceCitation {
            preview: truncate_preview(&snippet.content),
            source: snippet.source.clone(),
            chunk: snippet.chunk,
        });
    }

    citations
}

/// Dedup an already-built citation list by the same key. Idempotent; the
/// orchestrator re-applies this when merging citations at synthesis time.
pub fn dedup_citation_list(citations: Vec<SourceCitation>) -> Vec<SourceCitation> {
    let mut seen: HashSet<(String, u32)> = HashSet::new();
    citations
        .into_iter()
        .filter(|c| seen.insert((c.source.clone(), c.chunk)))
        .collect()
}
