//! Similarity index contract and the default lexical implementation.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use tutorgraph_shared::{Document, DocumentMetadata, Result, RetrievalResult};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A searchable document store.
///
/// Implementations own similarity scoring. `search` returns at most `k`
/// results with `similarity` in `[0, 1]`, most relevant first, and an empty
/// list when nothing clears the index's own relevance bar.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Index one passage.
    async fn add_document(&mut self, text: String, metadata: DocumentMetadata) -> Result<()>;

    /// Rank indexed documents against `query`.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>>;

    /// Number of indexed documents.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// LexicalIndex
// ---------------------------------------------------------------------------

/// In-memory index scoring documents by cosine similarity of term frequencies.
///
/// Term weights are non-negative, so similarity always falls in `[0, 1]`.
#[derive(Debug, Default)]
pub struct LexicalIndex {
    entries: Vec<IndexedDocument>,
    min_similarity: f32,
}

#[derive(Debug)]
struct IndexedDocument {
    document: Document,
    terms: HashMap<String, f32>,
    norm: f32,
}

impl LexicalIndex {
    /// Create an empty index that drops results scoring below `min_similarity`.
    pub fn new(min_similarity: f32) -> Self {
        Self {
            entries: Vec::new(),
            min_similarity: min_similarity.clamp(0.0, 1.0),
        }
    }

    fn score(&self, query_terms: &HashMap<String, f32>, query_norm: f32, entry: &IndexedDocument) -> f32 {
        if entry.norm == 0.0 {
            return 0.0;
        }
        let dot: f32 = query_terms
            .iter()
            .filter_map(|(term, weight)| entry.terms.get(term).map(|w| w * weight))
            .sum();
        (dot / (query_norm * entry.norm)).clamp(0.0, 1.0)
    }
}

#[async_trait]
impl SimilarityIndex for LexicalIndex {
    async fn add_document(&mut self, text: String, metadata: DocumentMetadata) -> Result<()> {
        let (terms, norm) = term_vector(&text);
        let id = format!("doc-{}", self.entries.len() + 1);
        debug!(%id, terms = terms.len(), "document indexed");
        self.entries.push(IndexedDocument {
            document: Document { id, text, metadata },
            terms,
            norm,
        });
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        let (query_terms, query_norm) = term_vector(query);
        if query_norm == 0.0 || self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<RetrievalResult> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let similarity = self.score(&query_terms, query_norm, entry);
                (similarity > 0.0 && similarity >= self.min_similarity).then(|| RetrievalResult {
                    document: entry.document.clone(),
                    similarity,
                })
            })
            .collect();

        // Stable: equal scores keep insertion order.
        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(k);
        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// Tokenization
// ---------------------------------------------------------------------------

/// Function words that carry no topic and would otherwise match every passage.
const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from",
    "how", "i", "in", "into", "is", "it", "its", "my", "of", "on", "or", "should", "so", "that",
    "the", "their", "this", "to", "was", "what", "when", "where", "which", "who", "why", "with",
    "you", "your",
];

/// Split text into lowercase terms.
///
/// Words are runs of letters and digits; English stop words are dropped.
/// Runs of CJK characters, which carry no spaces, are split into overlapping
/// character bigrams.
pub fn tokenize(text: &str) -> Vec<String> {
    static WORD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid regex"));

    let mut terms = Vec::new();
    for word in WORD_RE.find_iter(text) {
        let word = word.as_str().to_lowercase();
        let chars: Vec<char> = word.chars().collect();
        if chars.iter().any(|c| is_cjk(*c)) && chars.len() > 2 {
            terms.extend(chars.windows(2).map(|pair| pair.iter().collect::<String>()));
        } else if !STOP_WORDS.contains(&word.as_str()) {
            terms.push(word);
        }
    }
    terms
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF   // hiragana, katakana
        | 0x3400..=0x4DBF // CJK extension A
        | 0x4E00..=0x9FFF // CJK unified ideographs
        | 0xAC00..=0xD7AF // hangul syllables
    )
}

/// Term-frequency vector and its Euclidean norm.
fn term_vector(text: &str) -> (HashMap<String, f32>, f32) {
    let mut terms: HashMap<String, f32> = HashMap::new();
    for term in tokenize(text) {
        *terms.entry(term).or_insert(0.0) += 1.0;
    }
    let norm = terms.values().map(|w| w * w).sum::<f32>().sqrt();
    (terms, norm)
}
