//! Two-tier similarity scoring for listing titles.

/// Token-order-insensitive similarity in `[0, 100]`.
///
/// Both titles are lower-cased, split on whitespace, sorted and re-joined,
/// then compared with an insertion/deletion edit ratio:
/// `100 * 2 * lcs / (len_a + len_b)` counted in characters.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a = sorted_tokens(a);
    let b = sorted_tokens(b);
    indel_ratio(&a, &b)
}

fn sorted_tokens(text: &str) -> Vec<char> {
    let lowered = text.to_lowercase();
    let mut tokens = lowered.split_whitespace().collect::<Vec<_>>();
    tokens.sort_unstable();
    tokens.join(" ").chars().collect()
}

fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let matches = lcs_length(a, b);
    100.0 * (2 * matches) as f64 / total as f64
}

/// LCS length using two rows.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Cosine similarity in `[-1, 1]`.
///
/// Zero vectors, and vectors of different length, score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Which tier confirmed a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
    Lexical,
    Semantic,
}

/// Applies the lexical test first and falls back to embeddings only when it
/// fails.
#[derive(Clone, Copy, Debug)]
pub struct SimilarityScorer {
    text_threshold: f64,
    semantic_threshold: f32,
}

impl SimilarityScorer {
    pub fn new(text_threshold: f64, semantic_threshold: f32) -> Self {
        Self {
            text_threshold,
            semantic_threshold,
        }
    }

    pub fn lexical(&self, a: &str, b: &str) -> f64 {
        token_sort_ratio(a, b)
    }

    pub fn semantic(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }

    /// Returns the tier that accepted the pair, or `None`.
    pub fn confirm(
        &self,
        title_a: &str,
        title_b: &str,
        embedding_a: &[f32],
        embedding_b: &[f32],
    ) -> Option<MatchKind> {
        if self.lexical(title_a, title_b) >= self.text_threshold {
            return Some(MatchKind::Lexical);
        }
        if self.semantic(embedding_a, embedding_b) >= self.semantic_threshold {
            return Some(MatchKind::Semantic);
        }
        None
    }
}
