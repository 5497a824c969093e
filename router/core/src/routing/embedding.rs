//! Text Embedding
//!
//! The semantic stage depends on an [`Embedder`] to place queries and
//! example utterances in a shared vector space. The built-in
//! [`HashingEmbedder`] is a deterministic, dependency-free encoder based on
//! feature hashing of words and character trigrams. Model-backed encoders
//! plug in through the same trait.

use super::error::EmbeddingError;

/// Encodes text into fixed-dimension vectors
///
/// Implementations are shared by concurrent routing calls and must be
/// usable through `&self`. An encoder that needs exclusive access to its
/// model should hold its own lock.
pub trait Embedder: Send + Sync {
    /// Length of every produced vector
    fn dimension(&self) -> usize;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts, preserving order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

// ============================================================================
// Hashing Embedder
// ============================================================================

/// Weight of a whole-word feature
const WORD_WEIGHT: f32 = 1.0;

/// Weight of a character-trigram feature
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Function words carrying no topical signal
const STOP_WORDS: &[&str] = &[
    "a", "am", "an", "and", "are", "as", "at", "be", "but", "by", "can", "could", "did", "do",
    "does", "for", "from", "has", "have", "he", "her", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "me", "my", "no", "not", "of", "off", "on", "or", "our", "should", "so",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "to", "up", "was",
    "we", "were", "what", "when", "where", "which", "who", "why", "will", "with", "would", "you",
    "your",
];

/// Deterministic feature-hashing encoder
///
/// Text is lower-cased and split on non-alphanumeric characters; stop words
/// are dropped. Each remaining token contributes a whole-word feature and
/// the character trigrams of `<token>`, so morphological variants
/// ("service" / "microservices") still overlap. Features are hashed with
/// CRC-32 into signed buckets and the result is L2-normalised. Text without
/// content words embeds to the zero vector.
#[derive(Clone, Debug)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create an encoder producing `dimension`-sized vectors
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::Rejected(
                "embedding dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    /// Content tokens of a text
    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .filter(|t| !STOP_WORDS.contains(&t.as_str()))
    }

    /// Add one hashed feature to the accumulator
    fn add_feature(&self, acc: &mut [f32], feature: &str, weight: f32) {
        let hash = crc32fast::hash(feature.as_bytes());
        let bucket = hash as usize % self.dimension;
        let sign = if hash >> 31 == 1 { -1.0 } else { 1.0 };
        acc[bucket] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut acc = vec![0.0_f32; self.dimension];

        for token in Self::tokens(text) {
            self.add_feature(&mut acc, &format!("w:{token}"), WORD_WEIGHT);

            let padded: Vec<char> = std::iter::once('<')
                .chain(token.chars())
                .chain(std::iter::once('>'))
                .collect();
            if padded.len() > 3 {
                for window in padded.windows(3) {
                    let trigram: String = window.iter().collect();
                    self.add_feature(&mut acc, &format!("g:{trigram}"), TRIGRAM_WEIGHT);
                }
            }
        }

        let norm = acc.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            acc.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(acc)
    }
}

// ============================================================================
// Similarity
// ============================================================================

/// Cosine similarity of two vectors
///
/// Returns 0.0 for mismatched lengths or zero-magnitude inputs. The result
/// is not clamped.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0_f64, 0.0_f64, 0.0_f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (dot + x * y, na + x * x, nb + y * y)
        },
    );

    if norm_a <= f64::EPSILON || norm_b <= f64::EPSILON {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
