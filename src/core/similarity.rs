use async_trait::async_trait;
use thiserror::Error;

/// Errors produced while scoring descriptions
///
/// Any of these aborts the whole pairing run.
#[derive(Debug, Error)]
pub enum SimilarityError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Embeddings backend returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Similarity matrix must be {expected}x{expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: String },

    #[error("Similarity score at ({row}, {col}) is not finite")]
    NonFinite { row: usize, col: usize },
}

/// Square matrix of pairwise similarity scores
///
/// Higher means more alike. Only the upper triangle is read by the engine;
/// the diagonal is unused.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Build from row vectors, rejecting ragged or non-finite input
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, SimilarityError> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);

        for (row, cols) in rows.into_iter().enumerate() {
            if cols.len() != size {
                return Err(SimilarityError::ShapeMismatch {
                    expected: size,
                    actual: format!("row {} with {} columns", row, cols.len()),
                });
            }
            if let Some(col) = cols.iter().position(|v| !v.is_finite()) {
                return Err(SimilarityError::NonFinite { row, col });
            }
            values.extend(cols);
        }

        Ok(Self { size, values })
    }

    /// Pairwise cosine similarity of embedding vectors
    pub fn from_embeddings(embeddings: &[Vec<f64>]) -> Result<Self, SimilarityError> {
        let size = embeddings.len();
        if let Some(first) = embeddings.first() {
            if let Some(bad) = embeddings.iter().find(|e| e.len() != first.len()) {
                return Err(SimilarityError::DimensionMismatch {
                    expected: first.len(),
                    actual: bad.len(),
                });
            }
        }

        let mut values = vec![0.0; size * size];
        for i in 0..size {
            for j in i..size {
                let score = cosine_similarity(&embeddings[i], &embeddings[j]);
                if !score.is_finite() {
                    return Err(SimilarityError::NonFinite { row: i, col: j });
                }
                values[i * size + j] = score;
                values[j * size + i] = score;
            }
        }

        Ok(Self { size, values })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }
}

/// Cosine of the angle between two vectors; 0 when either has zero length
#[inline]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Scores a batch of texts against each other
///
/// Called once per pairing run with every description in user order.
#[async_trait]
pub trait SimilarityProvider: Send + Sync {
    async fn score(&self, texts: &[String]) -> Result<SimilarityMatrix, SimilarityError>;
}

/// Provider returning a precomputed matrix, for tests and offline runs
#[derive(Debug, Clone)]
pub struct FixedSimilarity {
    matrix: SimilarityMatrix,
}

impl FixedSimilarity {
    pub fn new(matrix: SimilarityMatrix) -> Self {
        Self { matrix }
    }

    /// Same score for every pair; `score` must be finite
    pub fn uniform(size: usize, score: f64) -> Result<Self, SimilarityError> {
        let matrix = SimilarityMatrix::from_rows(vec![vec![score; size]; size])?;
        Ok(Self { matrix })
    }
}

#[async_trait]
impl SimilarityProvider for FixedSimilarity {
    async fn score(&self, texts: &[String]) -> Result<SimilarityMatrix, SimilarityError> {
        if texts.len() != self.matrix.size() {
            return Err(SimilarityError::ShapeMismatch {
                expected: texts.len(),
                actual: format!("{}x{}", self.matrix.size(), self.matrix.size()),
            });
        }
        Ok(self.matrix.clone())
    }
}
