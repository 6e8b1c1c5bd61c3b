//! In-memory similarity index.

use crate::chunker::Chunk;

/// How far apart two vectors are. Smaller is closer for every variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Distance {
    /// Squared L2 distance.
    #[default]
    Euclidean,
    /// `1 - cos(a, b)`. A zero vector is at distance 1 from everything.
    Cosine,
}

impl Distance {
    pub fn between(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Distance::Euclidean => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Distance::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (norm_a * norm_b)
                }
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("got {chunks} chunks but {vectors} vectors")]
    CountMismatch { chunks: usize, vectors: usize },

    #[error("vector has {got} dimensions, index holds {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("cannot index an empty vector")]
    EmptyVector,
}

/// A stored chunk and its distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub chunk: Chunk,
    pub distance: f32,
}

pub trait VectorStore: Send + Sync {
    /// Append chunks with their vectors, pairwise.
    fn add(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<(), StoreError>;

    /// At most `k` hits, closest first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector width, once something has been added.
    fn dimensions(&self) -> Option<usize>;
}

/// Exact, brute-force index. Every query is compared against every vector.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    distance: Distance,
    dims: Option<usize>,
    entries: Vec<(Chunk, Vec<f32>)>,
}

impl InMemoryVectorStore {
    pub fn new(distance: Distance) -> Self {
        Self {
            distance,
            dims: None,
            entries: Vec::new(),
        }
    }

    fn check_dims(&self, got: usize) -> Result<(), StoreError> {
        if got == 0 {
            return Err(StoreError::EmptyVector);
        }
        match self.dims {
            Some(expected) if expected != got => {
                Err(StoreError::DimensionMismatch { expected, got })
            },
            _ => Ok(()),
        }
    }
}

impl VectorStore for InMemoryVectorStore {
    fn add(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<(), StoreError> {
        if chunks.len() != vectors.len() {
            return Err(StoreError::CountMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }
        // Validate the whole batch before touching the index.
        let mut dims = self.dims;
        for vector in &vectors {
            if vector.is_empty() {
                return Err(StoreError::EmptyVector);
            }
            match dims {
                Some(expected) if expected != vector.len() => {
                    return Err(StoreError::DimensionMismatch {
                        expected,
                        got: vector.len(),
                    });
                },
                Some(_) => {},
                None => dims = Some(vector.len()),
            }
        }
        self.dims = dims;
        self.entries.extend(chunks.into_iter().zip(vectors));
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, StoreError> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dims(query.len())?;

        let mut hits: Vec<Hit> = self
            .entries
            .iter()
            .map(|(chunk, vector)| Hit {
                chunk: chunk.clone(),
                distance: self.distance.between(query, vector),
            })
            .collect();
        // Stable sort: equal distances keep insertion order.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> Option<usize> {
        self.dims
    }
}
