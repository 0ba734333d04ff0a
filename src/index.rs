use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::error::IndexError;
use crate::model::Hit;
use crate::vector::squared_euclidean;

/// Heap entry. Ordered so that the WORST hit sits on top of the max-heap:
/// larger distance first, then later insertion position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    dist: OrderedFloat<f32>,
    position: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .cmp(&other.dist)
            .then_with(|| self.position.cmp(&other.position))
    }
}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Exact nearest-neighbour index over a fixed vector set.
///
/// Built once, never mutated. Vector `i` belongs to roster position `i`.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dim = vectors.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(IndexError::DimensionMismatch { expected: dim, actual: bad.len() });
        }
        Ok(Self { dim, vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Up to `k` hits by ascending distance; equal distances keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, IndexError> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch { expected: self.dim, actual: query.len() });
        }

        let mut heap = BinaryHeap::with_capacity(k + 1);
        for (position, v) in self.vectors.iter().enumerate() {
            let cand = Candidate {
                dist: OrderedFloat(squared_euclidean(query, v)),
                position,
            };
            if heap.len() < k {
                heap.push(cand);
            } else if let Some(worst) = heap.peek() {
                if cand < *worst {
                    heap.pop();
                    heap.push(cand);
                }
            }
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| Hit { position: c.position, distance: c.dist.into_inner() })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(hits: &[Hit]) -> Vec<usize> {
        hits.iter().map(|h| h.position).collect()
    }

    #[test]
    fn returns_k_nearest_in_ascending_order() {
        let idx = FlatIndex::build(vec![
            vec![10.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 0.0],
            vec![5.0, 5.0],
        ])
        .unwrap();

        let hits = idx.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(positions(&hits), vec![2, 1, 3]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn k_larger_than_corpus_returns_everything() {
        let idx = FlatIndex::build(vec![vec![1.0], vec![2.0]]).unwrap();
        assert_eq!(idx.search(&[0.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let idx = FlatIndex::build(vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![-1.0, 0.0],
            vec![0.0, -1.0],
        ])
        .unwrap();

        assert_eq!(positions(&idx.search(&[0.0, 0.0], 4).unwrap()), vec![0, 1, 2, 3]);
        assert_eq!(positions(&idx.search(&[0.0, 0.0], 2).unwrap()), vec![0, 1]);
    }

    #[test]
    fn rejects_ragged_vectors_and_bad_queries() {
        let err = FlatIndex::build(vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert_eq!(err, IndexError::DimensionMismatch { expected: 2, actual: 1 });

        let idx = FlatIndex::build(vec![vec![1.0, 2.0]]).unwrap();
        assert!(idx.search(&[1.0], 1).is_err());
    }

    #[test]
    fn empty_index_finds_nothing() {
        let idx = FlatIndex::build(Vec::new()).unwrap();
        assert!(idx.is_empty());
        assert!(idx.search(&[1.0, 2.0], 3).unwrap().is_empty());
    }
}
