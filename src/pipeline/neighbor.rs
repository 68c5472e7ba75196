use std::fmt::Debug;

use rayon::prelude::*;
use tracing::debug;

use crate::collab::RelationalStore;
use crate::error::{RecommendError, Result};
use crate::model::{Bibcode, ClusterId};
use crate::utils::math::euclidean_distance;

/// Neighbors of a query document, (bibcode, distance)
pub struct Neighbors {
    pub list: Vec<(Bibcode, f64)>,
}

impl Neighbors {
    pub fn new(list: Vec<(Bibcode, f64)>) -> Self {
        Neighbors { list }
    }

    /// Sort by ascending distance.
    /// The sort is stable, equal distances keep store order.
    pub fn sort_by_distance(&mut self) -> &mut Self {
        self.list.retain(|(_, d)| !d.is_nan());
        self.list.sort_by(|a, b| a.1.total_cmp(&b.1));
        self
    }

    pub fn truncate(&mut self, k: usize) -> &mut Self {
        self.list.truncate(k);
        self
    }

    pub fn bibcodes(&self) -> Vec<Bibcode> {
        self.list.iter().map(|(b, _)| b.clone()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl Debug for Neighbors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "Neighbors [")?;
            for (bibcode, dist) in &self.list {
                writeln!(f, "    {:?}: {:.6}", bibcode, dist)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

/// NeighborFinder
/// k nearest cluster members in the cluster-local space.
pub struct NeighborFinder<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> NeighborFinder<'a, S>
where
    S: RelationalStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// # Arguments
    /// * `cluster` - assigned cluster
    /// * `local` - query vector in the cluster-local space
    /// * `max_neighbors` - k
    ///
    /// # Returns
    /// * at most `max_neighbors` members, non-decreasing distance
    pub fn find_neighbors(&self, cluster: ClusterId, local: &[f64], max_neighbors: usize) -> Result<Neighbors> {
        let entries = self.store.list_clustering_entries(cluster)?;
        if entries.is_empty() {
            return Err(RecommendError::ClusterNotFound { cluster });
        }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != local.len()) {
            return Err(RecommendError::VectorDimensionMismatch {
                context: format!("cluster {} entry {}", cluster, bad.bibcode),
                expected: local.len(),
                actual: bad.vector.len(),
            });
        }

        // par_iter + collect keeps the store order
        let distances: Vec<(Bibcode, f64)> = entries
            .into_par_iter()
            .map(|entry| {
                let dist = euclidean_distance(&entry.vector, local);
                (entry.bibcode, dist)
            })
            .collect();

        let mut neighbors = Neighbors::new(distances);
        neighbors.sort_by_distance().truncate(max_neighbors);
        debug!(cluster, found = neighbors.len(), max_neighbors, "nearest cluster members");
        Ok(neighbors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::MemorySnapshot;
    use crate::model::ClusteringEntry;

    fn entry(bibcode: &str, cluster: ClusterId, vector: Vec<f64>) -> ClusteringEntry {
        ClusteringEntry {
            bibcode: bibcode.to_string(),
            cluster,
            vector,
        }
    }

    fn snapshot() -> MemorySnapshot {
        MemorySnapshot {
            clustering: vec![
                entry("far", 1, vec![5.0, 5.0]),
                entry("near", 1, vec![0.1, 0.0]),
                entry("tie_a", 1, vec![1.0, 0.0]),
                entry("tie_b", 1, vec![0.0, 1.0]),
                entry("self", 1, vec![0.0, 0.0]),
                entry("other", 2, vec![0.0, 0.0]),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn sorted_by_distance_with_store_order_ties() {
        let store = snapshot();
        let neighbors = NeighborFinder::new(&store).find_neighbors(1, &[0.0, 0.0], 10).unwrap();
        assert_eq!(neighbors.bibcodes(), vec!["self", "near", "tie_a", "tie_b", "far"]);
        for pair in neighbors.list.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn truncates_to_max_neighbors() {
        let store = snapshot();
        let finder = NeighborFinder::new(&store);
        assert_eq!(finder.find_neighbors(1, &[0.0, 0.0], 2).unwrap().bibcodes(), vec!["self", "near"]);
        assert!(finder.find_neighbors(1, &[0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn unknown_cluster() {
        let store = snapshot();
        assert_eq!(
            NeighborFinder::new(&store).find_neighbors(42, &[0.0, 0.0], 5).unwrap_err(),
            RecommendError::ClusterNotFound { cluster: 42 }
        );
    }

    #[test]
    fn entry_dimension_mismatch() {
        let store = snapshot();
        assert!(matches!(
            NeighborFinder::new(&store).find_neighbors(1, &[0.0, 0.0, 0.0], 5),
            Err(RecommendError::VectorDimensionMismatch { expected: 3, actual: 2, .. })
        ));
    }
}
