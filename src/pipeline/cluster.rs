use tracing::{debug, warn};

use crate::collab::RelationalStore;
use crate::error::{RecommendError, Result};
use crate::model::ClusterId;
use crate::utils::math::euclidean_distance;

/// ClusterAssigner
/// Decides which cluster a document belongs to.
///
/// Recorded membership wins; the nearest centroid is only computed for
/// documents the offline clustering never saw. Nothing is written back.
pub struct ClusterAssigner<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> ClusterAssigner<'a, S>
where
    S: RelationalStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// # Arguments
    /// * `reduced` - document vector in the global reduced space
    /// * `bibcode` - document identifier
    pub fn assign(&self, reduced: &[f64], bibcode: &str) -> Result<ClusterId> {
        if let Some(cluster) = self.store.cluster_by_member(bibcode)? {
            // membership data is maintained externally, make sure it really lists us
            if cluster.has_member(bibcode) {
                debug!(bibcode, cluster = cluster.id, "cluster from recorded membership");
                return Ok(cluster.id);
            }
            warn!(bibcode, cluster = cluster.id, "stale membership record, falling back to centroids");
        }
        self.nearest_centroid(reduced)
    }

    /// Cluster whose centroid is closest to `reduced`.
    /// Clusters are scanned by ascending id; the first of equally distant ones wins.
    pub fn nearest_centroid(&self, reduced: &[f64]) -> Result<ClusterId> {
        let mut clusters = self.store.list_clusters()?;
        if clusters.is_empty() {
            return Err(RecommendError::NoClustersAvailable);
        }
        clusters.sort_by_key(|c| c.id);

        let mut best: Option<(ClusterId, f64)> = None;
        for cluster in &clusters {
            if cluster.centroid.len() != reduced.len() {
                return Err(RecommendError::VectorDimensionMismatch {
                    context: format!("centroid of cluster {}", cluster.id),
                    expected: reduced.len(),
                    actual: cluster.centroid.len(),
                });
            }
            let dist = euclidean_distance(reduced, &cluster.centroid);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((cluster.id, dist)),
            }
        }

        let (id, dist) = best.ok_or(RecommendError::NoClustersAvailable)?;
        debug!(cluster = id, distance = dist, candidates = clusters.len(), "nearest centroid");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{MemorySnapshot, UpstreamResult};
    use crate::model::{Cluster, ClusteringEntry, CoReadRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cluster(id: ClusterId, centroid: Vec<f64>, members: &[&str]) -> Cluster {
        Cluster {
            id,
            centroid,
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn snapshot() -> MemorySnapshot {
        MemorySnapshot {
            clusters: vec![
                cluster(3, vec![10.0, 10.0], &["P3a"]),
                cluster(1, vec![0.0, 0.0], &["P1a", "P1b"]),
                cluster(2, vec![2.0, 0.0], &["P2a"]),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn recorded_member_short_circuits() {
        let store = snapshot();
        let assigner = ClusterAssigner::new(&store);
        // the vector points at cluster 3, but P1b is a recorded member of 1
        assert_eq!(assigner.assign(&[10.0, 10.0], "P1b").unwrap(), 1);
        assert_eq!(store.list_clusters_calls(), 0);
    }

    #[test]
    fn nearest_centroid_for_unknown_document() {
        let store = snapshot();
        let assigner = ClusterAssigner::new(&store);
        assert_eq!(assigner.assign(&[1.8, 0.1], "NEW").unwrap(), 2);
        assert_eq!(assigner.assign(&[9.0, 8.0], "NEW").unwrap(), 3);
        assert_eq!(store.list_clusters_calls(), 2);
    }

    #[test]
    fn tie_goes_to_lowest_cluster_id() {
        let store = snapshot();
        // equidistant from cluster 1 (0,0) and cluster 2 (2,0)
        assert_eq!(ClusterAssigner::new(&store).assign(&[1.0, 0.0], "NEW").unwrap(), 1);
    }

    #[test]
    fn assign_is_idempotent() {
        let store = snapshot();
        let assigner = ClusterAssigner::new(&store);
        let first = assigner.assign(&[4.0, 5.0], "NEW").unwrap();
        let second = assigner.assign(&[4.0, 5.0], "NEW").unwrap();
        assert_eq!(first, second);
    }

    /// Membership lookup answers with a cluster that no longer lists the paper
    struct StaleStore {
        scans: AtomicUsize,
    }

    impl RelationalStore for StaleStore {
        fn cluster_by_member(&self, _: &str) -> UpstreamResult<Option<Cluster>> {
            Ok(Some(cluster(9, vec![100.0], &["OTHER"])))
        }

        fn list_clusters(&self) -> UpstreamResult<Vec<Cluster>> {
            self.scans.fetch_add(1, Ordering::Relaxed);
            Ok(vec![cluster(9, vec![100.0], &["OTHER"]), cluster(4, vec![0.0], &[])])
        }

        fn list_clustering_entries(&self, _: ClusterId) -> UpstreamResult<Vec<ClusteringEntry>> {
            Ok(Vec::new())
        }

        fn co_reads(&self, _: &str) -> UpstreamResult<Option<CoReadRecord>> {
            Ok(None)
        }
    }

    #[test]
    fn stale_membership_falls_back_to_centroids() {
        let store = StaleStore { scans: AtomicUsize::new(0) };
        assert_eq!(ClusterAssigner::new(&store).assign(&[0.5], "P").unwrap(), 4);
        assert_eq!(store.scans.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn no_clusters() {
        let store = MemorySnapshot::default();
        assert_eq!(
            ClusterAssigner::new(&store).assign(&[0.0], "NEW").unwrap_err(),
            RecommendError::NoClustersAvailable
        );
    }

    #[test]
    fn centroid_dimension_mismatch() {
        let store = snapshot();
        assert!(matches!(
            ClusterAssigner::new(&store).assign(&[0.0, 0.0, 0.0], "NEW"),
            Err(RecommendError::VectorDimensionMismatch { expected: 3, actual: 2, .. })
        ));
    }
}
