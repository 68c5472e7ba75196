use serde::{Deserialize, Serialize};

use super::{Bibcode, ClusterId};

/// Cluster row: centroid in the global reduced space plus member bibcodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub centroid: Vec<f64>,
    #[serde(default)]
    pub members: Vec<Bibcode>,
}

impl Cluster {
    #[inline]
    pub fn has_member(&self, bibcode: &str) -> bool {
        self.members.iter().any(|m| m == bibcode)
    }
}

/// Per-member coordinates in the cluster-local reduced space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringEntry {
    pub bibcode: Bibcode,
    pub cluster: ClusterId,
    pub vector: Vec<f64>,
}

/// Co-read counts for one bibcode
/// `before` / `after` hold (co-read bibcode, count) pairs for papers read
/// directly before / after this one in a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoReadRecord {
    pub bibcode: Bibcode,
    #[serde(default)]
    pub before: Vec<(Bibcode, u64)>,
    #[serde(default)]
    pub after: Vec<(Bibcode, u64)>,
}

impl CoReadRecord {
    /// Every (bibcode, count) pair of both tables
    pub fn all_reads(&self) -> impl Iterator<Item = &(Bibcode, u64)> {
        self.before.iter().chain(self.after.iter())
    }
}
