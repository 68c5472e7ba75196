use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collab::{MatrixLookup, ProjectionStore};
use crate::error::{RecommendError, Result};
use crate::model::ClusterId;
use crate::utils::math::vec_mat_mul;

/// Which projection to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionKey {
    /// keyword space -> global reduced space
    Global,
    /// global reduced space -> cluster-local space
    Cluster(ClusterId),
}

impl ProjectionKey {
    /// Identifier used in projection file names; the global projection is `-1`
    pub fn file_id(&self) -> String {
        match self {
            ProjectionKey::Global => "-1".to_string(),
            ProjectionKey::Cluster(id) => id.to_string(),
        }
    }
}

impl fmt::Display for ProjectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionKey::Global => f.write_str("global"),
            ProjectionKey::Cluster(id) => write!(f, "cluster {id}"),
        }
    }
}

/// Dense row-major projection matrix
/// `rows` is the input dimensionality, `cols` the reduced one.
/// Always holds exactly `rows * cols` values, deserialization included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct ProjectionMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<RawMatrix> for ProjectionMatrix {
    type Error = String;

    fn try_from(raw: RawMatrix) -> std::result::Result<Self, Self::Error> {
        let (rows, cols, len) = (raw.rows, raw.cols, raw.data.len());
        ProjectionMatrix::new(raw.rows, raw.cols, raw.data)
            .ok_or_else(|| format!("malformed projection matrix: {rows}x{cols} with {len} values"))
    }
}

impl ProjectionMatrix {
    /// Returns `None` if `data` does not hold exactly `rows * cols` values
    /// or either dimension is zero.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        let matrix = Self { rows, cols, data };
        matrix.is_well_formed().then_some(matrix)
    }

    /// Build from nested rows; all rows must have the same length
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let cols = rows.first()?.len();
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let n = rows.len();
        Self::new(n, cols, rows.into_iter().flatten().collect())
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Shape check for matrices coming from deserialization
    pub fn is_well_formed(&self) -> bool {
        self.rows > 0 && self.cols > 0 && self.data.len() == self.rows * self.cols
    }

    /// vector · matrix
    pub fn apply(&self, vector: &[f64]) -> Option<Vec<f64>> {
        (vector.len() == self.rows).then(|| vec_mat_mul(vector, &self.data, self.cols))
    }
}

/// Projector
/// Reduces a vector with a projection matrix fetched from the store.
pub struct Projector<'a, P: ?Sized> {
    store: &'a P,
}

impl<'a, P> Projector<'a, P>
where
    P: ProjectionStore + ?Sized,
{
    pub fn new(store: &'a P) -> Self {
        Self { store }
    }

    /// Project `vector` with the matrix stored under `key`
    ///
    /// # Errors
    /// * `ProjectionUnavailable` - no matrix for the key
    /// * `ProjectionShapeMismatch` - vector length differs from the matrix row count
    /// * `UpstreamUnavailable` - the store itself failed
    pub fn project(&self, vector: &[f64], key: ProjectionKey) -> Result<Vec<f64>> {
        let matrix = match self.store.load_matrix(key)? {
            MatrixLookup::Found(matrix) => matrix,
            MatrixLookup::NotFound => {
                return Err(RecommendError::ProjectionUnavailable { key: key.to_string() })
            }
        };
        let reduced = matrix
            .apply(vector)
            .ok_or_else(|| RecommendError::ProjectionShapeMismatch {
                key: key.to_string(),
                expected: matrix.rows(),
                actual: vector.len(),
            })?;
        debug!(%key, from = vector.len(), to = reduced.len(), "projected vector");
        Ok(reduced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::MemoryProjectionStore;

    fn store() -> MemoryProjectionStore {
        let mut store = MemoryProjectionStore::new();
        // 3 -> 2
        store.insert(
            ProjectionKey::Global,
            ProjectionMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]).unwrap(),
        );
        // 2 -> 1
        store.insert(
            ProjectionKey::Cluster(4),
            ProjectionMatrix::from_rows(vec![vec![2.0], vec![-1.0]]).unwrap(),
        );
        store
    }

    #[test]
    fn projects_global_then_local() {
        let store = store();
        let projector = Projector::new(&store);
        let global = projector.project(&[0.5, 0.25, 0.25], ProjectionKey::Global).unwrap();
        assert_eq!(global, vec![0.75, 0.5]);
        let local = projector.project(&global, ProjectionKey::Cluster(4)).unwrap();
        assert_eq!(local, vec![1.0]);
    }

    #[test]
    fn missing_matrix_is_an_error() {
        let store = store();
        let err = Projector::new(&store)
            .project(&[1.0, 0.0], ProjectionKey::Cluster(99))
            .unwrap_err();
        assert_eq!(err, RecommendError::ProjectionUnavailable { key: "cluster 99".into() });
    }

    #[test]
    fn shape_mismatch_is_an_error_not_zero() {
        let store = store();
        let err = Projector::new(&store)
            .project(&[1.0, 0.0], ProjectionKey::Global)
            .unwrap_err();
        assert_eq!(
            err,
            RecommendError::ProjectionShapeMismatch { key: "global".into(), expected: 3, actual: 2 }
        );
    }

    #[test]
    fn malformed_matrices_are_rejected() {
        assert!(ProjectionMatrix::new(2, 2, vec![1.0; 3]).is_none());
        assert!(ProjectionMatrix::new(0, 2, vec![]).is_none());
        assert!(ProjectionMatrix::from_rows(vec![vec![1.0], vec![1.0, 2.0]]).is_none());
        assert!(ProjectionMatrix::from_rows(vec![]).is_none());
    }

    #[test]
    fn deserialization_rejects_bad_shapes() {
        let err = serde_json::from_str::<ProjectionMatrix>(r#"{"rows":3,"cols":2,"data":[1,2,3,4]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("3x2 with 4 values"));
        assert!(serde_json::from_str::<ProjectionMatrix>(r#"{"rows":0,"cols":2,"data":[]}"#).is_err());

        let ok: ProjectionMatrix = serde_json::from_str(r#"{"rows":2,"cols":1,"data":[2,-1]}"#).unwrap();
        let mut store = MemoryProjectionStore::new();
        store.insert(ProjectionKey::Cluster(1), ok);
        assert_eq!(
            Projector::new(&store).project(&[1.0, 1.0], ProjectionKey::Cluster(1)).unwrap(),
            vec![1.0]
        );
    }

    #[test]
    fn file_ids() {
        assert_eq!(ProjectionKey::Global.file_id(), "-1");
        assert_eq!(ProjectionKey::Cluster(12).file_id(), "12");
    }
}
