//! Collaborator seams of the pipeline.
//!
//! The recommender only talks to the outside world through these three traits.
//! How a collaborator reaches its backend (direct search client, forwarded
//! authorization header, pooled database handle, ...) is decided when it is
//! constructed, never inside the pipeline.

pub mod memory;
pub mod projection;

use std::{fs, path::{Path, PathBuf}, sync::Arc};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::{ArticleMeta, Bibcode, Cluster, ClusterId, ClusteringEntry, CoReadRecord};
use crate::pipeline::projector::{ProjectionKey, ProjectionMatrix};

pub use memory::{MemorySnapshot, SnapshotDocument};
pub use projection::{FileProjectionStore, MemoryProjectionStore};

/// Failure of a collaborator call (transport error, non-200 status, timeout, decode error)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub status_code: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Failure to read a data file (snapshot, projection matrix, config)
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid CBOR in {}: {source}", .path.display())]
    Cbor {
        path: PathBuf,
        #[source]
        source: serde_cbor::Error,
    },
}

impl From<LoadError> for UpstreamError {
    fn from(err: LoadError) -> Self {
        UpstreamError::new(None, err.to_string())
    }
}

/// Read a JSON (`.json`) or CBOR (anything else) file
pub fn read_data_file<T>(path: &Path) -> Result<T, LoadError>
where
    T: DeserializeOwned,
{
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_slice(&bytes).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_cbor::from_slice(&bytes).map_err(|source| LoadError::Cbor {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Search / metadata index
pub trait SearchIndex: Send + Sync {
    /// Normalized (lower-cased) keywords of the document and of all its references.
    /// Repeated keywords are kept; the caller counts them.
    fn query_keywords(&self, bibcode: &str) -> UpstreamResult<Vec<String>>;

    /// Metadata for the documents that were found, in the index's native order
    /// (most recent publication first).
    fn query_metadata(&self, bibcodes: &[Bibcode]) -> UpstreamResult<IndexMap<Bibcode, ArticleMeta>>;

    /// Bibcodes citing any of the given documents, duplicates kept
    fn query_citing_papers(&self, bibcodes: &[Bibcode]) -> UpstreamResult<Vec<Bibcode>>;
}

/// Relational store holding clusters, cluster-local coordinates and co-reads.
/// Read-only from the recommender's point of view.
pub trait RelationalStore: Send + Sync {
    fn cluster_by_member(&self, bibcode: &str) -> UpstreamResult<Option<Cluster>>;

    fn list_clusters(&self) -> UpstreamResult<Vec<Cluster>>;

    fn list_clustering_entries(&self, cluster: ClusterId) -> UpstreamResult<Vec<ClusteringEntry>>;

    fn co_reads(&self, bibcode: &str) -> UpstreamResult<Option<CoReadRecord>>;
}

/// Result of a projection lookup
#[derive(Debug, Clone)]
pub enum MatrixLookup {
    Found(Arc<ProjectionMatrix>),
    NotFound,
}

/// Store of precomputed projection matrices
pub trait ProjectionStore: Send + Sync {
    fn load_matrix(&self, key: ProjectionKey) -> UpstreamResult<MatrixLookup>;
}

impl<T: SearchIndex + ?Sized> SearchIndex for Arc<T> {
    fn query_keywords(&self, bibcode: &str) -> UpstreamResult<Vec<String>> {
        (**self).query_keywords(bibcode)
    }

    fn query_metadata(&self, bibcodes: &[Bibcode]) -> UpstreamResult<IndexMap<Bibcode, ArticleMeta>> {
        (**self).query_metadata(bibcodes)
    }

    fn query_citing_papers(&self, bibcodes: &[Bibcode]) -> UpstreamResult<Vec<Bibcode>> {
        (**self).query_citing_papers(bibcodes)
    }
}

impl<T: RelationalStore + ?Sized> RelationalStore for Arc<T> {
    fn cluster_by_member(&self, bibcode: &str) -> UpstreamResult<Option<Cluster>> {
        (**self).cluster_by_member(bibcode)
    }

    fn list_clusters(&self) -> UpstreamResult<Vec<Cluster>> {
        (**self).list_clusters()
    }

    fn list_clustering_entries(&self, cluster: ClusterId) -> UpstreamResult<Vec<ClusteringEntry>> {
        (**self).list_clustering_entries(cluster)
    }

    fn co_reads(&self, bibcode: &str) -> UpstreamResult<Option<CoReadRecord>> {
        (**self).co_reads(bibcode)
    }
}

impl<T: ProjectionStore + ?Sized> ProjectionStore for Arc<T> {
    fn load_matrix(&self, key: ProjectionKey) -> UpstreamResult<MatrixLookup> {
        (**self).load_matrix(key)
    }
}
