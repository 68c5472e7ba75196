use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::collab::UpstreamError;
use crate::model::{Bibcode, ClusterId};

pub type Result<T> = std::result::Result<T, RecommendError>;

/// Failure kinds raised by the pipeline stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecommendError {
    /// The document (and its references) carry no keyword known to the vocabulary
    #[error("no usable keywords for {bibcode}")]
    NoUsableKeywords { bibcode: Bibcode },

    #[error("no projection matrix available for {key}")]
    ProjectionUnavailable { key: String },

    /// vector length != matrix row count
    #[error("projection {key} expects {expected} dimensions, got {actual}")]
    ProjectionShapeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("no clusters available")]
    NoClustersAvailable,

    #[error("cluster {cluster} has no recorded members")]
    ClusterNotFound { cluster: ClusterId },

    /// A stored vector (centroid or cluster entry) is not comparable with the query vector
    #[error("{context}: expected {expected} dimensions, got {actual}")]
    VectorDimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// A frequency distribution needed for a recommendation slot was empty
    #[error("cannot synthesize recommendations: {reason}")]
    SynthesisError { reason: String },

    #[error("upstream unavailable (status {}): {message}", fmt_status(.status_code))]
    UpstreamUnavailable {
        status_code: Option<u16>,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn fmt_status(code: &Option<u16>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl RecommendError {
    /// Stable identifier used in error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoUsableKeywords { .. } => "no_usable_keywords",
            Self::ProjectionUnavailable { .. } => "projection_unavailable",
            Self::ProjectionShapeMismatch { .. } => "projection_shape_mismatch",
            Self::NoClustersAvailable => "no_clusters_available",
            Self::ClusterNotFound { .. } => "cluster_not_found",
            Self::VectorDimensionMismatch { .. } => "vector_dimension_mismatch",
            Self::SynthesisError { .. } => "synthesis_error",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }

    pub(crate) fn synthesis(reason: impl Into<String>) -> Self {
        Self::SynthesisError { reason: reason.into() }
    }
}

impl From<UpstreamError> for RecommendError {
    fn from(err: UpstreamError) -> Self {
        Self::UpstreamUnavailable {
            status_code: err.status_code,
            message: err.message,
        }
    }
}

/// Pipeline stage in which a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Vectorize,
    ProjectGlobal,
    AssignCluster,
    ProjectLocal,
    FindNeighbors,
    Synthesize,
    Enrich,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Vectorize => "vectorize",
            Stage::ProjectGlobal => "project_global",
            Stage::AssignCluster => "assign_cluster",
            Stage::ProjectLocal => "project_local",
            Stage::FindNeighbors => "find_neighbors",
            Stage::Synthesize => "synthesize",
            Stage::Enrich => "enrich",
        };
        f.write_str(name)
    }
}

/// Error surfaced by `Recommender::get_recommendations`
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} failed for {bibcode}: {kind}")]
pub struct PipelineError {
    pub bibcode: Bibcode,
    pub stage: Stage,
    #[source]
    pub kind: RecommendError,
}

impl PipelineError {
    pub fn new(bibcode: impl Into<Bibcode>, stage: Stage, kind: RecommendError) -> Self {
        Self {
            bibcode: bibcode.into(),
            stage,
            kind,
        }
    }

    /// Structured payload for callers (kind + message, never a backtrace)
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            paper: self.bibcode.clone(),
            kind: self.kind.kind(),
            stage: self.stage,
            message: self.kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub paper: Bibcode,
    pub kind: &'static str,
    pub stage: Stage,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_keeps_status_and_message() {
        let err: RecommendError = UpstreamError::new(Some(503), "solr down").into();
        assert_eq!(err.kind(), "upstream_unavailable");
        assert_eq!(err.to_string(), "upstream unavailable (status 503): solr down");
    }

    #[test]
    fn payload_carries_stage_and_kind() {
        let err = PipelineError::new(
            "2010ApJ...1..1A",
            Stage::FindNeighbors,
            RecommendError::ClusterNotFound { cluster: 7 },
        );
        let payload = err.payload();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "cluster_not_found");
        assert_eq!(json["stage"], "find_neighbors");
        assert_eq!(json["paper"], "2010ApJ...1..1A");
        assert_eq!(json["message"], "cluster 7 has no recorded members");
    }
}
