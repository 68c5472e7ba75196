/// This crate recommends related papers for a bibcode from keyword projections,
/// cluster neighborhoods and reader co-read statistics.
pub mod model;
pub mod pipeline;
pub mod collab;
pub mod config;
pub mod error;
pub mod utils;

/// Recommender
/// The top-level struct of this crate, running the whole recommendation pipeline.
///
/// For one bibcode it:
/// - Builds a normalized keyword vector over the fixed vocabulary
/// - Projects it into the global reduced space
/// - Finds the paper's cluster (recorded membership, else nearest centroid)
/// - Projects into the cluster-local space and ranks cluster members by distance
/// - Blends co-reads, citations and references of the neighbors into candidates
/// - Attaches title and abbreviated first author to each candidate
///
/// `Recommender<I, S, P>` has the following generic parameters:
/// - `I`: search index (`SearchIndex`)
/// - `S`: relational store (`RelationalStore`)
/// - `P`: projection matrix store (`ProjectionStore`)
///
/// # Thread Safety
/// Nothing is mutated per request; share one instance behind an `Arc`.
pub use pipeline::Recommender;

/// Recommendation output
/// - `RecommendationResult`: the queried bibcode and its ordered recommendations
/// - `Recommendation`: bibcode, display title and `Surname,+` author
pub use model::{Recommendation, RecommendationResult};

/// Keyword vocabulary
/// Fixed ordered set of lower-cased keywords; positions are vector dimensions.
pub use model::Vocabulary;

/// Collaborator traits
/// The pipeline reaches the search index, the relational store and the
/// projection matrices only through these.
pub use collab::{ProjectionStore, RelationalStore, SearchIndex};

/// Bundled collaborators
/// - `MemorySnapshot`: JSON/CBOR snapshot acting as index and relational store
/// - `FileProjectionStore`: `clusterprojection_<id>` files, cached after first load
/// - `MemoryProjectionStore`: matrices held in memory
pub use collab::{FileProjectionStore, MemoryProjectionStore, MemorySnapshot};

/// Runtime configuration
pub use config::RecommenderConfig;

/// Errors
/// - `RecommendError`: what went wrong
/// - `PipelineError`: what went wrong, at which stage, for which paper
/// - `ErrorPayload`: serializable form handed to callers
pub use error::{ErrorPayload, PipelineError, RecommendError, Stage};
