pub mod vocabulary;
pub mod record;
pub mod article;
pub mod result;

pub use vocabulary::Vocabulary;
pub use record::{Cluster, ClusteringEntry, CoReadRecord};
pub use article::{ArticleMeta, PubDate};
pub use result::{Recommendation, RecommendationResult};

/// Publication identifier
pub type Bibcode = String;

/// Cluster identifier as recorded in the relational store
pub type ClusterId = i64;
