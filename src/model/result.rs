use serde::{Deserialize, Serialize};

use super::Bibcode;

/// One enriched recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub bibcode: Bibcode,
    pub title: String,
    pub author: String,
}

/// Output of the pipeline
/// Serializes to `{"paper": ..., "recommendations": [{"bibcode", "title", "author"}, ...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub paper: Bibcode,
    pub recommendations: Vec<Recommendation>,
}

impl RecommendationResult {
    pub fn bibcodes(&self) -> impl Iterator<Item = &str> {
        self.recommendations.iter().map(|r| r.bibcode.as_str())
    }
}
