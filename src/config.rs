use std::{env, path::{Path, PathBuf}, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collab::read_data_file;
use crate::error::{RecommendError, Result};
use crate::pipeline::synthesizer::DEFAULT_PICK_WINDOW;
use crate::utils::frequency::DEFAULT_TOP_N;

/// Runtime settings of the recommender
///
/// Loaded from a JSON (`.json`) or CBOR file, missing fields fall back to
/// defaults, then overridden by `RECOMMENDER_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// number of nearest cluster members used as the neighbor set
    pub max_neighbors: usize,
    /// row limit for index queries
    pub max_hits: usize,
    /// cap of every frequency distribution
    pub top_n: usize,
    /// window for the random picks
    pub pick_window: usize,
    /// directory holding `clusterprojection_<id>` files
    pub projection_dir: PathBuf,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            max_neighbors: 10,
            max_hits: 10_000,
            top_n: DEFAULT_TOP_N,
            pick_window: DEFAULT_PICK_WINDOW,
            projection_dir: PathBuf::from("data/projections"),
        }
    }
}

impl RecommenderConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        read_data_file(path).map_err(|e| RecommendError::InvalidConfig(e.to_string()))
    }

    /// Apply `RECOMMENDER_MAX_NEIGHBORS`, `RECOMMENDER_MAX_HITS`, `RECOMMENDER_TOP_N`,
    /// `RECOMMENDER_PICK_WINDOW` and `RECOMMENDER_PROJECTION_DIR`
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| env::var(name).ok())
    }

    /// Same as `with_env_overrides` with an explicit variable lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_parsed(&lookup, "RECOMMENDER_MAX_NEIGHBORS", &mut self.max_neighbors)?;
        override_parsed(&lookup, "RECOMMENDER_MAX_HITS", &mut self.max_hits)?;
        override_parsed(&lookup, "RECOMMENDER_TOP_N", &mut self.top_n)?;
        override_parsed(&lookup, "RECOMMENDER_PICK_WINDOW", &mut self.pick_window)?;
        if let Some(dir) = lookup("RECOMMENDER_PROJECTION_DIR") {
            self.projection_dir = PathBuf::from(dir);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("max_neighbors", self.max_neighbors),
            ("max_hits", self.max_hits),
            ("top_n", self.top_n),
            ("pick_window", self.pick_window),
        ] {
            if value == 0 {
                return Err(RecommendError::InvalidConfig(format!("{name} must be greater than 0")));
            }
        }
        if self.pick_window > self.top_n {
            warn!(
                pick_window = self.pick_window,
                top_n = self.top_n,
                "pick window larger than distribution cap"
            );
        }
        Ok(())
    }
}

fn override_parsed<F, T>(lookup: &F, name: &str, slot: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(name) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| RecommendError::InvalidConfig(format!("{name}: cannot parse {raw:?}")))?;
    }
    Ok(())
}
