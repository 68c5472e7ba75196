pub mod vectorizer;
pub mod projector;
pub mod cluster;
pub mod neighbor;
pub mod synthesizer;

use std::{collections::HashSet, sync::Arc};

use ahash::RandomState;
use rand::Rng;
use tracing::{debug, info, info_span};

use crate::collab::{ProjectionStore, RelationalStore, SearchIndex};
use crate::config::RecommenderConfig;
use crate::error::{PipelineError, RecommendError, Stage};
use crate::model::{Bibcode, Recommendation, RecommendationResult, Vocabulary};
use cluster::ClusterAssigner;
use neighbor::NeighborFinder;
use projector::{ProjectionKey, Projector};
use synthesizer::{RecommendationSynthesizer, Synthesis};
use vectorizer::Vectorizer;

trait StageResult<T> {
    fn at_stage(self, bibcode: &str, stage: Stage) -> Result<T, PipelineError>;
}

impl<T, E> StageResult<T> for Result<T, E>
where
    E: Into<RecommendError>,
{
    fn at_stage(self, bibcode: &str, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|e| PipelineError::new(bibcode, stage, e.into()))
    }
}

/// Recommender
/// The whole pipeline:
/// vectorize -> project (global) -> assign cluster -> project (cluster-local)
/// -> nearest members -> synthesize -> enrich with metadata.
///
/// Vocabulary, collaborators and configuration are fixed at construction;
/// a request mutates nothing, so one instance can serve many threads.
pub struct Recommender<I, S, P> {
    vocab: Arc<Vocabulary>,
    index: I,
    store: S,
    projections: P,
    config: RecommenderConfig,
}

impl<I, S, P> Recommender<I, S, P>
where
    I: SearchIndex,
    S: RelationalStore,
    P: ProjectionStore,
{
    /// Fails with `InvalidConfig` if the configuration or vocabulary is unusable
    pub fn new(
        vocab: Arc<Vocabulary>,
        index: I,
        store: S,
        projections: P,
        config: RecommenderConfig,
    ) -> Result<Self, RecommendError> {
        config.validate()?;
        if vocab.is_empty() {
            return Err(RecommendError::InvalidConfig("vocabulary is empty".to_string()));
        }
        Ok(Self {
            vocab,
            index,
            store,
            projections,
            config,
        })
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Recommendations for one paper
    pub fn get_recommendations(&self, bibcode: &str) -> Result<RecommendationResult, PipelineError> {
        self.get_recommendations_with_rng(bibcode, &mut rand::thread_rng())
    }

    /// Same as `get_recommendations` with a caller-supplied random source
    pub fn get_recommendations_with_rng<R>(
        &self,
        bibcode: &str,
        rng: &mut R,
    ) -> Result<RecommendationResult, PipelineError>
    where
        R: Rng + ?Sized,
    {
        let span = info_span!("recommend", bibcode);
        let _guard = span.enter();

        let synthesis = self.synthesize(bibcode, rng)?;
        let recommendations = self.enrich(bibcode, synthesis.candidates())?;
        info!(count = recommendations.len(), "recommendations ready");
        Ok(RecommendationResult {
            paper: bibcode.to_string(),
            recommendations,
        })
    }

    /// Run every stage up to synthesis and return the raw seeds and signals
    pub fn synthesize<R>(&self, bibcode: &str, rng: &mut R) -> Result<Synthesis, PipelineError>
    where
        R: Rng + ?Sized,
    {
        let keywords = self.index.query_keywords(bibcode).at_stage(bibcode, Stage::Vectorize)?;
        let vector = Vectorizer::new(&self.vocab)
            .vectorize(bibcode, &keywords)
            .at_stage(bibcode, Stage::Vectorize)?;

        let projector = Projector::new(&self.projections);
        let reduced = projector
            .project(&vector, ProjectionKey::Global)
            .at_stage(bibcode, Stage::ProjectGlobal)?;

        let cluster = ClusterAssigner::new(&self.store)
            .assign(&reduced, bibcode)
            .at_stage(bibcode, Stage::AssignCluster)?;

        let local = projector
            .project(&reduced, ProjectionKey::Cluster(cluster))
            .at_stage(bibcode, Stage::ProjectLocal)?;

        let neighbors = NeighborFinder::new(&self.store)
            .find_neighbors(cluster, &local, self.config.max_neighbors)
            .at_stage(bibcode, Stage::FindNeighbors)?;
        debug!(cluster, neighbors = ?neighbors, "neighbor set");

        RecommendationSynthesizer::new(&self.index, &self.store)
            .with_top_n(self.config.top_n)
            .with_pick_window(self.config.pick_window)
            .synthesize(&neighbors.bibcodes(), Some(bibcode), rng)
            .at_stage(bibcode, Stage::Synthesize)
    }

    /// Attach title and author; candidates without metadata are dropped,
    /// repeated candidates are kept once.
    fn enrich(&self, bibcode: &str, candidates: &[Bibcode]) -> Result<Vec<Recommendation>, PipelineError> {
        let mut seen: HashSet<&str, RandomState> =
            HashSet::with_capacity_and_hasher(candidates.len(), RandomState::new());
        let unique: Vec<Bibcode> = candidates
            .iter()
            .filter(|b| seen.insert(b.as_str()))
            .cloned()
            .collect();

        let meta = self.index.query_metadata(&unique).at_stage(bibcode, Stage::Enrich)?;
        Ok(unique
            .iter()
            .filter_map(|b| meta.get(b))
            .map(|m| Recommendation {
                bibcode: m.bibcode.clone(),
                title: m.display_title(),
                author: m.abbreviated_author(),
            })
            .collect())
    }
}
