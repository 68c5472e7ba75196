use rand::Rng;
use tracing::{debug, info};

use crate::collab::{RelationalStore, SearchIndex};
use crate::error::{RecommendError, Result};
use crate::model::{ArticleMeta, Bibcode};
use crate::utils::frequency::{Frequencies, DEFAULT_TOP_N};

/// Default size of the random-pick window
pub const DEFAULT_PICK_WINDOW: usize = 10;

/// Every signal gathered for one request plus the ordered seed list.
///
/// `seeds[0]` is the closest neighbor (anchor); the remaining slots are
/// before, after, also-read pick, most recent, citing pick, reference pick, most cited.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub seeds: Vec<Bibcode>,
    pub before: Frequencies<Bibcode>,
    pub after: Frequencies<Bibcode>,
    pub also_read: Frequencies<Bibcode>,
    pub references: Frequencies<Bibcode>,
    pub citations: Frequencies<Bibcode>,
    pub most_recent: Bibcode,
    pub most_cited: Bibcode,
}

impl Synthesis {
    /// Seeds without the anchor
    pub fn candidates(&self) -> &[Bibcode] {
        self.seeds.get(1..).unwrap_or(&[])
    }
}

/// RecommendationSynthesizer
/// Blends co-read, citation and reference statistics of the neighbor set
/// into an ordered list of candidate bibcodes.
pub struct RecommendationSynthesizer<'a, I: ?Sized, S: ?Sized> {
    index: &'a I,
    store: &'a S,
    top_n: usize,
    pick_window: usize,
}

impl<'a, I, S> RecommendationSynthesizer<'a, I, S>
where
    I: SearchIndex + ?Sized,
    S: RelationalStore + ?Sized,
{
    pub fn new(index: &'a I, store: &'a S) -> Self {
        Self {
            index,
            store,
            top_n: DEFAULT_TOP_N,
            pick_window: DEFAULT_PICK_WINDOW,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_pick_window(mut self, pick_window: usize) -> Self {
        self.pick_window = pick_window;
        self
    }

    /// # Arguments
    /// * `neighbors` - neighbor bibcodes, closest first
    /// * `exclude` - bibcode to keep out of the also-read distribution (the query paper)
    /// * `rng` - source for the top-window picks
    pub fn synthesize<R>(&self, neighbors: &[Bibcode], exclude: Option<&str>, rng: &mut R) -> Result<Synthesis>
    where
        R: Rng + ?Sized,
    {
        let anchor = neighbors
            .first()
            .cloned()
            .ok_or_else(|| RecommendError::synthesis("neighbor set is empty"))?;

        // co-reads of the whole neighbor set
        let mut before_pairs: Vec<(Bibcode, u64)> = Vec::new();
        let mut after_pairs: Vec<(Bibcode, u64)> = Vec::new();
        let mut with_history = 0usize;
        for paper in neighbors {
            let Some(record) = self.store.co_reads(paper)? else {
                continue;
            };
            with_history += 1;
            before_pairs.extend(record.before.iter().cloned());
            after_pairs.extend(record.after.iter().cloned());
        }
        debug!(neighbors = neighbors.len(), with_history, "collected co-reads");

        // every co-read weighted by its count, minus the query paper
        let also_pairs: Vec<(Bibcode, u64)> = before_pairs
            .iter()
            .chain(after_pairs.iter())
            .filter(|(b, _)| Some(b.as_str()) != exclude)
            .cloned()
            .collect();

        let before = Frequencies::from_counts(before_pairs, self.top_n);
        let after = Frequencies::from_counts(after_pairs, self.top_n);
        let also_read = Frequencies::from_counts(also_pairs, self.top_n);
        let top_before = before
            .top()
            .cloned()
            .ok_or_else(|| RecommendError::synthesis("no papers read before any neighbor"))?;
        let top_after = match (after.top(), after.nth(1)) {
            (Some(first), Some(second)) if *first == top_before => second.clone(),
            (Some(first), _) => first.clone(),
            (None, _) => return Err(RecommendError::synthesis("no papers read after any neighbor")),
        };
        if also_read.is_empty() {
            return Err(RecommendError::synthesis("also-read distribution is empty"));
        }

        // metadata of the most also-read papers, only those with a reference list
        let top_also: Vec<Bibcode> = also_read.items().cloned().collect();
        let mut top_data: Vec<ArticleMeta> = self
            .index
            .query_metadata(&top_also)?
            .into_values()
            .filter(|m| m.references.is_some())
            .collect();
        let most_recent = top_data
            .first()
            .map(|m| m.bibcode.clone())
            .ok_or_else(|| RecommendError::synthesis("no metadata for the also-read papers"))?;
        top_data.sort_by(|a, b| b.citations().cmp(&a.citations()));
        let most_cited = top_data
            .first()
            .map(|m| m.bibcode.clone())
            .ok_or_else(|| RecommendError::synthesis("no metadata for the also-read papers"))?;

        let references = Frequencies::from_items(
            top_data.iter().flat_map(|m| m.references.iter().flatten().cloned()),
            self.top_n,
        );
        let citations = Frequencies::from_items(self.index.query_citing_papers(&top_also)?, self.top_n);

        let also_pick = self.pick(&also_read, rng, "also-read")?;
        let citation_pick = self.pick(&citations, rng, "citing papers")?;
        let reference_pick = self.pick(&references, rng, "references")?;

        let seeds = vec![
            anchor,
            top_before,
            top_after,
            also_pick,
            most_recent.clone(),
            citation_pick,
            reference_pick,
            most_cited.clone(),
        ];
        info!(
            also_read = also_read.len(),
            references = references.len(),
            citations = citations.len(),
            "synthesized recommendation seeds"
        );

        Ok(Synthesis {
            seeds,
            before,
            after,
            also_read,
            references,
            citations,
            most_recent,
            most_cited,
        })
    }

    fn pick<R>(&self, freq: &Frequencies<Bibcode>, rng: &mut R, what: &str) -> Result<Bibcode>
    where
        R: Rng + ?Sized,
    {
        freq.pick(rng, self.pick_window)
            .cloned()
            .ok_or_else(|| RecommendError::synthesis(format!("{what} distribution is empty")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{MemorySnapshot, SnapshotDocument};
    use crate::model::CoReadRecord;
    use rand::{rngs::StdRng, SeedableRng};

    fn pairs(items: &[(&str, u64)]) -> Vec<(Bibcode, u64)> {
        items.iter().map(|(b, c)| (b.to_string(), *c)).collect()
    }

    fn coreads(bibcode: &str, before: &[(&str, u64)], after: &[(&str, u64)]) -> CoReadRecord {
        CoReadRecord {
            bibcode: bibcode.to_string(),
            before: pairs(before),
            after: pairs(after),
        }
    }

    fn doc(bibcode: &str, pubdate: &str, cites: Option<u64>, refs: Option<&[&str]>, cited_by: &[&str]) -> SnapshotDocument {
        SnapshotDocument {
            bibcode: bibcode.to_string(),
            title: vec![format!("Title of {bibcode}")],
            authors: vec![format!("Author{bibcode}, A.")],
            citation_count: cites,
            references: refs.map(|r| r.iter().map(|s| s.to_string()).collect()),
            citations: cited_by.iter().map(|s| s.to_string()).collect(),
            pubdate: Some(pubdate.to_string()),
            ..Default::default()
        }
    }

    fn snapshot() -> MemorySnapshot {
        MemorySnapshot {
            documents: vec![
                doc("X", "2010-01-00", Some(5), Some(&["R1", "R2"]), &["C1"]),
                doc("Y", "2012-06-00", None, Some(&["R1"]), &["C1", "C2"]),
                doc("Z", "2011-00-00", Some(40), Some(&["R3"]), &[]),
                doc("W", "2015-00-00", Some(1), None, &["C3"]),
            ],
            coreads: vec![
                coreads("N1", &[("X", 5), ("Q", 2)], &[("X", 5), ("Y", 3)]),
                coreads("N2", &[("Z", 1)], &[("W", 2)]),
            ],
            ..Default::default()
        }
    }

    fn neighbors(items: &[&str]) -> Vec<Bibcode> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn after_slot_avoids_before_top() {
        let store = snapshot();
        let mut rng = StdRng::seed_from_u64(3);
        let synthesis = RecommendationSynthesizer::new(&store, &store)
            .synthesize(&neighbors(&["N1", "N2", "N3"]), Some("Q"), &mut rng)
            .unwrap();
        assert_eq!(synthesis.seeds[0], "N1");
        assert_eq!(synthesis.before.top().unwrap(), "X");
        assert_eq!(synthesis.after.top().unwrap(), "X");
        // highest after entry equals highest before entry -> second one
        assert_eq!(synthesis.seeds[2], "Y");
        assert_eq!(synthesis.seeds.len(), 8);
    }

    #[test]
    fn deterministic_signals() {
        let store = snapshot();
        let mut rng = StdRng::seed_from_u64(11);
        let synthesis = RecommendationSynthesizer::new(&store, &store)
            .synthesize(&neighbors(&["N1", "N2"]), Some("Q"), &mut rng)
            .unwrap();
        // X: 5+5, Y: 3, W: 2, Z: 1; Q excluded
        assert_eq!(
            synthesis.also_read.list,
            pairs(&[("X", 10), ("Y", 3), ("W", 2), ("Z", 1)])
        );
        // W has no reference list and is skipped; Y is the newest remaining
        assert_eq!(synthesis.most_recent, "Y");
        assert_eq!(synthesis.most_cited, "Z");
        assert_eq!(synthesis.references.list, pairs(&[("R1", 2), ("R2", 1), ("R3", 1)]));
        assert_eq!(synthesis.citations.list, pairs(&[("C1", 2), ("C2", 1), ("C3", 1)]));
        assert_eq!(synthesis.seeds[4], "Y");
        assert_eq!(synthesis.seeds[7], "Z");
    }

    #[test]
    fn random_picks_stay_in_window() {
        let store = snapshot();
        let synthesizer = RecommendationSynthesizer::new(&store, &store).with_pick_window(2);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let s = synthesizer
                .synthesize(&neighbors(&["N1", "N2"]), Some("Q"), &mut rng)
                .unwrap();
            assert!(["X", "Y"].contains(&s.seeds[3].as_str()));
            assert!(["C1", "C2"].contains(&s.seeds[5].as_str()));
            assert!(["R1", "R2"].contains(&s.seeds[6].as_str()));
        }
    }

    #[test]
    fn single_after_entry_equal_to_before_is_kept() {
        let mut store = snapshot();
        store.coreads = vec![coreads("N1", &[("X", 2)], &[("X", 1)])];
        let mut rng = StdRng::seed_from_u64(0);
        let s = RecommendationSynthesizer::new(&store, &store)
            .synthesize(&neighbors(&["N1"]), None, &mut rng)
            .unwrap();
        assert_eq!(s.seeds[1], "X");
        assert_eq!(s.seeds[2], "X");
    }

    #[test]
    fn no_reader_history_is_a_synthesis_error() {
        let store = snapshot();
        let mut rng = StdRng::seed_from_u64(0);
        let err = RecommendationSynthesizer::new(&store, &store)
            .synthesize(&neighbors(&["N7", "N8"]), None, &mut rng)
            .unwrap_err();
        assert!(matches!(err, RecommendError::SynthesisError { .. }));
    }

    #[test]
    fn empty_neighbor_set() {
        let store = snapshot();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            RecommendationSynthesizer::new(&store, &store).synthesize(&[], None, &mut rng),
            Err(RecommendError::SynthesisError { .. })
        ));
    }

    #[test]
    fn missing_citations_are_a_synthesis_error() {
        let mut store = snapshot();
        for d in store.documents.iter_mut() {
            d.citations.clear();
        }
        let mut rng = StdRng::seed_from_u64(0);
        let err = RecommendationSynthesizer::new(&store, &store)
            .synthesize(&neighbors(&["N1"]), Some("Q"), &mut rng)
            .unwrap_err();
        assert_eq!(err, RecommendError::synthesis("citing papers distribution is empty"));
    }
}
