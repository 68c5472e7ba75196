//! In-memory search index and relational store.
//!
//! Backed by a serde snapshot so a whole deployment (documents, clusters,
//! cluster coordinates, co-reads) can be loaded from one JSON or CBOR file.
//! Lookups are linear scans; fine for tests and small snapshots.

use std::{
    cmp::Ordering as CmpOrdering,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{read_data_file, LoadError, RelationalStore, SearchIndex, UpstreamResult};
use crate::model::{ArticleMeta, Bibcode, Cluster, ClusterId, ClusteringEntry, CoReadRecord, PubDate, Vocabulary};

fn default_max_hits() -> usize {
    10_000
}

/// One indexed document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub bibcode: Bibcode,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub citation_count: Option<u64>,
    /// papers this document cites
    #[serde(default)]
    pub references: Option<Vec<Bibcode>>,
    /// papers citing this document
    #[serde(default)]
    pub citations: Vec<Bibcode>,
    #[serde(default)]
    pub pubdate: Option<String>,
}

impl SnapshotDocument {
    fn to_meta(&self) -> ArticleMeta {
        ArticleMeta {
            bibcode: self.bibcode.clone(),
            title: self.title.first().cloned(),
            first_author: self.authors.first().cloned(),
            citation_count: self.citation_count,
            references: self.references.clone(),
            pubdate: self.pubdate.clone(),
        }
    }
}

/// Snapshot-backed `SearchIndex` + `RelationalStore`
#[derive(Debug, Serialize, Deserialize)]
pub struct MemorySnapshot {
    #[serde(default)]
    pub documents: Vec<SnapshotDocument>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub clustering: Vec<ClusteringEntry>,
    #[serde(default)]
    pub coreads: Vec<CoReadRecord>,
    /// row limit applied to index queries, set from `RecommenderConfig::max_hits`
    #[serde(skip, default = "default_max_hits")]
    pub max_hits: usize,
    #[serde(skip)]
    pub(crate) list_clusters_calls: AtomicUsize,
}

impl Default for MemorySnapshot {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            clusters: Vec::new(),
            clustering: Vec::new(),
            coreads: Vec::new(),
            max_hits: default_max_hits(),
            list_clusters_calls: AtomicUsize::new(0),
        }
    }
}

impl MemorySnapshot {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        read_data_file(path)
    }

    pub fn with_max_hits(mut self, max_hits: usize) -> Self {
        self.max_hits = max_hits;
        self
    }

    /// Number of full cluster scans served so far
    pub fn list_clusters_calls(&self) -> usize {
        self.list_clusters_calls.load(Ordering::Relaxed)
    }

    /// Every keyword of the snapshot, in first-seen order
    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::new(self.documents.iter().flat_map(|d| d.keywords.iter()))
    }

    fn document(&self, bibcode: &str) -> Option<&SnapshotDocument> {
        self.documents.iter().find(|d| d.bibcode == bibcode)
    }

    /// Found documents in native order: newest first, then bibcode descending
    fn sorted_hits(&self, bibcodes: &[Bibcode]) -> Vec<&SnapshotDocument> {
        let mut hits: Vec<&SnapshotDocument> = self
            .documents
            .iter()
            .filter(|d| bibcodes.contains(&d.bibcode))
            .collect();
        hits.sort_by(|a, b| native_order(a, b));
        hits.truncate(self.max_hits);
        hits
    }
}

fn native_order(a: &SnapshotDocument, b: &SnapshotDocument) -> CmpOrdering {
    let da = a.pubdate.as_deref().and_then(|d| d.parse::<PubDate>().ok());
    let db = b.pubdate.as_deref().and_then(|d| d.parse::<PubDate>().ok());
    db.cmp(&da).then_with(|| b.bibcode.cmp(&a.bibcode))
}

impl SearchIndex for MemorySnapshot {
    fn query_keywords(&self, bibcode: &str) -> UpstreamResult<Vec<String>> {
        let Some(doc) = self.document(bibcode) else {
            return Ok(Vec::new());
        };
        let mut docs = vec![doc];
        for reference in doc.references.iter().flatten() {
            if let Some(r) = self.document(reference) {
                docs.push(r);
            }
        }
        docs.truncate(self.max_hits);
        Ok(docs
            .iter()
            .flat_map(|d| d.keywords.iter().map(|k| k.to_lowercase()))
            .collect())
    }

    fn query_metadata(&self, bibcodes: &[Bibcode]) -> UpstreamResult<IndexMap<Bibcode, ArticleMeta>> {
        Ok(self
            .sorted_hits(bibcodes)
            .into_iter()
            .map(|d| (d.bibcode.clone(), d.to_meta()))
            .collect())
    }

    fn query_citing_papers(&self, bibcodes: &[Bibcode]) -> UpstreamResult<Vec<Bibcode>> {
        Ok(self
            .sorted_hits(bibcodes)
            .into_iter()
            .flat_map(|d| d.citations.iter().cloned())
            .collect())
    }
}

impl RelationalStore for MemorySnapshot {
    fn cluster_by_member(&self, bibcode: &str) -> UpstreamResult<Option<Cluster>> {
        Ok(self.clusters.iter().find(|c| c.has_member(bibcode)).cloned())
    }

    fn list_clusters(&self) -> UpstreamResult<Vec<Cluster>> {
        self.list_clusters_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.clusters.clone())
    }

    fn list_clustering_entries(&self, cluster: ClusterId) -> UpstreamResult<Vec<ClusteringEntry>> {
        Ok(self
            .clustering
            .iter()
            .filter(|e| e.cluster == cluster)
            .cloned()
            .collect())
    }

    fn co_reads(&self, bibcode: &str) -> UpstreamResult<Option<CoReadRecord>> {
        Ok(self.coreads.iter().find(|r| r.bibcode == bibcode).cloned())
    }
}
