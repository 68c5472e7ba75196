use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use ahash::RandomState;
use dashmap::DashMap;
use tracing::{debug, info};

use super::{read_data_file, MatrixLookup, ProjectionStore, UpstreamError, UpstreamResult};
use crate::pipeline::projector::{ProjectionKey, ProjectionMatrix};

/// File name stem of a projection matrix
pub fn projection_file_stem(key: ProjectionKey) -> String {
    format!("clusterprojection_{}", key.file_id())
}

/// Projection matrices stored as `clusterprojection_<id>.cbor` (or `.json`)
/// in one directory. Matrices are loaded on first use and kept for the
/// lifetime of the process; they are trained offline and never change.
#[derive(Debug)]
pub struct FileProjectionStore {
    dir: PathBuf,
    cache: DashMap<ProjectionKey, Arc<ProjectionMatrix>, RandomState>,
}

impl FileProjectionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: DashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of matrices currently cached
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn locate(&self, key: ProjectionKey) -> Option<PathBuf> {
        let stem = projection_file_stem(key);
        ["cbor", "json"]
            .iter()
            .map(|ext| self.dir.join(format!("{stem}.{ext}")))
            .find(|p| p.is_file())
    }
}

impl ProjectionStore for FileProjectionStore {
    fn load_matrix(&self, key: ProjectionKey) -> UpstreamResult<MatrixLookup> {
        if let Some(matrix) = self.cache.get(&key) {
            return Ok(MatrixLookup::Found(Arc::clone(matrix.value())));
        }
        let Some(path) = self.locate(key) else {
            debug!(%key, dir = %self.dir.display(), "no projection file");
            return Ok(MatrixLookup::NotFound);
        };
        let matrix: ProjectionMatrix = read_data_file(&path)?;
        if !matrix.is_well_formed() {
            return Err(UpstreamError::new(
                None,
                format!("malformed projection matrix in {}", path.display()),
            ));
        }
        info!(%key, rows = matrix.rows(), cols = matrix.cols(), "loaded projection matrix");
        let matrix = Arc::new(matrix);
        // 同時ロード時は先に入った方を使う
        let cached = self.cache.entry(key).or_insert(matrix);
        Ok(MatrixLookup::Found(Arc::clone(cached.value())))
    }
}

/// Fixed set of matrices held in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryProjectionStore {
    matrices: HashMap<ProjectionKey, Arc<ProjectionMatrix>, RandomState>,
}

impl MemoryProjectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ProjectionKey, matrix: ProjectionMatrix) -> &mut Self {
        self.matrices.insert(key, Arc::new(matrix));
        self
    }
}

impl ProjectionStore for MemoryProjectionStore {
    fn load_matrix(&self, key: ProjectionKey) -> UpstreamResult<MatrixLookup> {
        Ok(match self.matrices.get(&key) {
            Some(m) => MatrixLookup::Found(Arc::clone(m)),
            None => MatrixLookup::NotFound,
        })
    }
}
