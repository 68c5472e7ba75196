use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Instant};

use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use paper_recommender::collab::read_data_file;
use paper_recommender::{
    FileProjectionStore, MemorySnapshot, RecommendError, Recommender, RecommenderConfig, Vocabulary,
};

#[derive(Parser, Debug)]
#[command(
    name = "paper-recommender",
    about = "Recommend related papers for one or more bibcodes"
)]
struct Cli {
    /// Configuration file (JSON or CBOR).
    #[arg(long, env = "RECOMMENDER_CONFIG")]
    config: Option<PathBuf>,

    /// Snapshot holding documents, clusters and co-reads (JSON or CBOR).
    #[arg(long, env = "RECOMMENDER_SNAPSHOT")]
    snapshot: PathBuf,

    /// Keyword list fixing the vector dimensions; defaults to the snapshot's keywords.
    #[arg(long, env = "RECOMMENDER_VOCABULARY")]
    vocabulary: Option<PathBuf>,

    /// Directory of `clusterprojection_<id>` files.
    #[arg(long)]
    projections: Option<PathBuf>,

    /// Number of nearest cluster members to use.
    #[arg(long)]
    max_neighbors: Option<usize>,

    /// Seed for the random picks; omitted means a fresh thread rng per request.
    #[arg(long)]
    seed: Option<u64>,

    /// Bibcodes to recommend for.
    #[arg(required = true)]
    bibcodes: Vec<String>,
}

fn load_config(cli: &Cli) -> Result<RecommenderConfig, RecommendError> {
    let mut config = match &cli.config {
        Some(path) => RecommenderConfig::from_file(path)?,
        None => RecommenderConfig::default(),
    }
    .with_env_overrides()?;
    if let Some(dir) = &cli.projections {
        config.projection_dir = dir.clone();
    }
    if let Some(k) = cli.max_neighbors {
        config.max_neighbors = k;
    }
    Ok(config)
}

fn build(cli: &Cli) -> Result<Recommender<Arc<MemorySnapshot>, Arc<MemorySnapshot>, FileProjectionStore>, RecommendError> {
    let config = load_config(cli)?;
    let snapshot = MemorySnapshot::from_path(&cli.snapshot)
        .map_err(|e| RecommendError::InvalidConfig(e.to_string()))?
        .with_max_hits(config.max_hits);
    let vocab = match &cli.vocabulary {
        Some(path) => read_data_file::<Vocabulary>(path).map_err(|e| RecommendError::InvalidConfig(e.to_string()))?,
        None => snapshot.vocabulary(),
    };
    info!(
        documents = snapshot.documents.len(),
        clusters = snapshot.clusters.len(),
        vocabulary = vocab.len(),
        projections = %config.projection_dir.display(),
        "loaded snapshot"
    );
    let snapshot = Arc::new(snapshot);
    let projections = FileProjectionStore::new(config.projection_dir.clone());
    Recommender::new(Arc::new(vocab), Arc::clone(&snapshot), snapshot, projections, config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let recommender = match build(&cli) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "cannot start recommender");
            return ExitCode::from(2);
        }
    };

    let mut seeded = cli.seed.map(StdRng::seed_from_u64);
    let mut failed = false;
    for bibcode in &cli.bibcodes {
        let started = Instant::now();
        let outcome = match seeded.as_mut() {
            Some(rng) => recommender.get_recommendations_with_rng(bibcode, rng),
            None => recommender.get_recommendations(bibcode),
        };
        let rendered = match outcome {
            Ok(result) => serde_json::to_string(&result),
            Err(e) => {
                failed = true;
                error!(%bibcode, stage = %e.stage, error = %e.kind, "recommendation failed");
                serde_json::to_string(&e.payload())
            }
        };
        match rendered {
            Ok(line) => println!("{line}"),
            Err(e) => {
                failed = true;
                error!(%bibcode, error = %e, "cannot render output");
            }
        }
        info!(%bibcode, elapsed_ms = started.elapsed().as_secs_f64() * 1000.0, "done");
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
