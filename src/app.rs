use std::path::PathBuf;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::cache::PathwayCache;
use crate::error::Ko2PathwayError;
use crate::extract::extract_kos;
use crate::filter::ExclusionTerms;
use crate::kegg::KeggClient;
use crate::plot::render_circular_barplot;
use crate::resolve::{ResolveOptions, ResolveStats, Resolver};
use crate::summary::{PLOT_TOP_N, SummaryRow, summarize, top, write_summary};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub exclude: Option<PathBuf>,
    pub cache: Utf8PathBuf,
    pub output: PathBuf,
    /// Chart destination; `None` disables plotting.
    pub plot: Option<PathBuf>,
    pub offline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub generated_at: String,
    pub input: String,
    pub output: String,
    pub cache: String,
    pub plot: Option<String>,
    pub ko_count: usize,
    pub resolve: ResolveStats,
    pub pathways_found: usize,
    pub pathways_excluded: usize,
    pub rows: Vec<SummaryRow>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Runs the extract -> resolve -> aggregate -> filter -> emit pipeline.
pub struct App<K: KeggClient> {
    kegg: K,
}

impl<K: KeggClient> App<K> {
    pub fn new(kegg: K) -> Self {
        Self { kegg }
    }

    pub fn run(
        &self,
        options: &RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, Ko2PathwayError> {
        let started = Instant::now();

        sink.event(ProgressEvent {
            message: format!("phase=Extract; reading {}", options.input.display()),
            elapsed: None,
        });
        let kos = extract_kos(&options.input)?;
        info!(kos = kos.len(), "extracted KO identifiers");

        let exclusions = match &options.exclude {
            Some(path) => ExclusionTerms::load(path)?,
            None => ExclusionTerms::default(),
        };

        sink.event(ProgressEvent {
            message: format!("phase=Resolve; {} KOs, cache {}", kos.len(), options.cache),
            elapsed: None,
        });
        let mut cache = PathwayCache::load(&options.cache);
        let resolution = Resolver::new(
            &self.kegg,
            ResolveOptions {
                offline: options.offline,
            },
        )
        .resolve(&kos, &mut cache, Some(options.cache.as_path()), sink);

        sink.event(ProgressEvent {
            message: "phase=Aggregate; counting KOs per pathway".to_string(),
            elapsed: None,
        });
        let mut counts = aggregate(&resolution.pathways);
        let pathways_found = counts.len();
        let pathways_excluded = exclusions.apply(&mut counts);
        if pathways_excluded > 0 {
            info!(pathways_excluded, "applied exclusion terms");
        }

        let rows = summarize(&counts);
        sink.event(ProgressEvent {
            message: format!("phase=Emit; writing {}", options.output.display()),
            elapsed: None,
        });
        write_summary(&options.output, &rows)?;
        info!(path = %options.output.display(), rows = rows.len(), "summary written");

        let mut plot = None;
        if let Some(path) = &options.plot {
            if rows.is_empty() {
                warn!("no pathways left after filtering, skipping chart");
            } else {
                render_circular_barplot(path, top(&rows, PLOT_TOP_N))?;
                plot = Some(path.display().to_string());
            }
        }

        sink.event(ProgressEvent {
            message: "phase=Done".to_string(),
            elapsed: Some(started.elapsed()),
        });

        Ok(RunResult {
            generated_at: iso_timestamp(),
            input: options.input.display().to_string(),
            output: options.output.display().to_string(),
            cache: options.cache.to_string(),
            plot,
            ko_count: kos.len(),
            resolve: resolution.stats,
            pathways_found,
            pathways_excluded,
            rows,
        })
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
