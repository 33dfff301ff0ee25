use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

use camino::Utf8Path;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::cache::PathwayCache;
use crate::domain::{KoId, PathwayId, PathwayRecord};
use crate::error::Ko2PathwayError;
use crate::kegg::KeggClient;

/// Title recorded for a linked pathway whose listing could not be fetched.
pub const UNKNOWN_DESCRIPTION: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Do not contact KEGG; cache misses are skipped and not recorded.
    pub offline: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    pub cache_hits: usize,
    pub fetched: usize,
    pub failed: usize,
    pub skipped: usize,
    pub untitled: usize,
    pub remote_requests: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub pathways: BTreeMap<KoId, Vec<PathwayRecord>>,
    pub stats: ResolveStats,
}

/// Resolves KOs through the cache, falling back to `client` for misses.
pub struct Resolver<'a, K: KeggClient> {
    client: &'a K,
    options: ResolveOptions,
    descriptions: HashMap<PathwayId, String>,
    remote_requests: usize,
    untitled: usize,
}

impl<'a, K: KeggClient> Resolver<'a, K> {
    pub fn new(client: &'a K, options: ResolveOptions) -> Self {
        Self {
            client,
            options,
            descriptions: HashMap::new(),
            remote_requests: 0,
            untitled: 0,
        }
    }

    /// Each KO is looked up at most once. When `cache_path` is set the cache is
    /// saved after every new entry and once more at the end; save failures only warn.
    pub fn resolve(
        mut self,
        kos: &BTreeSet<KoId>,
        cache: &mut PathwayCache,
        cache_path: Option<&Utf8Path>,
        sink: &dyn ProgressSink,
    ) -> Resolution {
        self.seed_descriptions(cache);

        let total = kos.len();
        let mut resolution = Resolution::default();
        let mut dirty = false;
        let mut incremental = cache_path.is_some();

        for (index, ko) in kos.iter().enumerate() {
            if let Some(records) = cache.lookup(ko) {
                resolution.stats.cache_hits += 1;
                resolution.pathways.insert(ko.clone(), records.to_vec());
                continue;
            }
            if self.options.offline {
                debug!(%ko, "offline, skipping cache miss");
                resolution.stats.skipped += 1;
                continue;
            }

            sink.event(ProgressEvent {
                message: format!("phase=Resolve; {ko} ({}/{total})", index + 1),
                elapsed: None,
            });
            let start = Instant::now();
            let records = match self.fetch(ko) {
                Ok(records) => {
                    if records.is_empty() {
                        debug!(%ko, "no pathways linked");
                    }
                    resolution.stats.fetched += 1;
                    records
                }
                Err(err) => {
                    warn!(%ko, error = %err, "pathway lookup failed, recording no pathways");
                    resolution.stats.failed += 1;
                    Vec::new()
                }
            };
            sink.event(ProgressEvent {
                message: format!("kegg.resolved {ko} pathways={}", records.len()),
                elapsed: Some(start.elapsed()),
            });

            cache.insert(ko.clone(), records.clone());
            resolution.pathways.insert(ko.clone(), records);
            dirty = true;

            if let (true, Some(path)) = (incremental, cache_path) {
                if let Err(err) = cache.save(path) {
                    warn!(error = %err, "incremental cache save failed, deferring to end of run");
                    incremental = false;
                }
            }
        }

        if let Some(path) = cache_path {
            if dirty || !path.as_std_path().exists() {
                if let Err(err) = cache.save(path) {
                    warn!(error = %err, "final cache save failed");
                }
            }
        }

        resolution.stats.remote_requests = self.remote_requests;
        resolution.stats.untitled = self.untitled;
        info!(
            kos = total,
            cache_hits = resolution.stats.cache_hits,
            fetched = resolution.stats.fetched,
            failed = resolution.stats.failed,
            untitled = resolution.stats.untitled,
            skipped = resolution.stats.skipped,
            "resolved KOs"
        );
        resolution
    }

    fn seed_descriptions(&mut self, cache: &PathwayCache) {
        for (_, records) in cache.iter() {
            for record in records {
                if record.description == UNKNOWN_DESCRIPTION {
                    continue;
                }
                self.descriptions
                    .entry(record.pathway_id.clone())
                    .or_insert_with(|| record.description.clone());
            }
        }
    }

    fn fetch(&mut self, ko: &KoId) -> Result<Vec<PathwayRecord>, Ko2PathwayError> {
        self.remote_requests += 1;
        let pathway_ids = self.client.link_pathways(ko)?;
        let mut records = Vec::with_capacity(pathway_ids.len());
        for pathway_id in pathway_ids {
            let description = self.describe(&pathway_id);
            records.push(PathwayRecord::new(pathway_id, description));
        }
        Ok(records)
    }

    /// A failed title lookup keeps the link under [`UNKNOWN_DESCRIPTION`] and is not retried this run.
    fn describe(&mut self, pathway_id: &PathwayId) -> String {
        if let Some(description) = self.descriptions.get(pathway_id) {
            return description.clone();
        }
        self.remote_requests += 1;
        let description = match self.client.pathway_description(pathway_id) {
            Ok(description) => description,
            Err(err) => {
                warn!(pathway = %pathway_id, error = %err, "pathway title lookup failed");
                self.untitled += 1;
                UNKNOWN_DESCRIPTION.to_string()
            }
        };
        self.descriptions
            .insert(pathway_id.clone(), description.clone());
        description
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;
    use std::sync::Mutex;

    use camino::Utf8PathBuf;

    use super::*;

    struct NoopSink;

    impl ProgressSink for NoopSink {
        fn event(&self, _event: ProgressEvent) {}
    }

    #[derive(Default)]
    struct MockKegg {
        links: HashMap<String, Vec<&'static str>>,
        failing_titles: HashSet<&'static str>,
        before_link: Option<Box<dyn Fn(&KoId)>>,
        link_calls: Mutex<Vec<String>>,
        description_calls: Mutex<usize>,
    }

    impl MockKegg {
        fn with_link(mut self, ko: &str, pathways: &[&'static str]) -> Self {
            self.links.insert(ko.to_string(), pathways.to_vec());
            self
        }

        fn with_failing_title(mut self, pathway: &'static str) -> Self {
            self.failing_titles.insert(pathway);
            self
        }

        fn before_link(mut self, hook: impl Fn(&KoId) + 'static) -> Self {
            self.before_link = Some(Box::new(hook));
            self
        }
    }

    impl KeggClient for MockKegg {
        fn link_pathways(&self, ko: &KoId) -> Result<Vec<PathwayId>, Ko2PathwayError> {
            if let Some(hook) = &self.before_link {
                hook(ko);
            }
            self.link_calls.lock().unwrap().push(ko.to_string());
            match self.links.get(ko.as_str()) {
                Some(ids) => Ok(ids.iter().map(|id| id.parse().unwrap()).collect()),
                None => Err(Ko2PathwayError::KeggHttp("connection refused".to_string())),
            }
        }

        fn pathway_description(&self, pathway: &PathwayId) -> Result<String, Ko2PathwayError> {
            *self.description_calls.lock().unwrap() += 1;
            if self.failing_titles.contains(pathway.as_str()) {
                return Err(Ko2PathwayError::KeggStatus {
                    status: 503,
                    message: "Service Unavailable".to_string(),
                });
            }
            Ok(format!("Pathway {pathway}"))
        }
    }

    fn kos(values: &[&str]) -> BTreeSet<KoId> {
        values.iter().map(|value| value.parse().unwrap()).collect()
    }

    #[test]
    fn descriptions_fetched_once_per_pathway() {
        let client = MockKegg::default()
            .with_link("ko:K00001", &["map00010", "map00020"])
            .with_link("ko:K00002", &["map00010"]);
        let mut cache = PathwayCache::new();

        let resolution = Resolver::new(&client, ResolveOptions::default()).resolve(
            &kos(&["K00001", "K00002"]),
            &mut cache,
            None,
            &NoopSink,
        );

        assert_eq!(resolution.stats.fetched, 2);
        assert_eq!(*client.description_calls.lock().unwrap(), 2);
        assert_eq!(resolution.stats.remote_requests, 4);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_lookup_cached_as_empty() {
        let client = MockKegg::default();
        let mut cache = PathwayCache::new();
        let ko: KoId = "K09999".parse().unwrap();

        let resolution = Resolver::new(&client, ResolveOptions::default()).resolve(
            &kos(&["K09999"]),
            &mut cache,
            None,
            &NoopSink,
        );

        assert_eq!(resolution.stats.failed, 1);
        assert!(resolution.pathways[&ko].is_empty());
        assert_eq!(cache.lookup(&ko).map(|records| records.len()), Some(0));
    }

    #[test]
    fn offline_skips_misses_without_caching() {
        let client = MockKegg::default().with_link("ko:K00001", &["map00010"]);
        let mut cache = PathwayCache::new();

        let resolution = Resolver::new(&client, ResolveOptions { offline: true }).resolve(
            &kos(&["K00001"]),
            &mut cache,
            None,
            &NoopSink,
        );

        assert_eq!(resolution.stats.skipped, 1);
        assert!(resolution.pathways.is_empty());
        assert!(cache.is_empty());
        assert!(client.link_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn cached_descriptions_reused_for_new_kos() {
        let client = MockKegg::default().with_link("ko:K00002", &["map00010"]);
        let mut cache = PathwayCache::new();
        cache.insert(
            "K00001".parse().unwrap(),
            vec![PathwayRecord::new("map00010".parse().unwrap(), "Glycolysis")],
        );

        let resolution = Resolver::new(&client, ResolveOptions::default()).resolve(
            &kos(&["K00001", "K00002"]),
            &mut cache,
            None,
            &NoopSink,
        );

        assert_eq!(resolution.stats.cache_hits, 1);
        assert_eq!(*client.description_calls.lock().unwrap(), 0);
        let ko: KoId = "K00002".parse().unwrap();
        assert_eq!(resolution.pathways[&ko][0].description, "Glycolysis");
    }

    #[test]
    fn failed_title_keeps_other_links() {
        let client = MockKegg::default()
            .with_link("ko:K00001", &["map00010", "map99999"])
            .with_link("ko:K00002", &["map00010", "map99999"])
            .with_failing_title("map99999");
        let mut cache = PathwayCache::new();

        let resolution = Resolver::new(&client, ResolveOptions::default()).resolve(
            &kos(&["K00001", "K00002"]),
            &mut cache,
            None,
            &NoopSink,
        );

        assert_eq!(resolution.stats.fetched, 2);
        assert_eq!(resolution.stats.failed, 0);
        assert_eq!(resolution.stats.untitled, 1);
        assert_eq!(*client.description_calls.lock().unwrap(), 2);
        for ko in kos(&["K00001", "K00002"]) {
            let records = &resolution.pathways[&ko];
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].description, "Pathway map00010");
            assert_eq!(records[1].description, UNKNOWN_DESCRIPTION);
            assert_eq!(cache.lookup(&ko).map(|records| records.len()), Some(2));
        }
    }

    #[test]
    fn unknown_titles_not_reused_from_cache() {
        let client = MockKegg::default().with_link("ko:K00002", &["map00010"]);
        let mut cache = PathwayCache::new();
        cache.insert(
            "K00001".parse().unwrap(),
            vec![PathwayRecord::new(
                "map00010".parse().unwrap(),
                UNKNOWN_DESCRIPTION,
            )],
        );

        let resolution = Resolver::new(&client, ResolveOptions::default()).resolve(
            &kos(&["K00001", "K00002"]),
            &mut cache,
            None,
            &NoopSink,
        );

        let ko: KoId = "K00002".parse().unwrap();
        assert_eq!(*client.description_calls.lock().unwrap(), 1);
        assert_eq!(resolution.pathways[&ko][0].description, "Pathway map00010");
    }

    #[test]
    fn cache_saved_after_each_resolution() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("cache.json")).unwrap();
        let seen = std::rc::Rc::new(Mutex::new(Vec::<(String, Vec<String>)>::new()));
        let client = {
            let path = path.clone();
            let seen = seen.clone();
            MockKegg::default()
                .with_link("ko:K00001", &["map00010"])
                .with_link("ko:K00002", &["map00020"])
                .before_link(move |ko| {
                    let stored: Vec<String> = PathwayCache::try_load(&path)
                        .unwrap()
                        .map(|cache| cache.iter().map(|(stored, _)| stored.to_string()).collect())
                        .unwrap_or_default();
                    seen.lock().unwrap().push((ko.to_string(), stored));
                })
        };
        let mut cache = PathwayCache::new();

        Resolver::new(&client, ResolveOptions::default()).resolve(
            &kos(&["K00001", "K00002"]),
            &mut cache,
            Some(&path),
            &NoopSink,
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("ko:K00001".to_string(), Vec::<String>::new()));
        assert_eq!(seen[1], ("ko:K00002".to_string(), vec!["ko:K00001".to_string()]));
        assert_eq!(PathwayCache::try_load(&path).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn failed_incremental_save_retried_at_end() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("state");
        fs::write(&blocker, "not a directory").unwrap();
        let path = Utf8PathBuf::from_path_buf(blocker.join("cache.json")).unwrap();
        let client = {
            let blocker = blocker.clone();
            MockKegg::default()
                .with_link("ko:K00001", &["map00010"])
                .with_link("ko:K00002", &["map00020"])
                .before_link(move |ko| {
                    if ko.accession() == "K00002" {
                        fs::remove_file(&blocker).unwrap();
                    }
                })
        };
        let mut cache = PathwayCache::new();

        let resolution = Resolver::new(&client, ResolveOptions::default()).resolve(
            &kos(&["K00001", "K00002"]),
            &mut cache,
            Some(&path),
            &NoopSink,
        );

        assert_eq!(resolution.stats.fetched, 2);
        let stored = PathwayCache::try_load(&path).unwrap().unwrap();
        assert_eq!(stored, cache);
        assert_eq!(stored.len(), 2);
    }
}
