//! End-to-end store scenarios against an in-memory index.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chunkstore::{Config, Error, SeriesIndexStore, StoreMetrics};
use common::chunk::{Chunk, ChunkFetcher, ChunkFilterer, ChunkRef, FetchError, RequestChunkFilterer};
use common::index::in_memory::InMemoryIndex;
use common::index::{IndexError, IndexQuery};
use common::labels::{Labels, METRIC_NAME_LABEL};
use common::matchers::{MatchType, Matcher, ShardAnnotation, SHARD_LABEL};
use common::schema::{SchemaError, SeriesStoreSchema};
use common::serde::{encode_entry_range, encode_label_names};
use common::TimeMs;

const TENANT: &str = "t1";
const METRIC: &str = "logs";

/// Schema used by the tests.
///
/// Series rows live under `tenant:metric` (all series of a metric) and
/// `tenant:metric:label` (series carrying a label); exact-value lookups add
/// a value-equality filter. Chunk rows live under `tenant:series`.
struct TestSchema {
    label_names_supported: bool,
    recorded_shards: Mutex<Vec<Option<ShardAnnotation>>>,
}

impl TestSchema {
    fn new(label_names_supported: bool) -> Self {
        Self {
            label_names_supported,
            recorded_shards: Mutex::new(Vec::new()),
        }
    }
}

impl SeriesStoreSchema for TestSchema {
    fn read_queries_for_metric(
        &self,
        _from: TimeMs,
        _through: TimeMs,
        tenant: &str,
        metric_name: &str,
    ) -> Result<Vec<IndexQuery>, SchemaError> {
        Ok(vec![IndexQuery::new(
            "series",
            format!("{}:{}", tenant, metric_name),
        )])
    }

    fn read_queries_for_metric_label(
        &self,
        _from: TimeMs,
        _through: TimeMs,
        tenant: &str,
        metric_name: &str,
        label_name: &str,
    ) -> Result<Vec<IndexQuery>, SchemaError> {
        Ok(vec![IndexQuery::new(
            "series",
            format!("{}:{}:{}", tenant, metric_name, label_name),
        )])
    }

    fn read_queries_for_metric_label_value(
        &self,
        _from: TimeMs,
        _through: TimeMs,
        tenant: &str,
        metric_name: &str,
        label_name: &str,
        label_value: &str,
    ) -> Result<Vec<IndexQuery>, SchemaError> {
        Ok(vec![IndexQuery::new(
            "series",
            format!("{}:{}:{}", tenant, metric_name, label_name),
        )
        .with_value_equal(Bytes::copy_from_slice(label_value.as_bytes()))])
    }

    fn chunks_for_series(
        &self,
        _from: TimeMs,
        _through: TimeMs,
        tenant: &str,
        series_id: &str,
    ) -> Result<Vec<IndexQuery>, SchemaError> {
        Ok(vec![IndexQuery::new(
            "chunks",
            format!("{}:{}", tenant, series_id),
        )])
    }

    fn label_names_for_series(
        &self,
        _from: TimeMs,
        _through: TimeMs,
        tenant: &str,
        series_id: &str,
    ) -> Result<Vec<IndexQuery>, SchemaError> {
        if !self.label_names_supported {
            return Err(SchemaError::NotSupported);
        }
        Ok(vec![IndexQuery::new(
            "labelnames",
            format!("{}:{}", tenant, series_id),
        )])
    }

    fn filter_read_queries(
        &self,
        queries: Vec<IndexQuery>,
        shard: Option<&ShardAnnotation>,
    ) -> Vec<IndexQuery> {
        self.recorded_shards
            .lock()
            .unwrap()
            .push(shard.copied());
        queries
    }
}

/// Fetcher resolving labels from a fixed key -> labels map, recording the
/// keys of every call.
#[derive(Default)]
struct TestFetcher {
    labels_by_key: Mutex<HashMap<String, Labels>>,
    calls: Mutex<Vec<Vec<String>>>,
    fail: Mutex<Option<String>>,
}

impl TestFetcher {
    fn set_labels(&self, key: String, labels: Labels) {
        self.labels_by_key.lock().unwrap().insert(key, labels);
    }

    fn fail_with(&self, message: &str) {
        *self.fail.lock().unwrap() = Some(message.to_string());
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChunkFetcher for TestFetcher {
    async fn fetch_chunks(
        &self,
        chunks: Vec<Chunk>,
        keys: Vec<String>,
    ) -> Result<Vec<Chunk>, FetchError> {
        self.calls.lock().unwrap().push(keys.clone());
        if let Some(message) = self.fail.lock().unwrap().clone() {
            return Err(FetchError(message));
        }
        let labels_by_key = self.labels_by_key.lock().unwrap();
        chunks
            .into_iter()
            .zip(keys)
            .map(|(mut chunk, key)| {
                let labels = labels_by_key
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| FetchError(format!("no labels for chunk {}", key)))?;
                chunk.labels = labels;
                Ok(chunk)
            })
            .collect()
    }
}

struct Fixture {
    index: Arc<InMemoryIndex>,
    schema: Arc<TestSchema>,
    fetcher: Arc<TestFetcher>,
    metrics: Arc<StoreMetrics>,
    store: SeriesIndexStore,
}

impl Fixture {
    fn new() -> Self {
        Self::with_index(InMemoryIndex::new(), Config::default(), true)
    }

    fn with_index(index: InMemoryIndex, config: Config, label_names_supported: bool) -> Self {
        let index = Arc::new(index);
        let schema = Arc::new(TestSchema::new(label_names_supported));
        let fetcher = Arc::new(TestFetcher::default());
        let metrics = Arc::new(StoreMetrics::new());
        let store = SeriesIndexStore::new(
            config,
            schema.clone(),
            index.clone(),
            fetcher.clone(),
            metrics.clone(),
        );
        Self {
            index,
            schema,
            fetcher,
            metrics,
            store,
        }
    }

    /// Registers a series under its metric and label rows.
    fn add_series(&self, series_id: &str, labels: &[(&str, &str)]) {
        self.index.add(
            "series",
            format!("{}:{}", TENANT, METRIC),
            encode_entry_range(series_id, ""),
            Bytes::new(),
        );
        for (name, value) in labels {
            self.index.add(
                "series",
                format!("{}:{}:{}", TENANT, METRIC, name),
                encode_entry_range(series_id, value),
                Bytes::copy_from_slice(value.as_bytes()),
            );
        }
    }

    /// Registers a chunk row for a series and returns its reference.
    fn add_chunk(&self, series_id: &str, chunk_ref: ChunkRef) -> ChunkRef {
        self.index.add(
            "chunks",
            format!("{}:{}", TENANT, series_id),
            encode_entry_range(&chunk_ref.external_key(), ""),
            Bytes::new(),
        );
        chunk_ref
    }

    fn add_label_names(&self, series_id: &str, names: &[&str]) {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        self.index.add(
            "labelnames",
            format!("{}:{}", TENANT, series_id),
            encode_entry_range(series_id, ""),
            encode_label_names(&names),
        );
    }
}

fn chunk_ref(fingerprint: u64, from: TimeMs, through: TimeMs) -> ChunkRef {
    ChunkRef {
        tenant: TENANT.to_string(),
        fingerprint,
        from,
        through,
        checksum: 1,
    }
}

fn metric_matcher() -> Matcher {
    Matcher::equal(METRIC_NAME_LABEL, METRIC)
}

#[tokio::test]
async fn should_resolve_chunk_refs_for_single_matcher() {
    // given
    let fx = Fixture::new();
    for series in ["s1", "s2", "s3"] {
        fx.add_series(series, &[("job", "api")]);
    }
    let c1 = fx.add_chunk("s1", chunk_ref(1, 50, 150));
    let c2 = fx.add_chunk("s2", chunk_ref(2, 180, 220));
    fx.add_chunk("s3", chunk_ref(3, 300, 400));

    // when
    let refs = fx
        .store
        .get_chunk_refs(
            TENANT,
            100,
            200,
            &[metric_matcher(), Matcher::equal("job", "api")],
        )
        .await
        .unwrap();

    // then - the chunk outside the window is filtered out
    assert_eq!(refs, vec![c1, c2]);
    let encoded = fx.metrics.encode();
    assert!(encoded.contains("index_lookups_per_query_count 1"));
    assert!(encoded.contains("index_lookups_per_query_sum 1"));
}

#[tokio::test]
async fn should_intersect_series_across_matchers() {
    // given - job=api yields {s1,s2,s3}, env=prod yields {s2,s3,s4}
    let fx = Fixture::new();
    fx.add_series("s1", &[("job", "api")]);
    fx.add_series("s2", &[("job", "api"), ("env", "prod")]);
    fx.add_series("s3", &[("job", "api"), ("env", "prod")]);
    fx.add_series("s4", &[("env", "prod")]);
    let c1 = fx.add_chunk("s2", chunk_ref(2, 100, 200));
    let c2 = fx.add_chunk("s3", chunk_ref(3, 100, 200));
    fx.add_chunk("s1", chunk_ref(1, 100, 200));
    fx.add_chunk("s4", chunk_ref(4, 100, 200));

    // when
    let refs = fx
        .store
        .get_chunk_refs(
            TENANT,
            0,
            1_000,
            &[
                metric_matcher(),
                Matcher::equal("job", "api"),
                Matcher::equal("env", "prod"),
            ],
        )
        .await
        .unwrap();

    // then - only the intersection {s2,s3} contributes chunks
    assert_eq!(refs, vec![c1, c2]);
    let encoded = fx.metrics.encode();
    assert!(encoded.contains("index_lookups_per_query_sum 2"));
    assert!(encoded.contains("series_pre_intersection_per_query_sum 6"));
    assert!(encoded.contains("series_post_intersection_per_query_sum 2"));
}

#[tokio::test]
async fn should_recover_from_partial_cardinality_failure() {
    // given - job=api matches 3 rows and trips the limit, env=prod stays under
    let fx = Fixture::with_index(
        InMemoryIndex::new().with_cardinality_limit(2),
        Config::default(),
        true,
    );
    fx.add_series("s1", &[("job", "api")]);
    fx.add_series("s2", &[("job", "api"), ("env", "prod")]);
    fx.add_series("s3", &[("job", "api"), ("env", "prod")]);
    let c2 = fx.add_chunk("s2", chunk_ref(2, 100, 200));
    let c3 = fx.add_chunk("s3", chunk_ref(3, 100, 200));

    // when
    let refs = fx
        .store
        .get_chunk_refs(
            TENANT,
            0,
            1_000,
            &[
                metric_matcher(),
                Matcher::equal("job", "api"),
                Matcher::equal("env", "prod"),
            ],
        )
        .await
        .unwrap();

    // then - the bounded matcher's series carry the query
    assert_eq!(refs, vec![c2, c3]);
}

#[tokio::test]
async fn should_fail_when_all_matchers_exceed_cardinality() {
    // given
    let fx = Fixture::with_index(
        InMemoryIndex::new().with_cardinality_limit(1),
        Config::default(),
        true,
    );
    fx.add_series("s1", &[("job", "api"), ("env", "prod")]);
    fx.add_series("s2", &[("job", "api"), ("env", "prod")]);

    // when
    let result = fx
        .store
        .get_chunk_refs(
            TENANT,
            0,
            1_000,
            &[
                metric_matcher(),
                Matcher::equal("job", "api"),
                Matcher::equal("env", "prod"),
            ],
        )
        .await;

    // then - the error is annotated with the metric and label
    match result {
        Err(Error::Index(IndexError::CardinalityExceeded {
            metric_name,
            label_name,
            size,
            limit,
        })) => {
            assert_eq!(metric_name, METRIC);
            assert!(label_name == "job" || label_name == "env");
            assert_eq!(size, 2);
            assert_eq!(limit, 1);
        }
        other => panic!("expected cardinality error, got {:?}", other.map(|r| r.len())),
    }
}

#[tokio::test]
async fn should_shortcut_regex_set_matchers() {
    // given
    let fx = Fixture::new();
    fx.add_series("s1", &[("job", "api")]);
    fx.add_series("s2", &[("job", "web")]);
    fx.add_series("s3", &[("job", "db")]);
    let c1 = fx.add_chunk("s1", chunk_ref(1, 100, 200));
    let c2 = fx.add_chunk("s2", chunk_ref(2, 100, 200));
    fx.add_chunk("s3", chunk_ref(3, 100, 200));

    // when
    let refs = fx
        .store
        .get_chunk_refs(
            TENANT,
            0,
            1_000,
            &[
                metric_matcher(),
                Matcher::new(MatchType::Re, "job", "api|web").unwrap(),
            ],
        )
        .await
        .unwrap();

    // then
    assert_eq!(refs, vec![c1, c2]);
}

#[tokio::test]
async fn should_apply_residual_matchers_when_materializing_series() {
    // given - a stale index returns both series for env=prod, but the
    // fetched chunks disagree
    let fx = Fixture::new();
    fx.add_series("s1", &[("env", "prod")]);
    fx.add_series("s2", &[("env", "prod")]);
    let c1 = fx.add_chunk("s1", chunk_ref(1, 100, 200));
    let c2 = fx.add_chunk("s2", chunk_ref(2, 100, 200));
    // Same fingerprint as c1: grouped away before fetching.
    fx.add_chunk("s1", chunk_ref(1, 150, 250));
    fx.fetcher.set_labels(
        c1.external_key(),
        Labels::from_pairs(&[(METRIC_NAME_LABEL, METRIC), ("job", "api"), ("env", "prod")]),
    );
    fx.fetcher.set_labels(
        c2.external_key(),
        Labels::from_pairs(&[(METRIC_NAME_LABEL, METRIC), ("job", "api"), ("env", "dev")]),
    );

    // when
    let series = fx
        .store
        .get_series(
            TENANT,
            0,
            1_000,
            &[metric_matcher(), Matcher::equal("env", "prod")],
        )
        .await
        .unwrap();

    // then - one series survives, metric name stripped
    assert_eq!(
        series,
        vec![Labels::from_pairs(&[("env", "prod"), ("job", "api")])]
    );
    // One chunk per distinct fingerprint was fetched.
    let fetched_keys: Vec<String> = fx.fetcher.calls().concat();
    assert_eq!(fetched_keys.len(), 2);
}

#[tokio::test]
async fn should_fail_without_metric_name_matcher() {
    // given
    let fx = Fixture::new();

    // when - no metric matcher at all
    let result = fx
        .store
        .get_chunk_refs(TENANT, 0, 1_000, &[Matcher::equal("job", "api")])
        .await;

    // then
    assert!(matches!(result, Err(Error::MissingMetricName)));

    // when - a metric matcher that is not an equality matcher
    let result = fx
        .store
        .get_chunk_refs(
            TENANT,
            0,
            1_000,
            &[Matcher::new(MatchType::Re, METRIC_NAME_LABEL, METRIC).unwrap()],
        )
        .await;

    // then
    assert!(matches!(result, Err(Error::MissingMetricName)));
}

#[tokio::test]
async fn should_resolve_label_names_from_series_rows() {
    // given
    let fx = Fixture::new();
    fx.add_series("s1", &[("job", "api")]);
    fx.add_series("s2", &[("env", "prod")]);
    fx.add_label_names("s1", &["__name__", "job"]);
    fx.add_label_names("s2", &["__name__", "env"]);

    // when
    let names = fx
        .store
        .label_names_for_metric_name(TENANT, 0, 1_000, METRIC)
        .await
        .unwrap();

    // then
    assert_eq!(names, vec!["__name__", "env", "job"]);
    assert!(fx.fetcher.calls().is_empty());
}

#[tokio::test]
async fn should_fall_back_to_chunks_when_label_names_unsupported() {
    // given
    let fx = Fixture::with_index(InMemoryIndex::new(), Config::default(), false);
    fx.add_series("s1", &[("job", "api")]);
    let c1 = fx.add_chunk("s1", chunk_ref(1, 100, 200));
    fx.fetcher.set_labels(
        c1.external_key(),
        Labels::from_pairs(&[(METRIC_NAME_LABEL, METRIC), ("job", "api")]),
    );

    // when
    let names = fx
        .store
        .label_names_for_metric_name(TENANT, 0, 1_000, METRIC)
        .await
        .unwrap();

    // then - labels as observed on the fetched chunk, nothing stripped
    assert_eq!(names, vec!["__name__", "job"]);
    assert_eq!(fx.fetcher.calls().len(), 1);
}

#[tokio::test]
async fn should_resolve_label_values_without_matchers() {
    // given
    let fx = Fixture::new();
    fx.add_series("s1", &[("env", "prod")]);
    fx.add_series("s2", &[("env", "dev")]);
    fx.add_series("s3", &[("env", "prod")]);

    // when
    let values = fx
        .store
        .label_values_for_metric_name(TENANT, 0, 1_000, METRIC, "env", &[])
        .await
        .unwrap();

    // then - unique and sorted
    assert_eq!(values, vec!["dev", "prod"]);
}

#[tokio::test]
async fn should_filter_label_values_by_matchers() {
    // given
    let fx = Fixture::new();
    fx.add_series("s1", &[("env", "prod"), ("job", "api")]);
    fx.add_series("s2", &[("env", "dev"), ("job", "web")]);

    // when
    let values = fx
        .store
        .label_values_for_metric_name(
            TENANT,
            0,
            1_000,
            METRIC,
            "env",
            &[Matcher::equal("job", "api")],
        )
        .await
        .unwrap();

    // then - only values of series matching job=api
    assert_eq!(values, vec!["prod"]);
}

#[tokio::test]
async fn should_sort_and_dedup_series_results() {
    // given
    let fx = Fixture::new();
    fx.add_series("s1", &[("job", "api")]);
    fx.add_series("s2", &[("job", "web")]);
    let c1 = fx.add_chunk("s1", chunk_ref(1, 100, 200));
    let c2 = fx.add_chunk("s2", chunk_ref(2, 100, 200));
    fx.fetcher.set_labels(
        c1.external_key(),
        Labels::from_pairs(&[(METRIC_NAME_LABEL, METRIC), ("job", "web")]),
    );
    fx.fetcher.set_labels(
        c2.external_key(),
        Labels::from_pairs(&[(METRIC_NAME_LABEL, METRIC), ("job", "api")]),
    );

    // when
    let series = fx
        .store
        .get_series(TENANT, 0, 1_000, &[metric_matcher()])
        .await
        .unwrap();

    // then - sorted by label set, regardless of fetch order
    assert_eq!(
        series,
        vec![
            Labels::from_pairs(&[("job", "api")]),
            Labels::from_pairs(&[("job", "web")]),
        ]
    );
}

#[tokio::test]
async fn should_batch_chunk_fetches_in_sorted_order() {
    // given - five distinct series, batches of two
    let fx = Fixture::with_index(
        InMemoryIndex::new(),
        Config {
            chunk_batch_size: 2,
        },
        true,
    );
    for (idx, series) in ["s1", "s2", "s3", "s4", "s5"].iter().enumerate() {
        fx.add_series(series, &[("job", "api")]);
        let chunk = fx.add_chunk(series, chunk_ref(idx as u64 + 1, 100, 200));
        fx.fetcher.set_labels(
            chunk.external_key(),
            Labels::from_pairs(&[(METRIC_NAME_LABEL, METRIC), ("job", "api"), ("series", series)]),
        );
    }

    // when
    let series = fx
        .store
        .get_series(
            TENANT,
            0,
            1_000,
            &[metric_matcher(), Matcher::equal("job", "api")],
        )
        .await
        .unwrap();

    // then
    assert_eq!(series.len(), 5);
    let calls = fx.fetcher.calls();
    assert_eq!(
        calls.iter().map(|keys| keys.len()).collect::<Vec<_>>(),
        vec![2, 2, 1]
    );
    for keys in calls {
        let mut sorted_keys = keys.clone();
        sorted_keys.sort();
        assert_eq!(keys, sorted_keys, "fetch keys must be sorted ascending");
    }
}

#[tokio::test]
async fn should_apply_configured_chunk_filterer() {
    // given
    struct DropDev;

    impl ChunkFilterer for DropDev {
        fn should_filter(&self, labels: &Labels) -> bool {
            labels.get("env") == Some("dev")
        }
    }

    struct DropDevFactory;

    impl RequestChunkFilterer for DropDevFactory {
        fn for_request(&self) -> Box<dyn ChunkFilterer> {
            Box::new(DropDev)
        }
    }

    let mut fx = Fixture::new();
    fx.add_series("s1", &[("job", "api")]);
    fx.add_series("s2", &[("job", "api")]);
    let c1 = fx.add_chunk("s1", chunk_ref(1, 100, 200));
    let c2 = fx.add_chunk("s2", chunk_ref(2, 100, 200));
    fx.fetcher.set_labels(
        c1.external_key(),
        Labels::from_pairs(&[(METRIC_NAME_LABEL, METRIC), ("job", "api"), ("env", "prod")]),
    );
    fx.fetcher.set_labels(
        c2.external_key(),
        Labels::from_pairs(&[(METRIC_NAME_LABEL, METRIC), ("job", "api"), ("env", "dev")]),
    );
    fx.store.set_chunk_filterer(Arc::new(DropDevFactory));

    // when
    let series = fx
        .store
        .get_series(
            TENANT,
            0,
            1_000,
            &[metric_matcher(), Matcher::equal("job", "api")],
        )
        .await
        .unwrap();

    // then
    assert_eq!(
        series,
        vec![Labels::from_pairs(&[("env", "prod"), ("job", "api")])]
    );
}

#[tokio::test]
async fn should_forward_shard_annotation_to_schema() {
    // given
    let fx = Fixture::new();
    fx.add_series("s1", &[("job", "api")]);
    fx.add_chunk("s1", chunk_ref(1, 100, 200));

    // when
    fx.store
        .get_chunk_refs(
            TENANT,
            0,
            1_000,
            &[
                metric_matcher(),
                Matcher::equal("job", "api"),
                Matcher::equal(SHARD_LABEL, "1_of_2"),
            ],
        )
        .await
        .unwrap();

    // then - the schema saw the shard; the shard matcher never hit the index
    let shards = fx.schema.recorded_shards.lock().unwrap().clone();
    assert!(shards
        .iter()
        .all(|shard| *shard == Some(ShardAnnotation { shard: 1, of: 2 })));
    assert!(!shards.is_empty());
}

#[tokio::test]
async fn should_return_empty_list_when_nothing_matches() {
    // given
    let fx = Fixture::new();

    // when
    let refs = fx
        .store
        .get_chunk_refs(
            TENANT,
            0,
            1_000,
            &[metric_matcher(), Matcher::equal("job", "api")],
        )
        .await
        .unwrap();

    // then - empty, not an error
    assert!(refs.is_empty());
}

#[tokio::test]
async fn should_return_equal_results_for_identical_calls() {
    // given
    let fx = Fixture::new();
    fx.add_series("s1", &[("job", "api")]);
    fx.add_series("s2", &[("job", "api")]);
    fx.add_chunk("s1", chunk_ref(1, 100, 200));
    fx.add_chunk("s2", chunk_ref(2, 100, 200));
    let matchers = vec![metric_matcher(), Matcher::equal("job", "api")];

    // when
    let first = fx
        .store
        .get_chunk_refs(TENANT, 0, 1_000, &matchers)
        .await
        .unwrap();
    let second = fx
        .store
        .get_chunk_refs(TENANT, 0, 1_000, &matchers)
        .await
        .unwrap();

    // then
    assert_eq!(first, second);
}

#[tokio::test]
async fn should_surface_fetcher_errors() {
    // given
    let fx = Fixture::new();
    fx.add_series("s1", &[("job", "api")]);
    fx.add_chunk("s1", chunk_ref(1, 100, 200));
    fx.fetcher.fail_with("cache unavailable");

    // when
    let result = fx
        .store
        .get_series(
            TENANT,
            0,
            1_000,
            &[metric_matcher(), Matcher::equal("job", "api")],
        )
        .await;

    // then
    assert!(matches!(result, Err(Error::Fetch(FetchError(message))) if message == "cache unavailable"));
}

#[tokio::test]
async fn should_fail_on_corrupt_chunk_keys() {
    // given - a chunk row whose key does not parse
    let fx = Fixture::new();
    fx.add_series("s1", &[("job", "api")]);
    fx.index.add(
        "chunks",
        format!("{}:{}", TENANT, "s1"),
        encode_entry_range("not-a-chunk-key", ""),
        Bytes::new(),
    );

    // when
    let result = fx
        .store
        .get_chunk_refs(
            TENANT,
            0,
            1_000,
            &[metric_matcher(), Matcher::equal("job", "api")],
        )
        .await;

    // then
    assert!(matches!(result, Err(Error::ChunkKey(_))));
}
