//! The series index store.

use std::collections::HashSet;
use std::sync::Arc;

use common::chunk::{Chunk, ChunkFetcher, ChunkRef, RequestChunkFilterer, TimeMs};
use common::index::IndexClient;
use common::labels::{Labels, METRIC_NAME_LABEL};
use common::matchers::{extract_metric_name, split_filters_and_matchers, Matcher, SHARD_LABEL};
use common::schema::{SchemaError, SeriesStoreSchema};
use common::serde::{decode_entry_range, decode_label_names};

use crate::config::Config;
use crate::entries::parse_index_entries;
use crate::error::{Error, Result};
use crate::metrics::StoreMetrics;
use crate::pool::EntryPool;

/// Resolves tenant-scoped series queries against the backing index.
///
/// All lookups are request-scoped: the store holds no mutable state beyond
/// its entry-buffer pool and metrics. Cloning is cheap and clones share both.
#[derive(Clone)]
pub struct SeriesIndexStore {
    pub(crate) schema: Arc<dyn SeriesStoreSchema>,
    pub(crate) index: Arc<dyn IndexClient>,
    pub(crate) fetcher: Arc<dyn ChunkFetcher>,
    pub(crate) chunk_filterer: Option<Arc<dyn RequestChunkFilterer>>,
    pub(crate) chunk_batch_size: usize,
    pub(crate) metrics: Arc<StoreMetrics>,
    pub(crate) pool: Arc<EntryPool>,
}

impl SeriesIndexStore {
    pub fn new(
        config: Config,
        schema: Arc<dyn SeriesStoreSchema>,
        index: Arc<dyn IndexClient>,
        fetcher: Arc<dyn ChunkFetcher>,
        metrics: Arc<StoreMetrics>,
    ) -> Self {
        Self {
            schema,
            index,
            fetcher,
            chunk_filterer: None,
            chunk_batch_size: config.chunk_batch_size,
            metrics,
            pool: EntryPool::new(),
        }
    }

    /// Sets a chunk filter applied while materializing series.
    ///
    /// The `&mut` receiver restricts this to initialization; requests read
    /// the filterer without synchronization.
    pub fn set_chunk_filterer(&mut self, filterer: Arc<dyn RequestChunkFilterer>) {
        self.chunk_filterer = Some(filterer);
    }

    /// Resolves the chunk references matching a series query.
    ///
    /// The matcher set must contain an equality matcher on the metric-name
    /// label. Every returned reference overlaps `[from, through]`. An empty
    /// result is a normal outcome, not an error.
    #[tracing::instrument(level = "debug", skip_all, fields(tenant = %tenant))]
    pub async fn get_chunk_refs(
        &self,
        tenant: &str,
        from: TimeMs,
        through: TimeMs,
        matchers: &[Matcher],
    ) -> Result<Vec<ChunkRef>> {
        let (metric_name, matchers) =
            extract_metric_name(matchers).ok_or(Error::MissingMetricName)?;

        // Only matchers the index can answer participate in the lookup;
        // empty-value matchers are re-applied once chunks are fetched.
        let (_filters, index_matchers) = split_filters_and_matchers(&matchers);
        let series_ids = self
            .lookup_series_by_metric_name_matchers(
                tenant,
                from,
                through,
                &metric_name,
                &index_matchers,
            )
            .await?;
        tracing::debug!(series_ids = series_ids.len(), "resolved series ids");

        let chunk_ids = self
            .lookup_chunks_by_series(tenant, from, through, &series_ids)
            .await?;
        tracing::debug!(chunk_ids = chunk_ids.len(), "resolved chunk ids");

        let chunk_refs = convert_chunk_ids_to_chunk_refs(tenant, &chunk_ids)?;
        let chunk_refs = filter_chunk_refs_by_time(from, through, chunk_refs);
        tracing::debug!(chunks = chunk_refs.len(), "chunks post time filtering");
        self.metrics.chunks_per_query.observe(chunk_refs.len() as f64);

        Ok(chunk_refs)
    }

    /// Resolves the distinct series label sets matching a query.
    ///
    /// Label sets are sorted, deduplicated, and stripped of the metric-name
    /// label.
    #[tracing::instrument(level = "debug", skip_all, fields(tenant = %tenant))]
    pub async fn get_series(
        &self,
        tenant: &str,
        from: TimeMs,
        through: TimeMs,
        matchers: &[Matcher],
    ) -> Result<Vec<Labels>> {
        let chunk_refs = self.get_chunk_refs(tenant, from, through, matchers).await?;
        self.chunks_to_series(chunk_refs, matchers).await
    }

    async fn chunks_to_series(
        &self,
        chunk_refs: Vec<ChunkRef>,
        matchers: &[Matcher],
    ) -> Result<Vec<Labels>> {
        // Download one chunk per series and merge its label set.
        let (mut chunks, mut keys) = filter_by_unique_fingerprint(chunk_refs);
        let filterer = self.chunk_filterer.as_ref().map(|f| f.for_request());

        let mut results = Vec::with_capacity(chunks.len());
        while !chunks.is_empty() {
            let split = chunks.len().min(self.chunk_batch_size);
            let rest_chunks = chunks.split_off(split);
            let rest_keys = keys.split_off(split);

            // The fetcher requires keys sorted ascending so batched cache
            // lookups line up.
            let mut group: Vec<(String, Chunk)> = keys.drain(..).zip(chunks.drain(..)).collect();
            group.sort_by(|a, b| a.0.cmp(&b.0));
            let (group_keys, group_chunks): (Vec<_>, Vec<_>) = group.into_iter().unzip();

            let fetched = self.fetcher.fetch_chunks(group_chunks, group_keys).await?;
            'chunks: for chunk in fetched {
                for matcher in matchers {
                    if matcher.name() == SHARD_LABEL || matcher.name() == METRIC_NAME_LABEL {
                        continue;
                    }
                    let value = chunk.labels.get(matcher.name()).unwrap_or("");
                    if !matcher.matches(value) {
                        continue 'chunks;
                    }
                }

                if let Some(filterer) = &filterer {
                    if filterer.should_filter(&chunk.labels) {
                        continue 'chunks;
                    }
                }

                results.push(chunk.labels.without(METRIC_NAME_LABEL));
            }

            chunks = rest_chunks;
            keys = rest_keys;
        }

        results.sort();
        results.dedup();
        Ok(results)
    }

    /// Enumerates the label names seen across a metric's series.
    #[tracing::instrument(level = "debug", skip_all, fields(tenant = %tenant, metric_name = %metric_name))]
    pub async fn label_names_for_metric_name(
        &self,
        tenant: &str,
        from: TimeMs,
        through: TimeMs,
        metric_name: &str,
    ) -> Result<Vec<String>> {
        let series_ids = self
            .lookup_series_by_metric_name_matchers(tenant, from, through, metric_name, &[])
            .await?;
        tracing::debug!(series_ids = series_ids.len(), "resolved series ids");

        match self
            .lookup_label_names_by_series(tenant, from, through, &series_ids)
            .await
        {
            Err(Error::Schema(SchemaError::NotSupported)) => {
                // Label names by series are not supported, fall back on chunks.
                self.lookup_label_names_by_chunks(tenant, from, through, &series_ids)
                    .await
            }
            other => other,
        }
    }

    /// Enumerates the values of one label across a metric's series.
    #[tracing::instrument(level = "debug", skip_all, fields(tenant = %tenant, metric_name = %metric_name, label_name = %label_name))]
    pub async fn label_values_for_metric_name(
        &self,
        tenant: &str,
        from: TimeMs,
        through: TimeMs,
        metric_name: &str,
        label_name: &str,
        matchers: &[Matcher],
    ) -> Result<Vec<String>> {
        if !matchers.is_empty() {
            return self
                .label_values_with_matchers(tenant, from, through, metric_name, label_name, matchers)
                .await;
        }

        let queries = self
            .schema
            .read_queries_for_metric_label(from, through, tenant, metric_name, label_name)?;
        let entries = self.lookup_entries_by_queries(&queries).await?;

        let mut values = HashSet::new();
        for entry in entries.iter() {
            let (_series_id, label_value) = decode_entry_range(&entry.range_value)?;
            values.insert(label_value);
        }
        Ok(sorted(values))
    }

    async fn label_values_with_matchers(
        &self,
        tenant: &str,
        from: TimeMs,
        through: TimeMs,
        metric_name: &str,
        label_name: &str,
        matchers: &[Matcher],
    ) -> Result<Vec<String>> {
        // Restrict to series matching the other matchers.
        let series_ids = self
            .lookup_series_by_metric_name_matchers(tenant, from, through, metric_name, matchers)
            .await?;
        let series_ids: HashSet<String> = series_ids.into_iter().collect();

        let queries = self
            .schema
            .read_queries_for_metric_label(from, through, tenant, metric_name, label_name)?;
        let entries = self.lookup_entries_by_queries(&queries).await?;

        let mut values = HashSet::new();
        for entry in entries.iter() {
            let (series_id, label_value) = decode_entry_range(&entry.range_value)?;
            if series_ids.contains(&series_id) {
                values.insert(label_value);
            }
        }
        Ok(sorted(values))
    }

    async fn lookup_label_names_by_series(
        &self,
        tenant: &str,
        from: TimeMs,
        through: TimeMs,
        series_ids: &[String],
    ) -> Result<Vec<String>> {
        let mut queries = Vec::with_capacity(series_ids.len());
        for series_id in series_ids {
            queries.extend(
                self.schema
                    .label_names_for_series(from, through, tenant, series_id)?,
            );
        }
        let entries = self.lookup_entries_by_queries(&queries).await?;

        let mut names = HashSet::new();
        for entry in entries.iter() {
            names.extend(decode_label_names(&entry.value)?);
        }
        Ok(sorted(names))
    }

    async fn lookup_label_names_by_chunks(
        &self,
        tenant: &str,
        from: TimeMs,
        through: TimeMs,
        series_ids: &[String],
    ) -> Result<Vec<String>> {
        // Look up the series in the index to get the chunks.
        let chunk_ids = self
            .lookup_chunks_by_series(tenant, from, through, series_ids)
            .await?;
        tracing::debug!(chunk_ids = chunk_ids.len(), "resolved chunk ids");

        // Keep one chunk per fingerprint within the queried time range.
        let chunk_refs = convert_chunk_ids_to_chunk_refs(tenant, &chunk_ids)?;
        let chunk_refs = filter_chunk_refs_by_time(from, through, chunk_refs);
        let (chunks, keys) = filter_by_unique_fingerprint(chunk_refs);
        self.metrics.chunks_per_query.observe(chunks.len() as f64);

        let mut group: Vec<(String, Chunk)> = keys.into_iter().zip(chunks).collect();
        group.sort_by(|a, b| a.0.cmp(&b.0));
        let (keys, chunks): (Vec<_>, Vec<_>) = group.into_iter().unzip();

        let fetched = self.fetcher.fetch_chunks(chunks, keys).await?;
        let mut names = HashSet::new();
        for chunk in &fetched {
            for label in chunk.labels.iter() {
                names.insert(label.name.clone());
            }
        }
        Ok(sorted(names))
    }

    async fn lookup_chunks_by_series(
        &self,
        tenant: &str,
        from: TimeMs,
        through: TimeMs,
        series_ids: &[String],
    ) -> Result<Vec<String>> {
        let mut queries = Vec::with_capacity(series_ids.len());
        for series_id in series_ids {
            queries.extend(
                self.schema
                    .chunks_for_series(from, through, tenant, series_id)?,
            );
        }
        let entries = self.lookup_entries_by_queries(&queries).await?;
        parse_index_entries(&entries, None)
    }
}

fn convert_chunk_ids_to_chunk_refs(tenant: &str, chunk_ids: &[String]) -> Result<Vec<ChunkRef>> {
    chunk_ids
        .iter()
        .map(|id| ChunkRef::parse_external_key(tenant, id).map_err(Error::from))
        .collect()
}

fn filter_chunk_refs_by_time(from: TimeMs, through: TimeMs, mut refs: Vec<ChunkRef>) -> Vec<ChunkRef> {
    refs.retain(|chunk_ref| chunk_ref.overlaps(from, through));
    refs
}

/// Keeps one chunk per distinct series fingerprint, paired with its external
/// key.
fn filter_by_unique_fingerprint(chunk_refs: Vec<ChunkRef>) -> (Vec<Chunk>, Vec<String>) {
    let mut seen = HashSet::with_capacity(chunk_refs.len());
    let mut chunks = Vec::with_capacity(chunk_refs.len());
    let mut keys = Vec::with_capacity(chunk_refs.len());
    for chunk_ref in chunk_refs {
        if seen.insert(chunk_ref.fingerprint) {
            keys.push(chunk_ref.external_key());
            chunks.push(Chunk::from_ref(chunk_ref));
        }
    }
    (chunks, keys)
}

fn sorted(values: HashSet<String>) -> Vec<String> {
    let mut values: Vec<String> = values.into_iter().collect();
    values.sort_unstable();
    values
}
