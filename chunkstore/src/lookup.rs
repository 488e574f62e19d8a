//! Index lookups: query execution, matcher fanout, and intersection.

use std::sync::Mutex;

use common::index::{IndexEntry, IndexError, IndexQuery};
use common::matchers::{shard_from_matchers, MatchType, Matcher, ShardAnnotation};
use common::TimeMs;
use tokio::task::JoinSet;

use crate::entries::parse_index_entries;
use crate::error::{Error, Result};
use crate::pool::PooledEntries;
use crate::store::SeriesIndexStore;

impl SeriesIndexStore {
    /// Resolves the sorted, duplicate-free series IDs matching a metric and
    /// matcher set, fanning matchers out concurrently and intersecting the
    /// per-matcher results.
    pub(crate) async fn lookup_series_by_metric_name_matchers(
        &self,
        tenant: &str,
        from: TimeMs,
        through: TimeMs,
        metric_name: &str,
        matchers: &[Matcher],
    ) -> Result<Vec<String>> {
        let (shard, matchers) = shard_from_matchers(matchers)?;

        // Just get series for the metric if there are no matchers.
        if matchers.is_empty() {
            self.metrics.index_lookups_per_query.observe(1.0);
            let ids = self
                .lookup_ids_by_matcher(tenant, from, through, metric_name, None, shard)
                .await?;
            self.metrics
                .series_pre_intersection_per_query
                .observe(ids.len() as f64);
            self.metrics
                .series_post_intersection_per_query
                .observe(ids.len() as f64);
            return Ok(ids);
        }

        self.metrics
            .index_lookups_per_query
            .observe(matchers.len() as f64);
        let mut tasks = JoinSet::new();
        for matcher in matchers.iter().cloned() {
            let store = self.clone();
            let tenant = tenant.to_string();
            let metric_name = metric_name.to_string();
            tasks.spawn(async move {
                store
                    .lookup_ids_by_matcher(
                        &tenant,
                        from,
                        through,
                        &metric_name,
                        Some(&matcher),
                        shard,
                    )
                    .await
            });
        }

        // Receive IDs from every matcher, intersecting as they arrive. The
        // collector always drains all tasks; a matcher tripping the
        // cardinality bound must not reject its siblings' results.
        let total = matchers.len();
        let mut ids: Vec<String> = Vec::new();
        let mut initialized = false;
        let mut pre_intersection_count = 0usize;
        let mut last_err = None;
        let mut cardinality_err = None;
        let mut cardinality_errors = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|err| Err(Error::Internal(err.to_string())));
            match outcome {
                Ok(incoming) => {
                    pre_intersection_count += incoming.len();
                    if initialized {
                        ids = intersect_sorted(&ids, &incoming);
                    } else {
                        ids = incoming;
                        initialized = true;
                    }
                }
                Err(err) if err.is_cardinality_exceeded() => {
                    // One unbounded matcher is fine: a bounded sibling keeps
                    // the candidate set small and residual matching at the
                    // chunk stage handles the rest.
                    cardinality_errors += 1;
                    cardinality_err = Some(err);
                }
                Err(err) => last_err = Some(err),
            }
        }

        // If every single matcher is unbounded, abort the query.
        if cardinality_errors == total {
            return Err(cardinality_err.expect("at least one cardinality error recorded"));
        }
        if let Some(err) = last_err {
            return Err(err);
        }

        self.metrics
            .series_pre_intersection_per_query
            .observe(pre_intersection_count as f64);
        self.metrics
            .series_post_intersection_per_query
            .observe(ids.len() as f64);
        tracing::debug!(matchers = total, ids = ids.len(), "post intersection");
        Ok(ids)
    }

    /// Looks up series IDs for one matcher, or for the bare metric when no
    /// matcher is given.
    async fn lookup_ids_by_matcher(
        &self,
        tenant: &str,
        from: TimeMs,
        through: TimeMs,
        metric_name: &str,
        matcher: Option<&Matcher>,
        shard: Option<ShardAnnotation>,
    ) -> Result<Vec<String>> {
        let (queries, label_name) = match matcher {
            None => (
                self.schema
                    .read_queries_for_metric(from, through, tenant, metric_name)?,
                String::new(),
            ),
            Some(matcher) if matcher.match_type() == MatchType::Eq => (
                self.schema.read_queries_for_metric_label_value(
                    from,
                    through,
                    tenant,
                    metric_name,
                    matcher.name(),
                    matcher.value(),
                )?,
                matcher.name().to_string(),
            ),
            Some(matcher) => (
                self.schema.read_queries_for_metric_label(
                    from,
                    through,
                    tenant,
                    metric_name,
                    matcher.name(),
                )?,
                matcher.name().to_string(),
            ),
        };
        let queries = self.schema.filter_read_queries(queries, shard.as_ref());

        let entries = match self.lookup_entries_by_queries(&queries).await {
            Err(Error::Index(IndexError::CardinalityExceeded { size, limit, .. })) => {
                return Err(Error::Index(IndexError::CardinalityExceeded {
                    metric_name: metric_name.to_string(),
                    label_name,
                    size,
                    limit,
                }));
            }
            other => other?,
        };

        parse_index_entries(&entries, matcher)
    }

    /// Executes index queries, collecting rows into a pooled entry buffer.
    ///
    /// The index client may invoke the callback concurrently from multiple
    /// workers; appends are serialized through a mutex. The returned guard
    /// hands the buffer back to the pool when dropped, on success and error
    /// paths alike.
    pub(crate) async fn lookup_entries_by_queries(
        &self,
        queries: &[IndexQuery],
    ) -> Result<PooledEntries> {
        let entries = Mutex::new(self.pool.get());
        if queries.is_empty() {
            return Ok(entries.into_inner().expect("lock poisoned"));
        }

        let result = self
            .index
            .query_pages(queries, &|query, batch| {
                let mut entries = entries.lock().expect("lock poisoned");
                while let Some((range_value, value)) = batch.next_row() {
                    entries.push(IndexEntry {
                        table_name: query.table_name.clone(),
                        hash_value: query.hash_value.clone(),
                        range_value,
                        value,
                    });
                }
                true
            })
            .await;
        if let Err(err) = result {
            tracing::error!(error = %err, "error querying index storage");
            return Err(err.into());
        }
        Ok(entries.into_inner().expect("lock poisoned"))
    }
}

/// Intersects two sorted, duplicate-free lists, preserving order.
pub(crate) fn intersect_sorted(left: &[String], right: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(left[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    out
}
