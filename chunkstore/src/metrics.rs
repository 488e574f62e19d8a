//! Prometheus metrics for the series index store.

use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

/// Container for the store's Prometheus metrics.
pub struct StoreMetrics {
    registry: Registry,

    /// Distribution of index lookups per query.
    pub index_lookups_per_query: Histogram,

    /// Distribution of series counts per query before matcher intersection.
    pub series_pre_intersection_per_query: Histogram,

    /// Distribution of series counts per query after matcher intersection.
    pub series_post_intersection_per_query: Histogram,

    /// Distribution of chunk counts per query.
    pub chunks_per_query: Histogram,
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreMetrics {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let index_lookups_per_query = Histogram::new(exponential_buckets(1.0, 2.0, 5));
        registry.register(
            "index_lookups_per_query",
            "Distribution of #index lookups per query",
            index_lookups_per_query.clone(),
        );

        // An upper bound around 100k series - 10*(8^5) = 327k.
        let series_pre_intersection_per_query = Histogram::new(exponential_buckets(10.0, 8.0, 6));
        registry.register(
            "series_pre_intersection_per_query",
            "Distribution of #series (pre intersection) per query",
            series_pre_intersection_per_query.clone(),
        );

        let series_post_intersection_per_query = Histogram::new(exponential_buckets(10.0, 8.0, 6));
        registry.register(
            "series_post_intersection_per_query",
            "Distribution of #series (post intersection) per query",
            series_post_intersection_per_query.clone(),
        );

        // 100k series over 7 weeks can reach 1.2m chunks - 10*(8^6) = 2.6m.
        let chunks_per_query = Histogram::new(exponential_buckets(10.0, 8.0, 7));
        registry.register(
            "chunks_per_query",
            "Distribution of #chunks per query",
            chunks_per_query.clone(),
        );

        Self {
            registry,
            index_lookups_per_query,
            series_pre_intersection_per_query,
            series_post_intersection_per_query,
            chunks_per_query,
        }
    }

    /// Returns a mutable reference to the underlying Prometheus registry.
    ///
    /// Use this to register additional metrics before wrapping
    /// `StoreMetrics` in an `Arc`.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Encode all metrics to Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        prometheus_client::encoding::text::encode(&mut buffer, &self.registry)
            .expect("encoding metrics should not fail");
        buffer
    }
}
