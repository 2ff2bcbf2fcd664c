//! Prometheus metrics for the GraphQL service.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::{info, warn};

/// All metric names used in the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    GraphqlRequests,
    GraphqlErrors,
    GraphqlRequestDuration,
    CategoriesCreated,
    IngredientsCreated,
    FixtureObjectsLoaded,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::GraphqlRequests => "cookbook_graphql_requests_total",
            MetricName::GraphqlErrors => "cookbook_graphql_errors_total",
            MetricName::GraphqlRequestDuration => "cookbook_graphql_request_duration_seconds",
            MetricName::CategoriesCreated => "cookbook_categories_created_total",
            MetricName::IngredientsCreated => "cookbook_ingredients_created_total",
            MetricName::FixtureObjectsLoaded => "cookbook_fixture_objects_loaded_total",
        }
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder. Calling it twice is harmless.
pub fn init() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
            info!("Metrics system initialized");
        }
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Current metrics in the Prometheus text format, if the recorder is installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod graphql {
    use super::MetricName;
    use std::time::Duration;

    pub fn record_request(schema: &'static str, duration: Duration, error_count: usize) {
        ::metrics::counter!(MetricName::GraphqlRequests.as_str(), "schema" => schema).increment(1);
        ::metrics::histogram!(MetricName::GraphqlRequestDuration.as_str(), "schema" => schema)
            .record(duration.as_secs_f64());
        if error_count > 0 {
            ::metrics::counter!(MetricName::GraphqlErrors.as_str(), "schema" => schema)
                .increment(error_count as u64);
        }
    }
}

pub mod catalog {
    use super::MetricName;

    pub fn record_category_created() {
        ::metrics::counter!(MetricName::CategoriesCreated.as_str()).increment(1);
    }

    pub fn record_ingredient_created() {
        ::metrics::counter!(MetricName::IngredientsCreated.as_str()).increment(1);
    }

    pub fn record_fixture_objects(count: usize) {
        ::metrics::counter!(MetricName::FixtureObjectsLoaded.as_str()).increment(count as u64);
    }
}
