//! Tracing setup and request counters.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests, embedding).
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Counters for served requests.
#[derive(Debug, Default)]
pub struct Metrics {
    requests: AtomicU64,
    mutations: AtomicU64,
    errors: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_served(&self, mutating: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if mutating {
            self.mutations.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(counter = "requests", mutating, "Metric incremented");
    }

    pub fn request_failed(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "errors", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            mutations: self.mutations.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub mutations: u64,
    pub errors: u64,
}
