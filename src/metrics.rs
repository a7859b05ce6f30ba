// BCI Admin Desktop - Session metrics
// In-memory usage and performance counters, summarized on exit

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

const MAX_ERROR_SAMPLES: usize = 50;
const RECENT_ERRORS: usize = 5;

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLoadStats {
    pub count: u64,
    pub total_ms: u64,
    pub avg_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSample {
    pub context: String,
    pub message: String,
}

#[derive(Default)]
struct Counters {
    page_loads: HashMap<String, PageLoadStats>,
    features: HashMap<String, u64>,
    cache_hits: u64,
    cache_misses: u64,
    errors: Vec<ErrorSample>,
}

/// Snapshot handed to window content and to the exit log.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub session_seconds: u64,
    pub total_page_loads: u64,
    pub page_loads: HashMap<String, PageLoadStats>,
    pub feature_usage: HashMap<String, u64>,
    /// Percentage of page fetches served from cache, 0 when nothing fetched.
    pub cache_hit_rate: u32,
    pub error_count: usize,
    pub recent_errors: Vec<ErrorSample>,
}

/// Session-scoped counters. Only touched from the control thread and the
/// command handlers, so a plain mutex is enough.
pub struct Metrics {
    started: Instant,
    counters: Mutex<Counters>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn track_page_load(&self, page: &str, elapsed: Duration) {
        let mut counters = self.counters.lock().unwrap();
        let stats = counters.page_loads.entry(page.to_string()).or_default();
        stats.count += 1;
        stats.total_ms += elapsed.as_millis() as u64;
        stats.avg_ms = stats.total_ms / stats.count;
    }

    pub fn track_feature(&self, feature: &str) {
        let mut counters = self.counters.lock().unwrap();
        *counters.features.entry(feature.to_string()).or_insert(0) += 1;
    }

    pub fn track_cache(&self, hit: bool) {
        let mut counters = self.counters.lock().unwrap();
        if hit {
            counters.cache_hits += 1;
        } else {
            counters.cache_misses += 1;
        }
    }

    pub fn track_error(&self, context: &str, message: &str) {
        let mut counters = self.counters.lock().unwrap();
        counters.errors.push(ErrorSample {
            context: context.to_string(),
            message: message.to_string(),
        });
        let len = counters.errors.len();
        if len > MAX_ERROR_SAMPLES {
            counters.errors.drain(..len - MAX_ERROR_SAMPLES);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let counters = self.counters.lock().unwrap();
        let fetches = counters.cache_hits + counters.cache_misses;
        let hit_rate = if fetches > 0 {
            (counters.cache_hits * 100 / fetches) as u32
        } else {
            0
        };
        let recent = counters
            .errors
            .iter()
            .rev()
            .take(RECENT_ERRORS)
            .rev()
            .cloned()
            .collect();
        MetricsSummary {
            session_seconds: self.started.elapsed().as_secs(),
            total_page_loads: counters.page_loads.values().map(|s| s.count).sum(),
            page_loads: counters.page_loads.clone(),
            feature_usage: counters.features.clone(),
            cache_hit_rate: hit_rate,
            error_count: counters.errors.len(),
            recent_errors: recent,
        }
    }

    /// Log the session summary, called when the app exits.
    pub fn log_summary(&self) {
        let summary = self.summary();
        info!(
            session_seconds = summary.session_seconds,
            page_loads = summary.total_page_loads,
            cache_hit_rate = summary.cache_hit_rate,
            errors = summary.error_count,
            "session metrics"
        );
        for (page, stats) in &summary.page_loads {
            info!(page, avg_ms = stats.avg_ms, count = stats.count, "page load stats");
        }
        for (feature, count) in &summary.feature_usage {
            info!(feature, count, "feature usage");
        }
    }
}
