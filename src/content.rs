// BCI Admin Desktop - Remote page fetch with cache
// Pulls page content from the frontend API, keeping fresh copies in memory

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server could not be reached at all. Window content renders its
    /// own offline state when it sees this.
    #[error("no internet connection")]
    Offline,
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// One fetched page, as handed to window content.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub content: String,
    pub etag: Option<String>,
    /// Unix millis of the fetch that produced this content.
    pub fetched_at: u64,
    pub from_cache: bool,
}

struct Entry {
    page: Page,
    fetched: Instant,
}

/// In-memory page cache over the remote frontend API.
pub struct PageCache {
    client: reqwest::Client,
    base_url: String,
    entries: Mutex<HashMap<String, Entry>>,
}

impl PageCache {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a page, serving it from the cache while it is younger than
    /// `ttl`. Offline failures are distinguishable from server errors.
    pub async fn fetch(&self, relative: &str, ttl: Duration) -> Result<Page, FetchError> {
        if let Some(page) = self.lookup_fresh(relative, ttl) {
            debug!(path = relative, "serving page from cache");
            return Ok(page);
        }

        let url = join_url(&self.base_url, relative);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                FetchError::Offline
            } else {
                FetchError::from(e)
            }
        })?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let content = response.text().await?;
        let page = Page {
            content,
            etag,
            fetched_at: unix_millis(),
            from_cache: false,
        };
        self.insert(relative, page.clone());
        Ok(page)
    }

    fn lookup_fresh(&self, relative: &str, ttl: Duration) -> Option<Page> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(relative)?;
        if entry.fetched.elapsed() >= ttl {
            return None;
        }
        let mut page = entry.page.clone();
        page.from_cache = true;
        Some(page)
    }

    fn insert(&self, relative: &str, page: Page) {
        self.entries.lock().unwrap().insert(
            relative.to_string(),
            Entry {
                page,
                fetched: Instant::now(),
            },
        );
    }

    /// Drop every cached page. Used by hard reload and the clear-cache
    /// shortcut.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

fn join_url(base: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(content: &str) -> Page {
        Page {
            content: content.to_string(),
            etag: Some("\"abc\"".to_string()),
            fetched_at: unix_millis(),
            from_cache: false,
        }
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(
            join_url("https://host/api/", "/dashboard/index.html"),
            "https://host/api/dashboard/index.html"
        );
        assert_eq!(
            join_url("https://host/api", "dashboard/index.html"),
            "https://host/api/dashboard/index.html"
        );
    }

    #[test]
    fn fresh_entry_is_served_from_cache() {
        let cache = PageCache::new("https://host/api".to_string());
        cache.insert("users/index.html", page("<html>"));

        let hit = cache
            .lookup_fresh("users/index.html", Duration::from_secs(60))
            .unwrap();
        assert!(hit.from_cache);
        assert_eq!(hit.content, "<html>");
    }

    #[test]
    fn stale_entry_is_not_served() {
        let cache = PageCache::new("https://host/api".to_string());
        cache.insert("users/index.html", page("<html>"));

        assert!(cache
            .lookup_fresh("users/index.html", Duration::ZERO)
            .is_none());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = PageCache::new("https://host/api".to_string());
        cache.insert("a", page("a"));
        cache.insert("b", page("b"));

        cache.clear();

        assert!(cache.lookup_fresh("a", Duration::from_secs(60)).is_none());
        assert!(cache.lookup_fresh("b", Duration::from_secs(60)).is_none());
    }
}
