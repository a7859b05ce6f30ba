// BCI Admin Desktop - Static configuration
// Remote endpoint layout, cache policy, storage keys and event names

use std::time::Duration;

/// Base URL of the admin frontend API serving page content.
/// Overridable at runtime through the `ADMIN_API_BASE_URL` environment
/// variable (picked up in `Shell::build`).
pub const API_BASE_URL: &str = "https://admin.bcibizz.pt/frontend-api";

/// Endpoint under the base URL that serves page files.
pub const FILES_ENDPOINT: &str = "/files";

/// How long a fetched page stays fresh in the in-memory cache.
pub const DEFAULT_PAGE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Keys into the persisted key/value store.
pub mod keys {
    pub const WINDOW_STATE: &str = "admin-window-state";
    pub const AUTH_TOKEN: &str = "admin-token";
    pub const REMEMBER_ME: &str = "admin-remember-me";
}

/// Events broadcast from the shell to window content.
pub mod events {
    /// Sent to a window after its caches have been invalidated.
    pub const CACHE_CLEARED: &str = "cache-cleared";
    /// Asks a window's content to switch route in place, without a load cycle.
    pub const NAVIGATE_TO: &str = "navigate-to";
}
