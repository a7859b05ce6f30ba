// BCI Admin Desktop - Detached windows
// Small always-on-top windows pinning a single route, tracked by a registry
// owned by the app state

use crate::readiness::NAVIGATION_GRACE;
use crate::window::{self, WINDOW_TITLE};
use crate::Shell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder, WindowEvent};
use tracing::{debug, info, warn};

const DETACHED_WIDTH: f64 = 400.0;
const DETACHED_HEIGHT: f64 = 420.0;

#[derive(Clone, Debug)]
pub struct DetachedRecord {
    pub id: String,
    /// Tauri window label; the registry key stays the route-derived id.
    pub label: String,
    pub route: String,
    pub title: String,
}

/// Live detached windows, keyed by id. An entry exists exactly while its
/// window is alive; the window's destroy notification is the only removal
/// path.
pub struct DetachedRegistry {
    windows: Mutex<HashMap<String, DetachedRecord>>,
    counter: AtomicU64,
}

impl DetachedRegistry {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    /// Allocate an id and window label for a new detached window. The
    /// counter is monotonic for the process lifetime and never reused, so
    /// concurrently open windows sharing a route stay distinguishable.
    pub fn allocate(&self, route: &str) -> (String, String) {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        (format!("{route}_{seq}"), format!("detached-{seq}"))
    }

    pub fn insert(&self, record: DetachedRecord) {
        self.windows
            .lock()
            .unwrap()
            .insert(record.id.clone(), record);
    }

    pub fn remove_by_label(&self, label: &str) -> Option<DetachedRecord> {
        let mut windows = self.windows.lock().unwrap();
        let id = windows
            .values()
            .find(|record| record.label == label)?
            .id
            .clone();
        windows.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.windows.lock().unwrap().len()
    }
}

/// Spawn a detached window for `route` and gate its first load. Returns the
/// new window's id.
pub fn create_detached_window(
    app: &AppHandle,
    route: &str,
    title: Option<&str>,
) -> anyhow::Result<String> {
    let shell = app.state::<Shell>();
    let (id, label) = shell.detached.allocate(route);
    let (width, height) = detached_size(app);

    let entry = format!("index.html?detached=true#{route}");
    let win = WebviewWindowBuilder::new(app, &label, WebviewUrl::App(entry.into()))
        .title(title.filter(|t| !t.is_empty()).unwrap_or(WINDOW_TITLE))
        .inner_size(width, height)
        .min_inner_size(width, height)
        .max_inner_size(width, height)
        .resizable(false)
        .always_on_top(true)
        .visible(false)
        .build()?;

    shell.detached.insert(DetachedRecord {
        id: id.clone(),
        label: label.clone(),
        route: route.to_string(),
        title: title.unwrap_or(WINDOW_TITLE).to_string(),
    });

    let handle = win.clone();
    win.on_window_event(move |event| {
        if let WindowEvent::Destroyed = event {
            let app = handle.app_handle();
            let shell = app.state::<Shell>();
            if let Some(record) = shell.detached.remove_by_label(handle.label()) {
                info!(id = %record.id, "detached window closed");
            }
            window::abandon_gate(&handle);
        }
    });

    // The builder issued the load; detached windows use the short grace since
    // the shell itself is already local by the time one can be spawned.
    window::run_gated(app, &win, NAVIGATION_GRACE, false, None, |_| Ok(()));

    debug!(id, route, "created detached window");
    Ok(id)
}

/// Detached windows are fixed-size but never larger than the primary display.
fn detached_size(app: &AppHandle) -> (f64, f64) {
    let (mut width, mut height) = (DETACHED_WIDTH, DETACHED_HEIGHT);
    match app.primary_monitor() {
        Ok(Some(monitor)) => {
            let scale = monitor.scale_factor();
            let logical = monitor.size().to_logical::<f64>(scale);
            width = width.min(logical.width);
            height = height.min(logical.height);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "could not query primary monitor"),
    }
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, label: &str, route: &str) -> DetachedRecord {
        DetachedRecord {
            id: id.to_string(),
            label: label.to_string(),
            route: route.to_string(),
            title: "BCI Admin".to_string(),
        }
    }

    #[test]
    fn ids_are_unique_for_the_same_route() {
        let registry = DetachedRegistry::new();

        let (first, _) = registry.allocate("dashboard");
        let (second, _) = registry.allocate("dashboard");

        assert_eq!(first, "dashboard_1");
        assert_eq!(second, "dashboard_2");
    }

    #[test]
    fn counter_is_not_reused_after_removal() {
        let registry = DetachedRegistry::new();

        let (id, label) = registry.allocate("users");
        registry.insert(record(&id, &label, "users"));
        registry.remove_by_label(&label).unwrap();

        let (next, _) = registry.allocate("users");
        assert_eq!(next, "users_2");
    }

    #[test]
    fn same_route_windows_coexist() {
        let registry = DetachedRegistry::new();

        for _ in 0..3 {
            let (id, label) = registry.allocate("transactions");
            registry.insert(record(&id, &label, "transactions"));
        }

        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn remove_by_label_is_single_shot() {
        let registry = DetachedRegistry::new();
        let (id, label) = registry.allocate("dashboard");
        registry.insert(record(&id, &label, "dashboard"));

        let removed = registry.remove_by_label(&label).unwrap();
        assert_eq!(removed.id, "dashboard_1");
        assert!(registry.remove_by_label(&label).is_none());
        assert_eq!(registry.len(), 0);
    }
}
