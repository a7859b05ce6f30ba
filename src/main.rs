// BCI Admin Desktop - Tauri v2
// Main entry point

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod assets;
mod config;
mod content;
mod detach;
mod errlog;
mod metrics;
mod readiness;
mod shortcuts;
mod storage;
mod tray;
mod window;

use assets::Assets;
use content::{Page, PageCache};
use errlog::ErrorLog;
use metrics::{Metrics, MetricsSummary};
use readiness::{GateSignal, ReadinessGate};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use storage::Store;
use tauri::{AppHandle, Manager, RunEvent, State, WebviewWindow};
use tracing::{debug, info, warn};
use window::{Dispatch, ShellWindow};

/// Application-wide state, built once in setup and shared through
/// `app.manage`.
pub struct Shell {
    pub store: Store,
    pub pages: PageCache,
    pub assets: Assets,
    pub metrics: Metrics,
    pub errors: ErrorLog,
    pub detached: detach::DetachedRegistry,
    /// Current load cycle per window label. `renderer_ready` and
    /// `renderer_load_failed` route into this; a signal with no waiting gate
    /// is dropped.
    pub gates: Mutex<HashMap<String, Arc<ReadinessGate<ShellWindow>>>>,
}

impl Shell {
    fn build(app: &AppHandle) -> anyhow::Result<Self> {
        let base_url = std::env::var("ADMIN_API_BASE_URL")
            .unwrap_or_else(|_| format!("{}{}", config::API_BASE_URL, config::FILES_ENDPOINT));
        Ok(Self {
            store: Store::from_app(app)?,
            pages: PageCache::new(base_url),
            assets: Assets::from_app(app),
            metrics: Metrics::new(),
            errors: ErrorLog::from_app(app)?,
            detached: detach::DetachedRegistry::new(),
            gates: Mutex::new(HashMap::new()),
        })
    }
}

// ============================================================================
// Readiness signals from window content
// ============================================================================

/// One-shot ready signal from a window's content. Consumed by that window's
/// pending gate, ignored when none is waiting.
#[tauri::command]
fn renderer_ready(window: WebviewWindow, shell: State<'_, Shell>) {
    let gate = shell.gates.lock().unwrap().get(window.label()).cloned();
    match gate {
        Some(gate) => {
            gate.signal(GateSignal::Ready);
        }
        None => debug!(label = window.label(), "ready signal with no waiting gate"),
    }
}

/// Content failed to load; the window is shown with whatever rendered rather
/// than staying hidden.
#[tauri::command]
fn renderer_load_failed(window: WebviewWindow, shell: State<'_, Shell>) {
    warn!(label = window.label(), "window content reported a failed load");
    shell.metrics.track_error("load", "window content failed to load");
    let gate = shell.gates.lock().unwrap().get(window.label()).cloned();
    if let Some(gate) = gate {
        gate.signal(GateSignal::LoadFailed);
    }
}

// ============================================================================
// Navigation commands
// ============================================================================

/// Tauri command to swap the focused window to another route.
#[tauri::command]
async fn navigate_request(app: AppHandle, route: String) -> Result<Dispatch, String> {
    let shell = app.state::<Shell>();
    shell.metrics.track_feature("navigate");
    Ok(window::navigate(&app, &route))
}

/// Tauri command to clear the session and return to the entry page.
#[tauri::command]
async fn logout_request(app: AppHandle) -> Result<Dispatch, String> {
    let shell = app.state::<Shell>();
    shell.metrics.track_feature("logout");
    Ok(window::logout(&app))
}

/// Tauri command to open a detached window for a route. Returns the new
/// window's id.
#[tauri::command]
async fn detach_request(
    app: AppHandle,
    route: String,
    title: Option<String>,
) -> Result<String, String> {
    let shell = app.state::<Shell>();
    shell.metrics.track_feature("detach");
    detach::create_detached_window(&app, &route, title.as_deref()).map_err(|e| {
        shell.errors.record("detach", &e.to_string());
        e.to_string()
    })
}

/// Tauri command to toggle fullscreen on the focused window.
#[tauri::command]
async fn toggle_fullscreen(app: AppHandle) -> Result<Dispatch, String> {
    Ok(window::toggle_fullscreen(&app))
}

// ============================================================================
// Content and asset commands
// ============================================================================

/// Tauri command fetching a page for window content, cache-first.
#[tauri::command]
async fn fetch_page(
    app: AppHandle,
    path: String,
    ttl_ms: Option<u64>,
) -> Result<Page, String> {
    let shell = app.state::<Shell>();
    let ttl = ttl_ms.map_or(config::DEFAULT_PAGE_TTL, Duration::from_millis);
    let started = Instant::now();
    match shell.pages.fetch(&path, ttl).await {
        Ok(page) => {
            shell.metrics.track_cache(page.from_cache);
            shell.metrics.track_page_load(&path, started.elapsed());
            Ok(page)
        }
        Err(e) => {
            shell.metrics.track_error("fetch", &e.to_string());
            shell.errors.record("fetch", &format!("{path}: {e}"));
            Err(e.to_string())
        }
    }
}

/// Tauri command resolving a bundled asset to a data URL; `None` when the
/// asset is missing and the caller picks its own fallback.
#[tauri::command]
async fn get_asset_data_url(app: AppHandle, path: String) -> Option<String> {
    app.state::<Shell>().assets.data_url(&path)
}

/// Tauri command exposing the session metrics snapshot.
#[tauri::command]
async fn get_metrics_summary(app: AppHandle) -> Result<MetricsSummary, String> {
    Ok(app.state::<Shell>().metrics.summary())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .setup(|app| {
            let handle = app.handle().clone();
            let shell = Shell::build(&handle)?;
            shell.errors.clean_old(errlog::MAX_LOG_AGE);
            errlog::install_panic_hook(shell.errors.clone());
            app.manage(shell);

            window::create_main_window(&handle)?;
            tray::create_tray(&handle)?;
            if let Err(e) = shortcuts::register(&handle) {
                // Shortcuts are a convenience; the tray still reaches
                // everything they do.
                warn!(error = %e, "global shortcut registration failed");
            }
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            renderer_ready,
            renderer_load_failed,
            navigate_request,
            logout_request,
            detach_request,
            toggle_fullscreen,
            fetch_page,
            get_asset_data_url,
            get_metrics_summary,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app, event| match event {
        RunEvent::ExitRequested { code: None, api, .. } => {
            // The tray keeps the process alive once the last window closes.
            api.prevent_exit();
        }
        RunEvent::Exit => {
            info!("shutting down");
            app.state::<Shell>().metrics.log_summary();
            shortcuts::unregister_all(app);
        }
        _ => {}
    });
}
