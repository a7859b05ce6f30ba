// BCI Admin Desktop - Main window and navigation
// Creates the primary window from persisted state, intercepts close into the
// tray, and drives every in-place load cycle through the readiness gate

use crate::config::{events, keys};
use crate::readiness::{
    AfterShow, GateSignal, ReadinessGate, FIRST_LOAD_GRACE, NAVIGATION_GRACE,
};
use crate::storage::WindowState;
use crate::Shell;
use serde::Serialize;
use std::time::Duration;
use tauri::{
    AppHandle, Emitter, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent,
};
use tracing::{debug, warn};

pub const MAIN_WINDOW_LABEL: &str = "main";
pub const WINDOW_TITLE: &str = "BCI Admin";

const MIN_WIDTH: f64 = 1200.0;
const MIN_HEIGHT: f64 = 800.0;

/// Outcome of a window-targeting command. A missing focused window is
/// "nothing to do", reported explicitly rather than as a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dispatch {
    Performed,
    NoFocusedWindow,
}

/// Webview handle as seen by the readiness gate.
pub struct ShellWindow {
    win: WebviewWindow,
    maximize_on_show: bool,
}

impl crate::readiness::GatedWindow for ShellWindow {
    fn hide(&self) {
        if let Err(e) = self.win.hide() {
            warn!(label = self.win.label(), error = %e, "failed to hide window");
        }
    }

    fn show(&self) {
        if self.maximize_on_show {
            if let Err(e) = self.win.maximize() {
                warn!(label = self.win.label(), error = %e, "failed to maximize window");
            }
        }
        if let Err(e) = self.win.show() {
            warn!(label = self.win.label(), error = %e, "failed to show window");
        }
    }

    fn is_destroyed(&self) -> bool {
        // Destroyed windows disappear from the app's window map.
        self.win
            .app_handle()
            .get_webview_window(self.win.label())
            .is_none()
    }
}

/// Start one load cycle on a window: supersede any pending cycle, hide, run
/// the load action and wait for readiness under `grace`.
pub fn run_gated<F>(
    app: &AppHandle,
    win: &WebviewWindow,
    grace: Duration,
    maximize_on_show: bool,
    after_show: Option<AfterShow>,
    load: F,
) where
    F: FnOnce(&WebviewWindow) -> anyhow::Result<()>,
{
    let shell = app.state::<Shell>();
    if let Some(previous) = shell.gates.lock().unwrap().remove(win.label()) {
        previous.signal(GateSignal::Superseded);
    }
    let gate = ReadinessGate::arm(
        ShellWindow {
            win: win.clone(),
            maximize_on_show,
        },
        grace,
        after_show,
        |shell_win| load(&shell_win.win),
    );
    shell
        .gates
        .lock()
        .unwrap()
        .insert(win.label().to_string(), gate);
}

/// Resolve the window's pending load cycle, if any, because the window is
/// gone. Called from `Destroyed` window events.
pub fn abandon_gate(win: &WebviewWindow) {
    let app = win.app_handle();
    let shell = app.state::<Shell>();
    if let Some(gate) = shell.gates.lock().unwrap().remove(win.label()) {
        gate.signal(GateSignal::Destroyed);
    }
}

/// Create the main window from persisted state and gate its first load with
/// the long startup grace period.
pub fn create_main_window(app: &AppHandle) -> anyhow::Result<WebviewWindow> {
    let shell = app.state::<Shell>();
    let state = shell
        .store
        .load::<WindowState>(keys::WINDOW_STATE)
        .unwrap_or_default();
    debug!(?state, "creating main window");

    let mut builder =
        WebviewWindowBuilder::new(app, MAIN_WINDOW_LABEL, WebviewUrl::App("index.html".into()))
            .title(WINDOW_TITLE)
            .inner_size(state.width, state.height)
            .min_inner_size(MIN_WIDTH, MIN_HEIGHT)
            .visible(false);
    if let (Some(x), Some(y)) = (state.x, state.y) {
        builder = builder.position(x, y);
    }
    let win = builder.build()?;

    attach_main_window_events(&win);

    // The builder already issued the entry load; the gate hides, waits for
    // the content's ready signal and shows maximized. Startup always
    // maximizes; the persisted geometry seeds the pre-maximize bounds.
    run_gated(app, &win, FIRST_LOAD_GRACE, true, None, |_| Ok(()));
    Ok(win)
}

fn attach_main_window_events(win: &WebviewWindow) {
    let handle = win.clone();
    win.on_window_event(move |event| match event {
        WindowEvent::CloseRequested { api, .. } => {
            save_window_state(&handle);
            // Tray-resident on everything but macOS: suppress the close and
            // hide, so the tray can reveal the window later.
            #[cfg(not(target_os = "macos"))]
            {
                api.prevent_close();
                if let Err(e) = handle.hide() {
                    warn!(error = %e, "failed to hide main window");
                }
                debug!("main window hidden to tray");
            }
            #[cfg(target_os = "macos")]
            let _ = api;
        }
        WindowEvent::Destroyed => abandon_gate(&handle),
        _ => {}
    });
}

/// Persist the window's current geometry and maximized flag.
pub fn save_window_state(win: &WebviewWindow) {
    let app = win.app_handle();
    let shell = app.state::<Shell>();
    if let (Ok(size), Ok(position)) = (win.inner_size(), win.outer_position()) {
        let scale = win.scale_factor().unwrap_or(1.0);
        let logical_size = size.to_logical::<f64>(scale);
        let logical_position = position.to_logical::<f64>(scale);
        let state = WindowState {
            x: Some(logical_position.x),
            y: Some(logical_position.y),
            width: logical_size.width,
            height: logical_size.height,
            is_maximized: win.is_maximized().unwrap_or(false),
        };
        debug!(?state, "saving window state");
        shell.store.save(keys::WINDOW_STATE, &state);
    }
}

/// Reload the main window behind the gate. A hard reload drops the webview's
/// browsing data and the page cache first, and tells the freshly loaded
/// content about it once the window is visible again.
pub fn reload_main_window(app: &AppHandle, hard: bool) {
    let Some(win) = app.get_webview_window(MAIN_WINDOW_LABEL) else {
        debug!("reload requested without a main window");
        return;
    };
    let shell = app.state::<Shell>();
    shell
        .metrics
        .track_feature(if hard { "hard-reload" } else { "reload" });

    if hard {
        let broadcast: AfterShow = {
            let win = win.clone();
            Box::new(move || {
                if let Err(e) = win.emit(events::CACHE_CLEARED, ()) {
                    warn!(error = %e, "failed to broadcast cache-cleared");
                }
            })
        };
        run_gated(app, &win, NAVIGATION_GRACE, false, Some(broadcast), |w| {
            w.clear_all_browsing_data()?;
            app.state::<Shell>().pages.clear();
            w.eval("window.location.reload()")?;
            Ok(())
        });
    } else {
        run_gated(app, &win, NAVIGATION_GRACE, false, None, |w| {
            w.eval("window.location.reload()")?;
            Ok(())
        });
    }
}

/// Swap the focused window's content to the page for `route`.
pub fn navigate(app: &AppHandle, route: &str) -> Dispatch {
    let Some(win) = focused_window(app) else {
        debug!(route, "navigate requested with no focused window");
        return Dispatch::NoFocusedWindow;
    };
    debug!(route, "navigating focused window");
    run_gated(app, &win, NAVIGATION_GRACE, false, None, |w| {
        let url = shell_url(w, Some(route))?;
        let mut target = w.clone();
        target.navigate(url)?;
        Ok(())
    });
    Dispatch::Performed
}

/// Clear the persisted session and return the focused window to the entry
/// page. The session is cleared even when no window is focused.
pub fn logout(app: &AppHandle) -> Dispatch {
    let shell = app.state::<Shell>();
    shell.store.remove(keys::AUTH_TOKEN);
    shell.store.remove(keys::REMEMBER_ME);
    debug!("cleared persisted session");

    let Some(win) = focused_window(app) else {
        debug!("logout with no focused window");
        return Dispatch::NoFocusedWindow;
    };
    run_gated(app, &win, NAVIGATION_GRACE, false, None, |w| {
        let url = shell_url(w, None)?;
        let mut target = w.clone();
        target.navigate(url)?;
        Ok(())
    });
    Dispatch::Performed
}

/// Flip the focused window's fullscreen flag. No content reload happens, so
/// no gating is involved.
pub fn toggle_fullscreen(app: &AppHandle) -> Dispatch {
    let Some(win) = focused_window(app) else {
        return Dispatch::NoFocusedWindow;
    };
    let fullscreen = win.is_fullscreen().unwrap_or(false);
    if let Err(e) = win.set_fullscreen(!fullscreen) {
        warn!(error = %e, "failed to toggle fullscreen");
    }
    Dispatch::Performed
}

pub fn focused_window(app: &AppHandle) -> Option<WebviewWindow> {
    app.webview_windows()
        .into_values()
        .find(|win| win.is_focused().unwrap_or(false))
}

/// Entry URL of the shell, optionally scoped to a route via the fragment.
fn shell_url(win: &WebviewWindow, route: Option<&str>) -> anyhow::Result<tauri::Url> {
    let mut url = win.url()?;
    url.set_path("/index.html");
    url.set_query(None);
    url.set_fragment(route.filter(|r| !r.is_empty()));
    Ok(url)
}
