// BCI Admin Desktop - System tray
// Tray icon with quick routes into the main window; keeps the app reachable
// while the window is hidden

use crate::config::events;
use crate::window::{self, MAIN_WINDOW_LABEL};
use crate::Shell;
use tauri::image::Image;
use tauri::menu::{Menu, MenuItem, PredefinedMenuItem};
use tauri::tray::{TrayIconBuilder, TrayIconEvent};
use tauri::{AppHandle, Emitter, Manager};
use tracing::{debug, info, warn};

const TRAY_TOOLTIP: &str = "BCI Admin";

pub fn create_tray(app: &AppHandle) -> tauri::Result<()> {
    let show = MenuItem::with_id(app, "show", "Show Application", true, None::<&str>)?;
    let dashboard = MenuItem::with_id(app, "dashboard", "Dashboard", true, None::<&str>)?;
    let users = MenuItem::with_id(app, "users", "Users", true, None::<&str>)?;
    let transactions = MenuItem::with_id(app, "transactions", "Transactions", true, None::<&str>)?;
    let quit = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;
    let menu = Menu::with_items(
        app,
        &[
            &show,
            &PredefinedMenuItem::separator(app)?,
            &dashboard,
            &users,
            &transactions,
            &PredefinedMenuItem::separator(app)?,
            &quit,
        ],
    )?;

    let mut builder = TrayIconBuilder::with_id("tray")
        .menu(&menu)
        .tooltip(TRAY_TOOLTIP)
        .show_menu_on_left_click(false)
        .on_menu_event(|app, event| match event.id.as_ref() {
            "show" => show_main_window(app),
            "dashboard" | "users" | "transactions" => {
                show_and_route(app, event.id.as_ref());
            }
            "quit" => {
                info!("quit requested from tray");
                if let Some(win) = app.get_webview_window(MAIN_WINDOW_LABEL) {
                    window::save_window_state(&win);
                }
                app.exit(0);
            }
            other => debug!(item = other, "unhandled tray menu item"),
        })
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::DoubleClick { .. } = event {
                show_main_window(tray.app_handle());
            }
        });
    if let Some(icon) = tray_icon(app) {
        builder = builder.icon(icon);
    }
    builder.build(app)?;

    debug!("system tray created");
    Ok(())
}

/// Reveal the main window and ask its content to switch route in place. No
/// load cycle happens, so no readiness gating is involved.
fn show_and_route(app: &AppHandle, route: &str) {
    show_main_window(app);
    if let Some(win) = app.get_webview_window(MAIN_WINDOW_LABEL) {
        if let Err(e) = win.emit(events::NAVIGATE_TO, route) {
            warn!(route, error = %e, "failed to send navigate-to");
        }
    }
}

fn show_main_window(app: &AppHandle) {
    match app.get_webview_window(MAIN_WINDOW_LABEL) {
        Some(win) => {
            if let Err(e) = win.show() {
                warn!(error = %e, "failed to show main window");
            }
            let _ = win.set_focus();
        }
        // On macOS the close is not intercepted, so the window may be gone.
        None => {
            if let Err(e) = window::create_main_window(app) {
                warn!(error = %e, "failed to recreate main window");
            }
        }
    }
}

/// Bundled tray icon, falling back to the app's window icon when the asset
/// is missing or unreadable.
fn tray_icon(app: &AppHandle) -> Option<Image<'static>> {
    let shell = app.state::<Shell>();
    if let Some(bytes) = shell.assets.read("icons/tray-icon.png") {
        match Image::from_bytes(&bytes) {
            Ok(icon) => return Some(icon),
            Err(e) => warn!(error = %e, "could not decode tray icon asset"),
        }
    }
    app.default_window_icon().cloned()
}
