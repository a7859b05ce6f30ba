// BCI Admin Desktop - Global shortcuts
// Reload, hard reload, cache clearing and fullscreen, registered app-wide

use crate::config::events;
use crate::window;
use crate::Shell;
use tauri::{AppHandle, Emitter, Manager};
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutState};
use tracing::{debug, warn};

#[cfg(target_os = "macos")]
const PRIMARY: Modifiers = Modifiers::SUPER;
#[cfg(not(target_os = "macos"))]
const PRIMARY: Modifiers = Modifiers::CONTROL;

pub fn register(app: &AppHandle) -> anyhow::Result<()> {
    let shortcuts = app.global_shortcut();

    // Plain reload, both accelerators.
    shortcuts.on_shortcut(Shortcut::new(Some(PRIMARY), Code::KeyR), |app, _, event| {
        if event.state() == ShortcutState::Pressed {
            debug!("reload shortcut");
            window::reload_main_window(app, false);
        }
    })?;
    shortcuts.on_shortcut(Shortcut::new(None, Code::F5), |app, _, event| {
        if event.state() == ShortcutState::Pressed {
            debug!("reload shortcut (F5)");
            window::reload_main_window(app, false);
        }
    })?;

    // Hard reload clears caches before reloading.
    shortcuts.on_shortcut(
        Shortcut::new(Some(PRIMARY | Modifiers::SHIFT), Code::KeyR),
        |app, _, event| {
            if event.state() == ShortcutState::Pressed {
                debug!("hard reload shortcut");
                window::reload_main_window(app, true);
            }
        },
    )?;

    // Clear the page cache in place and tell the focused window's content.
    shortcuts.on_shortcut(
        Shortcut::new(Some(PRIMARY | Modifiers::SHIFT), Code::KeyC),
        |app, _, event| {
            if event.state() == ShortcutState::Pressed {
                debug!("clear cache shortcut");
                let shell = app.state::<Shell>();
                shell.pages.clear();
                shell.metrics.track_feature("clear-cache");
                if let Some(win) = window::focused_window(app) {
                    if let Err(e) = win.emit(events::CACHE_CLEARED, ()) {
                        warn!(error = %e, "failed to broadcast cache-cleared");
                    }
                }
            }
        },
    )?;

    shortcuts.on_shortcut(Shortcut::new(None, Code::F11), |app, _, event| {
        if event.state() == ShortcutState::Pressed {
            window::toggle_fullscreen(app);
        }
    })?;

    // Devtools toggle stays out of release builds.
    #[cfg(debug_assertions)]
    shortcuts.on_shortcut(
        Shortcut::new(Some(PRIMARY | Modifiers::SHIFT), Code::KeyI),
        |app, _, event| {
            if event.state() == ShortcutState::Pressed {
                if let Some(win) = window::focused_window(app) {
                    if win.is_devtools_open() {
                        win.close_devtools();
                    } else {
                        win.open_devtools();
                    }
                }
            }
        },
    )?;

    debug!("global shortcuts registered");
    Ok(())
}

pub fn unregister_all(app: &AppHandle) {
    if let Err(e) = app.global_shortcut().unregister_all() {
        warn!(error = %e, "failed to unregister shortcuts");
    }
}
