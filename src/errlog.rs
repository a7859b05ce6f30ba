// BCI Admin Desktop - File error log
// Append-only dated log files under the app data dir, plus a panic hook

use chrono::{Local, Utc};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tauri::{AppHandle, Manager};
use tracing::{error, warn};

const LOG_FILE_PREFIX: &str = "admin-error-";

/// Log files older than this are pruned at startup.
pub const MAX_LOG_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Writes error reports to `admin-error-YYYY-MM-DD.log` files.
///
/// Logging must never take the app down: every failure in here is swallowed
/// after a tracing event.
#[derive(Clone)]
pub struct ErrorLog {
    dir: PathBuf,
}

impl ErrorLog {
    pub fn new(dir: PathBuf) -> Self {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "could not create logs directory");
        }
        Self { dir }
    }

    pub fn from_app(app: &AppHandle) -> anyhow::Result<Self> {
        let data_dir = app
            .path()
            .app_data_dir()
            .map_err(|e| anyhow::anyhow!("Failed to get app data dir: {}", e))?;
        Ok(Self::new(data_dir.join("logs")))
    }

    fn current_file(&self) -> PathBuf {
        let day = Local::now().format("%Y-%m-%d");
        self.dir.join(format!("{LOG_FILE_PREFIX}{day}.log"))
    }

    /// Append one report to today's log file.
    pub fn record(&self, context: &str, message: &str) {
        error!(context, message, "recording error");
        let entry = format!("\n[{}] {}\n{}\n---\n", Utc::now().to_rfc3339(), context, message);
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_file())
            .and_then(|mut file| file.write_all(entry.as_bytes()));
        if let Err(e) = result {
            warn!(error = %e, "failed to write error log");
        }
    }

    /// Remove log files older than `max_age`. Returns how many were removed.
    pub fn clean_old(&self, max_age: Duration) -> usize {
        let mut cleaned = 0;
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "failed to list logs directory");
                return 0;
            }
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(LOG_FILE_PREFIX) {
                continue;
            }
            let stale = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .is_some_and(|age| age > max_age);
            if stale && std::fs::remove_file(entry.path()).is_ok() {
                cleaned += 1;
            }
        }
        cleaned
    }
}

/// Record panics before handing them to the previous hook, so a crash in the
/// orchestration still leaves a trace on disk.
pub fn install_panic_hook(log: ErrorLog) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log.record("panic", &info.to_string());
        previous(info);
    }));
}
