// BCI Admin Desktop - Local asset resolution
// Serves bundled images to window content as data URLs

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};
use tauri::{AppHandle, Manager};
use tracing::warn;

/// Read-only view over the bundled `assets/` directory.
///
/// Everything here returns `Option`: a missing asset is a normal outcome and
/// the caller picks its own fallback (usually an empty icon).
pub struct Assets {
    root: PathBuf,
}

impl Assets {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn from_app(app: &AppHandle) -> Self {
        let root = match app.path().resource_dir() {
            Ok(dir) => dir.join("assets"),
            Err(e) => {
                warn!(error = %e, "no resource dir, falling back to ./assets");
                PathBuf::from("assets")
            }
        };
        Self::new(root)
    }

    /// Resolve a relative asset path to an absolute one, if the file exists.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let clean = relative.trim_start_matches('/');
        if clean.split(['/', '\\']).any(|part| part == "..") {
            return None;
        }
        let path = self.root.join(clean);
        path.is_file().then_some(path)
    }

    pub fn read(&self, relative: &str) -> Option<Vec<u8>> {
        let path = self.resolve(relative)?;
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read asset");
                None
            }
        }
    }

    /// Asset contents as a base64 data URL, with the MIME type derived from
    /// the file extension.
    pub fn data_url(&self, relative: &str) -> Option<String> {
        let bytes = self.read(relative)?;
        let mime = mime_for(Path::new(relative));
        Some(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn assets_with(files: &[(&str, &[u8])]) -> (Assets, TempDir) {
        let temp = TempDir::new().unwrap();
        for (rel, bytes) in files {
            let path = temp.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, bytes).unwrap();
        }
        (Assets::new(temp.path().to_path_buf()), temp)
    }

    #[test]
    fn mime_table_matches_extensions() {
        assert_eq!(mime_for(Path::new("icon.png")), "image/png");
        assert_eq!(mime_for(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("a/b/pic.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("anim.gif")), "image/gif");
        assert_eq!(mime_for(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(mime_for(Path::new("img.webp")), "image/webp");
        assert_eq!(mime_for(Path::new("blob.bin")), "application/octet-stream");
        assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn missing_asset_is_none() {
        let (assets, _temp) = assets_with(&[]);
        assert!(assets.resolve("icons/missing.png").is_none());
        assert!(assets.read("icons/missing.png").is_none());
        assert!(assets.data_url("icons/missing.png").is_none());
    }

    #[test]
    fn leading_slash_is_tolerated() {
        let (assets, _temp) = assets_with(&[("icons/icon.png", b"png-bytes")]);
        assert!(assets.resolve("/icons/icon.png").is_some());
        assert_eq!(assets.read("/icons/icon.png").unwrap(), b"png-bytes");
    }

    #[test]
    fn parent_traversal_is_rejected() {
        let (assets, _temp) = assets_with(&[("icons/icon.png", b"x")]);
        assert!(assets.resolve("../icons/icon.png").is_none());
        assert!(assets.resolve("icons/../../etc/passwd").is_none());
    }

    #[test]
    fn data_url_carries_mime_and_base64() {
        let (assets, _temp) = assets_with(&[("icons/icon.png", b"hello")]);
        let url = assets.data_url("icons/icon.png").unwrap();
        assert_eq!(url, format!("data:image/png;base64,{}", STANDARD.encode(b"hello")));
    }
}
