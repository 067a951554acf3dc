//! Saving classified downloads and handing them to the OS.
//!
//! Thin wrapper around file I/O and process spawning. Every failure here is
//! non-fatal: it is logged and the caller keeps the response bytes, at worst
//! the user saves the file manually.

use chrono::Local;
use std::path::PathBuf;
use std::process::Command;

/// Writes the payload to a time-stamped file in the system temp directory.
pub fn save_to_temp(bytes: &[u8], extension: &str) -> std::io::Result<PathBuf> {
    let filename = format!(
        "download-{}{}",
        Local::now().format("%Y%m%d-%H%M%S%.3f"),
        extension
    );
    let path = std::env::temp_dir().join(filename);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Asks the platform to open the file with its default application.
#[cfg(target_os = "linux")]
pub fn open_with_default_app(path: &std::path::Path) -> std::io::Result<()> {
    Command::new("xdg-open").arg(path).spawn().map(|_| ())
}

#[cfg(target_os = "macos")]
pub fn open_with_default_app(path: &std::path::Path) -> std::io::Result<()> {
    Command::new("open").arg(path).spawn().map(|_| ())
}

#[cfg(target_os = "windows")]
pub fn open_with_default_app(path: &std::path::Path) -> std::io::Result<()> {
    Command::new("cmd")
        .args(["/C", "start", ""])
        .arg(path)
        .spawn()
        .map(|_| ())
}

/// Saves the payload and opens it; returns the saved path when the write
/// succeeded, `None` otherwise. Open failures are logged but keep the path.
pub fn save_and_open(bytes: &[u8], extension: &str) -> Option<PathBuf> {
    match save_to_temp(bytes, extension) {
        Ok(path) => {
            if let Err(e) = open_with_default_app(&path) {
                log::warn!("could not open {}: {}", path.display(), e);
            }
            Some(path)
        }
        Err(e) => {
            log::warn!("could not save download: {}", e);
            None
        }
    }
}
