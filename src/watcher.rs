// Shader hot reload - file watching
//
// Watches the directory holding a shader file and raises a flag whenever that
// file is created or modified. The notify callback runs on its own thread;
// the render thread drains the flag once per frame and rebuilds the program.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

pub struct ShaderWatcher {
    path: PathBuf,
    changed: Arc<Mutex<bool>>,
    // Dropping the watcher stops the notify thread
    _watcher: RecommendedWatcher,
}

impl ShaderWatcher {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .with_context(|| format!("Shader path has no file name: {:?}", path))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let changed = Arc::new(Mutex::new(false));
        let flag = changed.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if touches(&event, &file_name) => *flag.lock() = true,
            Ok(_) => {}
            Err(e) => log::warn!("Shader watcher error: {}", e),
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {:?}", dir))?;

        log::info!("Watching {:?} for changes", path);

        Ok(Self {
            path,
            changed,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true once per burst of changes since the last call.
    pub fn take_change(&self) -> bool {
        std::mem::take(&mut *self.changed.lock())
    }
}

/// Whether `event` writes to a file named `file_name`.
fn touches(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
