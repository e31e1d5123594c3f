//! The ephemeral directory the runtime libraries are staged into.

use crate::RuntimeError;
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;

/// Prefix of every workspace directory name; a random suffix follows.
pub const WORKSPACE_PREFIX: &str = "CJIT-exec.";

// ---------------------------------------------------------------------------
// Exit-time cleanup
// ---------------------------------------------------------------------------

/// Workspaces that are alive right now.
///
/// A program calling `exit()` ends the process inside its `main`, so no destructor
/// runs. Live workspaces are removed by an `atexit` handler instead.
static LIVE_WORKSPACES: Mutex<Vec<PathBuf>> = parking_lot::const_mutex(Vec::new());
static EXIT_HOOK: Once = Once::new();

extern "C" fn remove_live_workspaces() {
    remove_live(|_| true);
}

/// Removes and forgets the live workspaces matching `select`.
fn remove_live(select: impl Fn(&Path) -> bool) {
    // Never block at exit; the lock is only ever held for a push or a retain.
    let Some(mut live) = LIVE_WORKSPACES.try_lock() else {
        return;
    };
    live.retain(|path| {
        if !select(path) {
            return true;
        }
        if let Err(e) = std::fs::remove_dir_all(path) {
            log::warn!("Failed to remove temp dir {}: {}", path.display(), e);
        }
        false
    });
}

fn track(path: &Path) {
    EXIT_HOOK.call_once(|| {
        // SAFETY: registers a plain `extern "C"` function without captured state.
        if unsafe { libc::atexit(remove_live_workspaces) } != 0 {
            log::warn!("could not register exit-time workspace cleanup");
        }
    });
    LIVE_WORKSPACES.lock().push(path.to_path_buf());
}

fn untrack(path: &Path) {
    LIVE_WORKSPACES.lock().retain(|live| live != path);
}

#[cfg(test)]
fn is_tracked(path: &Path) -> bool {
    LIVE_WORKSPACES.lock().iter().any(|live| live == path)
}

/// A uniquely named, owner-only directory removed exactly once.
///
/// Removal happens in [`Workspace::close`], or on drop if the workspace goes out of
/// scope without being closed (early returns, panics). If the process exits while
/// the workspace is alive, an exit handler removes it. Failures while removing are
/// only logged: by then the outcome of the run is already decided.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Creates a new workspace below `root`.
    pub fn create(root: &Path) -> Result<Self, RuntimeError> {
        let to_error = |source| RuntimeError::Workspace {
            root: root.to_path_buf(),
            source,
        };
        // Resolve the root first so the workspace path is absolute.
        let root = root.canonicalize().map_err(to_error)?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&root)
            .map_err(to_error)?;
        let path = dir.path().to_path_buf();
        log::debug!("workspace created: {}", path.display());
        track(&path);
        Ok(Self { dir: Some(dir), path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the workspace and everything in it.
    pub fn close(mut self) -> io::Result<()> {
        self.remove()
    }

    fn remove(&mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => {
                log::debug!("removing workspace {}", self.path.display());
                untrack(&self.path);
                dir.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            log::warn!("Failed to remove temp dir {}: {}", self.path.display(), e);
        }
    }
}
