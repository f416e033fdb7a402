use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/// Flat list of candidate files shared between the indexer (append) and the
/// list sampler (pick and evict).
///
/// Indices are only meaningful while the lock is held; callers re-derive them
/// from the current length on every pick because the list shrinks and grows
/// underfoot.
#[derive(Debug, Clone, Default)]
pub struct FileList {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    paths: Mutex<Vec<PathBuf>>,
    complete: AtomicBool,
}

impl FileList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend<I: IntoIterator<Item = PathBuf>>(&self, paths: I) {
        self.inner.paths.lock().extend(paths);
    }

    pub fn len(&self) -> usize {
        self.inner.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.paths.lock().is_empty()
    }

    /// Pick an entry with `choose(len)` under the lock; `choose` receives a
    /// non-zero length and must return an index below it.
    pub fn pick_with(&self, choose: impl FnOnce(usize) -> usize) -> Option<(usize, PathBuf)> {
        let paths = self.inner.paths.lock();
        if paths.is_empty() {
            return None;
        }
        let idx = choose(paths.len());
        paths.get(idx).map(|p| (idx, p.clone()))
    }

    /// Remove `path`, expected at `idx`. Falls back to a search when the
    /// entry moved since it was picked. Returns whether anything was removed.
    pub fn evict(&self, idx: usize, path: &Path) -> bool {
        let mut paths = self.inner.paths.lock();
        let pos = if paths.get(idx).is_some_and(|p| p == path) {
            Some(idx)
        } else {
            paths.iter().position(|p| p == path)
        };
        match pos {
            Some(pos) => {
                paths.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.inner.paths.lock().iter().any(|p| p == path)
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<PathBuf> {
        self.inner.paths.lock().clone()
    }

    /// Marks that no further entries will be appended.
    pub fn mark_complete(&self) {
        self.inner.complete.store(true, Ordering::Release);
    }

    pub fn is_complete(&self) -> bool {
        self.inner.complete.load(Ordering::Acquire)
    }
}

impl FromIterator<PathBuf> for FileList {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let list = Self::new();
        list.extend(iter);
        list
    }
}
