//! Following shortcut-style filesystem entries to their real targets.

pub mod lnk;

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Chains longer than this (link to link to ...) are treated as unresolvable.
const MAX_HOPS: usize = 8;

/// Resolves entries that point at other files or directories.
///
/// Samplers use this to follow indirections as if they were their targets;
/// the indirection itself is never a slide candidate.
pub trait IndirectionResolver: Send + Sync {
    /// Whether `path` is an indirection rather than content.
    fn is_indirection(&self, path: &Path) -> bool;

    /// The real path behind `path`, which may be a file or a directory.
    ///
    /// # Errors
    /// Returns [`Error::Unresolvable`] when the target is missing or invalid.
    fn resolve(&self, path: &Path) -> Result<PathBuf>;
}

/// Follows symbolic links and Windows `.lnk` shell links.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortcutResolver;

impl ShortcutResolver {
    fn resolve_once(&self, path: &Path) -> Result<PathBuf> {
        let target = if is_lnk(path) {
            let bytes = fs::read(path)?;
            lnk::parse(&bytes)?.target_path()
        } else {
            fs::read_link(path)?
        };
        // relative symlink targets are relative to the link's directory
        Ok(match path.parent() {
            Some(parent) if target.is_relative() => parent.join(target),
            _ => target,
        })
    }
}

impl IndirectionResolver for ShortcutResolver {
    fn is_indirection(&self, path: &Path) -> bool {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => true,
            Ok(meta) => meta.is_file() && is_lnk(path),
            Err(_) => false,
        }
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let mut current = path.to_path_buf();
        for _ in 0..MAX_HOPS {
            current = self.resolve_once(&current).map_err(|err| {
                debug!(path = %path.display(), error = %err, "indirection unreadable");
                Error::Unresolvable(path.to_path_buf())
            })?;
            if !self.is_indirection(&current) {
                return fs::canonicalize(&current)
                    .map_err(|_| Error::Unresolvable(path.to_path_buf()));
            }
        }
        debug!(path = %path.display(), "indirection chain too long");
        Err(Error::Unresolvable(path.to_path_buf()))
    }
}

fn is_lnk(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("lnk"))
}
