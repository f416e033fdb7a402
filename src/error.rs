use std::path::PathBuf;

use thiserror::Error;

/// Library error type for slide sourcing and display.
///
/// Most variants are recovered locally by the sampler (the candidate is
/// discarded) and only reach the logs.
#[derive(Debug, Error)]
pub enum Error {
    /// The file exists but is not a valid or supported image.
    #[error("{path} is not a decodable image: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A pipe, socket or device node; opening it could block forever.
    #[error("{0} is not a regular file")]
    NotAFile(PathBuf),

    /// An indirection points at a missing or invalid target.
    #[error("cannot resolve indirection {0}")]
    Unresolvable(PathBuf),

    /// A `.lnk` file is truncated or does not follow the shell-link layout.
    #[error("malformed shell link: {0}")]
    Shortcut(&'static str),

    /// A subtree could not be traversed while indexing.
    #[error("traversal of {path} failed: {source}")]
    Traversal {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Resizing a decoded slide to the viewport failed.
    #[error("resize failed: {0}")]
    Resize(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
