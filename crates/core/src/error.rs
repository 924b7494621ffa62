use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    /// The root could not be turned into an absolute path.
    #[error("failed to resolve {}: {source}", path.display())]
    PathResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The walk failed on some entry; nothing is returned.
    #[error("failed to enumerate {}: {source}", path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// More than one entry has no parent among the walked paths.
    #[error("walk produced {} disconnected roots", roots.len())]
    AmbiguousRoot { roots: Vec<PathBuf> },

    #[error("walk produced no entries")]
    EmptyWalk,
}

impl TreeError {
    pub(crate) fn from_walk(root: &std::path::Path, err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| root.to_path_buf());
        TreeError::Enumeration {
            path,
            source: err.into(),
        }
    }
}
