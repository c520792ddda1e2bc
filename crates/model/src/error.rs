use thiserror::Error;

use crate::position::Path;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("path {0:?} does not address a node")]
    InvalidPath(Path),

    #[error("node at {0:?} cannot hold children")]
    NotAContainer(Path),

    #[error("offset {offset} is out of bounds in {parent:?} (size {size})")]
    OffsetOutOfBounds {
        parent: Path,
        offset: usize,
        size: usize,
    },

    #[error("cannot {0} at the document root")]
    RootOperation(&'static str),

    #[error("content cannot be inserted at {0:?}")]
    InvalidInsertionPosition(Path),

    #[error("node kind `{0}` is declared twice")]
    DuplicateKind(String),

    #[error("marker `{0}` already exists")]
    MarkerExists(String),

    #[error("marker `{0}` does not exist")]
    MissingMarker(String),
}
