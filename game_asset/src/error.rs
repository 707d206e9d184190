use std::io;

use thiserror::Error;

use crate::id::{AssetId, AssetPath};

/// The closed set of failure modes the asset pipeline can surface (§7).
///
/// Every variant is something a caller can reasonably branch on; anything else is folded into
/// [`AssetError::Io`] or [`AssetError::Fatal`].
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0:?}")]
    NotFound(AssetPath),

    #[error("unknown asset id: {0}")]
    UnknownId(AssetId),

    #[error("corrupt intermediate file for {path:?}: {reason}")]
    Corrupt { path: AssetPath, reason: String },

    #[error("unsupported file type for {0:?}")]
    UnsupportedFileType(AssetPath),

    #[error("asset {id} is a {actual:?}, expected {expected:?}")]
    WrongType {
        id: AssetId,
        expected: crate::types::AssetType,
        actual: crate::types::AssetType,
    },

    #[error("cache miss for {path:?} and re-import failed: {source}")]
    CacheMissAndImportFailed {
        path: AssetPath,
        #[source]
        source: Box<AssetError>,
    },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("fatal asset pipeline error: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, AssetError>;
