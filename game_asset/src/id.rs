use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The stable identity of an asset, generated once at first import.
///
/// Unlike [`AssetPath`] the id never changes for the lifetime of the asset; it is the primary
/// key used to locate metadata and intermediate files on disk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    /// Generates a new random asset id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns `true` if this is the nil UUID.
    ///
    /// A nil id never refers to a valid asset; metadata invariants forbid it (§3).
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AssetId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl Display for AssetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A UTF-8 relative path under the implicit project root.
///
/// The secondary key for an asset: it may be renamed without invalidating the [`AssetId`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetPath(String);

impl AssetPath {
    pub fn new<S>(path: S) -> Self
    where
        S: Into<String>,
    {
        Self(path.into().replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.0).extension().and_then(|ext| ext.to_str())
    }

    /// The path relative to a project root, as a real filesystem path.
    pub fn to_path_buf(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.0)
    }
}

impl Display for AssetPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<S> From<S> for AssetPath
where
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{AssetId, AssetPath};

    #[test]
    fn asset_id_default_is_not_nil() {
        assert!(!AssetId::new().is_nil());
    }

    #[test]
    fn asset_path_normalizes_separators() {
        let path = AssetPath::new("Textures\\checker.png");
        assert_eq!(path.as_str(), "Textures/checker.png");
    }

    #[test]
    fn asset_path_extension() {
        let path = AssetPath::new("Textures/checker.png");
        assert_eq!(path.extension(), Some("png"));
    }
}
