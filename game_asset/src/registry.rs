use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use game_common::collections::bimap::BiMap;
use game_common::collections::lru::LruCache;

use crate::error::{AssetError, Result};
use crate::id::{AssetId, AssetPath};
use crate::metadata::Metadata;
use crate::types::AssetType;

/// The default bound on [`AssetRegistry`]'s in-memory metadata cache, matching the original
/// engine's `TLruCache<FUuid, FAssetMetaData> CachedMetadata(512)`.
pub const DEFAULT_METADATA_CACHE_CAPACITY: usize = 512;

/// Maps between [`AssetId`] and [`AssetPath`], and owns the on-disk `Metadata/<uuid>.meta` files.
///
/// Holds the two directions of identity (§3 "Identity & addressing") in a [`BiMap`] so a rename
/// on disk only requires updating the path side, and caches recently touched metadata in a bounded
/// [`LruCache`] to avoid re-parsing JSON on every lookup.
pub struct AssetRegistry {
    project_root: PathBuf,
    index: BiMap<AssetId, AssetPath>,
    cache: LruCache<AssetId, Metadata>,
}

impl AssetRegistry {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self::with_cache_capacity(project_root, DEFAULT_METADATA_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(project_root: impl Into<PathBuf>, cache_capacity: usize) -> Self {
        Self {
            project_root: project_root.into(),
            index: BiMap::new(),
            cache: LruCache::new(cache_capacity),
        }
    }

    fn metadata_dir(&self) -> PathBuf {
        self.project_root.join("Metadata")
    }

    fn meta_file_path(&self, id: AssetId) -> PathBuf {
        self.metadata_dir().join(format!("{id}.meta"))
    }

    /// Scans `Metadata/*.meta` under the project root and populates the id/path index.
    ///
    /// Does not populate the metadata cache; entries are loaded lazily on first lookup so startup
    /// cost stays proportional to how many assets are actually touched this run.
    pub fn scan(&mut self) -> Result<()> {
        let dir = self.metadata_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(AssetError::Io(e)),
        };

        for entry in entries {
            let entry = entry.map_err(AssetError::Io)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("meta") {
                continue;
            }

            let contents = fs::read_to_string(&path).map_err(AssetError::Io)?;
            let metadata: Metadata = serde_json::from_str(&contents).map_err(|e| AssetError::Corrupt {
                path: AssetPath::new(path.to_string_lossy().into_owned()),
                reason: e.to_string(),
            })?;

            self.index.insert(metadata.id, metadata.path.clone());
        }

        Ok(())
    }

    pub fn id_for_path(&self, path: &AssetPath) -> Option<AssetId> {
        self.index.get_right(path).copied()
    }

    pub fn path_for_id(&self, id: AssetId) -> Option<&AssetPath> {
        self.index.get_left(&id)
    }

    /// Looks up metadata by id, reading it from disk and caching it on first access.
    pub fn metadata(&mut self, id: AssetId) -> Result<&Metadata> {
        if !self.cache.contains_key(&id) {
            let metadata = self.load_metadata_from_disk(id)?;
            self.cache.insert(id, metadata);
        }
        Ok(self.cache.get(&id).expect("just inserted"))
    }

    fn load_metadata_from_disk(&self, id: AssetId) -> Result<Metadata> {
        tracing::debug!(%id, "loading metadata from disk");
        let path = self.meta_file_path(id);
        let contents = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                AssetError::UnknownId(id)
            } else {
                AssetError::Io(e)
            }
        })?;
        serde_json::from_str(&contents).map_err(|e| AssetError::Corrupt {
            path: AssetPath::new(path.to_string_lossy().into_owned()),
            reason: e.to_string(),
        })
    }

    /// Registers a brand-new asset, generating its id and writing its metadata sidecar.
    pub fn create(&mut self, path: AssetPath, file_type: crate::types::FileType) -> Result<Metadata> {
        let Some(asset_type) = file_type.asset_type() else {
            return Err(AssetError::UnsupportedFileType(path));
        };

        let metadata = Metadata::new(path.clone(), file_type, asset_type);
        self.save(&metadata)?;
        self.index.insert(metadata.id, path);
        self.cache.insert(metadata.id, metadata.clone());
        Ok(metadata)
    }

    /// Persists metadata to its sidecar file, replacing it via a temp-file-then-rename so a
    /// concurrent reader never observes a partially written file.
    pub fn save(&mut self, metadata: &Metadata) -> Result<()> {
        let dir = self.metadata_dir();
        fs::create_dir_all(&dir).map_err(AssetError::Io)?;

        let final_path = self.meta_file_path(metadata.id);
        let tmp_path = final_path.with_extension("meta.tmp");

        let json = serde_json::to_string_pretty(metadata)
            .map_err(|e| AssetError::Fatal(format!("failed to encode metadata: {e}")))?;
        fs::write(&tmp_path, json).map_err(AssetError::Io)?;
        fs::rename(&tmp_path, &final_path).map_err(AssetError::Io)?;

        self.cache.insert(metadata.id, metadata.clone());
        Ok(())
    }

    /// The family-specific intermediate path for `id` (§6 on-disk layout):
    /// `Intermediate/{Textures|Meshes|Shaders}/<uuid>.bin`.
    pub fn intermediate_path(&self, id: AssetId, asset_type: AssetType) -> PathBuf {
        let family_dir = match asset_type {
            AssetType::Texture => "Textures",
            AssetType::Mesh => "Meshes",
            AssetType::Shader => "Shaders",
        };
        self.project_root
            .join("Intermediate")
            .join(family_dir)
            .join(format!("{id}.bin"))
    }

    pub fn source_path(&self, path: &AssetPath) -> PathBuf {
        path.to_path_buf(&self.project_root)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileType;

    fn registry() -> (tempfile::TempDir, AssetRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let registry = AssetRegistry::new(dir.path());
        (dir, registry)
    }

    #[test]
    fn create_then_look_up_by_path_and_id() {
        let (_dir, mut registry) = registry();
        let path = AssetPath::new("Textures/checker.png");

        let metadata = registry.create(path.clone(), FileType::Png).unwrap();

        assert_eq!(registry.id_for_path(&path), Some(metadata.id));
        assert_eq!(registry.path_for_id(metadata.id), Some(&path));
        assert_eq!(registry.metadata(metadata.id).unwrap().id, metadata.id);
    }

    #[test]
    fn rejects_unsupported_file_types() {
        let (_dir, mut registry) = registry();
        let result = registry.create(AssetPath::new("notes.txt"), FileType::Unknown);
        assert!(matches!(result, Err(AssetError::UnsupportedFileType(_))));
    }

    #[test]
    fn metadata_survives_a_cache_eviction_by_reloading_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = AssetRegistry::with_cache_capacity(dir.path(), 1);

        let a = registry
            .create(AssetPath::new("a.png"), FileType::Png)
            .unwrap();
        let b = registry
            .create(AssetPath::new("b.png"), FileType::Png)
            .unwrap();

        // `a` was evicted from the bounded cache when `b` was inserted; it must still be
        // reloadable from its sidecar file on disk.
        assert_eq!(registry.metadata(a.id).unwrap().id, a.id);
        assert_eq!(registry.metadata(b.id).unwrap().id, b.id);
    }
}
