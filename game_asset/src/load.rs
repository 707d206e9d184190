//! The loader: resolves an asset by path or id to a GPU-resident handle (§4.4).
//!
//! Implements the two-phase fallback the original engine's `TextureLoader::Load` codifies: if the
//! intermediate file's leading hash still matches the hash recorded in metadata, read it straight
//! through; otherwise (no intermediate yet, or it was tampered with or deleted out from under us)
//! import once and retry, never looping indefinitely on a persistently failing import.

use std::fs::File;

use crate::error::{AssetError, Result};
use crate::id::{AssetId, AssetPath};
use crate::import::{Importer, MeshImporter, ShaderImporter, TextureImporter};
use crate::intermediate::{self, MeshBody, ShaderBody, TextureBody};
use crate::registry::AssetRegistry;
use crate::types::AssetType;

/// The GPU-facing seam this crate depends on rather than the other way around.
///
/// `game_render` implements this trait to materialize decoded intermediate bodies into real GPU
/// resources (staging upload, descriptor publication); this crate never references a concrete RHI
/// type, keeping the dependency edge `game_render -> game_asset` one-directional.
pub trait GpuBackend {
    type TextureHandle;
    type MeshHandle;
    type ShaderHandle;

    /// `name` is the asset's stable path, stamped onto the returned object per §4.4 step 6
    /// ("set the object's stable name to the asset path").
    fn upload_texture(&mut self, name: &AssetPath, body: &TextureBody) -> Result<Self::TextureHandle>;
    fn upload_mesh(&mut self, name: &AssetPath, body: &MeshBody) -> Result<Self::MeshHandle>;
    fn upload_shader(&mut self, name: &AssetPath, body: &ShaderBody) -> Result<Self::ShaderHandle>;
}

/// Drives the registry and importers to resolve assets into GPU handles produced by a
/// [`GpuBackend`].
pub struct Loader<B> {
    registry: AssetRegistry,
    backend: B,
}

impl<B: GpuBackend> Loader<B> {
    pub fn new(registry: AssetRegistry, backend: B) -> Self {
        Self { registry, backend }
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AssetRegistry {
        &mut self.registry
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn load_texture(
        &mut self,
        path: &AssetPath,
        import_if_missing: bool,
    ) -> Result<B::TextureHandle> {
        let name = path.clone();
        self.load(
            path,
            AssetType::Texture,
            import_if_missing,
            move |loader, id| {
                let body: TextureBody = loader.read_intermediate(id)?;
                loader.backend.upload_texture(&name, &body)
            },
            |loader, id| {
                let mut metadata = loader.registry.metadata(id)?.clone();
                let source = std::fs::read(loader.registry.source_path(&metadata.path))
                    .map_err(AssetError::Io)?;
                TextureImporter::default().import(&mut loader.registry, &mut metadata, &source)
            },
        )
    }

    pub fn load_mesh(&mut self, path: &AssetPath, import_if_missing: bool) -> Result<B::MeshHandle> {
        let name = path.clone();
        self.load(
            path,
            AssetType::Mesh,
            import_if_missing,
            move |loader, id| {
                let body: MeshBody = loader.read_intermediate(id)?;
                loader.backend.upload_mesh(&name, &body)
            },
            |loader, id| {
                let mut metadata = loader.registry.metadata(id)?.clone();
                let source = std::fs::read(loader.registry.source_path(&metadata.path))
                    .map_err(AssetError::Io)?;
                MeshImporter::default().import(&mut loader.registry, &mut metadata, &source)
            },
        )
    }

    pub fn load_shader(
        &mut self,
        path: &AssetPath,
        import_if_missing: bool,
    ) -> Result<B::ShaderHandle> {
        let name = path.clone();
        self.load(
            path,
            AssetType::Shader,
            import_if_missing,
            move |loader, id| {
                let body: ShaderBody = loader.read_intermediate(id)?;
                loader.backend.upload_shader(&name, &body)
            },
            |loader, id| {
                let mut metadata = loader.registry.metadata(id)?.clone();
                let source = std::fs::read(loader.registry.source_path(&metadata.path))
                    .map_err(AssetError::Io)?;
                ShaderImporter::default().import(&mut loader.registry, &mut metadata, &source)
            },
        )
    }

    fn read_intermediate<T>(&mut self, id: AssetId) -> Result<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let metadata = self.registry.metadata(id)?.clone();
        let path = self.registry.intermediate_path(id, metadata.asset_type);
        let file = File::open(&path).map_err(AssetError::Io)?;
        intermediate::read(&metadata.path, file)
    }

    /// The two-phase fallback shared by every asset family (§4.4 steps 2-5): take the
    /// hash-validated fast path if the cached intermediate is still good, otherwise import once
    /// (if permitted) and retry exactly once.
    fn load<H, U, I>(
        &mut self,
        path: &AssetPath,
        expected: AssetType,
        import_if_missing: bool,
        upload: U,
        import: I,
    ) -> Result<H>
    where
        U: Fn(&mut Self, AssetId) -> Result<H>,
        I: Fn(&mut Self, AssetId) -> Result<()>,
    {
        let id = match self.registry.id_for_path(path) {
            Some(id) => id,
            None if import_if_missing => {
                let file_type = crate::types::FileType::infer(path);
                self.registry.create(path.clone(), file_type)?.id
            }
            None => return Err(AssetError::NotFound(path.clone())),
        };

        let metadata = self.registry.metadata(id)?;
        if metadata.asset_type != expected {
            return Err(AssetError::WrongType {
                id,
                expected,
                actual: metadata.asset_type,
            });
        }

        if self.intermediate_is_valid(id)? {
            return upload(self, id);
        }

        if !import_if_missing {
            return Err(AssetError::Corrupt {
                path: path.clone(),
                reason: "intermediate hash does not match metadata and re-import is disallowed"
                    .into(),
            });
        }

        tracing::debug!(%id, path = %path, "importing asset to fill cache miss");
        import(self, id).map_err(|e| AssetError::CacheMissAndImportFailed {
            path: path.clone(),
            source: Box::new(e),
        })?;

        if !self.intermediate_is_valid(id)? {
            return Err(AssetError::CacheMissAndImportFailed {
                path: path.clone(),
                source: Box::new(AssetError::Corrupt {
                    path: path.clone(),
                    reason: "intermediate still invalid after re-import".into(),
                }),
            });
        }
        upload(self, id)
    }

    /// Step 3-4 of §4.4: the intermediate file exists, is non-empty, and its leading hash
    /// matches the hash recorded in metadata at the last successful import.
    fn intermediate_is_valid(&mut self, id: AssetId) -> Result<bool> {
        let metadata = self.registry.metadata(id)?.clone();
        let Some(expected) = metadata.intermediate_hash else {
            return Ok(false);
        };

        let path = self.registry.intermediate_path(id, metadata.asset_type);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => return Ok(false),
        };

        Ok(intermediate::leading_hash(&bytes) == Some(expected))
    }
}
