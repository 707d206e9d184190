//! The importer framework: turns a source file into a hashed, decoded intermediate file (§4.2).
//!
//! Every importer runs the same four phases regardless of asset family, mirroring the original
//! engine's `FAssetImporter` lifecycle:
//!
//! 1. [`Importer::begin_import`] — validate and stage the raw source bytes.
//! 2. [`Importer::process_intermediate`] — decode the source into a typed body via the decoder
//!    collaborator.
//! 3. [`Importer::process_import`] — apply import-setting-driven transforms to the decoded body.
//! 4. [`Importer::end_import`] — frame and persist the body, and stamp the source hash into
//!    metadata so future loads can take the fast path.

use crate::decode::{GltfMeshDecoder, ImageTextureDecoder, MeshDecoder, PassthroughShaderTranslator, ShaderTranslator, TextureDecoder};
use crate::error::{AssetError, Result};
use crate::intermediate::{self, MeshBody, ShaderBody, TextureBody};
use crate::metadata::Metadata;
use crate::registry::AssetRegistry;
use crate::settings::ImportSetting;

/// The four-phase import pipeline, generic over the decoded intermediate body type.
pub trait Importer {
    type Body;

    fn begin_import(&self, source: &[u8]) -> Result<Vec<u8>> {
        if source.is_empty() {
            return Err(AssetError::Fatal("source file is empty".into()));
        }
        Ok(source.to_vec())
    }

    fn process_intermediate(&self, source: &[u8], setting: &ImportSetting) -> Result<Self::Body>;

    fn process_import(&self, body: Self::Body, _setting: &ImportSetting) -> Result<Self::Body> {
        Ok(body)
    }

    /// Frames and writes the intermediate via temp-file-then-rename (§4.2 "no in-place mutation
    /// is ever allowed"), then stamps the resulting hash into metadata so the loader's fast path
    /// (§4.4) can validate it on the next load without re-running the importer.
    fn end_import(
        &self,
        registry: &mut AssetRegistry,
        metadata: &mut Metadata,
        body: &Self::Body,
    ) -> Result<()>
    where
        Self::Body: serde::Serialize,
    {
        let final_path = registry.intermediate_path(metadata.id, metadata.asset_type);
        let tmp_path = final_path.with_extension("bin.tmp");

        if let Some(parent) = final_path.parent() {
            std::fs::create_dir_all(parent).map_err(AssetError::Io)?;
        }

        let file = std::fs::File::create(&tmp_path).map_err(AssetError::Io)?;
        let hash = match intermediate::write(body, file) {
            Ok(hash) => hash,
            Err(e) => {
                let _ = std::fs::remove_file(&tmp_path);
                return Err(e);
            }
        };
        std::fs::rename(&tmp_path, &final_path).map_err(AssetError::Io)?;

        metadata.intermediate_hash = Some(hash);
        registry.save(metadata)
    }

    /// Runs all four phases in order and persists the result.
    fn import(
        &self,
        registry: &mut AssetRegistry,
        metadata: &mut Metadata,
        source: &[u8],
    ) -> Result<()>
    where
        Self::Body: serde::Serialize,
    {
        let staged = self.begin_import(source)?;
        let body = self.process_intermediate(&staged, &metadata.import_setting)?;
        let body = self.process_import(body, &metadata.import_setting)?;
        self.end_import(registry, metadata, &body)
    }
}

pub struct TextureImporter<D = ImageTextureDecoder> {
    decoder: D,
}

impl Default for TextureImporter<ImageTextureDecoder> {
    fn default() -> Self {
        Self {
            decoder: ImageTextureDecoder,
        }
    }
}

impl<D: TextureDecoder> Importer for TextureImporter<D> {
    type Body = TextureBody;

    fn process_intermediate(&self, source: &[u8], setting: &ImportSetting) -> Result<Self::Body> {
        let setting = setting
            .as_texture()
            .ok_or_else(|| AssetError::Fatal("expected a texture import setting".into()))?;
        self.decoder.decode(source, setting)
    }
}

pub struct MeshImporter<D = GltfMeshDecoder> {
    decoder: D,
}

impl Default for MeshImporter<GltfMeshDecoder> {
    fn default() -> Self {
        Self {
            decoder: GltfMeshDecoder,
        }
    }
}

impl<D: MeshDecoder> Importer for MeshImporter<D> {
    type Body = MeshBody;

    fn process_intermediate(&self, source: &[u8], setting: &ImportSetting) -> Result<Self::Body> {
        let setting = setting
            .as_mesh()
            .ok_or_else(|| AssetError::Fatal("expected a mesh import setting".into()))?;
        Ok(MeshBody {
            sub_meshes: self.decoder.decode(source, setting)?,
        })
    }
}

pub struct ShaderImporter<T = PassthroughShaderTranslator> {
    translator: T,
}

impl Default for ShaderImporter<PassthroughShaderTranslator> {
    fn default() -> Self {
        Self {
            translator: PassthroughShaderTranslator,
        }
    }
}

impl<T: ShaderTranslator> Importer for ShaderImporter<T> {
    type Body = ShaderBody;

    fn process_intermediate(&self, source: &[u8], _setting: &ImportSetting) -> Result<Self::Body> {
        let (vs, fs, parameter_sheet) = self.translator.translate(source)?;
        Ok(ShaderBody {
            parameter_sheet,
            vs,
            fs,
        })
    }
}
