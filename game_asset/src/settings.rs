use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Mesh importer flags, mirroring the original engine's `EMeshImportFlag` bitset.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MeshImportFlags: u32 {
        const TRIANGULATE = 1 << 0;
        const GEN_NORMALS = 1 << 1;
        const FLIP_UVS = 1 << 2;
        const JOIN_IDENTICAL_VERTICES = 1 << 3;
        const CALC_TANGENT_SPACE = 1 << 4;
    }
}

impl Default for MeshImportFlags {
    fn default() -> Self {
        Self::TRIANGULATE | Self::GEN_NORMALS | Self::FLIP_UVS | Self::JOIN_IDENTICAL_VERTICES
    }
}

/// GPU texture format targeted by the texture importer.
///
/// A small, representative subset; the real decoder (out of scope, §1) is free to request any
/// format the RHI exposes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    #[default]
    Bgra8UnormSrgb,
    Rgba8Unorm,
    Rgba8UnormSrgb,
}

/// Polymorphic per-asset-family import configuration attached to [`crate::Metadata`].
///
/// A tagged sum rather than an inheritance hierarchy (Design Note "Polymorphic ImportSetting");
/// serialization tags the active variant explicitly via serde's adjacently-tagged enum support.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum ImportSetting {
    Texture(TextureSetting),
    Mesh(MeshSetting),
    Shader(ShaderSetting),
}

impl ImportSetting {
    pub fn default_for(asset_type: crate::types::AssetType) -> Self {
        match asset_type {
            crate::types::AssetType::Texture => Self::Texture(TextureSetting::default()),
            crate::types::AssetType::Mesh => Self::Mesh(MeshSetting::default()),
            crate::types::AssetType::Shader => Self::Shader(ShaderSetting::default()),
        }
    }

    pub fn as_texture(&self) -> Option<&TextureSetting> {
        match self {
            Self::Texture(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mesh(&self) -> Option<&MeshSetting> {
        match self {
            Self::Mesh(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_shader(&self) -> Option<&ShaderSetting> {
        match self {
            Self::Shader(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureSetting {
    pub gpu_format: TextureFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSetting {
    pub flags: MeshImportFlags,
}

/// Empty today; kept as a distinct variant so a future engine build can add fields without
/// changing the tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShaderSetting {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetType;

    #[test]
    fn default_for_matches_asset_type() {
        assert!(matches!(
            ImportSetting::default_for(AssetType::Texture),
            ImportSetting::Texture(_)
        ));
        assert!(matches!(
            ImportSetting::default_for(AssetType::Mesh),
            ImportSetting::Mesh(_)
        ));
        assert!(matches!(
            ImportSetting::default_for(AssetType::Shader),
            ImportSetting::Shader(_)
        ));
    }

    #[test]
    fn import_setting_round_trips_through_json() {
        let setting = ImportSetting::Mesh(MeshSetting {
            flags: MeshImportFlags::TRIANGULATE,
        });
        let json = serde_json::to_string(&setting).unwrap();
        let back: ImportSetting = serde_json::from_str(&json).unwrap();
        assert_eq!(setting, back);
    }
}
