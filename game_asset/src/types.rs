use serde::{Deserialize, Serialize};

use crate::id::AssetPath;

/// The file type inferred from an asset's path extension, partitioned into families.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    Png,
    Jpg,
    Bmp,
    Tga,
    Hdr,
    Exr,
    Dds,
    Ktx,
    Ktx2,
    Fbx,
    Obj,
    Gltf,
    Glb,
    Dae,
    Blend,
    X3d,
    Hlsl,
    Glsl,
    Slang,
    Spirv,
    Misc,
    Unknown,
}

impl FileType {
    /// Infers the file type from an asset path's extension.
    ///
    /// An empty path, or a path with no recognized extension, infers [`FileType::Unknown`].
    pub fn infer(path: &AssetPath) -> Self {
        let Some(ext) = path.extension() else {
            return Self::Unknown;
        };

        match ext.to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpg,
            "bmp" => Self::Bmp,
            "tga" => Self::Tga,
            "hdr" => Self::Hdr,
            "exr" => Self::Exr,
            "dds" => Self::Dds,
            "ktx" => Self::Ktx,
            "ktx2" => Self::Ktx2,
            "fbx" => Self::Fbx,
            "obj" => Self::Obj,
            "gltf" => Self::Gltf,
            "glb" => Self::Glb,
            "dae" => Self::Dae,
            "blend" => Self::Blend,
            "x3d" => Self::X3d,
            "hlsl" => Self::Hlsl,
            "glsl" | "vert" | "frag" => Self::Glsl,
            "slang" => Self::Slang,
            "spv" | "spirv" => Self::Spirv,
            _ => Self::Unknown,
        }
    }

    /// Returns the runtime [`AssetType`] family this file type is imported as, or `None` if the
    /// file type is not importable as any known asset family.
    pub fn asset_type(&self) -> Option<AssetType> {
        match self {
            Self::Png
            | Self::Jpg
            | Self::Bmp
            | Self::Tga
            | Self::Hdr
            | Self::Exr
            | Self::Dds
            | Self::Ktx
            | Self::Ktx2 => Some(AssetType::Texture),
            Self::Fbx | Self::Obj | Self::Gltf | Self::Glb | Self::Dae | Self::Blend | Self::X3d => {
                Some(AssetType::Mesh)
            }
            Self::Hlsl | Self::Glsl | Self::Slang | Self::Spirv => Some(AssetType::Shader),
            Self::Misc | Self::Unknown => None,
        }
    }
}

/// The runtime kind an asset is materialized as.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    Texture,
    Mesh,
    Shader,
}

#[cfg(test)]
mod tests {
    use super::{AssetType, FileType};
    use crate::id::AssetPath;

    #[test]
    fn infer_known_extension() {
        let path = AssetPath::new("Textures/checker.png");
        assert_eq!(FileType::infer(&path), FileType::Png);
        assert_eq!(FileType::Png.asset_type(), Some(AssetType::Texture));
    }

    #[test]
    fn infer_unknown_extension() {
        let path = AssetPath::new("foo.xyz");
        assert_eq!(FileType::infer(&path), FileType::Unknown);
        assert_eq!(FileType::Unknown.asset_type(), None);
    }

    #[test]
    fn infer_empty_path() {
        let path = AssetPath::new("");
        assert_eq!(FileType::infer(&path), FileType::Unknown);
    }

    #[test]
    fn mesh_family_consistent() {
        for ext in ["fbx", "obj", "gltf", "glb", "dae", "blend", "x3d"] {
            let path = AssetPath::new(format!("mesh.{ext}"));
            assert_eq!(FileType::infer(&path).asset_type(), Some(AssetType::Mesh));
        }
    }
}
