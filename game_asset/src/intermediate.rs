//! The binary intermediate file format: a content hash frame wrapping a `bincode`-encoded body.
//!
//! Mirrors the original engine's `FHashUtility::ComputeHash`, which is `XXH64(data, size, 0)` —
//! xxhash64 seeded with zero — so the loader's cache-validity check (§4.4: leading frame hash
//! against `Metadata::intermediate_hash`) stays compatible with intermediates produced outside
//! this crate.

use std::hash::Hasher;
use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::error::{AssetError, Result};
use crate::id::AssetPath;

/// Computes the content hash used to key and validate intermediate files.
pub fn content_hash(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}

/// Reads and hash-validates an intermediate file, returning its decoded body.
///
/// Returns [`AssetError::Corrupt`] if the trailing payload's hash does not match the leading
/// frame, which the loader (§4.5) treats as equivalent to a cache miss.
pub fn read<T, R>(path: &AssetPath, mut reader: R) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(AssetError::Io)?;

    if buf.len() < 8 {
        return Err(AssetError::Corrupt {
            path: path.clone(),
            reason: "truncated intermediate frame".into(),
        });
    }

    let (frame, body) = buf.split_at(8);
    let expected = u64::from_le_bytes(frame.try_into().unwrap());
    let actual = content_hash(body);
    if expected != actual {
        return Err(AssetError::Corrupt {
            path: path.clone(),
            reason: format!("hash mismatch: frame {expected:#x}, computed {actual:#x}"),
        });
    }

    bincode::deserialize(body).map_err(|e| AssetError::Corrupt {
        path: path.clone(),
        reason: e.to_string(),
    })
}

/// Encodes a body and writes it framed with its content hash, returning the hash for the caller
/// to record in [`crate::Metadata::intermediate_hash`] (§4.2 "Write").
pub fn write<T, W>(value: &T, mut writer: W) -> Result<u64>
where
    T: Serialize,
    W: Write,
{
    let body = bincode::serialize(value)
        .map_err(|e| AssetError::Fatal(format!("failed to encode intermediate body: {e}")))?;
    let hash = content_hash(&body);

    writer.write_all(&hash.to_le_bytes()).map_err(io_err)?;
    writer.write_all(&body).map_err(io_err)?;
    Ok(hash)
}

fn io_err(e: io::Error) -> AssetError {
    AssetError::Io(e)
}

/// Reads the leading 8-byte hash frame of an intermediate file's raw bytes, without decoding the
/// body. `None` if `bytes` is too short to contain a frame.
pub fn leading_hash(bytes: &[u8]) -> Option<u64> {
    bytes
        .get(..8)
        .map(|frame| u64::from_le_bytes(frame.try_into().unwrap()))
}

/// Decoded body of a texture intermediate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextureBody {
    pub width: u32,
    pub height: u32,
    pub format: crate::settings::TextureFormat,
    /// Tightly packed texel data, single mip level, in GPU-ready layout.
    pub image_data: Vec<u8>,
}

/// A single interleaved position/normal/uv vertex, matching the shared-material vertex layout
/// (stride 32, attributes at offsets 0/12/24).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexPnu {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubMesh {
    pub vertices: Vec<VertexPnu>,
    pub indices: Vec<u32>,
    pub material_index: u32,
}

/// Decoded body of a mesh intermediate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshBody {
    pub sub_meshes: Vec<SubMesh>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PushConstantItem {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

/// Describes which common descriptor sets and push constants a shader expects, used by the
/// shared-material factory (§4.8) to build a matching pipeline layout without inspecting reflection
/// data at pipeline-build time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterSheet {
    pub needs_camera: bool,
    pub needs_model: bool,
    pub needs_resource_pool: bool,
    pub push_constants: Vec<PushConstantItem>,
}

impl ParameterSheet {
    pub fn is_valid(&self) -> bool {
        let mut sorted = self.push_constants.clone();
        sorted.sort_by_key(|item| item.offset);
        sorted
            .windows(2)
            .all(|pair| pair[0].offset + pair[0].size <= pair[1].offset)
    }
}

/// Decoded body of a shader intermediate: both stages' translated SPIR-V plus the parameter
/// sheet reflected across them. One shader asset always carries a vertex and a fragment stage
/// together; multi-stage/compute shaders are out of scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShaderBody {
    pub parameter_sheet: ParameterSheet,
    /// Vertex-stage SPIR-V words produced by the (out-of-scope, §1) shader translator.
    pub vs: Vec<u32>,
    /// Fragment-stage SPIR-V words produced by the (out-of-scope, §1) shader translator.
    pub fs: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_texture_body_through_the_framed_codec() {
        let body = TextureBody {
            width: 4,
            height: 4,
            format: crate::settings::TextureFormat::Rgba8Unorm,
            image_data: vec![0u8; 64],
        };

        let mut buf = Vec::new();
        write(&body, &mut buf).unwrap();

        let decoded: TextureBody = read(&AssetPath::new("x.png"), buf.as_slice()).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn detects_a_corrupted_frame() {
        let body = MeshBody { sub_meshes: vec![] };
        let mut buf = Vec::new();
        write(&body, &mut buf).unwrap();

        *buf.last_mut().unwrap() ^= 0xFF;

        let result: Result<MeshBody> = read(&AssetPath::new("x.gltf"), buf.as_slice());
        assert!(matches!(result, Err(AssetError::Corrupt { .. })));
    }

    #[test]
    fn parameter_sheet_rejects_overlapping_push_constants() {
        let sheet = ParameterSheet {
            push_constants: vec![
                PushConstantItem {
                    name: "a".into(),
                    offset: 0,
                    size: 16,
                },
                PushConstantItem {
                    name: "b".into(),
                    offset: 8,
                    size: 16,
                },
            ],
            ..Default::default()
        };
        assert!(!sheet.is_valid());
    }

    #[test]
    fn content_hash_matches_the_reference_xxhash64_seed_zero_vector() {
        assert_eq!(content_hash(b""), 0xEF46_DB37_51D8_E999);
    }
}
