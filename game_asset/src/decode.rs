//! Source-format decoding collaborators.
//!
//! Turning a `.png` or `.gltf` byte stream into an [`crate::intermediate`] body is itself out of
//! this crate's scope (§1 Non-goals: "Decoding specific container/codec formats... is out of
//! scope; the pipeline consumes a decoder/translator interface and a small set of default,
//! off-the-shelf implementations are provided for common formats only"). [`Importer`]s consume
//! these traits rather than hard-coding a single library's API, the same way the loader consumes
//! [`crate::load::GpuBackend`] rather than a concrete RHI.

use crate::error::{AssetError, Result};
use crate::intermediate::{ParameterSheet, SubMesh, TextureBody, VertexPnu};
use crate::settings::{MeshSetting, TextureSetting};

pub trait TextureDecoder {
    fn decode(&self, source: &[u8], setting: &TextureSetting) -> Result<TextureBody>;
}

pub trait MeshDecoder {
    fn decode(&self, source: &[u8], setting: &MeshSetting) -> Result<Vec<SubMesh>>;
}

/// Translates one shader source into both stages at once (§3 "one shader asset carries both
/// VS and FS"), returning vertex words, fragment words, and the reflected parameter sheet.
pub trait ShaderTranslator {
    fn translate(&self, source: &[u8]) -> Result<(Vec<u32>, Vec<u32>, ParameterSheet)>;
}

/// Decodes common raster formats (png/jpeg/bmp/tga) via the `image` crate into a flat
/// [`TextureBody`]. Mip generation is left to the RHI (§1 Non-goals).
#[derive(Debug, Default)]
pub struct ImageTextureDecoder;

impl TextureDecoder for ImageTextureDecoder {
    fn decode(&self, source: &[u8], setting: &TextureSetting) -> Result<TextureBody> {
        let image = image::load_from_memory(source)
            .map_err(|e| AssetError::Fatal(format!("texture decode failed: {e}")))?
            .to_rgba8();

        Ok(TextureBody {
            width: image.width(),
            height: image.height(),
            format: setting.gpu_format,
            image_data: image.into_raw(),
        })
    }
}

/// Decodes glTF 2.0 (`.gltf`/`.glb`) meshes via the `gltf` crate.
///
/// Flattens every primitive of every mesh into a single flat list of [`SubMesh`]s; scene graph
/// transforms and skinning are out of scope (§1 Non-goals).
#[derive(Debug, Default)]
pub struct GltfMeshDecoder;

impl MeshDecoder for GltfMeshDecoder {
    fn decode(&self, source: &[u8], setting: &MeshSetting) -> Result<Vec<SubMesh>> {
        let (document, buffers, _images) = gltf::import_slice(source)
            .map_err(|e| AssetError::Fatal(format!("mesh decode failed: {e}")))?;

        let mut sub_meshes = Vec::new();
        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let reader =
                    primitive.reader(|buffer| Some(buffers[buffer.index()].0.as_slice()));

                let positions: Vec<[f32; 3]> = reader
                    .read_positions()
                    .ok_or_else(|| AssetError::Fatal("mesh primitive has no positions".into()))?
                    .collect();
                let normals: Vec<[f32; 3]> = reader
                    .read_normals()
                    .map(|iter| iter.collect())
                    .unwrap_or_else(|| vec![[0.0, 0.0, 1.0]; positions.len()]);
                let mut uvs: Vec<[f32; 2]> = reader
                    .read_tex_coords(0)
                    .map(|iter| iter.into_f32().collect())
                    .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

                if setting.flags.contains(crate::settings::MeshImportFlags::FLIP_UVS) {
                    for uv in &mut uvs {
                        uv[1] = 1.0 - uv[1];
                    }
                }

                let vertices = positions
                    .into_iter()
                    .zip(normals)
                    .zip(uvs)
                    .map(|((position, normal), uv)| VertexPnu {
                        position,
                        normal,
                        uv,
                    })
                    .collect::<Vec<_>>();

                let indices: Vec<u32> = reader
                    .read_indices()
                    .map(|iter| iter.into_u32().collect())
                    .unwrap_or_else(|| (0..vertices.len() as u32).collect());

                sub_meshes.push(SubMesh {
                    vertices,
                    indices,
                    material_index: primitive.material().index().unwrap_or(0) as u32,
                });
            }
        }

        Ok(sub_meshes)
    }
}

/// A pass-through translator for pre-compiled SPIR-V sources.
///
/// Real shader translation (Slang/HLSL/GLSL front ends) is an external collaborator out of this
/// crate's scope (§1 Non-goals); this implementation only handles sources that already hold the
/// two stages' SPIR-V words back to back, framed as `[u32 vs_word_count][vs words][fs words]`,
/// and derives a conservative, empty parameter sheet.
#[derive(Debug, Default)]
pub struct PassthroughShaderTranslator;

impl ShaderTranslator for PassthroughShaderTranslator {
    fn translate(&self, source: &[u8]) -> Result<(Vec<u32>, Vec<u32>, ParameterSheet)> {
        if source.len() < 4 || source.len() % 4 != 0 {
            return Err(AssetError::Fatal(
                "shader source is not a whole number of SPIR-V words".into(),
            ));
        }

        let words: Vec<u32> = source
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();

        let vs_word_count = words[0] as usize;
        let rest = &words[1..];
        if vs_word_count > rest.len() {
            return Err(AssetError::Fatal(
                "shader source's vertex word count exceeds the source length".into(),
            ));
        }

        let (vs, fs) = rest.split_at(vs_word_count);
        Ok((vs.to_vec(), fs.to_vec(), ParameterSheet::default()))
    }
}
