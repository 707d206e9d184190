//! The in-memory GPU mesh object returned by a successful load (§4.5 "Mesh specifics").
//!
//! One vertex buffer and one index buffer per [`game_asset::intermediate::SubMesh`], stride 32
//! bytes, 32-bit indices; the returned [`Mesh`] owns every RHI handle it created.

use crate::rhi::Device;

/// The GPU buffers backing one [`game_asset::intermediate::SubMesh`].
pub struct SubMeshGpu<D: Device> {
    pub vertex_buffer: D::Buffer,
    pub index_buffer: D::Buffer,
    pub vertex_count: u32,
    pub index_count: u32,
    pub material_index: u32,
}

pub struct Mesh<D: Device> {
    name: String,
    sub_meshes: Vec<SubMeshGpu<D>>,
}

impl<D: Device> Mesh<D> {
    pub(crate) fn new(name: String, sub_meshes: Vec<SubMeshGpu<D>>) -> Self {
        Self { name, sub_meshes }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sub_meshes(&self) -> &[SubMeshGpu<D>] {
        &self.sub_meshes
    }

    /// Releases every vertex/index buffer this mesh owns. There is no bindless pool for meshes
    /// (§4.6 only covers textures and samplers), so unlike [`crate::texture::Texture`] there is no
    /// implicit `Drop`-driven release to couple to — the caller destroys a mesh explicitly once it
    /// stops drawing it.
    pub fn destroy(self, device: &mut D) {
        for sub_mesh in self.sub_meshes {
            device.destroy_buffer(sub_mesh.vertex_buffer);
            device.destroy_buffer(sub_mesh.index_buffer);
        }
    }
}
