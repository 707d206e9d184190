//! Materializes decoded intermediate bodies into real GPU resources (§4.5).
//!
//! Implements [`game_asset::load::GpuBackend`] against an owned [`Device`], so a
//! [`game_asset::load::Loader`] drives straight into live [`Texture`]/[`Mesh`]/[`Shader`] objects.
//! The staging-buffer-map-memcpy-unmap-submit-fence path belongs to the concrete backend behind
//! [`Device::write_texture`]/[`Device::write_buffer`] — this module only decides *what* to upload,
//! not how the transfer is carried out, consistent with the RHI being an already-implemented
//! external collaborator.

use game_asset::error::Result as AssetResult;
use game_asset::id::AssetPath;
use game_asset::intermediate::{MeshBody, ShaderBody, TextureBody, VertexPnu};
use game_asset::load::GpuBackend;

use crate::mesh::{Mesh, SubMeshGpu};
use crate::rhi::{BufferDescriptor, BufferUsage, Device, TextureDescriptor, TextureUsage};
use crate::shader::Shader;
use crate::texture::Texture;

/// Drives a concrete [`Device`] to materialize assets; the seam `game_asset` depends on without
/// referencing any RHI type itself.
pub struct RenderBackend<D: Device> {
    device: D,
}

impl<D: Device> RenderBackend<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }
}

impl<D: Device> GpuBackend for RenderBackend<D> {
    type TextureHandle = Texture<D>;
    type MeshHandle = Mesh<D>;
    type ShaderHandle = Shader;

    /// Creates the final-usage image sized to the intermediate body and uploads its single mip
    /// level (§4.5 "Texture specifics": one image view spanning all mips/layers).
    fn upload_texture(&mut self, name: &AssetPath, body: &TextureBody) -> AssetResult<Texture<D>> {
        let format = body.format.into();
        let descriptor = TextureDescriptor {
            width: body.width,
            height: body.height,
            mip_levels: 1,
            format,
            usage: TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST,
        };

        let handle = self.device.create_texture(&descriptor);
        self.device.write_texture(handle, &body.image_data);

        Ok(Texture::new(
            name.as_str().to_string(),
            body.width,
            body.height,
            format,
            handle,
        ))
    }

    /// One vertex buffer and one index buffer per [`game_asset::intermediate::SubMesh`] (§4.5
    /// "Mesh specifics"), stride 32 and 32-bit indices.
    fn upload_mesh(&mut self, name: &AssetPath, body: &MeshBody) -> AssetResult<Mesh<D>> {
        let mut sub_meshes = Vec::with_capacity(body.sub_meshes.len());
        for sub_mesh in &body.sub_meshes {
            let vertex_bytes = pack_vertices(&sub_mesh.vertices);
            let vertex_buffer = self.device.create_buffer(&BufferDescriptor {
                size: vertex_bytes.len() as u64,
                usage: BufferUsage::VERTEX | BufferUsage::TRANSFER_DST,
            });
            self.device.write_buffer(vertex_buffer, 0, &vertex_bytes);

            let index_bytes = pack_indices(&sub_mesh.indices);
            let index_buffer = self.device.create_buffer(&BufferDescriptor {
                size: index_bytes.len() as u64,
                usage: BufferUsage::INDEX | BufferUsage::TRANSFER_DST,
            });
            self.device.write_buffer(index_buffer, 0, &index_bytes);

            sub_meshes.push(SubMeshGpu {
                vertex_buffer,
                index_buffer,
                vertex_count: sub_mesh.vertices.len() as u32,
                index_count: sub_mesh.indices.len() as u32,
                material_index: sub_mesh.material_index,
            });
        }

        Ok(Mesh::new(name.as_str().to_string(), sub_meshes))
    }

    /// No GPU work at load time (§4.5 "Shader specifics"): module creation is deferred to
    /// [`crate::material::SharedMaterialFactory`].
    fn upload_shader(&mut self, name: &AssetPath, body: &ShaderBody) -> AssetResult<Shader> {
        Ok(Shader::new(
            name.as_str().to_string(),
            body.vs.clone(),
            body.fs.clone(),
            body.parameter_sheet.clone(),
        ))
    }
}

fn pack_vertices(vertices: &[VertexPnu]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(vertices.len() * 32);
    for v in vertices {
        for component in v.position {
            buf.extend_from_slice(&component.to_le_bytes());
        }
        for component in v.normal {
            buf.extend_from_slice(&component.to_le_bytes());
        }
        for component in v.uv {
            buf.extend_from_slice(&component.to_le_bytes());
        }
    }
    buf
}

fn pack_indices(indices: &[u32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(indices.len() * 4);
    for index in indices {
        buf.extend_from_slice(&index.to_le_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_asset::intermediate::{ParameterSheet, SubMesh};
    use game_asset::settings::TextureFormat as AssetTextureFormat;
    use crate::rhi::*;

    #[derive(Debug, Default)]
    struct FakeDevice {
        next: u32,
        texture_writes: Vec<(u32, Vec<u8>)>,
        buffer_writes: Vec<(u32, Vec<u8>)>,
    }

    impl Device for FakeDevice {
        type Texture = u32;
        type Sampler = u32;
        type Buffer = u32;
        type DescriptorSetLayout = u32;
        type PipelineLayout = u32;
        type Pipeline = u32;
        type ShaderModule = u32;

        fn create_texture(&mut self, _desc: &TextureDescriptor) -> Self::Texture {
            self.next += 1;
            self.next
        }
        fn destroy_texture(&mut self, _texture: Self::Texture) {}
        fn write_texture(&mut self, texture: Self::Texture, data: &[u8]) {
            self.texture_writes.push((texture, data.to_vec()));
        }

        fn create_sampler(&mut self, _desc: &SamplerDescriptor) -> Self::Sampler {
            self.next += 1;
            self.next
        }
        fn destroy_sampler(&mut self, _sampler: Self::Sampler) {}

        fn create_buffer(&mut self, _desc: &BufferDescriptor) -> Self::Buffer {
            self.next += 1;
            self.next
        }
        fn destroy_buffer(&mut self, _buffer: Self::Buffer) {}
        fn write_buffer(&mut self, buffer: Self::Buffer, _offset: u64, data: &[u8]) {
            self.buffer_writes.push((buffer, data.to_vec()));
        }

        fn create_shader_module(&mut self, _source: &[u32]) -> Self::ShaderModule {
            0
        }

        fn create_descriptor_set_layout(
            &mut self,
            _desc: &DescriptorSetLayoutDescriptor,
        ) -> Self::DescriptorSetLayout {
            0
        }

        fn create_pipeline_layout(
            &mut self,
            _desc: &PipelineLayoutDescriptor<Self::DescriptorSetLayout>,
        ) -> Self::PipelineLayout {
            0
        }

        fn create_graphics_pipeline(
            &mut self,
            _desc: &GraphicsPipelineDescriptor<Self>,
        ) -> Self::Pipeline {
            0
        }

        fn write_bindless_texture_slot(&mut self, _index: u32, _texture: Self::Texture) {}
        fn write_bindless_sampler_slot(&mut self, _index: u32, _sampler: Self::Sampler) {}
    }

    #[test]
    fn uploads_a_textures_image_data_verbatim() {
        let mut backend = RenderBackend::new(FakeDevice::default());
        let name = AssetPath::new("checker.png");
        let body = TextureBody {
            width: 2,
            height: 2,
            format: AssetTextureFormat::Rgba8Unorm,
            image_data: vec![1, 2, 3, 4],
        };

        let texture = backend.upload_texture(&name, &body).unwrap();
        assert_eq!(texture.width(), 2);
        assert_eq!(texture.height(), 2);
        assert_eq!(backend.device().texture_writes.len(), 1);
        assert_eq!(backend.device().texture_writes[0].1, vec![1, 2, 3, 4]);
    }

    #[test]
    fn uploads_one_vertex_and_index_buffer_per_sub_mesh() {
        let mut backend = RenderBackend::new(FakeDevice::default());
        let name = AssetPath::new("cube.gltf");
        let body = MeshBody {
            sub_meshes: vec![SubMesh {
                vertices: vec![VertexPnu {
                    position: [0.0, 1.0, 2.0],
                    normal: [0.0, 0.0, 1.0],
                    uv: [0.5, 0.5],
                }],
                indices: vec![0, 1, 2],
                material_index: 0,
            }],
        };

        let mesh = backend.upload_mesh(&name, &body).unwrap();
        assert_eq!(mesh.sub_meshes().len(), 1);
        assert_eq!(mesh.sub_meshes()[0].vertex_count, 1);
        assert_eq!(mesh.sub_meshes()[0].index_count, 3);
        assert_eq!(backend.device().buffer_writes.len(), 2);
        assert_eq!(backend.device().buffer_writes[0].1.len(), 32);
        assert_eq!(backend.device().buffer_writes[1].1.len(), 12);
    }

    #[test]
    fn uploading_a_shader_does_no_gpu_work() {
        let mut backend = RenderBackend::new(FakeDevice::default());
        let name = AssetPath::new("lit.shader");
        let body = ShaderBody {
            parameter_sheet: ParameterSheet::default(),
            vs: vec![0x0723_0203, 1],
            fs: vec![2, 3],
        };

        let shader = backend.upload_shader(&name, &body).unwrap();
        assert_eq!(shader.name(), "lit.shader");
        assert_eq!(shader.vs(), &[0x0723_0203, 1]);
        assert_eq!(shader.fs(), &[2, 3]);
        assert!(backend.device().texture_writes.is_empty());
        assert!(backend.device().buffer_writes.is_empty());
    }
}
