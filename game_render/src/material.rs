//! The shared-material factory (§4.8): turns a shader object into a cacheable
//! `(pipeline-layout, graphics-pipeline)` pair, structurally sharing both the pipeline layout and
//! the common descriptor-set layouts across every material backed by the same shader.
//!
//! A [`Shader`] already carries both stages' SPIR-V and the parameter sheet reflected across
//! them, so the factory's cache keys on the one shader's own hash rather than a caller-assembled
//! vertex/fragment pair.

use std::collections::HashMap;

use game_asset::intermediate::ParameterSheet;

use crate::error::{RenderError, Result};
use crate::rhi::{
    CompareOp, DepthStencilState, DescriptorBinding, DescriptorSetLayoutDescriptor, DescriptorType,
    Device, Face, FrontFace, GraphicsPipelineDescriptor, PipelineLayoutDescriptor,
    PrimitiveTopology, PushConstantRange, ShaderStageFlags, TextureFormat, VertexAttribute,
    VertexFormat,
};
use crate::shader::Shader;

const MAX_TEXTURES: u32 = 4096;
const MAX_SAMPLERS: u32 = 256;

/// The three common descriptor-set-layout kinds every material may need, built once and reused
/// (§4.8 "Common descriptor-set layouts").
pub struct DescriptorSetLayoutCache<D: Device> {
    camera: Option<D::DescriptorSetLayout>,
    model: Option<D::DescriptorSetLayout>,
    static_resource: Option<D::DescriptorSetLayout>,
}

impl<D: Device> DescriptorSetLayoutCache<D> {
    pub fn new() -> Self {
        Self {
            camera: None,
            model: None,
            static_resource: None,
        }
    }

    pub fn camera(&mut self, device: &mut D) -> D::DescriptorSetLayout {
        *self.camera.get_or_insert_with(|| {
            device.create_descriptor_set_layout(&DescriptorSetLayoutDescriptor {
                bindings: vec![DescriptorBinding {
                    binding: 0,
                    kind: DescriptorType::UniformBuffer,
                    stages: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
                    update_after_bind: false,
                }],
            })
        })
    }

    pub fn model(&mut self, device: &mut D) -> D::DescriptorSetLayout {
        *self.model.get_or_insert_with(|| {
            device.create_descriptor_set_layout(&DescriptorSetLayoutDescriptor {
                bindings: vec![DescriptorBinding {
                    binding: 0,
                    kind: DescriptorType::StorageBuffer,
                    stages: ShaderStageFlags::VERTEX,
                    update_after_bind: false,
                }],
            })
        })
    }

    pub fn static_resource(&mut self, device: &mut D) -> D::DescriptorSetLayout {
        *self.static_resource.get_or_insert_with(|| {
            device.create_descriptor_set_layout(&DescriptorSetLayoutDescriptor {
                bindings: vec![
                    DescriptorBinding {
                        binding: 0,
                        kind: DescriptorType::SampledImageArray { count: MAX_TEXTURES },
                        stages: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
                        update_after_bind: true,
                    },
                    DescriptorBinding {
                        binding: 1,
                        kind: DescriptorType::SamplerArray { count: MAX_SAMPLERS },
                        stages: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
                        update_after_bind: true,
                    },
                ],
            })
        })
    }
}

impl<D: Device> Default for DescriptorSetLayoutCache<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies a pipeline-layout shape without needing `D::PipelineLayout` to be hashable itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PipelineLayoutKey {
    needs_camera: bool,
    needs_model: bool,
    needs_resource_pool: bool,
    push_constant: Option<(u32, u32)>,
}

/// Interns pipeline layouts by shape, ref-counting each so the factory can report structural
/// sharing (§8 scenario 4: two distinct shaders with identical needs share one layout).
pub struct PipelineLayoutCache<D: Device> {
    entries: HashMap<PipelineLayoutKey, (D::PipelineLayout, usize)>,
}

impl<D: Device> PipelineLayoutCache<D> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn intern(&mut self, key: PipelineLayoutKey, build: impl FnOnce() -> D::PipelineLayout) -> D::PipelineLayout {
        if let Some((layout, count)) = self.entries.get_mut(&key) {
            *count += 1;
            return *layout;
        }

        let layout = build();
        self.entries.insert(key, (layout, 1));
        layout
    }

    pub fn ref_count(&self, layout: D::PipelineLayout) -> usize {
        self.entries
            .values()
            .find(|(existing, _)| *existing == layout)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

impl<D: Device> Default for PipelineLayoutCache<D> {
    fn default() -> Self {
        Self::new()
    }
}

struct MaterialEntry<D: Device> {
    pipeline_layout: D::PipelineLayout,
    pipeline: D::Pipeline,
}

/// Given a vertex and fragment shader, produces the interned `(pipeline-layout, pipeline)` pair
/// every material instance backed by those shaders reuses (§4.8).
pub struct SharedMaterialFactory<D: Device> {
    descriptor_set_layouts: DescriptorSetLayoutCache<D>,
    pipeline_layouts: PipelineLayoutCache<D>,
    materials: HashMap<u64, MaterialEntry<D>>,
}

impl<D: Device> SharedMaterialFactory<D> {
    pub fn new() -> Self {
        Self {
            descriptor_set_layouts: DescriptorSetLayoutCache::new(),
            pipeline_layouts: PipelineLayoutCache::new(),
            materials: HashMap::new(),
        }
    }

    pub fn pipeline_layout_cache(&self) -> &PipelineLayoutCache<D> {
        &self.pipeline_layouts
    }

    /// Step 1 of §4.8: returns the cached pair if `shader` (by its own hash) was already built.
    pub fn get_or_build(
        &mut self,
        device: &mut D,
        shader: &Shader,
    ) -> Result<(D::PipelineLayout, D::Pipeline)> {
        let hash = shader.hash();
        if let Some(entry) = self.materials.get(&hash) {
            return Ok((entry.pipeline_layout, entry.pipeline));
        }

        let sheet = shader.parameter_sheet();

        let mut set_layouts = Vec::new();
        if sheet.needs_camera {
            set_layouts.push(self.descriptor_set_layouts.camera(device));
        }
        if sheet.needs_model {
            set_layouts.push(self.descriptor_set_layouts.model(device));
        }
        if sheet.needs_resource_pool {
            set_layouts.push(self.descriptor_set_layouts.static_resource(device));
        }

        let push_constant_range = build_push_constant_range(sheet)?;

        let key = PipelineLayoutKey {
            needs_camera: sheet.needs_camera,
            needs_model: sheet.needs_model,
            needs_resource_pool: sheet.needs_resource_pool,
            push_constant: push_constant_range.map(|r| (r.offset, r.size)),
        };

        let pipeline_layout = self.pipeline_layouts.intern(key, || {
            device.create_pipeline_layout(&PipelineLayoutDescriptor {
                set_layouts: set_layouts.clone(),
                push_constants: push_constant_range.into_iter().collect(),
            })
        });

        let vertex_shader = device.create_shader_module(shader.vs());
        let fragment_shader = device.create_shader_module(shader.fs());

        let pipeline = device.create_graphics_pipeline(&GraphicsPipelineDescriptor {
            layout: pipeline_layout,
            vertex_shader,
            fragment_shader,
            topology: PrimitiveTopology::TriangleList,
            cull_mode: Face::Back,
            front_face: FrontFace::Ccw,
            vertex_stride: 32,
            vertex_attributes: vec![
                VertexAttribute { offset: 0, format: VertexFormat::Float32x3 },
                VertexAttribute { offset: 12, format: VertexFormat::Float32x3 },
                VertexAttribute { offset: 24, format: VertexFormat::Float32x2 },
            ],
            depth_stencil: Some(DepthStencilState {
                format: TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare_op: CompareOp::Less,
            }),
        });

        self.materials.insert(
            hash,
            MaterialEntry {
                pipeline_layout,
                pipeline,
            },
        );
        Ok((pipeline_layout, pipeline))
    }
}

impl<D: Device> Default for SharedMaterialFactory<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// §9's explicit-sort fix: earlier revisions of the source took only the first and last item's
/// offset/size without sorting first, which is only correct if the sheet already lists items in
/// offset order. Sorting here makes the result correct regardless of declaration order.
fn build_push_constant_range(sheet: &ParameterSheet) -> Result<Option<PushConstantRange>> {
    if sheet.push_constants.is_empty() {
        return Ok(None);
    }
    if !sheet.is_valid() {
        let reason = "parameter sheet has overlapping push constants";
        tracing::error!(reason, "shared material build failed");
        return Err(RenderError::MaterialBuildFailed(reason.into()));
    }

    let mut items = sheet.push_constants.clone();
    items.sort_by_key(|item| item.offset);

    let offset = items.first().unwrap().offset;
    let end = items.iter().map(|item| item.offset + item.size).max().unwrap();
    let size = align_up(end - offset, 4);

    Ok(Some(PushConstantRange {
        stages: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
        offset,
        size,
    }))
}

fn align_up(value: u32, align: u32) -> u32 {
    (value + align - 1) / align * align
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::*;
    use game_asset::intermediate::PushConstantItem;

    #[derive(Debug, Default)]
    struct FakeDevice {
        next: u32,
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
            0
        }
        fn destroy_texture(&mut self, _texture: Self::Texture) {}
        fn write_texture(&mut self, _texture: Self::Texture, _data: &[u8]) {}

        fn create_sampler(&mut self, _desc: &SamplerDescriptor) -> Self::Sampler {
            0
        }
        fn destroy_sampler(&mut self, _sampler: Self::Sampler) {}

        fn create_buffer(&mut self, _desc: &BufferDescriptor) -> Self::Buffer {
            0
        }
        fn destroy_buffer(&mut self, _buffer: Self::Buffer) {}
        fn write_buffer(&mut self, _buffer: Self::Buffer, _offset: u64, _data: &[u8]) {}

        fn create_shader_module(&mut self, _source: &[u32]) -> Self::ShaderModule {
            self.next += 1;
            self.next
        }

        fn create_descriptor_set_layout(
            &mut self,
            _desc: &DescriptorSetLayoutDescriptor,
        ) -> Self::DescriptorSetLayout {
            self.next += 1;
            self.next
        }

        fn create_pipeline_layout(
            &mut self,
            _desc: &PipelineLayoutDescriptor<Self::DescriptorSetLayout>,
        ) -> Self::PipelineLayout {
            self.next += 1;
            self.next
        }

        fn create_graphics_pipeline(
            &mut self,
            _desc: &GraphicsPipelineDescriptor<Self>,
        ) -> Self::Pipeline {
            self.next += 1;
            self.next
        }

        fn write_bindless_texture_slot(&mut self, _index: u32, _texture: Self::Texture) {}
        fn write_bindless_sampler_slot(&mut self, _index: u32, _sampler: Self::Sampler) {}
    }

    fn shader_with(name: &str, sheet: ParameterSheet) -> Shader {
        Shader::new(name.into(), vec![1, 2, 3], vec![4, 5, 6], sheet)
    }

    #[test]
    fn byte_identical_shaders_share_one_pipeline_layout() {
        let mut device = FakeDevice::default();
        let mut factory: SharedMaterialFactory<FakeDevice> = SharedMaterialFactory::new();

        let sheet = ParameterSheet {
            needs_camera: true,
            ..Default::default()
        };
        let a = shader_with("a.shader", sheet.clone());
        let b = shader_with("a.shader", sheet);

        let (layout_a, pipeline_a) = factory.get_or_build(&mut device, &a).unwrap();
        let (layout_b, pipeline_b) = factory.get_or_build(&mut device, &b).unwrap();

        assert_eq!(layout_a, layout_b);
        assert_eq!(pipeline_a, pipeline_b, "byte-identical shaders must hit the material cache");
    }

    #[test]
    fn distinct_shaders_with_the_same_needs_share_the_pipeline_layout_with_refcount_two() {
        let mut device = FakeDevice::default();
        let mut factory: SharedMaterialFactory<FakeDevice> = SharedMaterialFactory::new();

        let sheet = ParameterSheet {
            needs_camera: true,
            needs_model: true,
            ..Default::default()
        };
        let a = shader_with("a.shader", sheet.clone());
        let b = Shader::new("b.shader".into(), vec![9, 9, 9], vec![8, 8, 8], sheet);

        let (layout_a, _) = factory.get_or_build(&mut device, &a).unwrap();
        let (layout_b, _) = factory.get_or_build(&mut device, &b).unwrap();

        assert_eq!(layout_a, layout_b);
        assert_eq!(factory.pipeline_layout_cache().ref_count(layout_a), 2);
    }

    #[test]
    fn push_constant_range_is_computed_after_an_explicit_sort() {
        let sheet = ParameterSheet {
            push_constants: vec![
                PushConstantItem { name: "b".into(), offset: 16, size: 16 },
                PushConstantItem { name: "a".into(), offset: 0, size: 8 },
            ],
            ..Default::default()
        };

        let range = build_push_constant_range(&sheet).unwrap().unwrap();
        assert_eq!(range.offset, 0);
        assert_eq!(range.size, 32);
    }

    #[test]
    fn overlapping_push_constants_fail_material_build() {
        let mut device = FakeDevice::default();
        let mut factory: SharedMaterialFactory<FakeDevice> = SharedMaterialFactory::new();

        let sheet = ParameterSheet {
            push_constants: vec![
                PushConstantItem { name: "a".into(), offset: 0, size: 16 },
                PushConstantItem { name: "b".into(), offset: 8, size: 16 },
            ],
            ..Default::default()
        };
        let shader = shader_with("bad.shader", sheet);

        let result = factory.get_or_build(&mut device, &shader);
        assert!(matches!(result, Err(RenderError::MaterialBuildFailed(_))));
    }
}
