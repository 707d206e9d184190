//! The render hardware interface: an opaque, handle-based seam to a real GPU backend (§1, §6.2).
//!
//! The RHI itself — a concrete Vulkan/D3D12/Metal implementation — is explicitly out of scope
//! ("an already-implemented external collaborator consumed only through the interface described
//! here"). Everything in this module is the *shape* of that interface as the rest of this crate
//! consumes it: opaque resource handles and the descriptor types used to create them, mirroring
//! the vocabulary of the engine's real backend abstraction.

use bitflags::bitflags;

/// A backend-allocated GPU resource identified only by an opaque handle.
///
/// The bindless pools (§4.6) and model matrix ring (§4.7) hand these out to callers; nothing in
/// this crate ever dereferences one directly.
pub trait Device {
    type Texture: Copy + Eq + std::fmt::Debug;
    type Sampler: Copy + Eq + std::fmt::Debug;
    type Buffer: Copy + Eq + std::fmt::Debug;
    type DescriptorSetLayout: Copy + Eq + std::fmt::Debug;
    type PipelineLayout: Copy + Eq + std::fmt::Debug;
    type Pipeline: Copy + Eq + std::fmt::Debug;
    type ShaderModule: Copy + Eq + std::fmt::Debug;

    fn create_texture(&mut self, desc: &TextureDescriptor) -> Self::Texture;
    fn destroy_texture(&mut self, texture: Self::Texture);

    /// Stages `data` (tightly packed rows, one mip) into `texture` (§4.5 "Texture specifics": a
    /// staging buffer upload, not a direct map).
    fn write_texture(&mut self, texture: Self::Texture, data: &[u8]);

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> Self::Sampler;
    fn destroy_sampler(&mut self, sampler: Self::Sampler);

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> Self::Buffer;
    fn destroy_buffer(&mut self, buffer: Self::Buffer);
    fn write_buffer(&mut self, buffer: Self::Buffer, offset: u64, data: &[u8]);

    fn create_shader_module(&mut self, source: &[u32]) -> Self::ShaderModule;

    fn create_descriptor_set_layout(
        &mut self,
        desc: &DescriptorSetLayoutDescriptor,
    ) -> Self::DescriptorSetLayout;

    fn create_pipeline_layout(
        &mut self,
        desc: &PipelineLayoutDescriptor<Self::DescriptorSetLayout>,
    ) -> Self::PipelineLayout;

    fn create_graphics_pipeline(
        &mut self,
        desc: &GraphicsPipelineDescriptor<Self>,
    ) -> Self::Pipeline;

    /// Publishes a texture at a bindless index into the global static resource descriptor set
    /// (§4.6).
    fn write_bindless_texture_slot(&mut self, index: u32, texture: Self::Texture);

    /// Publishes a sampler at a bindless index into the global static resource descriptor set
    /// (§4.6).
    fn write_bindless_sampler_slot(&mut self, index: u32, sampler: Self::Sampler);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Depth32Float,
}

impl From<game_asset::settings::TextureFormat> for TextureFormat {
    fn from(value: game_asset::settings::TextureFormat) -> Self {
        match value {
            game_asset::settings::TextureFormat::Bgra8UnormSrgb => Self::Bgra8UnormSrgb,
            game_asset::settings::TextureFormat::Rgba8Unorm => Self::Rgba8Unorm,
            game_asset::settings::TextureFormat::Rgba8UnormSrgb => Self::Rgba8UnormSrgb,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const SAMPLED = 1 << 0;
        const TRANSFER_DST = 1 << 1;
        const COLOR_ATTACHMENT = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 3;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Repeat,
    MirrorRepeat,
    ClampToEdge,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SamplerDescriptor {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub address_mode: AddressMode,
}

impl SamplerDescriptor {
    /// The 64-bit key [`crate::bindless::SamplerPool::get_or_insert`] interns on, so structurally
    /// identical descriptions collapse onto one bindless slot (§3 "Bindless sampler pool").
    pub fn cache_key(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const UNIFORM = 1 << 0;
        const STORAGE = 1 << 1;
        const TRANSFER_DST = 1 << 2;
        const INDEX = 1 << 3;
        const VERTEX = 1 << 4;
    }
}

#[derive(Clone, Debug)]
pub struct BufferDescriptor {
    pub size: u64,
    pub usage: BufferUsage,
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DescriptorType {
    UniformBuffer,
    StorageBuffer,
    SampledImageArray { count: u32 },
    SamplerArray { count: u32 },
}

#[derive(Copy, Clone, Debug)]
pub struct DescriptorBinding {
    pub binding: u32,
    pub kind: DescriptorType,
    pub stages: ShaderStageFlags,
    pub update_after_bind: bool,
}

#[derive(Clone, Debug, Default)]
pub struct DescriptorSetLayoutDescriptor {
    pub bindings: Vec<DescriptorBinding>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PushConstantRange {
    pub stages: ShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

#[derive(Clone, Debug)]
pub struct PipelineLayoutDescriptor<L> {
    pub set_layouts: Vec<L>,
    pub push_constants: Vec<PushConstantRange>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    LineList,
    PointList,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrontFace {
    Cw,
    Ccw,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Face {
    None,
    Front,
    Back,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Copy, Clone, Debug)]
pub struct DepthStencilState {
    pub format: TextureFormat,
    pub depth_write_enabled: bool,
    pub depth_compare_op: CompareOp,
}

#[derive(Copy, Clone, Debug)]
pub struct VertexAttribute {
    pub offset: u32,
    pub format: VertexFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
}

pub struct GraphicsPipelineDescriptor<D: Device + ?Sized> {
    pub layout: D::PipelineLayout,
    pub vertex_shader: D::ShaderModule,
    pub fragment_shader: D::ShaderModule,
    pub topology: PrimitiveTopology,
    pub cull_mode: Face,
    pub front_face: FrontFace,
    pub vertex_stride: u32,
    pub vertex_attributes: Vec<VertexAttribute>,
    pub depth_stencil: Option<DepthStencilState>,
}
