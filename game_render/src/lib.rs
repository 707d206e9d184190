//! GPU materialization, bindless resource pools, shared-material compilation, and the frame
//! dispatcher that drives them (§1 "The hard engineering is the asset cache and loader pipeline").
//!
//! `game_asset` owns identity, metadata, and the intermediate-file codec; this crate owns
//! everything past that point — the opaque RHI seam ([`rhi`]), the staging-buffer upload path
//! ([`materialize`]) that implements [`game_asset::load::GpuBackend`], the in-memory GPU object
//! types ([`texture`], [`mesh`], [`shader`]), the two bindless pools ([`bindless`],
//! [`model_pool`]), the shared-material factory ([`material`]), and the engine loop's frame
//! dispatch ([`frame`]).

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_crate_dependencies)]

pub mod bindless;
pub mod error;
pub mod frame;
pub mod material;
pub mod materialize;
pub mod mesh;
pub mod model_pool;
pub mod rhi;
pub mod shader;
pub mod texture;

pub use bindless::{SamplerHandle, SamplerPool, TextureHandle, TexturePool};
pub use error::RenderError;
pub use frame::{DispatcherState, EventBus, FrameDispatcher, TickArgs};
pub use material::SharedMaterialFactory;
pub use materialize::RenderBackend;
pub use mesh::Mesh;
pub use model_pool::ModelMatrixPool;
pub use rhi::Device;
pub use shader::Shader;
pub use texture::Texture;
