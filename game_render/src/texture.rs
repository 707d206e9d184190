//! The in-memory GPU texture object returned by a successful load (§4.5 "Texture specifics").
//!
//! A texture only ever gets *one* owner of its RHI handle (this type); the bindless static pool
//! (§4.6) never holds a strong reference back to it, only a non-owning [`crate::bindless::TextureHandle`]
//! index. Coupling destruction to slot release without a reference cycle (Design Note
//! "Reference-cycle risk") is done through a shared release queue: [`TexturePool::track`] hands the
//! texture a clone of the pool's queue, and the texture's [`Drop`] impl pushes its slot onto it
//! instead of calling back into the pool directly.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::bindless::TextureHandle;
use crate::rhi::{Device, TextureFormat};

pub(crate) type ReleaseQueue = Arc<Mutex<Vec<TextureHandle>>>;

/// A GPU-resident texture, materialized from a [`game_asset::intermediate::TextureBody`] via the
/// staging-buffer upload path (§4.5).
pub struct Texture<D: Device> {
    name: String,
    width: u32,
    height: u32,
    format: TextureFormat,
    handle: D::Texture,
    pool_slot: Option<TextureHandle>,
    release_queue: Option<ReleaseQueue>,
}

impl<D: Device> Texture<D> {
    pub(crate) fn new(name: String, width: u32, height: u32, format: TextureFormat, handle: D::Texture) -> Self {
        Self {
            name,
            width,
            height,
            format,
            handle,
            pool_slot: None,
            release_queue: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The RHI handle this texture owns. Never escapes into the bindless pool's own storage.
    pub fn handle(&self) -> D::Texture {
        self.handle
    }

    /// The bindless index this texture currently occupies, if [`TexturePool::track`] registered
    /// it.
    pub fn bindless_index(&self) -> Option<TextureHandle> {
        self.pool_slot
    }

    pub(crate) fn attach_pool_slot(&mut self, slot: TextureHandle, queue: ReleaseQueue) {
        self.pool_slot = Some(slot);
        self.release_queue = Some(queue);
    }
}

impl<D: Device> Drop for Texture<D> {
    fn drop(&mut self) {
        if let (Some(slot), Some(queue)) = (self.pool_slot.take(), self.release_queue.take()) {
            queue.lock().push(slot);
        }
    }
}
