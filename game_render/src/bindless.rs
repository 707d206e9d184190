//! Bindless GPU resource pools: fixed-capacity texture/sampler arrays indexed straight from
//! shaders via `update-after-bind`/`partially-bound` descriptors (§4.6).
//!
//! Handed-out [`TextureHandle`]/[`SamplerHandle`] values are non-owning; the pool only frees a
//! slot when the handle's registered pre-destroy callback runs, which lets callers hold a handle
//! across frames without the pool keeping a strong reference back to them (Design Note "Bindless
//! handles avoid reference cycles").

use std::collections::HashMap;

use crate::error::RenderError;
use crate::rhi::Device;

/// A non-owning index into a [`TexturePool`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub fn index(&self) -> u32 {
        self.0
    }

    pub(crate) fn from_index(index: u32) -> Self {
        Self(index)
    }
}

/// A non-owning index into a [`SamplerPool`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SamplerHandle(u32);

impl SamplerHandle {
    pub fn index(&self) -> u32 {
        self.0
    }
}

struct Slot<T> {
    resource: Option<T>,
}

/// A fixed-capacity array of GPU textures, each published at a stable bindless index.
///
/// Allocation always picks the lowest free index (mirroring `FindEmptyTextureIndex` in the
/// original engine), which keeps the live index range dense and makes a full pool detectable in
/// O(1) via a running count rather than a linear scan.
pub struct TexturePool<D: Device> {
    slots: Vec<Slot<D::Texture>>,
    by_key: HashMap<u64, TextureHandle>,
    len: usize,
    release_queue: crate::texture::ReleaseQueue,
}

impl<D: Device> TexturePool<D> {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot { resource: None });
        Self {
            slots,
            by_key: HashMap::new(),
            len: 0,
            release_queue: Default::default(),
        }
    }

    /// Registers `texture`'s bindless slot, and hands it a clone of this pool's release queue so
    /// dropping it enqueues the slot for [`TexturePool::reap`] rather than calling back into the
    /// pool directly (Design Note "Reference-cycle risk").
    pub fn track(
        &mut self,
        device: &mut D,
        texture: &mut crate::texture::Texture<D>,
    ) -> Result<TextureHandle, RenderError> {
        let handle = self.insert(device, texture.handle())?;
        texture.attach_pool_slot(handle, self.release_queue.clone());
        Ok(handle)
    }

    /// Drains slots enqueued by dropped tracked textures, per §4.6's destruction hook. Called by
    /// the host between frames (§5 "mutations happen on the main thread between frames").
    pub fn reap(&mut self, device: &mut D) {
        let pending: Vec<TextureHandle> = std::mem::take(&mut *self.release_queue.lock());
        for handle in pending {
            self.remove(device, handle);
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn find_empty_index(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.resource.is_none())
    }

    /// Inserts a texture into the lowest free slot, publishing it to the given descriptor set.
    pub fn insert(
        &mut self,
        device: &mut D,
        texture: D::Texture,
    ) -> Result<TextureHandle, RenderError> {
        let index = self.find_empty_index().ok_or_else(|| {
            tracing::error!(capacity = self.capacity(), "texture bindless pool exhausted");
            RenderError::PoolFull { capacity: self.capacity() }
        })?;

        self.slots[index].resource = Some(texture);
        self.len += 1;

        device.write_bindless_texture_slot(index as u32, texture);
        Ok(TextureHandle(index as u32))
    }

    /// Returns the existing handle for `key` if one was previously registered via
    /// [`TexturePool::get_or_insert`], avoiding a duplicate upload of an asset already resident.
    pub fn get_or_insert(
        &mut self,
        device: &mut D,
        key: u64,
        texture: impl FnOnce() -> D::Texture,
    ) -> Result<TextureHandle, RenderError> {
        if let Some(handle) = self.by_key.get(&key) {
            return Ok(*handle);
        }

        let handle = self.insert(device, texture())?;
        self.by_key.insert(key, handle);
        Ok(handle)
    }

    pub fn get(&self, handle: TextureHandle) -> Option<D::Texture> {
        self.slots.get(handle.0 as usize)?.resource
    }

    /// Releases the slot backing `handle`. Callers invoke this from the resource's pre-destroy
    /// callback, once nothing else can still reference the bindless index.
    pub fn remove(&mut self, device: &mut D, handle: TextureHandle) {
        if let Some(slot) = self.slots.get_mut(handle.0 as usize) {
            if let Some(texture) = slot.resource.take() {
                self.by_key.retain(|_, h| *h != handle);
                self.len -= 1;
                device.destroy_texture(texture);
            }
        }
    }
}

/// A fixed-capacity array of GPU samplers, indexed identically to [`TexturePool`].
pub struct SamplerPool<D: Device> {
    slots: Vec<Slot<D::Sampler>>,
    by_key: HashMap<u64, SamplerHandle>,
    len: usize,
}

impl<D: Device> SamplerPool<D> {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot { resource: None });
        Self {
            slots,
            by_key: HashMap::new(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    fn find_empty_index(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.resource.is_none())
    }

    pub fn insert(
        &mut self,
        device: &mut D,
        sampler: D::Sampler,
    ) -> Result<SamplerHandle, RenderError> {
        let index = self.find_empty_index().ok_or_else(|| {
            tracing::error!(capacity = self.capacity(), "sampler bindless pool exhausted");
            RenderError::PoolFull { capacity: self.capacity() }
        })?;

        self.slots[index].resource = Some(sampler);
        self.len += 1;

        device.write_bindless_sampler_slot(index as u32, sampler);
        Ok(SamplerHandle(index as u32))
    }

    /// Returns the existing handle for `key` (the 64-bit hash of a normalized sampler
    /// description, §3 "Bindless sampler pool") if one was already registered, so structurally
    /// identical sampler descriptions collapse onto a single slot.
    pub fn get_or_insert(
        &mut self,
        device: &mut D,
        key: u64,
        sampler: impl FnOnce() -> D::Sampler,
    ) -> Result<SamplerHandle, RenderError> {
        if let Some(handle) = self.by_key.get(&key) {
            return Ok(*handle);
        }

        let handle = self.insert(device, sampler())?;
        self.by_key.insert(key, handle);
        Ok(handle)
    }

    pub fn get(&self, handle: SamplerHandle) -> Option<D::Sampler> {
        self.slots.get(handle.0 as usize)?.resource
    }

    pub fn remove(&mut self, device: &mut D, handle: SamplerHandle) {
        if let Some(slot) = self.slots.get_mut(handle.0 as usize) {
            if let Some(sampler) = slot.resource.take() {
                self.by_key.retain(|_, h| *h != handle);
                self.len -= 1;
                device.destroy_sampler(sampler);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::*;

    #[derive(Debug, Default)]
    struct FakeDevice {
        next: u32,
        texture_writes: Vec<(u32, u32)>,
        sampler_writes: Vec<(u32, u32)>,
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
        fn write_texture(&mut self, _texture: Self::Texture, _data: &[u8]) {}

        fn create_sampler(&mut self, _desc: &SamplerDescriptor) -> Self::Sampler {
            self.next += 1;
            self.next
        }
        fn destroy_sampler(&mut self, _sampler: Self::Sampler) {}

        fn create_buffer(&mut self, _desc: &BufferDescriptor) -> Self::Buffer {
            0
        }
        fn destroy_buffer(&mut self, _buffer: Self::Buffer) {}
        fn write_buffer(&mut self, _buffer: Self::Buffer, _offset: u64, _data: &[u8]) {}

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

        fn write_bindless_texture_slot(&mut self, index: u32, texture: Self::Texture) {
            self.texture_writes.push((index, texture));
        }

        fn write_bindless_sampler_slot(&mut self, index: u32, sampler: Self::Sampler) {
            self.sampler_writes.push((index, sampler));
        }
    }

    #[test]
    fn allocates_the_lowest_free_index() {
        let mut device = FakeDevice::default();
        let mut pool: TexturePool<FakeDevice> = TexturePool::new(4);

        let a = pool.insert(&mut device, device.create_texture(&dummy_texture())).unwrap();
        let b = pool.insert(&mut device, device.create_texture(&dummy_texture())).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);

        pool.remove(&mut device, a);
        let c = pool.insert(&mut device, device.create_texture(&dummy_texture())).unwrap();
        assert_eq!(c.index(), 0, "freed slot 0 must be reused before growing");
    }

    #[test]
    fn reports_pool_full_once_capacity_is_exhausted() {
        let mut device = FakeDevice::default();
        let mut pool: TexturePool<FakeDevice> = TexturePool::new(1);

        pool.insert(&mut device, device.create_texture(&dummy_texture())).unwrap();
        let result = pool.insert(&mut device, device.create_texture(&dummy_texture()));
        assert!(matches!(result, Err(RenderError::PoolFull { capacity: 1 })));
    }

    #[test]
    fn get_or_insert_reuses_an_existing_key() {
        let mut device = FakeDevice::default();
        let mut pool: TexturePool<FakeDevice> = TexturePool::new(4);

        let a = pool
            .get_or_insert(&mut device, 42, || device.create_texture(&dummy_texture()))
            .unwrap();
        let b = pool
            .get_or_insert(&mut device, 42, || unreachable!("must not re-upload"))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn identical_sampler_descriptions_share_one_slot() {
        let mut device = FakeDevice::default();
        let mut pool: SamplerPool<FakeDevice> = SamplerPool::new(4);

        let desc = SamplerDescriptor {
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            address_mode: AddressMode::Repeat,
        };
        let key = desc.cache_key();

        let a = pool
            .get_or_insert(&mut device, key, || device.create_sampler(&desc))
            .unwrap();
        let b = pool
            .get_or_insert(&mut device, key, || unreachable!("must not re-create"))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(pool.len(), 1);
    }

    fn dummy_texture() -> TextureDescriptor {
        TextureDescriptor {
            width: 1,
            height: 1,
            mip_levels: 1,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsage::SAMPLED,
        }
    }
}
