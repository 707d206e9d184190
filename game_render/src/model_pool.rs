//! The per-frame-in-flight model matrix ring (§4.7).
//!
//! Holds `F` arrays of `N` model matrices each. A renderer becomes visible by calling
//! [`ModelMatrixPool::register`], which hands back a slot index valid for as long as the renderer
//! stays visible; [`ModelMatrixPool::unregister`] releases it. Each frame the dispatcher selects
//! `r = frame_number mod F` and writes into `matrices[r][slot]` — the ring index that would back a
//! storage buffer bound at descriptor set "Model", binding 0, once a real pipeline consumes it.

use glam::Mat4;

use crate::error::RenderError;

/// A conservative implementation of the §4.7 invariant: `register`/`unregister` is forbidden
/// between `begin_frame(r)` and the matching `end_frame(r)`, for any ring — callers serialize
/// slot churn with the frame dispatcher rather than tracking per-ring locks individually.
pub struct ModelMatrixPool {
    rings: Vec<Vec<Mat4>>,
    slot_in_use: Vec<bool>,
    locked: bool,
}

impl ModelMatrixPool {
    pub fn new(frames_in_flight: usize, capacity: usize) -> Self {
        let rings = (0..frames_in_flight)
            .map(|_| vec![Mat4::IDENTITY; capacity])
            .collect();
        Self {
            rings,
            slot_in_use: vec![false; capacity],
            locked: false,
        }
    }

    pub fn frames_in_flight(&self) -> usize {
        self.rings.len()
    }

    pub fn capacity(&self) -> usize {
        self.slot_in_use.len()
    }

    pub fn len(&self) -> usize {
        self.slot_in_use.iter().filter(|used| **used).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocates the lowest free slot index, mirroring the bindless pools' allocation discipline
    /// (§4.6) even though this pool has no `remove`-time descriptor-write side effect.
    pub fn register(&mut self) -> Result<usize, RenderError> {
        if self.locked {
            return Err(RenderError::Fatal(
                "model matrix pool slot churn attempted during an in-flight frame".into(),
            ));
        }

        let slot = self
            .slot_in_use
            .iter()
            .position(|used| !used)
            .ok_or(RenderError::PoolFull { capacity: self.capacity() })?;
        self.slot_in_use[slot] = true;
        Ok(slot)
    }

    pub fn unregister(&mut self, slot: usize) -> Result<(), RenderError> {
        if self.locked {
            return Err(RenderError::Fatal(
                "model matrix pool slot churn attempted during an in-flight frame".into(),
            ));
        }

        if let Some(used) = self.slot_in_use.get_mut(slot) {
            *used = false;
        }
        Ok(())
    }

    /// Locks out `register`/`unregister` until the matching [`ModelMatrixPool::end_frame`].
    pub fn begin_frame(&mut self) {
        self.locked = true;
    }

    pub fn end_frame(&mut self) {
        self.locked = false;
    }

    /// Writes `matrix` into ring `frame_number mod frames_in_flight` at `slot`.
    pub fn write(&mut self, frame_number: u64, slot: usize, matrix: Mat4) {
        let ring = self.ring_for(frame_number);
        if let Some(cell) = self.rings[ring].get_mut(slot) {
            *cell = matrix;
        }
    }

    pub fn read(&self, frame_number: u64, slot: usize) -> Option<Mat4> {
        let ring = self.ring_for(frame_number);
        self.rings[ring].get(slot).copied()
    }

    pub fn ring_for(&self, frame_number: u64) -> usize {
        (frame_number as usize) % self.rings.len()
    }

    /// The raw bytes backing ring `frame_number mod frames_in_flight`, ready to hand to
    /// [`crate::rhi::Device::write_buffer`] for the storage buffer bound at descriptor set
    /// "Model", binding 0 (§4.7).
    pub fn ring_bytes(&self, frame_number: u64) -> &[u8] {
        let ring = self.ring_for(frame_number);
        bytemuck::cast_slice(&self.rings[ring])
    }
}
