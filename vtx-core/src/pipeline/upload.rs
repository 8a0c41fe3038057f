//! Asynchronous CPU → GPU pixel upload.
//!
//! The mirror of the readback ring, two slots deep: each cycle queues
//! a texture update sourced from the slot filled **last** cycle, then
//! maps the other slot (discarding its old storage so the GPU never
//! stalls on a buffer it may still be consuming) and copies the
//! caller's bytes in. Uploaded content reaches the texture one cycle
//! after submission.

use crate::error::VtxError;
use crate::pipeline::copy::CopyEngine;
use crate::pipeline::device::{TransferDevice, TransferDirection};
use crate::pipeline::ring::SlotRing;
use crate::pipeline::types::{FrameBuffer, PixelFormat};

/// Default ring depth: uploads are producer-only, so one slot in
/// flight plus one being filled suffices.
pub const DEFAULT_UPLOAD_DEPTH: usize = 2;

/// N-slot asynchronous upload ring.
pub struct UploadRing<D: TransferDevice> {
    depth: usize,
    engine: CopyEngine,
    ring: Option<SlotRing<D::Slot>>,
    shape: Option<(u32, u32, PixelFormat)>,
}

impl<D: TransferDevice> UploadRing<D> {
    /// Ring with the default depth.
    pub fn new(engine: CopyEngine) -> Self {
        Self::with_depth(engine, DEFAULT_UPLOAD_DEPTH)
    }

    /// Ring with an explicit depth (minimum 2).
    pub fn with_depth(engine: CopyEngine, depth: usize) -> Self {
        Self {
            depth: depth.max(2),
            engine,
            ring: None,
            shape: None,
        }
    }

    /// Configured ring depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Drop every slot and forget the shape; the next call rebuilds.
    pub fn invalidate(&mut self) {
        self.ring = None;
        self.shape = None;
    }

    /// Run one upload cycle: push the previously staged frame to
    /// `texture` and stage `frame` for the next cycle.
    ///
    /// On [`VtxError::MapNotReady`] the staging step failed; the
    /// caller's fallback is
    /// [`upload_direct`](TransferDevice::upload_direct), which updates
    /// the texture synchronously at the cost of a pipeline stall.
    pub fn upload(
        &mut self,
        device: &mut D,
        frame: &FrameBuffer,
        texture: &D::Texture,
    ) -> Result<(), VtxError> {
        if frame.is_empty() {
            return Err(VtxError::ZeroSized {
                width: frame.width(),
                height: frame.height(),
            });
        }

        let shape = (frame.width(), frame.height(), frame.format());
        if self.shape != Some(shape) {
            self.rebuild(device, shape)?;
        }
        let engine = self.engine;
        let ring = self
            .ring
            .as_mut()
            .ok_or_else(|| VtxError::Allocation("upload ring not initialised".into()))?;

        // Push the slot staged last cycle (zeroed right after a
        // rebuild — one dark frame while the ring primes).
        ring.advance();
        device.queue_upload(ring.current_mut(), texture)?;

        // Stage the caller's frame into the other slot for the next
        // cycle. The map discards the slot's previous storage.
        let slot = ring.oldest_mut();
        let row_bytes = shape.2.row_bytes(shape.0);
        let rows = shape.1 as usize;
        let mapped = device.map_write(&mut *slot)?;
        engine.copy_rows(
            frame.bytes(),
            frame.stride() as usize,
            mapped.bytes,
            mapped.row_pitch,
            row_bytes,
            rows,
        );
        device.unmap(slot);

        Ok(())
    }

    fn rebuild(&mut self, device: &mut D, shape: (u32, u32, PixelFormat)) -> Result<(), VtxError> {
        tracing::debug!(
            width = shape.0,
            height = shape.1,
            format = ?shape.2,
            depth = self.depth,
            "rebuilding upload ring"
        );
        self.ring = None;
        self.shape = None;

        let mut slots = Vec::with_capacity(self.depth);
        for _ in 0..self.depth {
            slots.push(device.create_slot(shape.0, shape.1, shape.2, TransferDirection::Upload)?);
        }
        self.ring = Some(SlotRing::new(slots));
        self.shape = Some(shape);
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
