//! Asynchronous GPU → CPU pixel readback.
//!
//! A ring of transfer slots hides GPU latency: each cycle queues a
//! non-blocking readback into the slot under the cursor and maps the
//! **oldest** slot — whose copy was issued `depth − 1` cycles earlier
//! and has had that long to complete. The delivered frame therefore
//! lags the queued one by exactly `depth − 1` cycles; that latency is
//! the price of never stalling the GPU.

use crate::error::VtxError;
use crate::pipeline::copy::CopyEngine;
use crate::pipeline::device::{TransferDevice, TransferDirection};
use crate::pipeline::ring::SlotRing;
use crate::pipeline::types::{FrameBuffer, PixelFormat};

/// Default ring depth: one slot in flight on the GPU, one completing,
/// one being mapped.
pub const DEFAULT_READBACK_DEPTH: usize = 3;

/// Outcome of one readback cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadbackStatus {
    /// The caller's buffer now holds a frame.
    Frame,
    /// No slot was ready this cycle (ring warm-up, or the GPU is
    /// still busy). Try again next cycle; no state was lost.
    Pending,
}

/// N-slot asynchronous readback ring.
///
/// The ring sizes itself from the caller's destination buffer and
/// rebuilds all slots whenever that shape changes.
pub struct ReadbackRing<D: TransferDevice> {
    depth: usize,
    engine: CopyEngine,
    ring: Option<SlotRing<D::Slot>>,
    shape: Option<(u32, u32, PixelFormat)>,
}

impl<D: TransferDevice> ReadbackRing<D> {
    /// Ring with the default depth.
    pub fn new(engine: CopyEngine) -> Self {
        Self::with_depth(engine, DEFAULT_READBACK_DEPTH)
    }

    /// Ring with an explicit depth (minimum 2: one slot queuing, one
    /// mapping).
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

    /// How many cycles a delivered frame lags the cycle that queued it.
    pub fn latency_cycles(&self) -> usize {
        self.depth - 1
    }

    /// Drop every slot and forget the shape; the next call rebuilds.
    pub fn invalidate(&mut self) {
        self.ring = None;
        self.shape = None;
    }

    /// Run one readback cycle: queue `texture` into the ring and copy
    /// the oldest completed slot into `out`.
    ///
    /// `out` defines the expected shape; a shape change rebuilds the
    /// ring (and restarts warm-up). Returns
    /// [`ReadbackStatus::Pending`] while no slot is ready.
    pub fn readback(
        &mut self,
        device: &mut D,
        texture: &D::Texture,
        out: &mut FrameBuffer,
    ) -> Result<ReadbackStatus, VtxError> {
        if out.is_empty() {
            return Err(VtxError::ZeroSized {
                width: out.width(),
                height: out.height(),
            });
        }

        let shape = (out.width(), out.height(), out.format());
        if self.shape != Some(shape) {
            self.rebuild(device, shape)?;
        }
        let engine = self.engine;
        let ring = self
            .ring
            .as_mut()
            .ok_or_else(|| VtxError::Allocation("readback ring not initialised".into()))?;

        // Queue this cycle's copy into the slot under the cursor.
        ring.advance();
        device.queue_readback(texture, ring.current_mut())?;

        // Harvest the oldest slot. Not-ready is the expected outcome
        // for the first depth-1 cycles after a (re)build.
        let slot = ring.oldest_mut();
        let row_bytes = shape.2.row_bytes(shape.0);
        let rows = shape.1 as usize;
        let out_stride = out.stride() as usize;
        match device.map_read(&mut *slot) {
            Ok(mapped) => {
                engine.copy_rows(
                    mapped.bytes,
                    mapped.row_pitch,
                    out.bytes_mut(),
                    out_stride,
                    row_bytes,
                    rows,
                );
            }
            Err(VtxError::MapNotReady) => {
                tracing::trace!("readback slot not ready; skipping this cycle");
                return Ok(ReadbackStatus::Pending);
            }
            Err(e) => return Err(e),
        }
        device.unmap(slot);

        Ok(ReadbackStatus::Frame)
    }

    fn rebuild(&mut self, device: &mut D, shape: (u32, u32, PixelFormat)) -> Result<(), VtxError> {
        tracing::debug!(
            width = shape.0,
            height = shape.1,
            format = ?shape.2,
            depth = self.depth,
            "rebuilding readback ring"
        );
        // Old slots (and any in-flight copies) are abandoned first.
        self.ring = None;
        self.shape = None;

        let mut slots = Vec::with_capacity(self.depth);
        for _ in 0..self.depth {
            slots.push(device.create_slot(
                shape.0,
                shape.1,
                shape.2,
                TransferDirection::Readback,
            )?);
        }
        self.ring = Some(SlotRing::new(slots));
        self.shape = Some(shape);
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
