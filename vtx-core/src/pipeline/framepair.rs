//! Double-buffered send frames.
//!
//! When the transport's send call is fire-and-forget, the receiver may
//! still be reading the just-submitted buffer when the next cycle
//! starts. The pair gives every cycle a buffer that is guaranteed not
//! to be referenced by an in-flight send: fill the buffer returned by
//! [`acquire`](FramePair::acquire), submit it, then call
//! [`advance`](FramePair::advance) — in that order, as the last two
//! steps of the cycle.
//!
//! In synchronous transport mode the send returns only after the
//! transport is done with the bytes, so `advance` degenerates to a
//! no-op and a single buffer is reused.

use crate::pipeline::types::{FrameBuffer, PixelFormat};

/// Two equal-shape frame buffers with an alternating active index.
pub struct FramePair {
    slots: [FrameBuffer; 2],
    active: usize,
    asynchronous: bool,
}

impl FramePair {
    /// Allocate both buffers for the given shape.
    ///
    /// `asynchronous` mirrors the transport's send mode; when `false`
    /// the pair behaves as a single reusable buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat, asynchronous: bool) -> Self {
        Self {
            slots: [
                FrameBuffer::new(width, height, format),
                FrameBuffer::new(width, height, format),
            ],
            active: 0,
            asynchronous,
        }
    }

    /// Whether the pair actually alternates.
    pub fn is_asynchronous(&self) -> bool {
        self.asynchronous
    }

    /// The buffer the caller may fill this cycle.
    ///
    /// Stable across repeated calls within one cycle; only
    /// [`advance`](Self::advance) moves it.
    pub fn acquire(&mut self) -> &mut FrameBuffer {
        &mut self.slots[self.active]
    }

    /// Read access to the buffer most recently returned by
    /// [`acquire`](Self::acquire) — the one a just-issued send refers
    /// to.
    pub fn active(&self) -> &FrameBuffer {
        &self.slots[self.active]
    }

    /// Flip the active index for the next cycle.
    ///
    /// Must run *after* the transport submission, never before: the
    /// flip hands the previous buffer to the in-flight send and claims
    /// the other one for the caller.
    pub fn advance(&mut self) {
        if self.asynchronous {
            self.active ^= 1;
        }
    }

    /// Reallocate both buffers for a new shape and reset the index.
    pub fn resize(&mut self, width: u32, height: u32, format: PixelFormat) {
        for slot in &mut self.slots {
            slot.ensure_shape(width, height, format);
        }
        self.active = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_is_stable_within_a_cycle() {
        let mut pair = FramePair::new(8, 8, PixelFormat::Bgra8, true);
        let first = pair.acquire().bytes().as_ptr();
        let second = pair.acquire().bytes().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn advance_switches_storage_in_async_mode() {
        let mut pair = FramePair::new(8, 8, PixelFormat::Bgra8, true);
        let before = pair.acquire().bytes().as_ptr();
        pair.advance();
        let after = pair.acquire().bytes().as_ptr();
        assert_ne!(before, after);

        // And the previous cycle's storage is reachable again one flip
        // later — two buffers, strict alternation.
        pair.advance();
        assert_eq!(pair.acquire().bytes().as_ptr(), before);
    }

    #[test]
    fn synchronous_mode_reuses_one_buffer() {
        let mut pair = FramePair::new(8, 8, PixelFormat::Bgra8, false);
        let before = pair.acquire().bytes().as_ptr();
        pair.advance();
        assert_eq!(pair.acquire().bytes().as_ptr(), before);
    }

    #[test]
    fn filling_the_acquired_buffer_leaves_the_in_flight_one_alone() {
        let mut pair = FramePair::new(2, 2, PixelFormat::Bgra8, true);
        pair.acquire().bytes_mut().fill(0xAA);
        pair.advance();

        pair.acquire().bytes_mut().fill(0xBB);
        pair.advance();

        // Back on the first buffer: still exactly what cycle 1 wrote.
        assert!(pair.acquire().bytes().iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn resize_resets_the_index_and_both_shapes() {
        let mut pair = FramePair::new(4, 4, PixelFormat::Bgra8, true);
        pair.advance();
        pair.resize(16, 8, PixelFormat::Rgba8);

        let buf = pair.acquire();
        assert_eq!(buf.width(), 16);
        assert_eq!(buf.height(), 8);
        assert_eq!(buf.format(), PixelFormat::Rgba8);

        pair.advance();
        let other = pair.acquire();
        assert_eq!(other.width(), 16);
        assert_eq!(other.format(), PixelFormat::Rgba8);
    }
}
