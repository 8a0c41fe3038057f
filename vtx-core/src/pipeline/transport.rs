//! The boundary to the network video transport.
//!
//! The wire protocol is an external collaborator: the pipeline hands
//! it finished frame buffers and takes delivered ones, nothing more.
//! [`FrameTransport`] is that seam. Implementations wrap whatever
//! actually moves the bytes; the pipeline only cares about the send
//! mode (it decides whether [`FramePair`](super::framepair::FramePair)
//! alternates) and the tri-state receive outcome.

use crate::error::VtxError;
use crate::pipeline::types::{FrameBuffer, PixelFormat};

// ── VideoFrame ───────────────────────────────────────────────────

/// A borrowed view of one finished frame, as handed to the transport.
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
    /// Pixel bytes: `height` rows of `stride` bytes.
    pub bytes: &'a [u8],
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Row pitch in bytes.
    pub stride: u32,
    /// Pixel layout of `bytes`.
    pub format: PixelFormat,
}

impl<'a> VideoFrame<'a> {
    /// View a whole frame buffer.
    pub fn from_buffer(buffer: &'a FrameBuffer) -> Self {
        Self {
            bytes: buffer.bytes(),
            width: buffer.width(),
            height: buffer.height(),
            stride: buffer.stride(),
            format: buffer.format(),
        }
    }

    /// Check the view is internally consistent before it crosses the
    /// wire seam. Transports call this instead of trusting geometry
    /// that may have been assembled by hand.
    pub fn validate(&self) -> Result<(), VtxError> {
        if self.width == 0 || self.height == 0 {
            return Err(VtxError::ZeroSized {
                width: self.width,
                height: self.height,
            });
        }
        if self.bytes.is_empty() {
            return Err(VtxError::EmptyBuffer);
        }
        if (self.stride as usize) < self.format.row_bytes(self.width) {
            return Err(VtxError::StrideTooSmall {
                stride: self.stride,
                width: self.width,
                format: self.format,
            });
        }
        let needed = self.stride as usize * self.height as usize;
        if self.bytes.len() < needed {
            return Err(VtxError::BufferTooSmall {
                needed,
                available: self.bytes.len(),
            });
        }
        Ok(())
    }
}

// ── FrameTransport ───────────────────────────────────────────────

/// Outcome of one receive attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveStatus {
    /// A frame landed in the output buffer with this geometry.
    Frame { width: u32, height: u32 },
    /// Nothing arrived this cycle; the previous frame stays on
    /// screen.
    NoData,
}

/// The opaque send/receive primitive of the video transport.
pub trait FrameTransport {
    /// Whether `send` returns before the transport is done with the
    /// bytes. Asynchronous transports require the double-buffered
    /// send pair.
    fn is_async(&self) -> bool;

    /// Submit one frame. In asynchronous mode the transport may keep
    /// referencing `frame.bytes` until the next cycle.
    fn send(&mut self, frame: VideoFrame<'_>) -> Result<(), VtxError>;

    /// Fetch the next delivered frame into `out`, reshaping it as
    /// needed.
    fn receive(&mut self, out: &mut FrameBuffer) -> Result<ReceiveStatus, VtxError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VtxError;

    #[test]
    fn buffer_view_validates() {
        let buf = FrameBuffer::new(8, 4, PixelFormat::Bgra8);
        assert!(VideoFrame::from_buffer(&buf).validate().is_ok());
    }

    #[test]
    fn hand_assembled_views_are_checked() {
        let bytes = vec![0u8; 64];

        let zero = VideoFrame {
            bytes: &bytes,
            width: 0,
            height: 4,
            stride: 16,
            format: PixelFormat::Bgra8,
        };
        assert!(matches!(zero.validate(), Err(VtxError::ZeroSized { .. })));

        let empty = VideoFrame {
            bytes: &[],
            width: 4,
            height: 4,
            stride: 16,
            format: PixelFormat::Bgra8,
        };
        assert!(matches!(empty.validate(), Err(VtxError::EmptyBuffer)));

        let narrow = VideoFrame {
            bytes: &bytes,
            width: 8,
            height: 2,
            stride: 16, // 8 px of BGRA need 32
            format: PixelFormat::Bgra8,
        };
        assert!(matches!(
            narrow.validate(),
            Err(VtxError::StrideTooSmall { .. })
        ));

        let short = VideoFrame {
            bytes: &bytes,
            width: 8,
            height: 4,
            stride: 32,
            format: PixelFormat::Bgra8,
        };
        assert!(matches!(
            short.validate(),
            Err(VtxError::BufferTooSmall { .. })
        ));
    }
}

