//! Shared pixel types for the transfer pipeline.
//!
//! These are the **host-side** frame representations moved between
//! pipeline stages. GPU-side resources stay behind
//! [`TransferDevice`](crate::pipeline::device::TransferDevice).

use crate::error::VtxError;

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout of a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8,
    /// 4 bytes per pixel: Blue, Green, Red, Alpha.
    Bgra8,
    /// Packed 4:2:2 chroma-subsampled YUV. Every 4 bytes encode two
    /// horizontally adjacent pixels as U, Y0, V, Y1.
    Uyvy422,
}

impl PixelFormat {
    /// Average bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
            PixelFormat::Uyvy422 => 2,
        }
    }

    /// Tight byte length of one row of `width` pixels.
    ///
    /// For 4:2:2 the unit is the two-pixel group, so odd widths round
    /// up to the next group boundary.
    pub const fn row_bytes(self, width: u32) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => width as usize * 4,
            PixelFormat::Uyvy422 => (width as usize + 1) / 2 * 4,
        }
    }

    /// Parse a configuration name ("rgba", "bgra", "uyvy").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rgba" | "rgba8" => Some(PixelFormat::Rgba8),
            "bgra" | "bgra8" => Some(PixelFormat::Bgra8),
            "uyvy" | "uyvy422" | "yuv422" => Some(PixelFormat::Uyvy422),
            _ => None,
        }
    }
}

// ── FrameBuffer ──────────────────────────────────────────────────

/// An owned, contiguous host-memory pixel buffer.
///
/// The buffer holds `height` rows of `stride` bytes each. `stride` may
/// exceed the tight row size due to GPU row-alignment padding. Shape
/// changes reallocate in place ([`ensure_shape`](Self::ensure_shape));
/// the storage is released when the buffer goes out of scope.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    /// Row pitch in **bytes** (≥ tight row size).
    stride: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Allocate a zeroed buffer with a tight stride.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = format.row_bytes(width) as u32;
        Self {
            width,
            height,
            stride,
            format,
            data: vec![0; stride as usize * height as usize],
        }
    }

    /// Allocate a zeroed buffer with an explicit row pitch.
    pub fn with_stride(
        width: u32,
        height: u32,
        stride: u32,
        format: PixelFormat,
    ) -> Result<Self, VtxError> {
        if (stride as usize) < format.row_bytes(width) {
            return Err(VtxError::StrideTooSmall {
                stride,
                width,
                format,
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            format,
            data: vec![0; stride as usize * height as usize],
        })
    }

    /// Reallocate if the requested shape differs from the current one.
    ///
    /// Returns `true` when a reallocation happened. Contents are not
    /// preserved across a reallocation; an unchanged shape is a no-op.
    pub fn ensure_shape(&mut self, width: u32, height: u32, format: PixelFormat) -> bool {
        if self.width == width && self.height == height && self.format == format {
            return false;
        }
        let stride = format.row_bytes(width) as u32;
        tracing::debug!(
            old_w = self.width,
            old_h = self.height,
            new_w = width,
            new_h = height,
            ?format,
            "frame buffer reallocated"
        );
        self.width = width;
        self.height = height;
        self.stride = stride;
        self.format = format;
        self.data = vec![0; stride as usize * height as usize];
        true
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row pitch in bytes.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Pixel layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Total byte size the bitmap occupies.
    pub fn byte_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }

    /// Whether either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The whole backing storage, padding included.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the whole backing storage.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// One row, padding included.
    ///
    /// # Panics
    ///
    /// Panics if `y` is out of bounds.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride as usize;
        &self.data[start..start + self.stride as usize]
    }

    /// Mutable access to one row, padding included.
    ///
    /// # Panics
    ///
    /// Panics if `y` is out of bounds.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride as usize;
        &mut self.data[start..start + self.stride as usize]
    }
}
