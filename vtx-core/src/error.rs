//! Domain-specific error types for the transfer pipeline.
//!
//! All fallible operations return `Result<T, VtxError>`.
//! No panics on invalid input — every error is typed, and every failure
//! is either recoverable on the next cycle or surfaced to the caller.

use thiserror::Error;

use crate::pipeline::types::PixelFormat;

/// The canonical error type for the transfer pipeline.
#[derive(Debug, Error)]
pub enum VtxError {
    // ── Argument Errors ──────────────────────────────────────────
    /// A source or destination buffer was empty where pixel data was
    /// required.
    #[error("empty pixel buffer")]
    EmptyBuffer,

    /// A frame dimension was zero.
    #[error("zero-sized frame: {width}x{height}")]
    ZeroSized { width: u32, height: u32 },

    /// A buffer is too short for the geometry it claims to hold.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// A row stride is shorter than the tight row size of the format.
    #[error("stride {stride} too small for {width} px of {format:?}")]
    StrideTooSmall {
        stride: u32,
        width: u32,
        format: PixelFormat,
    },

    /// Source and destination disagree on the logical frame size.
    #[error("dimension mismatch: source {src_width}x{src_height}, destination {dst_width}x{dst_height}")]
    DimensionMismatch {
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    },

    // ── Conversion Errors ────────────────────────────────────────
    /// The requested format pairing has no implemented conversion.
    #[error("unsupported conversion: {from:?} -> {to:?}")]
    UnsupportedConversion { from: PixelFormat, to: PixelFormat },

    // ── GPU Transfer Errors ──────────────────────────────────────
    /// A GPU transfer slot or host buffer could not be (re)created.
    /// Fatal for the resize that triggered it; the operation is
    /// aborted for this cycle.
    #[error("transfer allocation failed: {0}")]
    Allocation(String),

    /// A transfer slot was not ready for CPU access. Recoverable:
    /// skip this cycle and retry on the next one.
    #[error("transfer slot not ready")]
    MapNotReady,

    /// The GPU device reported an error that is not a plain
    /// not-ready condition.
    #[error("device error: {0}")]
    Device(String),

    // ── Transport Errors ─────────────────────────────────────────
    /// The frame transport rejected a send or receive.
    #[error("transport error: {0}")]
    Transport(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl VtxError {
    /// Whether the failure is expected to clear by itself on the next
    /// cycle (the caller should skip the frame, not tear down).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VtxError::MapNotReady)
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for VtxError {
    fn from(s: String) -> Self {
        VtxError::Other(s)
    }
}

impl From<&str> for VtxError {
    fn from(s: &str) -> Self {
        VtxError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = VtxError::BufferTooSmall {
            needed: 4096,
            available: 1024,
        };
        assert!(e.to_string().contains("4096"));
        assert!(e.to_string().contains("1024"));

        let e = VtxError::UnsupportedConversion {
            from: PixelFormat::Uyvy422,
            to: PixelFormat::Bgra8,
        };
        assert!(e.to_string().contains("Uyvy422"));
    }

    #[test]
    fn from_string() {
        let e: VtxError = "something broke".into();
        assert!(matches!(e, VtxError::Other(_)));
    }

    #[test]
    fn only_map_miss_is_recoverable() {
        assert!(VtxError::MapNotReady.is_recoverable());
        assert!(!VtxError::Allocation("out of memory".into()).is_recoverable());
        assert!(!VtxError::EmptyBuffer.is_recoverable());
    }
}
