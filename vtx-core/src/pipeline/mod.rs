//! # Frame transfer pipeline
//!
//! Moves pixel data between GPU textures and host buffers fit for a
//! network video transport, converting encodings along the way and
//! never stalling the GPU on a transfer.
//!
//! ```text
//! SEND                                        RECEIVE
//! ┌──────────────────────────┐               ┌──────────────────────────┐
//! │ texture                  │               │ FrameTransport::receive  │
//! │   ↓ ReadbackRing (async) │               │   ↓                      │
//! │ FrameBuffer              │   transport   │ PixelConverter (UYVY→RGBA)│
//! │   ↓ PixelConverter       │ ──────────►   │   ↓                      │
//! │ FramePair::acquire       │               │ UploadRing (async)       │
//! │   ↓ FrameTransport::send │               │   ↓ texture              │
//! │ FramePair::advance       │               │ ReceiveRateEstimator     │
//! │ FrameRateGovernor::hold  │               │                          │
//! └──────────────────────────┘               └──────────────────────────┘
//! ```
//!
//! Everything runs on one thread, once per render cycle; the rings are
//! GPU-asynchronous, not CPU-concurrent. Readback delivery lags the
//! queueing cycle by (ring depth − 1); uploads become visible one
//! cycle after submission.
//!
//! ## Sub-modules
//!
//! | Module      | Purpose                                            |
//! |-------------|----------------------------------------------------|
//! | `types`     | Pixel formats and the stride-aware frame buffer    |
//! | `copy`      | Strategy-laddered bulk row copier                  |
//! | `convert`   | RGBA↔BGRA and packed 4:2:2 ⇄ RGBA conversion       |
//! | `ring`      | Slot ring shared by the two transfer directions    |
//! | `device`    | The opaque GPU seam ([`TransferDevice`])           |
//! | `readback`  | Asynchronous GPU → CPU transfer ring               |
//! | `upload`    | Asynchronous CPU → GPU transfer ring               |
//! | `d3d11`     | Direct3D 11 transfer device (Windows)              |
//! | `framepair` | Double-buffered send frames                        |
//! | `rate`      | Frame-rate governor and arrival-rate estimator     |
//! | `transport` | The opaque network transport seam                  |

pub mod convert;
pub mod copy;
pub mod d3d11;
pub mod device;
pub mod framepair;
pub mod rate;
pub mod readback;
pub mod transport;
pub mod types;
pub mod upload;

mod ring;

#[cfg(test)]
pub(crate) mod testdev;

// ── Re-exports ───────────────────────────────────────────────────

pub use convert::{HD_WIDTH_THRESHOLD, PixelConverter};
pub use copy::{CopyEngine, CopyStrategy, CpuFeatures};
pub use d3d11::{D3d11Slot, D3d11TransferDevice, D3d11Texture};
pub use device::{MappedRead, MappedWrite, TransferDevice, TransferDirection};
pub use framepair::FramePair;
pub use rate::{FrameRateGovernor, ReceiveRateEstimator};
pub use readback::{ReadbackRing, ReadbackStatus, DEFAULT_READBACK_DEPTH};
pub use transport::{FrameTransport, ReceiveStatus, VideoFrame};
pub use types::{FrameBuffer, PixelFormat};
pub use upload::{UploadRing, DEFAULT_UPLOAD_DEPTH};
