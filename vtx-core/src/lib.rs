//! # vtx-core
//!
//! Core library for the VTX video frame transfer pipeline.
//!
//! This crate contains:
//! - **Pixel types**: `PixelFormat`, stride-aware `FrameBuffer`
//! - **Conversion**: `PixelConverter` — RGBA↔BGRA and packed 4:2:2 ⇄ RGBA
//! - **Bulk copy**: `CopyEngine` with capability-probed strategies
//! - **GPU transfer**: `ReadbackRing` / `UploadRing` over the
//!   `TransferDevice` seam (Direct3D 11 implementation on Windows)
//! - **Send buffering**: `FramePair` for fire-and-forget transports
//! - **Pacing**: `FrameRateGovernor` and `ReceiveRateEstimator`
//! - **Config**: `PipelineConfig` — TOML-backed tuning
//! - **Error**: `VtxError` — typed, `thiserror`-based error hierarchy

pub mod config;
pub mod error;
pub mod pipeline;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use config::PipelineConfig;
pub use error::VtxError;
pub use pipeline::{
    CopyEngine, CopyStrategy, CpuFeatures, D3d11TransferDevice, FrameBuffer, FramePair,
    FrameRateGovernor, FrameTransport, PixelConverter, PixelFormat, ReadbackRing, ReadbackStatus,
    ReceiveRateEstimator, ReceiveStatus, TransferDevice, TransferDirection, UploadRing, VideoFrame,
};
