//! The GPU seam: transfer slots, queued copies, and CPU mapping.
//!
//! The transfer rings are generic over [`TransferDevice`] so the GPU
//! API stays opaque to them. The production implementation is
//! [`D3d11TransferDevice`](crate::pipeline::d3d11::D3d11TransferDevice)
//! on Windows; tests drive the rings with an in-crate device that
//! models one-cycle GPU completion.
//!
//! "Asynchronous" on this seam means GPU-asynchronous: every queue
//! call returns immediately, and the corresponding CPU mapping is only
//! attempted one or more cycles later.

use crate::error::VtxError;
use crate::pipeline::types::PixelFormat;

/// Which way a transfer slot moves pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// GPU texture → CPU-visible slot.
    Readback,
    /// CPU-visible slot → GPU texture.
    Upload,
}

/// A slot mapped for CPU read. Valid until the matching
/// [`unmap`](TransferDevice::unmap); `row_pitch` may exceed the tight
/// row size.
pub struct MappedRead<'a> {
    pub bytes: &'a [u8],
    pub row_pitch: usize,
}

/// A slot mapped for CPU write. Previous contents are discarded by the
/// map itself (the orphaning that keeps the GPU from stalling on a
/// buffer it may still be consuming).
pub struct MappedWrite<'a> {
    pub bytes: &'a mut [u8],
    pub row_pitch: usize,
}

/// Device-side operations the transfer rings need.
///
/// Slot lifecycle: created sized for a (width, height, format) triple,
/// dropped wholesale on any shape change — in-flight GPU work on a
/// dropped slot is abandoned, which is safe because the driver owns
/// the resource until it is done with it.
pub trait TransferDevice {
    /// Opaque GPU texture handle supplied by the caller.
    type Texture;
    /// One ring entry's GPU-visible storage.
    type Slot;

    /// Allocate a transfer slot sized for the given shape.
    ///
    /// Failure is an [`VtxError::Allocation`] — hard for the resize
    /// that requested it.
    fn create_slot(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        direction: TransferDirection,
    ) -> Result<Self::Slot, VtxError>;

    /// Queue an asynchronous texture → slot copy, including whatever
    /// source attachment the API needs. Must return without waiting
    /// for the GPU; stale slot contents are discarded.
    fn queue_readback(
        &mut self,
        src: &Self::Texture,
        slot: &mut Self::Slot,
    ) -> Result<(), VtxError>;

    /// Map a readback slot for CPU read.
    ///
    /// Returns [`VtxError::MapNotReady`] when the queued copy has not
    /// completed — the recoverable skip-this-cycle condition.
    fn map_read<'a>(&mut self, slot: &'a mut Self::Slot) -> Result<MappedRead<'a>, VtxError>;

    /// Map an upload slot for CPU write, discarding prior contents.
    fn map_write<'a>(&mut self, slot: &'a mut Self::Slot) -> Result<MappedWrite<'a>, VtxError>;

    /// Release a mapping established by `map_read` or `map_write`.
    fn unmap(&mut self, slot: &mut Self::Slot);

    /// Queue an asynchronous slot → texture update. Reads from the
    /// slot's GPU-side storage; must return without waiting.
    fn queue_upload(&mut self, slot: &Self::Slot, dst: &Self::Texture) -> Result<(), VtxError>;

    /// Synchronous texture update straight from host memory — the
    /// fallback when an upload slot cannot be mapped.
    fn upload_direct(
        &mut self,
        dst: &Self::Texture,
        pixels: &[u8],
        row_pitch: usize,
    ) -> Result<(), VtxError>;
}
