//! Direct3D 11 transfer device for Windows.
//!
//! Readback slots are staging textures (`D3D11_USAGE_STAGING`, CPU
//! read): a queued readback is a GPU-side `CopyResource` into the
//! slot, and the later map uses `D3D11_MAP_FLAG_DO_NOT_WAIT` so a
//! still-busy slot surfaces as the recoverable not-ready condition
//! instead of a stall. Upload slots are dynamic textures mapped with
//! `D3D11_MAP_WRITE_DISCARD` — the driver renames the storage on every
//! map, which is the discard-then-reallocate step folded into one
//! call.
//!
//! # Platform
//!
//! This module is **Windows-only**. On other platforms the types are
//! still defined but construction will fail at runtime.

use crate::error::VtxError;
use crate::pipeline::device::{MappedRead, MappedWrite, TransferDevice, TransferDirection};
use crate::pipeline::types::PixelFormat;

// ── Platform gate ────────────────────────────────────────────────

/// D3D11-backed [`TransferDevice`].
///
/// Wraps a device + immediate context pair; callers that already own
/// one (the render pipeline) should share it via
/// [`from_parts`](Self::from_parts) rather than creating a second
/// device.
///
/// # Safety
///
/// All unsafe FFI calls are confined to this struct.
pub struct D3d11TransferDevice {
    #[cfg(target_os = "windows")]
    device: windows::Win32::Graphics::Direct3D11::ID3D11Device,
    #[cfg(target_os = "windows")]
    context: windows::Win32::Graphics::Direct3D11::ID3D11DeviceContext,
}

/// One transfer slot: a staging or dynamic texture plus the shape it
/// was sized for.
pub struct D3d11Slot {
    width: u32,
    height: u32,
    #[cfg(target_os = "windows")]
    texture: windows::Win32::Graphics::Direct3D11::ID3D11Texture2D,
}

impl D3d11Slot {
    /// The shape this slot was created for.
    pub fn shape(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// The GPU texture handle callers pass to the rings.
#[cfg(target_os = "windows")]
pub type D3d11Texture = windows::Win32::Graphics::Direct3D11::ID3D11Texture2D;

/// Placeholder handle so the API keeps its shape off Windows.
#[cfg(not(target_os = "windows"))]
pub struct D3d11Texture;

// ── Windows implementation ───────────────────────────────────────

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use windows::Win32::Graphics::{
        Direct3D::D3D_DRIVER_TYPE_HARDWARE,
        Direct3D11::*,
        Dxgi::{Common::*, DXGI_ERROR_WAS_STILL_DRAWING},
    };

    impl D3d11TransferDevice {
        /// Create a standalone hardware device + immediate context.
        pub fn new() -> Result<Self, VtxError> {
            let mut device = None;
            let mut context = None;
            unsafe {
                D3D11CreateDevice(
                    None,
                    D3D_DRIVER_TYPE_HARDWARE,
                    None,
                    D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                    None, // feature levels — let the driver decide
                    D3D11_SDK_VERSION,
                    Some(&mut device),
                    None,
                    Some(&mut context),
                )
                .map_err(|e| VtxError::Device(format!("D3D11CreateDevice failed: {e}")))?;
            }

            let device =
                device.ok_or_else(|| VtxError::Device("D3D11 device is None".into()))?;
            let context =
                context.ok_or_else(|| VtxError::Device("D3D11 context is None".into()))?;

            Ok(Self { device, context })
        }

        /// Wrap an existing device + immediate context.
        pub fn from_parts(device: ID3D11Device, context: ID3D11DeviceContext) -> Self {
            Self { device, context }
        }

        fn dxgi_format(format: PixelFormat) -> Result<DXGI_FORMAT, VtxError> {
            match format {
                PixelFormat::Rgba8 => Ok(DXGI_FORMAT_R8G8B8A8_UNORM),
                PixelFormat::Bgra8 => Ok(DXGI_FORMAT_B8G8R8A8_UNORM),
                // Packed 4:2:2 never crosses this seam: it is decoded
                // on the CPU before any GPU transfer.
                PixelFormat::Uyvy422 => Err(VtxError::Allocation(
                    "packed 4:2:2 transfer slots are not supported".into(),
                )),
            }
        }

        fn map_error(e: windows::core::Error) -> VtxError {
            if e.code() == DXGI_ERROR_WAS_STILL_DRAWING {
                VtxError::MapNotReady
            } else {
                VtxError::Device(format!("Map failed: {e}"))
            }
        }
    }

    impl TransferDevice for D3d11TransferDevice {
        type Texture = D3d11Texture;
        type Slot = D3d11Slot;

        fn create_slot(
            &mut self,
            width: u32,
            height: u32,
            format: PixelFormat,
            direction: TransferDirection,
        ) -> Result<Self::Slot, VtxError> {
            let dxgi = Self::dxgi_format(format)?;
            let desc = match direction {
                TransferDirection::Readback => D3D11_TEXTURE2D_DESC {
                    Width: width,
                    Height: height,
                    MipLevels: 1,
                    ArraySize: 1,
                    Format: dxgi,
                    SampleDesc: DXGI_SAMPLE_DESC {
                        Count: 1,
                        Quality: 0,
                    },
                    Usage: D3D11_USAGE_STAGING,
                    BindFlags: 0,
                    CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
                    MiscFlags: 0,
                },
                TransferDirection::Upload => D3D11_TEXTURE2D_DESC {
                    Width: width,
                    Height: height,
                    MipLevels: 1,
                    ArraySize: 1,
                    Format: dxgi,
                    SampleDesc: DXGI_SAMPLE_DESC {
                        Count: 1,
                        Quality: 0,
                    },
                    Usage: D3D11_USAGE_DYNAMIC,
                    BindFlags: D3D11_BIND_SHADER_RESOURCE.0 as u32,
                    CPUAccessFlags: D3D11_CPU_ACCESS_WRITE.0 as u32,
                    MiscFlags: 0,
                },
            };

            let mut texture = None;
            unsafe {
                self.device
                    .CreateTexture2D(&desc, None, Some(&mut texture))
                    .map_err(|e| {
                        VtxError::Allocation(format!("CreateTexture2D (slot) failed: {e}"))
                    })?;
            }
            let texture =
                texture.ok_or_else(|| VtxError::Allocation("slot texture is None".into()))?;

            Ok(D3d11Slot {
                width,
                height,
                texture,
            })
        }

        fn queue_readback(
            &mut self,
            src: &Self::Texture,
            slot: &mut Self::Slot,
        ) -> Result<(), VtxError> {
            // GPU-side copy; returns as soon as it is queued.
            unsafe {
                self.context.CopyResource(&slot.texture, src);
            }
            Ok(())
        }

        fn map_read<'a>(&mut self, slot: &'a mut Self::Slot) -> Result<MappedRead<'a>, VtxError> {
            let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
            unsafe {
                self.context
                    .Map(
                        &slot.texture,
                        0,
                        D3D11_MAP_READ,
                        D3D11_MAP_FLAG_DO_NOT_WAIT.0 as u32,
                        Some(&mut mapped),
                    )
                    .map_err(Self::map_error)?;
            }

            let row_pitch = mapped.RowPitch as usize;
            let len = row_pitch * slot.height as usize;
            let bytes = unsafe {
                // Valid until the matching Unmap; the borrow of `slot`
                // keeps the slot (and its mapping) alive that long.
                std::slice::from_raw_parts(mapped.pData as *const u8, len)
            };
            Ok(MappedRead { bytes, row_pitch })
        }

        fn map_write<'a>(
            &mut self,
            slot: &'a mut Self::Slot,
        ) -> Result<MappedWrite<'a>, VtxError> {
            let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
            unsafe {
                self.context
                    .Map(
                        &slot.texture,
                        0,
                        D3D11_MAP_WRITE_DISCARD,
                        0,
                        Some(&mut mapped),
                    )
                    .map_err(Self::map_error)?;
            }

            let row_pitch = mapped.RowPitch as usize;
            let len = row_pitch * slot.height as usize;
            let bytes = unsafe {
                std::slice::from_raw_parts_mut(mapped.pData as *mut u8, len)
            };
            Ok(MappedWrite { bytes, row_pitch })
        }

        fn unmap(&mut self, slot: &mut Self::Slot) {
            unsafe { self.context.Unmap(&slot.texture, 0) };
        }

        fn queue_upload(
            &mut self,
            slot: &Self::Slot,
            dst: &Self::Texture,
        ) -> Result<(), VtxError> {
            // Equal-shape resources; the update covers the whole frame
            // region and executes asynchronously on the GPU timeline.
            unsafe {
                self.context.CopyResource(dst, &slot.texture);
            }
            Ok(())
        }

        fn upload_direct(
            &mut self,
            dst: &Self::Texture,
            pixels: &[u8],
            row_pitch: usize,
        ) -> Result<(), VtxError> {
            unsafe {
                self.context.UpdateSubresource(
                    dst,
                    0,
                    None,
                    pixels.as_ptr() as *const core::ffi::c_void,
                    row_pitch as u32,
                    0,
                );
            }
            Ok(())
        }
    }
}

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
impl D3d11TransferDevice {
    /// Direct3D 11 is only available on Windows.
    pub fn new() -> Result<Self, VtxError> {
        Err(VtxError::Device(
            "Direct3D 11 transfer is only available on Windows".into(),
        ))
    }
}

#[cfg(not(target_os = "windows"))]
impl TransferDevice for D3d11TransferDevice {
    type Texture = D3d11Texture;
    type Slot = D3d11Slot;

    fn create_slot(
        &mut self,
        _width: u32,
        _height: u32,
        _format: PixelFormat,
        _direction: TransferDirection,
    ) -> Result<Self::Slot, VtxError> {
        Err(VtxError::Device("not supported on this platform".into()))
    }

    fn queue_readback(
        &mut self,
        _src: &Self::Texture,
        _slot: &mut Self::Slot,
    ) -> Result<(), VtxError> {
        Err(VtxError::Device("not supported on this platform".into()))
    }

    fn map_read<'a>(&mut self, _slot: &'a mut Self::Slot) -> Result<MappedRead<'a>, VtxError> {
        Err(VtxError::Device("not supported on this platform".into()))
    }

    fn map_write<'a>(&mut self, _slot: &'a mut Self::Slot) -> Result<MappedWrite<'a>, VtxError> {
        Err(VtxError::Device("not supported on this platform".into()))
    }

    fn unmap(&mut self, _slot: &mut Self::Slot) {}

    fn queue_upload(&mut self, _slot: &Self::Slot, _dst: &Self::Texture) -> Result<(), VtxError> {
        Err(VtxError::Device("not supported on this platform".into()))
    }

    fn upload_direct(
        &mut self,
        _dst: &Self::Texture,
        _pixels: &[u8],
        _row_pitch: usize,
    ) -> Result<(), VtxError> {
        Err(VtxError::Device("not supported on this platform".into()))
    }
}
