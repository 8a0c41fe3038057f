//! Test stand-in for a GPU transfer device.
//!
//! Models the timing contract the rings rely on: a queued copy is
//! complete by the time the corresponding slot is mapped (one or more
//! cycles later), and a never-queued slot refuses to map. Textures are
//! plain host memory behind interior mutability, so tests can repaint
//! them between cycles and inspect upload results.

use std::cell::RefCell;

use crate::error::VtxError;
use crate::pipeline::device::{MappedRead, MappedWrite, TransferDevice, TransferDirection};
use crate::pipeline::types::PixelFormat;

/// Host-memory "texture": tight rows of 4-byte pixels.
pub(crate) struct TestTexture {
    width: u32,
    height: u32,
    pixels: RefCell<Vec<u8>>,
}

impl TestTexture {
    pub fn fill(&self, value: u8) {
        self.pixels.borrow_mut().fill(value);
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.pixels.borrow().clone()
    }

    fn row_bytes(&self) -> usize {
        self.width as usize * 4
    }
}

/// One ring slot: pitched storage plus a filled flag.
pub(crate) struct TestSlot {
    height: u32,
    row_bytes: usize,
    pitch: usize,
    bytes: Vec<u8>,
    filled: bool,
}

/// Scriptable [`TransferDevice`] for ring tests.
#[derive(Default)]
pub(crate) struct TestDevice {
    slot_padding: usize,
    fail_alloc: bool,
    fail_map_write: bool,
    slots_created: usize,
}

impl TestDevice {
    /// Pad every slot's row pitch by `padding` bytes, so tests cover
    /// the pitch-aware copy paths.
    pub fn with_slot_padding(mut self, padding: usize) -> Self {
        self.slot_padding = padding;
        self
    }

    pub fn with_failing_alloc(mut self) -> Self {
        self.fail_alloc = true;
        self
    }

    pub fn with_failing_map_write(mut self) -> Self {
        self.fail_map_write = true;
        self
    }

    pub fn texture(&mut self, width: u32, height: u32) -> TestTexture {
        TestTexture {
            width,
            height,
            pixels: RefCell::new(vec![0; width as usize * height as usize * 4]),
        }
    }

    pub fn slots_created(&self) -> usize {
        self.slots_created
    }
}

impl TransferDevice for TestDevice {
    type Texture = TestTexture;
    type Slot = TestSlot;

    fn create_slot(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        _direction: TransferDirection,
    ) -> Result<Self::Slot, VtxError> {
        if self.fail_alloc {
            return Err(VtxError::Allocation("test device refused the slot".into()));
        }
        self.slots_created += 1;
        let row_bytes = format.row_bytes(width);
        let pitch = row_bytes + self.slot_padding;
        Ok(TestSlot {
            height,
            row_bytes,
            pitch,
            bytes: vec![0; pitch * height as usize],
            filled: false,
        })
    }

    fn queue_readback(
        &mut self,
        src: &Self::Texture,
        slot: &mut Self::Slot,
    ) -> Result<(), VtxError> {
        // "GPU" completes well before the slot is mapped next cycle,
        // so the copy happens eagerly here.
        let pixels = src.pixels.borrow();
        let row = src.row_bytes().min(slot.row_bytes);
        for y in 0..slot.height.min(src.height) as usize {
            slot.bytes[y * slot.pitch..y * slot.pitch + row]
                .copy_from_slice(&pixels[y * src.row_bytes()..y * src.row_bytes() + row]);
        }
        slot.filled = true;
        Ok(())
    }

    fn map_read<'a>(&mut self, slot: &'a mut Self::Slot) -> Result<MappedRead<'a>, VtxError> {
        if !slot.filled {
            return Err(VtxError::MapNotReady);
        }
        Ok(MappedRead {
            bytes: &slot.bytes,
            row_pitch: slot.pitch,
        })
    }

    fn map_write<'a>(&mut self, slot: &'a mut Self::Slot) -> Result<MappedWrite<'a>, VtxError> {
        if self.fail_map_write {
            return Err(VtxError::MapNotReady);
        }
        // Discard semantics: fresh storage, old contents gone.
        slot.bytes.fill(0);
        slot.filled = true;
        Ok(MappedWrite {
            bytes: &mut slot.bytes,
            row_pitch: slot.pitch,
        })
    }

    fn unmap(&mut self, _slot: &mut Self::Slot) {}

    fn queue_upload(&mut self, slot: &Self::Slot, dst: &Self::Texture) -> Result<(), VtxError> {
        let mut pixels = dst.pixels.borrow_mut();
        let row = dst.row_bytes().min(slot.row_bytes);
        for y in 0..slot.height.min(dst.height) as usize {
            pixels[y * dst.row_bytes()..y * dst.row_bytes() + row]
                .copy_from_slice(&slot.bytes[y * slot.pitch..y * slot.pitch + row]);
        }
        Ok(())
    }

    fn upload_direct(
        &mut self,
        dst: &Self::Texture,
        pixels: &[u8],
        row_pitch: usize,
    ) -> Result<(), VtxError> {
        let mut out = dst.pixels.borrow_mut();
        let row = dst.row_bytes().min(row_pitch);
        for y in 0..dst.height as usize {
            out[y * dst.row_bytes()..y * dst.row_bytes() + row]
                .copy_from_slice(&pixels[y * row_pitch..y * row_pitch + row]);
        }
        Ok(())
    }
}
