//! Pixel format conversion between host buffers.
//!
//! Three families of transform, each done in a single pass over the
//! data (a requested vertical flip is folded into the same traversal —
//! never a second one):
//!
//! - **Channel swap** RGBA ↔ BGRA: a 4-byte permutation that is its own
//!   inverse, so one routine serves both directions.
//! - **Packed 4:2:2 YUV ⇄ RGBA**: integer-matrix conversion operating
//!   on two-pixel groups (U, Y0, V, Y1). The coefficient set is chosen
//!   by output width — HD material gets the BT.709 matrix, everything
//!   narrower the BT.601 one.
//! - **Identity copy**: same format both sides, rows moved through the
//!   copy engine (reversed row order when flipping).
//!
//! All validation happens before the first byte is written; a failed
//! conversion leaves the destination untouched.

use crate::error::VtxError;
use crate::pipeline::copy::CopyEngine;
use crate::pipeline::types::{FrameBuffer, PixelFormat};

/// Output widths at or above this use the BT.709 coefficient set.
///
/// Selection is by width alone — a fixed policy, not negotiated with
/// the source.
pub const HD_WIDTH_THRESHOLD: u32 = 1920;

// ── Coefficient matrices ─────────────────────────────────────────

/// Fixed-point (Q8) conversion coefficients for one colour standard.
///
/// The decode side is applied to (Y−16, U−128, V−128) with a unit luma
/// coefficient: mid-grey (Y=U=V=128) maps to exactly (128,128,128),
/// and the encode side is the matching inverse.
#[derive(Debug)]
struct ColorMatrix {
    name: &'static str,
    // YUV -> RGB
    rv: i32,
    gu: i32,
    gv: i32,
    bu: i32,
    // RGB -> YUV
    yr: i32,
    yg: i32,
    yb: i32,
    ur: i32,
    ug: i32,
    ub: i32,
    vr: i32,
    vg: i32,
    vb: i32,
}

/// BT.601 — standard definition.
static MATRIX_SD: ColorMatrix = ColorMatrix {
    name: "bt601",
    rv: 359,
    gu: 88,
    gv: 183,
    bu: 454,
    yr: 77,
    yg: 150,
    yb: 29,
    ur: -43,
    ug: -85,
    ub: 128,
    vr: 128,
    vg: -107,
    vb: -21,
};

/// BT.709 — high definition.
static MATRIX_HD: ColorMatrix = ColorMatrix {
    name: "bt709",
    rv: 403,
    gu: 48,
    gv: 120,
    bu: 475,
    yr: 54,
    yg: 183,
    yb: 19,
    ur: -29,
    ug: -99,
    ub: 128,
    vr: 128,
    vg: -116,
    vb: -12,
};

fn matrix_for_width(width: u32) -> &'static ColorMatrix {
    if width >= HD_WIDTH_THRESHOLD {
        &MATRIX_HD
    } else {
        &MATRIX_SD
    }
}

#[inline]
fn clamp8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Decode one luma sample against shared chroma offsets.
#[inline]
fn yuv_to_rgb(m: &ColorMatrix, y: u8, d: i32, e: i32) -> [u8; 3] {
    let c = (i32::from(y) - 16) << 8;
    let r = ((c + m.rv * e + 128) >> 8) + 16;
    let g = ((c - m.gu * d - m.gv * e + 128) >> 8) + 16;
    let b = ((c + m.bu * d + 128) >> 8) + 16;
    [clamp8(r), clamp8(g), clamp8(b)]
}

/// Encode one RGB triple to a luma sample.
#[inline]
fn rgb_to_y(m: &ColorMatrix, r: i32, g: i32, b: i32) -> u8 {
    clamp8((m.yr * r + m.yg * g + m.yb * b + 128) >> 8)
}

// ── PixelConverter ───────────────────────────────────────────────

/// Converts frames between the supported pixel formats.
///
/// The converter is stateless apart from the injected [`CopyEngine`]
/// used for identity copies; it can be freely copied around.
#[derive(Clone, Copy)]
pub struct PixelConverter {
    engine: CopyEngine,
}

impl PixelConverter {
    /// Converter moving identity copies through `engine`.
    pub fn new(engine: CopyEngine) -> Self {
        Self { engine }
    }

    /// Convert `src` into `dst`, optionally flipping vertically.
    ///
    /// The format pairing is taken from the two buffers. Supported:
    /// RGBA↔BGRA, UYVY→RGBA, RGBA→UYVY, and same-format copies. Both
    /// buffers must agree on width and height.
    pub fn convert(
        &self,
        src: &FrameBuffer,
        dst: &mut FrameBuffer,
        flip: bool,
    ) -> Result<(), VtxError> {
        if src.width() != dst.width() || src.height() != dst.height() {
            return Err(VtxError::DimensionMismatch {
                src_width: src.width(),
                src_height: src.height(),
                dst_width: dst.width(),
                dst_height: dst.height(),
            });
        }
        if src.is_empty() {
            return Err(VtxError::ZeroSized {
                width: src.width(),
                height: src.height(),
            });
        }

        match (src.format(), dst.format()) {
            (PixelFormat::Rgba8, PixelFormat::Bgra8) | (PixelFormat::Bgra8, PixelFormat::Rgba8) => {
                swap_channels(src, dst, flip);
                Ok(())
            }
            (PixelFormat::Uyvy422, PixelFormat::Rgba8) => {
                decode_uyvy(src, dst, flip);
                Ok(())
            }
            (PixelFormat::Rgba8, PixelFormat::Uyvy422) => {
                encode_uyvy(src, dst, flip);
                Ok(())
            }
            (a, b) if a == b => {
                self.copy_identity(src, dst, flip);
                Ok(())
            }
            (from, to) => Err(VtxError::UnsupportedConversion { from, to }),
        }
    }

    fn copy_identity(&self, src: &FrameBuffer, dst: &mut FrameBuffer, flip: bool) {
        let row_bytes = src.format().row_bytes(src.width());
        let rows = src.height() as usize;
        let src_stride = src.stride() as usize;
        let dst_stride = dst.stride() as usize;
        if flip {
            self.engine.copy_rows_flipped(
                src.bytes(),
                src_stride,
                dst.bytes_mut(),
                dst_stride,
                row_bytes,
                rows,
            );
        } else {
            self.engine.copy_rows(
                src.bytes(),
                src_stride,
                dst.bytes_mut(),
                dst_stride,
                row_bytes,
                rows,
            );
        }
    }
}

// ── Conversion passes ────────────────────────────────────────────

/// RGBA↔BGRA: swap bytes 0 and 2 of every pixel. Self-inverse.
fn swap_channels(src: &FrameBuffer, dst: &mut FrameBuffer, flip: bool) {
    let height = src.height();
    let width = src.width() as usize;
    for y in 0..height {
        let dy = if flip { height - 1 - y } else { y };
        let src_row = &src.row(y)[..width * 4];
        let dst_row = &mut dst.row_mut(dy)[..width * 4];
        for (s, d) in src_row.chunks_exact(4).zip(dst_row.chunks_exact_mut(4)) {
            d[0] = s[2];
            d[1] = s[1];
            d[2] = s[0];
            d[3] = s[3];
        }
    }
}

/// UYVY 4:2:2 → RGBA: each 4-byte group (U, Y0, V, Y1) yields two
/// opaque RGBA pixels. Row padding on either side is skipped.
fn decode_uyvy(src: &FrameBuffer, dst: &mut FrameBuffer, flip: bool) {
    let m = matrix_for_width(dst.width());
    tracing::trace!(matrix = m.name, width = dst.width(), "decoding 4:2:2 frame");
    let height = src.height();
    let width = src.width() as usize;
    let groups = width / 2;
    let tail = width % 2 == 1;

    for y in 0..height {
        let dy = if flip { height - 1 - y } else { y };
        let src_row = src.row(y);
        let dst_row = dst.row_mut(dy);

        for i in 0..groups {
            let g = &src_row[i * 4..i * 4 + 4];
            let d = i32::from(g[0]) - 128; // U
            let e = i32::from(g[2]) - 128; // V
            let [r0, g0, b0] = yuv_to_rgb(m, g[1], d, e);
            let [r1, g1, b1] = yuv_to_rgb(m, g[3], d, e);
            let out = &mut dst_row[i * 8..i * 8 + 8];
            out[0] = r0;
            out[1] = g0;
            out[2] = b0;
            out[3] = 255;
            out[4] = r1;
            out[5] = g1;
            out[6] = b1;
            out[7] = 255;
        }

        if tail {
            // Odd width: the final group carries one valid luma sample.
            let g = &src_row[groups * 4..groups * 4 + 4];
            let d = i32::from(g[0]) - 128;
            let e = i32::from(g[2]) - 128;
            let [r, gr, b] = yuv_to_rgb(m, g[1], d, e);
            let out = &mut dst_row[groups * 8..groups * 8 + 4];
            out[0] = r;
            out[1] = gr;
            out[2] = b;
            out[3] = 255;
        }
    }
}

/// RGBA → UYVY 4:2:2: luma per pixel, chroma from the averaged pixel
/// pair. The same width policy picks the matrix as on the decode side.
fn encode_uyvy(src: &FrameBuffer, dst: &mut FrameBuffer, flip: bool) {
    let m = matrix_for_width(src.width());
    tracing::trace!(matrix = m.name, width = src.width(), "encoding 4:2:2 frame");
    let height = src.height();
    let width = src.width() as usize;
    let groups = width / 2;
    let tail = width % 2 == 1;

    for y in 0..height {
        let dy = if flip { height - 1 - y } else { y };
        let src_row = src.row(y);
        let dst_row = dst.row_mut(dy);

        for i in 0..groups {
            let p = &src_row[i * 8..i * 8 + 8];
            let (r0, g0, b0) = (i32::from(p[0]), i32::from(p[1]), i32::from(p[2]));
            let (r1, g1, b1) = (i32::from(p[4]), i32::from(p[5]), i32::from(p[6]));
            let (ra, ga, ba) = ((r0 + r1 + 1) / 2, (g0 + g1 + 1) / 2, (b0 + b1 + 1) / 2);

            let out = &mut dst_row[i * 4..i * 4 + 4];
            out[0] = clamp8(128 + ((m.ur * ra + m.ug * ga + m.ub * ba + 128) >> 8));
            out[1] = rgb_to_y(m, r0, g0, b0);
            out[2] = clamp8(128 + ((m.vr * ra + m.vg * ga + m.vb * ba + 128) >> 8));
            out[3] = rgb_to_y(m, r1, g1, b1);
        }

        if tail {
            // Odd width: duplicate the last pixel into both luma slots.
            let p = &src_row[groups * 8..groups * 8 + 4];
            let (r, g, b) = (i32::from(p[0]), i32::from(p[1]), i32::from(p[2]));
            let out = &mut dst_row[groups * 4..groups * 4 + 4];
            out[0] = clamp8(128 + ((m.ur * r + m.ug * g + m.ub * b + 128) >> 8));
            out[1] = rgb_to_y(m, r, g, b);
            out[2] = clamp8(128 + ((m.vr * r + m.vg * g + m.vb * b + 128) >> 8));
            out[3] = out[1];
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> PixelConverter {
        PixelConverter::new(CopyEngine::new())
    }

    /// A deterministic RGBA gradient that exercises every channel.
    fn gradient(width: u32, height: u32, format: PixelFormat) -> FrameBuffer {
        let mut buf = FrameBuffer::new(width, height, format);
        for y in 0..height {
            let row = buf.row_mut(y);
            for x in 0..width as usize {
                row[x * 4] = (x % 256) as u8;
                row[x * 4 + 1] = (y % 256) as u8;
                row[x * 4 + 2] = ((x + y as usize) % 256) as u8;
                row[x * 4 + 3] = 255;
            }
        }
        buf
    }

    fn uyvy_filled(width: u32, height: u32, u: u8, y_: u8, v: u8) -> FrameBuffer {
        let mut buf = FrameBuffer::new(width, height, PixelFormat::Uyvy422);
        for row_idx in 0..height {
            for g in buf.row_mut(row_idx).chunks_exact_mut(4) {
                g[0] = u;
                g[1] = y_;
                g[2] = v;
                g[3] = y_;
            }
        }
        buf
    }

    #[test]
    fn channel_swap_is_an_involution() {
        let original = gradient(64, 48, PixelFormat::Rgba8);
        let mut bgra = FrameBuffer::new(64, 48, PixelFormat::Bgra8);
        let mut back = FrameBuffer::new(64, 48, PixelFormat::Rgba8);

        let c = converter();
        c.convert(&original, &mut bgra, false).unwrap();
        c.convert(&bgra, &mut back, false).unwrap();

        assert_eq!(back.bytes(), original.bytes());
        // And it actually permuted something.
        assert_ne!(bgra.bytes(), original.bytes());
    }

    #[test]
    fn swap_with_flip_is_one_pass_equivalent() {
        let original = gradient(16, 9, PixelFormat::Rgba8);

        // Fused: swap + flip in one convert call.
        let mut fused = FrameBuffer::new(16, 9, PixelFormat::Bgra8);
        converter().convert(&original, &mut fused, true).unwrap();

        // Reference: swap, then identity-flip.
        let mut swapped = FrameBuffer::new(16, 9, PixelFormat::Bgra8);
        let mut reference = FrameBuffer::new(16, 9, PixelFormat::Bgra8);
        converter().convert(&original, &mut swapped, false).unwrap();
        converter().convert(&swapped, &mut reference, true).unwrap();

        assert_eq!(fused.bytes(), reference.bytes());
    }

    #[test]
    fn double_identity_flip_restores_original() {
        let original = gradient(20, 15, PixelFormat::Rgba8);
        let mut once = FrameBuffer::new(20, 15, PixelFormat::Rgba8);
        let mut twice = FrameBuffer::new(20, 15, PixelFormat::Rgba8);

        let c = converter();
        c.convert(&original, &mut once, true).unwrap();
        assert_ne!(once.bytes(), original.bytes());
        c.convert(&once, &mut twice, true).unwrap();
        assert_eq!(twice.bytes(), original.bytes());
    }

    #[test]
    fn mid_grey_decodes_to_mid_grey_on_both_matrices() {
        // 1918 < threshold, 1920 ≥ threshold. One row keeps it fast.
        for width in [1918u32, 1920] {
            let src = uyvy_filled(width, 1, 128, 128, 128);
            let mut dst = FrameBuffer::new(width, 1, PixelFormat::Rgba8);
            converter().convert(&src, &mut dst, false).unwrap();

            for px in dst.row(0)[..width as usize * 4].chunks_exact(4) {
                for ch in &px[..3] {
                    assert!(
                        (127..=129).contains(ch),
                        "width {width}: channel {ch} out of ±1 of mid-grey"
                    );
                }
                assert_eq!(px[3], 255);
            }
        }
    }

    #[test]
    fn width_threshold_switches_coefficient_set() {
        // A saturated chroma sample decodes differently under the two
        // matrices; widths 1919 and 1920 must straddle the switch.
        let narrow_src = uyvy_filled(1919, 1, 90, 120, 200);
        let wide_src = uyvy_filled(1920, 1, 90, 120, 200);

        let mut narrow = FrameBuffer::new(1919, 1, PixelFormat::Rgba8);
        let mut wide = FrameBuffer::new(1920, 1, PixelFormat::Rgba8);
        converter().convert(&narrow_src, &mut narrow, false).unwrap();
        converter().convert(&wide_src, &mut wide, false).unwrap();

        assert_ne!(
            &narrow.row(0)[..4],
            &wide.row(0)[..4],
            "matrices must differ across the width threshold"
        );
        // Internally consistent: every pixel of one frame agrees.
        let first = narrow.row(0)[..4].to_vec();
        for px in narrow.row(0)[..1919 * 4].chunks_exact(4) {
            assert_eq!(px, &first[..]);
        }
    }

    #[test]
    fn decode_clamps_at_both_ends() {
        // Saturated bright corner: the red term overshoots 255 by far
        // and must clamp there, not wrap around as a byte.
        let hot = uyvy_filled(64, 1, 255, 255, 255);
        let mut dst = FrameBuffer::new(64, 1, PixelFormat::Rgba8);
        converter().convert(&hot, &mut dst, false).unwrap();
        assert_eq!(dst.row(0)[0], 255, "red must clamp high");

        // Saturated dark corner: red and blue go deeply negative.
        let cold = uyvy_filled(64, 1, 0, 0, 0);
        converter().convert(&cold, &mut dst, false).unwrap();
        assert_eq!(dst.row(0)[0], 0, "red must clamp low");
        assert_eq!(dst.row(0)[2], 0, "blue must clamp low");
        assert_eq!(dst.row(0)[3], 255);
    }

    #[test]
    fn mid_grey_encode_round_trips() {
        for width in [64u32, 1920] {
            let mut src = FrameBuffer::new(width, 2, PixelFormat::Rgba8);
            for y in 0..2 {
                for px in src.row_mut(y).chunks_exact_mut(4) {
                    px.copy_from_slice(&[128, 128, 128, 255]);
                }
            }
            let mut packed = FrameBuffer::new(width, 2, PixelFormat::Uyvy422);
            let mut back = FrameBuffer::new(width, 2, PixelFormat::Rgba8);

            let c = converter();
            c.convert(&src, &mut packed, false).unwrap();
            c.convert(&packed, &mut back, false).unwrap();

            for y in 0..2 {
                for px in back.row(y)[..width as usize * 4].chunks_exact(4) {
                    for ch in &px[..3] {
                        assert!((127..=129).contains(ch), "width {width}");
                    }
                }
            }
        }
    }

    #[test]
    fn odd_width_uyvy_paths_cover_the_tail_pixel() {
        let src = uyvy_filled(7, 3, 128, 200, 128);
        let mut dst = FrameBuffer::new(7, 3, PixelFormat::Rgba8);
        converter().convert(&src, &mut dst, false).unwrap();
        // Tail pixel (x = 6) must be written like the rest.
        let px = &dst.row(0)[6 * 4..7 * 4];
        assert_eq!(px[3], 255);
        assert!(px[0] > 150);
    }

    #[test]
    fn decode_respects_flip() {
        let mut src = FrameBuffer::new(2, 2, PixelFormat::Uyvy422);
        // Row 0 bright, row 1 dark.
        src.row_mut(0).copy_from_slice(&[128, 235, 128, 235]);
        src.row_mut(1).copy_from_slice(&[128, 16, 128, 16]);

        let mut dst = FrameBuffer::new(2, 2, PixelFormat::Rgba8);
        converter().convert(&src, &mut dst, true).unwrap();

        // Bright source row must land at the bottom.
        assert!(dst.row(1)[0] > dst.row(0)[0]);
    }

    #[test]
    fn unsupported_pairing_is_rejected_without_writes() {
        let src = uyvy_filled(8, 2, 10, 20, 30);
        let mut dst = FrameBuffer::new(8, 2, PixelFormat::Bgra8);
        let err = converter().convert(&src, &mut dst, false).unwrap_err();
        assert!(matches!(err, VtxError::UnsupportedConversion { .. }));
        assert!(dst.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_sized_and_mismatched_frames_are_rejected() {
        let empty = FrameBuffer::new(0, 0, PixelFormat::Rgba8);
        let mut dst = FrameBuffer::new(0, 0, PixelFormat::Bgra8);
        assert!(matches!(
            converter().convert(&empty, &mut dst, false),
            Err(VtxError::ZeroSized { .. })
        ));

        let src = gradient(8, 8, PixelFormat::Rgba8);
        let mut smaller = FrameBuffer::new(4, 8, PixelFormat::Bgra8);
        assert!(matches!(
            converter().convert(&src, &mut smaller, false),
            Err(VtxError::DimensionMismatch { .. })
        ));
    }
}
