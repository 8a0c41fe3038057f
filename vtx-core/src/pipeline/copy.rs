//! Bulk pixel movement between host buffers.
//!
//! Every other pipeline stage moves bytes through [`CopyEngine`]. The
//! engine walks rows (honouring differing source/destination pitches)
//! and picks a copy routine per call:
//!
//! - small buffers take the plain byte path — below the thresholds the
//!   per-row dispatch overhead outweighs any wide-load gain;
//! - rows that are a multiple of 16 bytes take the probed wide routine;
//! - rows that are a multiple of 4 bytes take the word routine;
//! - anything else falls back to the byte routine.
//!
//! The choice is purely a performance policy: all routines produce
//! byte-identical output, and the tests hold them to that.

use bitflags::bitflags;

bitflags! {
    /// CPU capabilities relevant to the wide copy routine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CpuFeatures: u32 {
        /// x86-64 SSE2 (always present on x86-64).
        const SSE2 = 1 << 0;
        /// x86-64 AVX2.
        const AVX2 = 1 << 1;
        /// AArch64 Advanced SIMD.
        const NEON = 1 << 2;
    }
}

impl CpuFeatures {
    /// Probe the executing CPU once at startup.
    pub fn probe() -> Self {
        let mut features = CpuFeatures::empty();

        #[cfg(target_arch = "x86_64")]
        {
            features |= CpuFeatures::SSE2;
            if is_x86_feature_detected!("avx2") {
                features |= CpuFeatures::AVX2;
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            // Advanced SIMD is a baseline AArch64 feature.
            features |= CpuFeatures::NEON;
        }

        features
    }

    /// Whether any 16-byte-wide load/store path is available.
    pub fn has_wide_loads(self) -> bool {
        self.intersects(CpuFeatures::SSE2 | CpuFeatures::AVX2 | CpuFeatures::NEON)
    }
}

// ── CopyStrategy ─────────────────────────────────────────────────

/// A contiguous-range copy routine.
///
/// Implementations must be behaviourally identical to
/// `dst.copy_from_slice(src)`; they differ only in access width.
pub trait CopyStrategy: Send + Sync {
    /// Routine name, for logs.
    fn name(&self) -> &'static str;

    /// Copy `src` into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ (caller guarantees equal, disjoint
    /// ranges).
    fn copy(&self, dst: &mut [u8], src: &[u8]);
}

/// Plain byte copy.
pub struct ByteCopy;

impl CopyStrategy for ByteCopy {
    fn name(&self) -> &'static str {
        "byte"
    }

    fn copy(&self, dst: &mut [u8], src: &[u8]) {
        dst.copy_from_slice(src);
    }
}

/// 4-byte word copy. Requires `len % 4 == 0`; trailing bytes that do
/// not fill a word are copied through the byte path.
pub struct WordCopy;

impl CopyStrategy for WordCopy {
    fn name(&self) -> &'static str {
        "word"
    }

    fn copy(&self, dst: &mut [u8], src: &[u8]) {
        assert_eq!(dst.len(), src.len());
        let mut d = dst.chunks_exact_mut(4);
        let mut s = src.chunks_exact(4);
        for (d, s) in d.by_ref().zip(s.by_ref()) {
            let word = u32::from_ne_bytes([s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&word.to_ne_bytes());
        }
        d.into_remainder().copy_from_slice(s.remainder());
    }
}

/// 16-byte wide copy. Requires `len % 16 == 0`; the remainder goes
/// through the byte path.
pub struct WideCopy;

impl CopyStrategy for WideCopy {
    fn name(&self) -> &'static str {
        "wide"
    }

    fn copy(&self, dst: &mut [u8], src: &[u8]) {
        assert_eq!(dst.len(), src.len());
        let mut d = dst.chunks_exact_mut(16);
        let mut s = src.chunks_exact(16);
        for (d, s) in d.by_ref().zip(s.by_ref()) {
            match s.first_chunk::<16>() {
                Some(lane) => {
                    let wide = u128::from_ne_bytes(*lane);
                    d.copy_from_slice(&wide.to_ne_bytes());
                }
                None => d.copy_from_slice(s),
            }
        }
        d.into_remainder().copy_from_slice(s.remainder());
    }
}

static BYTE_COPY: ByteCopy = ByteCopy;
static WORD_COPY: WordCopy = WordCopy;
static WIDE_COPY: WideCopy = WideCopy;

// ── CopyEngine ───────────────────────────────────────────────────

/// Row lengths below this take the byte path outright.
const SMALL_ROW_BYTES: usize = 512 * 4;

/// Row counts below this take the byte path outright.
const SMALL_ROWS: usize = 256;

/// Row-structured bulk copier.
///
/// Construct once per process with [`new`](Self::new) (which probes
/// CPU capabilities and fixes the accelerated routine) and pass it by
/// value — the engine is two words wide.
#[derive(Clone, Copy)]
pub struct CopyEngine {
    /// The accelerated routine used for 16-byte-aligned rows.
    fast: &'static dyn CopyStrategy,
}

impl CopyEngine {
    /// Engine with the accelerated routine chosen from a CPU probe.
    pub fn new() -> Self {
        Self::with_features(CpuFeatures::probe())
    }

    /// Engine for an explicit capability set.
    pub fn with_features(features: CpuFeatures) -> Self {
        let fast: &'static dyn CopyStrategy = if features.has_wide_loads() {
            &WIDE_COPY
        } else {
            &WORD_COPY
        };
        tracing::debug!(strategy = fast.name(), ?features, "copy engine ready");
        Self { fast }
    }

    /// Engine pinned to a specific routine (tests, benchmarks).
    pub fn with_strategy(strategy: &'static dyn CopyStrategy) -> Self {
        Self { fast: strategy }
    }

    /// Name of the accelerated routine in use.
    pub fn strategy_name(&self) -> &'static str {
        self.fast.name()
    }

    /// Copy `rows` rows of `row_bytes` each, honouring both pitches.
    ///
    /// When both pitches are tight the whole region is moved as one
    /// contiguous range.
    ///
    /// # Panics
    ///
    /// Panics if either buffer is shorter than its pitch × `rows`.
    pub fn copy_rows(
        &self,
        src: &[u8],
        src_stride: usize,
        dst: &mut [u8],
        dst_stride: usize,
        row_bytes: usize,
        rows: usize,
    ) {
        if row_bytes == 0 || rows == 0 {
            return;
        }

        if src_stride == row_bytes && dst_stride == row_bytes {
            let len = row_bytes * rows;
            self.dispatch(len, rows, &mut dst[..len], &src[..len]);
            return;
        }

        for y in 0..rows {
            let s = &src[y * src_stride..y * src_stride + row_bytes];
            let d = &mut dst[y * dst_stride..y * dst_stride + row_bytes];
            self.dispatch(row_bytes, rows, d, s);
        }
    }

    /// As [`copy_rows`](Self::copy_rows), writing destination rows in
    /// reverse order (source row `rows-1-y` lands in destination row
    /// `y`).
    pub fn copy_rows_flipped(
        &self,
        src: &[u8],
        src_stride: usize,
        dst: &mut [u8],
        dst_stride: usize,
        row_bytes: usize,
        rows: usize,
    ) {
        for y in 0..rows {
            let sy = rows - 1 - y;
            let s = &src[sy * src_stride..sy * src_stride + row_bytes];
            let d = &mut dst[y * dst_stride..y * dst_stride + row_bytes];
            self.dispatch(row_bytes, rows, d, s);
        }
    }

    /// Vertically flip a buffer in place by swapping row pairs.
    ///
    /// The only sanctioned same-buffer operation: each swap touches two
    /// disjoint rows, so no byte is read after it was overwritten.
    pub fn flip_rows_in_place(&self, buf: &mut [u8], stride: usize, rows: usize) {
        if stride == 0 {
            return;
        }
        for y in 0..rows / 2 {
            let (top, rest) = buf.split_at_mut((rows - 1 - y) * stride);
            let upper = &mut top[y * stride..y * stride + stride];
            let lower = &mut rest[..stride];
            upper.swap_with_slice(lower);
        }
    }

    // ── Internal ─────────────────────────────────────────────────

    /// The strategy ladder. `len` is the contiguous range being moved,
    /// `rows` the overall row count of the operation (part of the
    /// small-buffer heuristic).
    fn dispatch(&self, len: usize, rows: usize, dst: &mut [u8], src: &[u8]) {
        if len < SMALL_ROW_BYTES || rows < SMALL_ROWS {
            BYTE_COPY.copy(dst, src);
        } else if len % 16 == 0 {
            self.fast.copy(dst, src);
        } else if len % 4 == 0 {
            WORD_COPY.copy(dst, src);
        } else {
            BYTE_COPY.copy(dst, src);
        }
    }
}

impl Default for CopyEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
