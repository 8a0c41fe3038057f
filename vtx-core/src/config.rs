//! Configuration for the transfer pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pipeline::readback::DEFAULT_READBACK_DEPTH;
use crate::pipeline::types::PixelFormat;
use crate::pipeline::upload::DEFAULT_UPLOAD_DEPTH;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// GPU transfer tuning.
    pub transfer: TransferConfig,
    /// Frame pacing.
    pub pacing: PacingConfig,
    /// Send-side behaviour.
    pub send: SendConfig,
}

/// GPU transfer tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Readback ring depth. Deeper hides more GPU latency at the cost
    /// of that many cycles of delay.
    pub readback_depth: usize,
    /// Upload ring depth.
    pub upload_depth: usize,
}

/// Frame pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Target frames per second for the send loop. 0 disables pacing.
    pub target_fps: f64,
}

/// Send-side behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    /// Submit frames without waiting for the transport (enables the
    /// double-buffered send pair).
    pub asynchronous: bool,
    /// Pixel format handed to the transport: "rgba", "bgra" or
    /// "uyvy".
    pub format: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            transfer: TransferConfig::default(),
            pacing: PacingConfig::default(),
            send: SendConfig::default(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            readback_depth: DEFAULT_READBACK_DEPTH,
            upload_depth: DEFAULT_UPLOAD_DEPTH,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { target_fps: 60.0 }
    }
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            asynchronous: true,
            format: "bgra".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl PipelineConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the default configuration to a file (for bootstrapping).
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let cfg = Self::default();
        let text = toml::to_string_pretty(&cfg)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, text)
    }

    /// Readback ring depth, clamped to a workable range.
    pub fn readback_depth(&self) -> usize {
        self.transfer.readback_depth.clamp(2, 8)
    }

    /// Upload ring depth, clamped to a workable range.
    pub fn upload_depth(&self) -> usize {
        self.transfer.upload_depth.clamp(2, 4)
    }

    /// The configured send format, defaulting to BGRA on an
    /// unrecognised name.
    pub fn send_format(&self) -> PixelFormat {
        PixelFormat::from_name(&self.send.format).unwrap_or(PixelFormat::Bgra8)
    }
}

// ── Tests ────────────────────────────────────────────────────────
