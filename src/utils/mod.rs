//! Utility functions for the triage pipeline.
//!
//! This module provides image helpers used by the gate and the tensor codec,
//! and the tracing setup used by the command-line front end.

pub mod image;

pub use self::image::{downscale_to_max_side, fit_within, load_image, resize_rgb};

use tracing_subscriber::EnvFilter;

/// Installs a formatted tracing subscriber filtered by `RUST_LOG`
/// (default `info`).
///
/// Calling it more than once is harmless; only the first call installs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
