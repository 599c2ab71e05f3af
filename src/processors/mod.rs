//! Image and tensor processing for the triage pipeline.
//!
//! Everything here is pure and stateless:
//! - [`color`]: color space conversions and the jet colormap
//! - [`quality_gate`]: the pre-inference frame quality gate
//! - [`tensor_codec`]: input packing and saliency overlay rendering

pub mod color;
pub mod quality_gate;
pub mod tensor_codec;

pub use color::{Hsv, YCbCr, jet, luminance, rgb_to_hsv, rgb_to_ycbcr};
pub use quality_gate::{GateRejection, GateResult, ImageQualityGate, is_skin_pixel};
pub use tensor_codec::{
    DEFAULT_OVERLAY_STRENGTH, PackedInput, blend_overlay, normalize_saliency, pack, to_overlay,
};
