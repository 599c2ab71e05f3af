//! Shared fixtures for integration tests.

#![allow(dead_code)]

use image::{DynamicImage, Rgba, RgbaImage};
use lesion_triage::core::{ModelBackend, OutputTensor, Tensor4D, TriageResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const LIGHT_SKIN: [u8; 3] = [224, 172, 140];
pub const DARK_SKIN: [u8; 3] = [180, 120, 95];

/// In-memory backend returning canned outputs.
pub struct FakeBackend {
    pub input_shape: Vec<i64>,
    pub outputs: Vec<OutputTensor>,
    pub runs: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn new(side: u32, outputs: Vec<OutputTensor>) -> Self {
        let side = side as i64;
        Self {
            input_shape: vec![1, side, side, 3],
            outputs,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn probability(side: u32, p: f32) -> Self {
        Self::new(side, vec![OutputTensor::new(vec![1, 1], vec![p])])
    }

    pub fn run_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.runs)
    }
}

impl ModelBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake-lesion"
    }

    fn input_shape(&self) -> &[i64] {
        &self.input_shape
    }

    fn output_count(&self) -> usize {
        self.outputs.len()
    }

    fn run(&mut self, input: &Tensor4D) -> TriageResult<Vec<OutputTensor>> {
        let expected = [
            1,
            self.input_shape[1] as usize,
            self.input_shape[2] as usize,
            3,
        ];
        assert_eq!(input.shape(), &expected);
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(self.outputs.clone())
    }
}

pub fn checkerboard(size: u32, block: u32, a: [u8; 3], b: [u8; 3]) -> DynamicImage {
    let img = RgbaImage::from_fn(size, size, |x, y| {
        let c = if ((x / block) + (y / block)) % 2 == 0 { a } else { b };
        Rgba([c[0], c[1], c[2], 255])
    });
    DynamicImage::ImageRgba8(img)
}

pub fn skin_frame() -> DynamicImage {
    checkerboard(256, 16, LIGHT_SKIN, DARK_SKIN)
}

pub fn uniform(width: u32, height: u32, c: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([c[0], c[1], c[2], 255]),
    ))
}

/// Scales every color channel by `factor`, leaving alpha untouched.
pub fn darken(image: &DynamicImage, factor: f32) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    for Rgba(px) in rgba.pixels_mut() {
        for c in px.iter_mut().take(3) {
            *c = (*c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

/// Takes pixels from `inside` within `radius` of the center and from
/// `outside` elsewhere. Both inputs must share the same dimensions.
pub fn split_at_disk(inside: &DynamicImage, outside: &DynamicImage, radius: f32) -> DynamicImage {
    let inside = inside.to_rgba8();
    let outside = outside.to_rgba8();
    let (w, h) = inside.dimensions();
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let img = RgbaImage::from_fn(w, h, |x, y| {
        let (dx, dy) = (x as f32 - cx, y as f32 - cy);
        if dx * dx + dy * dy <= radius * radius {
            *inside.get_pixel(x, y)
        } else {
            *outside.get_pixel(x, y)
        }
    });
    DynamicImage::ImageRgba8(img)
}
