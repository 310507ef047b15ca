//! Plain source image value handed to the quantizer.
//!
//! Rows are stored top to bottom, pixels left to right, channels interleaved.
//! Channel values are normalized floats (0.0-1.0). Alpha, when present, is
//! carried along but ignored by quantization.

use crate::error::ExportError;

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<f32>,
}

impl Image {
    /// Create an image from an interleaved RGB or RGBA float buffer.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<f32>) -> Result<Self, ExportError> {
        if channels != 3 && channels != 4 {
            return Err(ExportError::InvalidImage(format!(
                "expected 3 or 4 channels, got {}",
                channels
            )));
        }
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(ExportError::InvalidImage(format!(
                "data length {} doesn't match {}x{}x{} = {}",
                data.len(),
                width,
                height,
                channels,
                expected
            )));
        }
        if let Some(i) = data.iter().position(|v| !v.is_finite()) {
            return Err(ExportError::InvalidImage(format!(
                "non-finite channel value {} at pixel {}",
                data[i],
                i / channels
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Build an RGB image from per-pixel colors (row-major, top row first).
    pub fn from_rgb(width: usize, height: usize, pixels: &[[f32; 3]]) -> Result<Self, ExportError> {
        let data = pixels.iter().flat_map(|p| p.iter().copied()).collect();
        Self::new(width, height, 3, data)
    }

    /// Build an RGB image from 8-bit colors.
    pub fn from_rgb8(width: usize, height: usize, pixels: &[[u8; 3]]) -> Result<Self, ExportError> {
        let data = pixels
            .iter()
            .flat_map(|p| p.iter().map(|&c| c as f32 / 255.0))
            .collect();
        Self::new(width, height, 3, data)
    }

    /// An image with no pixels.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            channels: 3,
            data: Vec::new(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// RGB of pixel (x, y), y counted from the top row.
    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [f32; 3] {
        let i = (y * self.width + x) * self.channels;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// RGB of every pixel in storage order.
    pub fn rgb_pixels(&self) -> Vec<[f32; 3]> {
        self.data
            .chunks_exact(self.channels)
            .map(|c| [c[0], c[1], c[2]])
            .collect()
    }

    /// Raw interleaved channel data.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
