//! Palette quantization for VRAM textures.
//!
//! Provides:
//! - `quantize`: reduce an `Image` to a palette of at most 2^depth colors
//!   (or convert directly to 5-5-5 pixels for 16-bit textures)
//! - `DitherMode`: error diffusion applied in the final index assignment
//!
//! Indexed quantization runs K-Means over the distinct colors of the image,
//! weighted by how often each appears. Nearest-centroid lookups go through a
//! k-d tree. Images that already have few enough colors skip K-Means and keep
//! their exact colors.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::VramPixel;
use crate::image::Image;
use crate::kdtree::KdTree;
use crate::texture::BitDepth;

/// Dithering mode for the final palette index assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DitherMode {
    /// Nearest palette entry per pixel, no error diffusion
    None,
    /// Floyd-Steinberg, every row left to right
    #[default]
    FloydSteinberg,
    /// Floyd-Steinberg, odd rows right to left
    FloydSteinbergSerpentine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizeOptions {
    pub max_iterations: usize,
    pub dither: DitherMode,
    /// Seed for empty-cluster reseeding
    pub seed: u32,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            dither: DitherMode::default(),
            seed: 0,
        }
    }
}

/// Palette-indexed result for 4-bit and 8-bit textures.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedImage {
    pub width: usize,
    pub height: usize,
    pub bit_depth: BitDepth,
    /// Row-major, top row first
    pub indices: Vec<u8>,
    pub palette: Vec<[f32; 3]>,
    /// K-Means assignment passes run; 0 when the palette was exact
    pub iterations: usize,
}

/// Direct-color result for 16-bit textures.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectImage {
    pub width: usize,
    pub height: usize,
    /// Row-major, top row first
    pub pixels: Vec<VramPixel>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Quantized {
    Indexed(IndexedImage),
    Direct(DirectImage),
}

impl Quantized {
    pub fn width(&self) -> usize {
        match self {
            Quantized::Indexed(i) => i.width,
            Quantized::Direct(d) => d.width,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Quantized::Indexed(i) => i.height,
            Quantized::Direct(d) => d.height,
        }
    }

    pub fn bit_depth(&self) -> BitDepth {
        match self {
            Quantized::Indexed(i) => i.bit_depth,
            Quantized::Direct(_) => BitDepth::Sixteen,
        }
    }
}

// ============================================================================
// Entry point
// ============================================================================

pub fn quantize(image: &Image, depth: BitDepth, options: &QuantizeOptions) -> Quantized {
    let (width, height) = (image.width(), image.height());

    let Some(max_colors) = depth.max_colors() else {
        let pixels = if image.is_empty() {
            Vec::new()
        } else {
            image.rgb_pixels().into_iter().map(VramPixel::from_rgb_f32).collect()
        };
        return Quantized::Direct(DirectImage { width, height, pixels });
    };

    if image.is_empty() {
        return Quantized::Indexed(IndexedImage {
            width,
            height,
            bit_depth: depth,
            indices: Vec::new(),
            palette: Vec::new(),
            iterations: 0,
        });
    }

    let pixels = image.rgb_pixels();
    let histogram = ColorHistogram::build(&pixels);

    if histogram.colors.len() <= max_colors {
        log::debug!(
            "{}x{} image has {} colors, palette is exact",
            width,
            height,
            histogram.colors.len()
        );
        let indices = histogram.pixel_slots.iter().map(|&s| s as u8).collect();
        return Quantized::Indexed(IndexedImage {
            width,
            height,
            bit_depth: depth,
            indices,
            palette: histogram.colors,
            iterations: 0,
        });
    }

    let (palette, iterations) = kmeans(&histogram, max_colors, options);
    log::debug!(
        "{}x{} image: {} colors reduced to {} in {} iterations",
        width,
        height,
        histogram.colors.len(),
        palette.len(),
        iterations
    );

    let indices = match options.dither {
        DitherMode::None => diffuse::<NoneKernel>(&pixels, width, height, &palette, false),
        DitherMode::FloydSteinberg => diffuse::<FloydSteinberg>(&pixels, width, height, &palette, false),
        DitherMode::FloydSteinbergSerpentine => {
            diffuse::<FloydSteinberg>(&pixels, width, height, &palette, true)
        }
    };

    Quantized::Indexed(IndexedImage {
        width,
        height,
        bit_depth: depth,
        indices,
        palette,
        iterations,
    })
}

// ============================================================================
// Distinct color histogram
// ============================================================================

struct ColorHistogram {
    /// Distinct colors in first-seen order
    colors: Vec<[f32; 3]>,
    /// Pixel count per distinct color
    counts: Vec<usize>,
    /// Distinct color slot of each pixel
    pixel_slots: Vec<usize>,
}

impl ColorHistogram {
    fn build(pixels: &[[f32; 3]]) -> Self {
        let mut lookup: HashMap<[u32; 3], usize> = HashMap::new();
        let mut colors = Vec::new();
        let mut counts = Vec::new();
        let mut pixel_slots = Vec::with_capacity(pixels.len());

        for &p in pixels {
            let key = [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()];
            let slot = *lookup.entry(key).or_insert_with(|| {
                colors.push(p);
                counts.push(0);
                colors.len() - 1
            });
            counts[slot] += 1;
            pixel_slots.push(slot);
        }

        Self {
            colors,
            counts,
            pixel_slots,
        }
    }
}

// ============================================================================
// K-Means
// ============================================================================

/// Deterministic hash for reseeding (Wang hash).
#[inline]
pub fn wang_hash(mut x: u32) -> u32 {
    x = (x ^ 61) ^ (x >> 16);
    x = x.wrapping_mul(9);
    x = x ^ (x >> 4);
    x = x.wrapping_mul(0x27d4eb2d);
    x = x ^ (x >> 15);
    x
}

/// Returns the centroids and the number of assignment passes run.
fn kmeans(histogram: &ColorHistogram, k: usize, options: &QuantizeOptions) -> (Vec<[f32; 3]>, usize) {
    let colors = &histogram.colors;
    let n = colors.len();
    let mut centroids: Vec<[f32; 3]> = (0..k).map(|i| colors[i * n / k]).collect();
    let mut assignments = vec![usize::MAX; n];
    let mut iterations = 0;

    for iteration in 0..options.max_iterations {
        iterations = iteration + 1;

        let tree = KdTree::build(&centroids);
        let mut changed = false;
        for (slot, &color) in colors.iter().enumerate() {
            let nearest = tree.nearest(color).unwrap_or(0);
            if assignments[slot] != nearest {
                assignments[slot] = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut weights = vec![0usize; k];
        for (slot, &cluster) in assignments.iter().enumerate() {
            let c = colors[slot];
            let w = histogram.counts[slot];
            sums[cluster][0] += c[0] as f64 * w as f64;
            sums[cluster][1] += c[1] as f64 * w as f64;
            sums[cluster][2] += c[2] as f64 * w as f64;
            weights[cluster] += w;
        }

        for (cluster, centroid) in centroids.iter_mut().enumerate() {
            if weights[cluster] == 0 {
                let hash = wang_hash(options.seed ^ (iteration * k + cluster) as u32);
                *centroid = colors[hash as usize % n];
                continue;
            }
            let w = weights[cluster] as f64;
            *centroid = [
                (sums[cluster][0] / w) as f32,
                (sums[cluster][1] / w) as f32,
                (sums[cluster][2] / w) as f32,
            ];
        }
    }

    (centroids, iterations)
}

// ============================================================================
// Error diffusion
// ============================================================================

/// Padded RGB working buffer; one column of padding on each side and one
/// extra row below so kernel writes never need bounds checks.
struct WorkingBuffer {
    stride: usize,
    data: Vec<[f32; 3]>,
}

const PAD: usize = 1;

impl WorkingBuffer {
    fn new(pixels: &[[f32; 3]], width: usize, height: usize) -> Self {
        let stride = width + 2 * PAD;
        let mut data = vec![[0.0; 3]; stride * (height + 1)];
        for y in 0..height {
            let row = &pixels[y * width..(y + 1) * width];
            data[y * stride + PAD..y * stride + PAD + width].copy_from_slice(row);
        }
        Self { stride, data }
    }

    #[inline]
    fn get(&self, bx: usize, y: usize) -> [f32; 3] {
        self.data[y * self.stride + bx]
    }

    #[inline]
    fn add(&mut self, bx: usize, y: usize, err: [f32; 3], weight: f32) {
        let px = &mut self.data[y * self.stride + bx];
        px[0] += err[0] * weight;
        px[1] += err[1] * weight;
        px[2] += err[2] * weight;
    }
}

trait DiffusionKernel {
    /// Diffuse error while scanning left to right.
    fn apply_ltr(buf: &mut WorkingBuffer, bx: usize, y: usize, err: [f32; 3]);
    /// Diffuse error while scanning right to left.
    fn apply_rtl(buf: &mut WorkingBuffer, bx: usize, y: usize, err: [f32; 3]);
}

struct FloydSteinberg;

impl DiffusionKernel for FloydSteinberg {
    #[inline]
    fn apply_ltr(buf: &mut WorkingBuffer, bx: usize, y: usize, err: [f32; 3]) {
        buf.add(bx + 1, y, err, 7.0 / 16.0);
        buf.add(bx - 1, y + 1, err, 3.0 / 16.0);
        buf.add(bx, y + 1, err, 5.0 / 16.0);
        buf.add(bx + 1, y + 1, err, 1.0 / 16.0);
    }

    #[inline]
    fn apply_rtl(buf: &mut WorkingBuffer, bx: usize, y: usize, err: [f32; 3]) {
        buf.add(bx - 1, y, err, 7.0 / 16.0);
        buf.add(bx + 1, y + 1, err, 3.0 / 16.0);
        buf.add(bx, y + 1, err, 5.0 / 16.0);
        buf.add(bx - 1, y + 1, err, 1.0 / 16.0);
    }
}

struct NoneKernel;

impl DiffusionKernel for NoneKernel {
    #[inline]
    fn apply_ltr(_buf: &mut WorkingBuffer, _bx: usize, _y: usize, _err: [f32; 3]) {}

    #[inline]
    fn apply_rtl(_buf: &mut WorkingBuffer, _bx: usize, _y: usize, _err: [f32; 3]) {}
}

/// Assign every pixel a palette index, diffusing the residual with `K`.
fn diffuse<K: DiffusionKernel>(
    pixels: &[[f32; 3]],
    width: usize,
    height: usize,
    palette: &[[f32; 3]],
    serpentine: bool,
) -> Vec<u8> {
    let tree = KdTree::build(palette);
    let mut buf = WorkingBuffer::new(pixels, width, height);
    let mut indices = vec![0u8; width * height];

    for y in 0..height {
        let rtl = serpentine && y % 2 == 1;
        for i in 0..width {
            let x = if rtl { width - 1 - i } else { i };
            let bx = x + PAD;
            let color = buf.get(bx, y);
            let index = tree.nearest(color).unwrap_or(0);
            indices[y * width + x] = index as u8;

            let chosen = palette[index];
            let err = [color[0] - chosen[0], color[1] - chosen[1], color[2] - chosen[2]];
            if rtl {
                K::apply_rtl(&mut buf, bx, y, err);
            } else {
                K::apply_ltr(&mut buf, bx, y, err);
            }
        }
    }

    indices
}
