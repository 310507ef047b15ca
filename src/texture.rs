//! Packed texture representation consumed by the VRAM allocator.
//!
//! A texture is stored as 16-bit words exactly as they will sit in VRAM:
//! - 4-bit: four palette indices per word, first pixel in the low nibble
//! - 8-bit: two palette indices per word, first pixel in the low byte
//! - 16-bit: one 5-5-5 color per word, no palette
//!
//! Word rows are stored bottom-up: row 0 of `words()` is the last row of the
//! source image, which is the order the device scans textures out in.

use serde::{Deserialize, Serialize};

use crate::color::VramPixel;
use crate::image::Image;
use crate::quantize::{quantize, QuantizeOptions, Quantized};

/// Maximum number of palette entries a texture can carry
pub const MAX_PALETTE_LEN: usize = 256;

// ============================================================================
// Bit depth classes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BitDepth {
    Four,
    Eight,
    Sixteen,
}

impl BitDepth {
    /// Allocation order: widest atlases first.
    pub const PACKING_ORDER: [BitDepth; 3] = [BitDepth::Sixteen, BitDepth::Eight, BitDepth::Four];

    #[inline]
    pub fn bits(self) -> u8 {
        match self {
            BitDepth::Four => 4,
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    /// Texels stored in one 16-bit VRAM word.
    #[inline]
    pub fn pixels_per_word(self) -> usize {
        match self {
            BitDepth::Four => 4,
            BitDepth::Eight => 2,
            BitDepth::Sixteen => 1,
        }
    }

    /// Palette size for indexed modes, `None` for direct color.
    #[inline]
    pub fn max_colors(self) -> Option<usize> {
        match self {
            BitDepth::Four => Some(16),
            BitDepth::Eight => Some(256),
            BitDepth::Sixteen => None,
        }
    }

    #[inline]
    pub fn is_indexed(self) -> bool {
        self != BitDepth::Sixteen
    }

    /// Atlas width in VRAM words for this class.
    #[inline]
    pub fn atlas_width(self) -> u16 {
        match self {
            BitDepth::Four => 64,
            BitDepth::Eight => 128,
            BitDepth::Sixteen => 256,
        }
    }

    /// Words needed to hold `width` texels.
    #[inline]
    pub fn quantized_width(self, width: usize) -> usize {
        width.div_ceil(self.pixels_per_word())
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = String;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            4 => Ok(BitDepth::Four),
            8 => Ok(BitDepth::Eight),
            15 | 16 => Ok(BitDepth::Sixteen),
            _ => Err(format!("unsupported bit depth {}, expected 4, 8 or 16", bits)),
        }
    }
}

impl From<BitDepth> for u8 {
    fn from(depth: BitDepth) -> u8 {
        depth.bits()
    }
}

// ============================================================================
// Index packing
// ============================================================================

/// Pack row-major palette indices into VRAM words, row by row.
///
/// Rows whose width is not a multiple of the texels-per-word count are padded
/// with index 0. Row order is preserved. Only meaningful for indexed depths.
pub fn pack_indices(indices: &[u8], width: usize, height: usize, depth: BitDepth) -> Vec<u16> {
    let per_word = depth.pixels_per_word();
    let bits = depth.bits() as usize;
    let mask = ((1u32 << bits) - 1) as u16;
    let qwidth = depth.quantized_width(width);
    let mut words = Vec::with_capacity(qwidth * height);

    for y in 0..height {
        let row = &indices[y * width..(y + 1) * width];
        for group in 0..qwidth {
            let mut word = 0u16;
            for slot in 0..per_word {
                let x = group * per_word + slot;
                if x < width {
                    word |= (row[x] as u16 & mask) << (slot * bits);
                }
            }
            words.push(word);
        }
    }
    words
}

/// Inverse of [`pack_indices`]; padding texels are dropped.
pub fn unpack_indices(words: &[u16], width: usize, height: usize, depth: BitDepth) -> Vec<u8> {
    let per_word = depth.pixels_per_word();
    let bits = depth.bits() as usize;
    let mask = ((1u32 << bits) - 1) as u16;
    let qwidth = depth.quantized_width(width);
    let mut indices = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            let word = words[y * qwidth + x / per_word];
            let slot = x % per_word;
            indices.push(((word >> (slot * bits)) & mask) as u8);
        }
    }
    indices
}

/// Reverse the row order of a word grid.
fn flip_rows(words: &[u16], row_len: usize, height: usize) -> Vec<u16> {
    let mut out = Vec::with_capacity(words.len());
    for y in (0..height).rev() {
        out.extend_from_slice(&words[y * row_len..(y + 1) * row_len]);
    }
    out
}

// ============================================================================
// IndexedTexture
// ============================================================================

/// Location of a texture inside its atlas and of that atlas in VRAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TexturePlacement {
    /// Offset inside the atlas, in VRAM words
    pub packing_x: u16,
    /// Offset inside the atlas, in rows
    pub packing_y: u16,
    /// Atlas origin X / 64
    pub texpage_x: u8,
    /// Atlas origin Y / 256
    pub texpage_y: u8,
}

/// Absolute VRAM position of a texture's CLUT, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClutPlacement {
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedTexture {
    width: usize,
    quantized_width: usize,
    height: usize,
    bit_depth: BitDepth,
    indices: Option<Vec<u8>>,
    palette: Option<Vec<VramPixel>>,
    words: Vec<u16>,
    placement: Option<TexturePlacement>,
    clut: Option<ClutPlacement>,
}

impl IndexedTexture {
    /// Quantize `image` and pack the result.
    pub fn from_image(image: &Image, depth: BitDepth, options: &QuantizeOptions) -> Self {
        Self::from_quantized(&quantize(image, depth, options))
    }

    pub fn from_quantized(quantized: &Quantized) -> Self {
        match quantized {
            Quantized::Direct(direct) => {
                let words: Vec<u16> = direct.pixels.iter().map(VramPixel::pack).collect();
                Self {
                    width: direct.width,
                    quantized_width: direct.width,
                    height: direct.height,
                    bit_depth: BitDepth::Sixteen,
                    indices: None,
                    palette: None,
                    words: flip_rows(&words, direct.width, direct.height),
                    placement: None,
                    clut: None,
                }
            }
            Quantized::Indexed(indexed) => {
                let depth = indexed.bit_depth;
                let qwidth = depth.quantized_width(indexed.width);
                let packed = pack_indices(&indexed.indices, indexed.width, indexed.height, depth);
                let palette: Vec<VramPixel> = indexed
                    .palette
                    .iter()
                    .take(MAX_PALETTE_LEN)
                    .map(|&c| VramPixel::from_rgb_f32(c))
                    .collect();
                Self {
                    width: indexed.width,
                    quantized_width: qwidth,
                    height: indexed.height,
                    bit_depth: depth,
                    indices: Some(indexed.indices.clone()),
                    palette: Some(palette),
                    words: flip_rows(&packed, qwidth, indexed.height),
                    placement: None,
                    clut: None,
                }
            }
        }
    }

    /// Build a texture from indices and a ready-made palette.
    ///
    /// Indices are row-major, top row first. Returns `None` if the depth is
    /// not indexed, the index count is wrong, or an index is out of range.
    pub fn from_indices(
        width: usize,
        height: usize,
        depth: BitDepth,
        indices: Vec<u8>,
        palette: Vec<VramPixel>,
    ) -> Option<Self> {
        let max = depth.max_colors()?;
        if indices.len() != width * height || palette.len() > max {
            return None;
        }
        if indices.iter().any(|&i| i as usize >= palette.len()) {
            return None;
        }
        let qwidth = depth.quantized_width(width);
        let packed = pack_indices(&indices, width, height, depth);
        Some(Self {
            width,
            quantized_width: qwidth,
            height,
            bit_depth: depth,
            indices: Some(indices),
            palette: Some(palette),
            words: flip_rows(&packed, qwidth, height),
            placement: None,
            clut: None,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn quantized_width(&self) -> usize {
        self.quantized_width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Palette indices in source orientation; `None` for 16-bit textures.
    pub fn indices(&self) -> Option<&[u8]> {
        self.indices.as_deref()
    }

    /// CLUT entries; `None` for 16-bit textures.
    pub fn palette(&self) -> Option<&[VramPixel]> {
        self.palette.as_deref()
    }

    /// True when the texture needs a CLUT slot in VRAM.
    pub fn has_palette(&self) -> bool {
        self.palette.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// Packed words, `quantized_width` per row, bottom row first.
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// Footprint used to order textures during atlas packing.
    #[inline]
    pub fn area(&self) -> usize {
        self.quantized_width * self.height
    }

    pub fn placement(&self) -> Option<TexturePlacement> {
        self.placement
    }

    pub fn clut(&self) -> Option<ClutPlacement> {
        self.clut
    }

    pub(crate) fn set_placement(&mut self, placement: TexturePlacement) {
        debug_assert!(self.placement.is_none(), "texture placed twice");
        self.placement = Some(placement);
    }

    pub(crate) fn set_clut(&mut self, clut: ClutPlacement) {
        debug_assert!(self.clut.is_none(), "CLUT allocated twice");
        self.clut = Some(clut);
    }

    /// Reconstruct 8-bit RGB in source orientation (top row first).
    pub fn decode_rgb(&self) -> Vec<[u8; 3]> {
        match (&self.indices, &self.palette) {
            (Some(indices), Some(palette)) => indices
                .iter()
                .map(|&i| palette.get(i as usize).copied().unwrap_or_default().to_rgb8())
                .collect(),
            _ => flip_rows(&self.words, self.quantized_width, self.height)
                .iter()
                .map(|&w| VramPixel::unpack(w).to_rgb8())
                .collect(),
        }
    }
}
