//! Texpage attribute word written into every triangle record.
//!
//! Bits 0-3 page X, bit 4 page Y, bits 5-6 semi-transparency mode, bits 7-8
//! color mode, bit 9 dither.

use crate::texture::BitDepth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TexpageAttr(u16);

impl TexpageAttr {
    pub fn new() -> Self {
        Self(0)
    }

    /// Page X in 64-word units (0-15).
    pub fn page_x(self, x: u8) -> Self {
        Self((self.0 & !0x000F) | (x as u16 & 0x0F))
    }

    /// Page Y in 256-row units (0-1).
    pub fn page_y(self, y: u8) -> Self {
        Self((self.0 & !0x0010) | ((y as u16 & 0x01) << 4))
    }

    pub fn color_mode(self, depth: BitDepth) -> Self {
        let mode = match depth {
            BitDepth::Four => 0u16,
            BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
        };
        Self((self.0 & !0x0180) | (mode << 7))
    }

    pub fn dithered(self, on: bool) -> Self {
        Self((self.0 & !0x0200) | ((on as u16) << 9))
    }

    #[inline]
    pub fn bits(self) -> u16 {
        self.0
    }
}
