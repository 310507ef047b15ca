//! VRAM layout: atlas packing, texpage placement, and CLUT allocation.
//!
//! The allocator works on a fixed 1024×512 canvas of 16-bit words. Textures
//! are first packed into same-depth atlases (64/128/256 words wide, 256 rows
//! high), then atlases are placed on the 64×256 texpage grid, then each
//! paletted texture gets a one-row CLUT on a 16-word column. Nothing placed
//! ever overlaps anything else, including the reserved regions handed in by
//! the caller.
//!
//! Coordinates are canvas words with y counted from the top. Placement is
//! deterministic for a given texture order.

use serde::{Deserialize, Serialize};

use crate::error::{PackedItem, PackingFailure};
use crate::texture::{BitDepth, ClutPlacement, IndexedTexture, TexturePlacement};

pub const VRAM_WIDTH: u16 = 1024;
pub const VRAM_HEIGHT: u16 = 512;
pub const ATLAS_HEIGHT: u16 = 256;
/// Horizontal texpage step
pub const TEXPAGE_WIDTH: u16 = 64;
/// CLUT X must be a multiple of this
pub const CLUT_ALIGN: u16 = 16;

// ============================================================================
// Rect
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    #[inline]
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> u32 {
        self.x as u32 + self.w as u32
    }

    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y as u32 + self.h as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Half-open overlap test; empty rects overlap nothing.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && (self.x as u32) < other.right()
            && (other.x as u32) < self.right()
            && (self.y as u32) < other.bottom()
            && (other.y as u32) < self.bottom()
    }

    /// True if the rect lies entirely inside the VRAM canvas.
    #[inline]
    pub fn within_canvas(&self) -> bool {
        self.right() <= VRAM_WIDTH as u32 && self.bottom() <= VRAM_HEIGHT as u32
    }
}

// ============================================================================
// Canvas
// ============================================================================

/// Simulated VRAM contents, row-major from the top-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VramCanvas {
    words: Vec<u16>,
}

impl Default for VramCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl VramCanvas {
    pub fn new() -> Self {
        Self {
            words: vec![0; VRAM_WIDTH as usize * VRAM_HEIGHT as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u16, y: u16) -> u16 {
        self.words[y as usize * VRAM_WIDTH as usize + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u16, y: u16, word: u16) {
        self.words[y as usize * VRAM_WIDTH as usize + x as usize] = word;
    }

    /// Write `row_len`-wide rows of `words` starting at (x, y).
    fn blit(&mut self, x: u16, y: u16, row_len: usize, words: &[u16]) {
        if row_len == 0 {
            return;
        }
        for (r, row) in words.chunks_exact(row_len).enumerate() {
            let start = (y as usize + r) * VRAM_WIDTH as usize + x as usize;
            self.words[start..start + row_len].copy_from_slice(row);
        }
    }

    /// Copy out a region in raster order.
    pub fn read_rect(&self, rect: Rect) -> Vec<u16> {
        let mut out = Vec::with_capacity(rect.w as usize * rect.h as usize);
        for y in rect.y as usize..rect.bottom() as usize {
            let start = y * VRAM_WIDTH as usize + rect.x as usize;
            out.extend_from_slice(&self.words[start..start + rect.w as usize]);
        }
        out
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.words
    }
}

// ============================================================================
// Atlases and CLUTs
// ============================================================================

/// A fixed-size group of same-depth textures placed on the canvas as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureAtlas {
    bit_depth: BitDepth,
    /// Canvas position; `None` until placed
    origin: Option<(u16, u16)>,
    /// (texture index, in-atlas rect)
    entries: Vec<(usize, Rect)>,
    /// Atlas contents, width × 256, filled by materialization
    pixels: Vec<u16>,
}

impl TextureAtlas {
    fn new(bit_depth: BitDepth) -> Self {
        Self {
            bit_depth,
            origin: None,
            entries: Vec::new(),
            pixels: Vec::new(),
        }
    }

    #[inline]
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.bit_depth.atlas_width()
    }

    #[inline]
    pub fn height(&self) -> u16 {
        ATLAS_HEIGHT
    }

    /// Canvas rectangle covered by the atlas, once placed.
    pub fn rect(&self) -> Option<Rect> {
        self.origin.map(|(x, y)| Rect::new(x, y, self.width(), self.height()))
    }

    /// Texture indices with their in-atlas rectangles.
    pub fn entries(&self) -> &[(usize, Rect)] {
        &self.entries
    }

    /// Raster-order atlas contents (empty before materialization).
    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    /// First free position for a `w`×`h` block, scanning rows top-down.
    fn find_slot(&self, w: u16, h: u16) -> Option<Rect> {
        if w > self.width() || h > ATLAS_HEIGHT {
            return None;
        }
        for y in 0..=ATLAS_HEIGHT - h {
            for x in 0..=self.width() - w {
                let candidate = Rect::new(x, y, w, h);
                if self.entries.iter().all(|(_, r)| !r.intersects(&candidate)) {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

/// A one-row palette slot on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClutSlot {
    /// Owning texture
    pub texture: usize,
    pub rect: Rect,
}

/// Everything the allocator produced for one export.
#[derive(Debug, Clone)]
pub struct PackResult {
    /// Placed atlases only, in placement order
    pub atlases: Vec<TextureAtlas>,
    pub cluts: Vec<ClutSlot>,
    pub failures: Vec<PackingFailure>,
    pub canvas: VramCanvas,
}

impl PackResult {
    /// Every occupied rectangle: reserved regions, atlases, CLUTs.
    pub fn occupied(&self, reserved: &[Rect]) -> Vec<Rect> {
        reserved
            .iter()
            .copied()
            .chain(self.atlases.iter().filter_map(TextureAtlas::rect))
            .chain(self.cluts.iter().map(|c| c.rect))
            .collect()
    }
}

// ============================================================================
// Allocator
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct VramAllocator {
    reserved: Vec<Rect>,
}

impl VramAllocator {
    pub fn new(reserved: Vec<Rect>) -> Self {
        Self { reserved }
    }

    /// Place `textures` in VRAM, recording placements and CLUT positions on
    /// each texture that fully succeeded.
    pub fn pack(&self, textures: &mut [IndexedTexture]) -> PackResult {
        let mut failures = Vec::new();

        let mut atlases = build_atlases(textures, &mut failures);
        let placed = self.place_atlases(&mut atlases, &mut failures);
        let atlases: Vec<TextureAtlas> = atlases
            .into_iter()
            .zip(placed)
            .filter_map(|(atlas, ok)| ok.then_some(atlas))
            .collect();

        let cluts = self.allocate_cluts(textures, &atlases, &mut failures);

        // Commit placements once both atlas and CLUT (if any) succeeded
        for atlas in &atlases {
            let Some((ax, ay)) = atlas.origin else { continue };
            for &(index, local) in &atlas.entries {
                let texture = &mut textures[index];
                if texture.has_palette() {
                    match cluts.iter().find(|c| c.texture == index) {
                        Some(slot) => texture.set_clut(ClutPlacement {
                            x: slot.rect.x,
                            y: slot.rect.y,
                        }),
                        None => continue,
                    }
                }
                texture.set_placement(TexturePlacement {
                    packing_x: local.x,
                    packing_y: local.y,
                    texpage_x: (ax / TEXPAGE_WIDTH) as u8,
                    texpage_y: (ay / ATLAS_HEIGHT) as u8,
                });
            }
        }

        let mut result = PackResult {
            atlases,
            cluts,
            failures,
            canvas: VramCanvas::new(),
        };
        materialize(&mut result, textures);

        log::info!(
            "VRAM packed: {} atlases, {} CLUTs, {} failures",
            result.atlases.len(),
            result.cluts.len(),
            result.failures.len()
        );
        result
    }

    fn place_atlases(&self, atlases: &mut [TextureAtlas], failures: &mut Vec<PackingFailure>) -> Vec<bool> {
        let mut occupied: Vec<Rect> = self.reserved.clone();
        let mut placed = Vec::with_capacity(atlases.len());

        for (i, atlas) in atlases.iter_mut().enumerate() {
            let w = atlas.width();
            let origin = (0..=VRAM_HEIGHT - ATLAS_HEIGHT)
                .step_by(ATLAS_HEIGHT as usize)
                .flat_map(|y| {
                    (0..=VRAM_WIDTH - w)
                        .step_by(TEXPAGE_WIDTH as usize)
                        .map(move |x| (x, y))
                })
                .find(|&(x, y)| {
                    let candidate = Rect::new(x, y, w, ATLAS_HEIGHT);
                    occupied.iter().all(|r| !r.intersects(&candidate))
                });

            match origin {
                Some((x, y)) => {
                    log::debug!("{}-bit atlas {} placed at ({}, {})", atlas.bit_depth.bits(), i, x, y);
                    atlas.origin = Some((x, y));
                    occupied.push(Rect::new(x, y, w, ATLAS_HEIGHT));
                    placed.push(true);
                }
                None => {
                    let failure = PackingFailure {
                        item: PackedItem::Atlas(i),
                        reason: format!("no free {}x{} texpage-aligned area", w, ATLAS_HEIGHT),
                    };
                    log::warn!("{}", failure);
                    failures.push(failure);
                    for &(texture, _) in &atlas.entries {
                        let failure = PackingFailure {
                            item: PackedItem::Texture(texture),
                            reason: format!("atlas {} could not be placed", i),
                        };
                        log::warn!("{}", failure);
                        failures.push(failure);
                    }
                    placed.push(false);
                }
            }
        }
        placed
    }

    fn allocate_cluts(
        &self,
        textures: &[IndexedTexture],
        atlases: &[TextureAtlas],
        failures: &mut Vec<PackingFailure>,
    ) -> Vec<ClutSlot> {
        let mut occupied: Vec<Rect> = self.reserved.clone();
        occupied.extend(atlases.iter().filter_map(TextureAtlas::rect));
        let mut cluts = Vec::new();

        let mut needing: Vec<usize> = atlases
            .iter()
            .flat_map(|a| a.entries.iter().map(|&(t, _)| t))
            .filter(|&t| textures[t].has_palette())
            .collect();
        needing.sort_unstable();

        for index in needing {
            let len = textures[index].palette().map_or(0, |p| p.len()) as u16;
            let slot = (0..VRAM_WIDTH)
                .step_by(CLUT_ALIGN as usize)
                .flat_map(|x| (0..VRAM_HEIGHT).map(move |y| Rect::new(x, y, len, 1)))
                .find(|candidate| {
                    candidate.within_canvas() && occupied.iter().all(|r| !r.intersects(candidate))
                });

            match slot {
                Some(rect) => {
                    log::debug!("CLUT for texture {} at ({}, {}), {} entries", index, rect.x, rect.y, len);
                    occupied.push(rect);
                    cluts.push(ClutSlot { texture: index, rect });
                }
                None => {
                    let failure = PackingFailure {
                        item: PackedItem::Clut(index),
                        reason: format!("no free {}-entry CLUT row", len),
                    };
                    log::warn!("{}", failure);
                    failures.push(failure);
                }
            }
        }
        cluts
    }
}

/// Group textures by depth and pack each group into atlases.
fn build_atlases(textures: &[IndexedTexture], failures: &mut Vec<PackingFailure>) -> Vec<TextureAtlas> {
    let mut atlases = Vec::new();

    for depth in BitDepth::PACKING_ORDER {
        let mut group: Vec<usize> = (0..textures.len())
            .filter(|&i| textures[i].bit_depth() == depth)
            .collect();
        // stable: equal areas keep input order
        group.sort_by(|&a, &b| textures[b].area().cmp(&textures[a].area()));

        let mut current: Option<TextureAtlas> = None;
        for index in group {
            let texture = &textures[index];
            let (w, h) = (texture.quantized_width(), texture.height());
            if w == 0 || h == 0 {
                let failure = PackingFailure {
                    item: PackedItem::Texture(index),
                    reason: "texture has no pixels".to_string(),
                };
                log::warn!("{}", failure);
                failures.push(failure);
                continue;
            }
            if w > depth.atlas_width() as usize || h > ATLAS_HEIGHT as usize {
                let failure = PackingFailure {
                    item: PackedItem::Texture(index),
                    reason: format!(
                        "{}x{} words exceeds the {}x{} {}-bit atlas",
                        w,
                        h,
                        depth.atlas_width(),
                        ATLAS_HEIGHT,
                        depth.bits()
                    ),
                };
                log::warn!("{}", failure);
                failures.push(failure);
                continue;
            }
            let (w, h) = (w as u16, h as u16);

            let atlas = current.get_or_insert_with(|| TextureAtlas::new(depth));
            let slot = match atlas.find_slot(w, h) {
                Some(slot) => Some(slot),
                None => {
                    let full = std::mem::replace(atlas, TextureAtlas::new(depth));
                    atlases.push(full);
                    atlas.find_slot(w, h)
                }
            };

            match slot {
                Some(rect) => {
                    log::debug!("texture {} packed at ({}, {}) in {}-bit atlas", index, rect.x, rect.y, depth.bits());
                    atlas.entries.push((index, rect));
                }
                None => {
                    let failure = PackingFailure {
                        item: PackedItem::Texture(index),
                        reason: "no room in a fresh atlas".to_string(),
                    };
                    log::warn!("{}", failure);
                    failures.push(failure);
                }
            }
        }
        if let Some(atlas) = current {
            if !atlas.entries.is_empty() {
                atlases.push(atlas);
            }
        }
    }
    atlases
}

/// Copy texture words and palettes into the canvas, then snapshot each
/// atlas region.
fn materialize(result: &mut PackResult, textures: &[IndexedTexture]) {
    for atlas in &result.atlases {
        let Some((ax, ay)) = atlas.origin else { continue };
        for &(index, local) in &atlas.entries {
            let texture = &textures[index];
            if texture.placement().is_none() {
                continue;
            }
            result
                .canvas
                .blit(ax + local.x, ay + local.y, local.w as usize, texture.words());
        }
    }

    for slot in &result.cluts {
        if let Some(palette) = textures[slot.texture].palette() {
            let words: Vec<u16> = palette.iter().map(|p| p.pack()).collect();
            result.canvas.blit(slot.rect.x, slot.rect.y, words.len(), &words);
        }
    }

    for atlas in &mut result.atlases {
        if let Some(rect) = atlas.rect() {
            atlas.pixels = result.canvas.read_rect(rect);
        }
    }
}

/// Display buffer rectangles for the given resolution.
///
/// Buffer A sits at the origin. With dual buffering, buffer B sits at
/// (0, 256) when stacked vertically, otherwise directly right of A.
pub fn framebuffer_rects(resolution: [u16; 2], dual_buffering: bool, vertical_buffering: bool) -> Vec<Rect> {
    let [w, h] = resolution;
    let mut rects = vec![Rect::new(0, 0, w, h)];
    if dual_buffering {
        if vertical_buffering {
            rects.push(Rect::new(0, 256, w, h));
        } else {
            rects.push(Rect::new(w, 0, w, h));
        }
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::VramPixel;
    use proptest::prelude::*;

    fn indexed_texture(width: usize, height: usize, depth: BitDepth, colors: usize) -> IndexedTexture {
        let indices: Vec<u8> = (0..width * height).map(|i| (i % colors) as u8).collect();
        let palette: Vec<VramPixel> = (0..colors)
            .map(|i| VramPixel::new(i as u8, 31 - i as u8 % 32, 7, false))
            .collect();
        IndexedTexture::from_indices(width, height, depth, indices, palette).unwrap()
    }

    fn assert_no_overlap(rects: &[Rect]) {
        for (i, a) in rects.iter().enumerate() {
            assert!(a.within_canvas(), "{:?} outside canvas", a);
            for b in &rects[i + 1..] {
                assert!(!a.intersects(b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0, 0, 64, 64);
        assert!(a.intersects(&Rect::new(63, 63, 1, 1)));
        assert!(!a.intersects(&Rect::new(64, 0, 10, 10)));
        assert!(!a.intersects(&Rect::new(0, 64, 10, 10)));
        assert!(!a.intersects(&Rect::new(10, 10, 0, 5)));
        assert!(!Rect::new(1000, 0, 30, 1).within_canvas());
    }

    #[test]
    fn test_framebuffer_rects() {
        assert_eq!(
            framebuffer_rects([320, 240], true, true),
            vec![Rect::new(0, 0, 320, 240), Rect::new(0, 256, 320, 240)]
        );
        assert_eq!(
            framebuffer_rects([320, 240], true, false),
            vec![Rect::new(0, 0, 320, 240), Rect::new(320, 0, 320, 240)]
        );
        assert_eq!(framebuffer_rects([640, 480], false, false).len(), 1);
    }

    #[test]
    fn test_three_8bit_textures_avoid_reserved_corner() {
        let mut textures = vec![
            indexed_texture(32, 32, BitDepth::Eight, 200),
            indexed_texture(64, 64, BitDepth::Eight, 200),
            indexed_texture(128, 128, BitDepth::Eight, 200),
        ];
        let reserved = vec![Rect::new(0, 0, 64, 64)];
        let result = VramAllocator::new(reserved.clone()).pack(&mut textures);

        assert!(result.failures.is_empty(), "{:?}", result.failures);
        assert_eq!(result.atlases.len(), 1);
        assert!(textures.iter().all(|t| t.placement().is_some() && t.clut().is_some()));

        // canvas rectangles of every texture
        let atlas = &result.atlases[0];
        let origin = atlas.rect().unwrap();
        let mut placed: Vec<Rect> = atlas
            .entries()
            .iter()
            .map(|&(_, r)| Rect::new(origin.x + r.x, origin.y + r.y, r.w, r.h))
            .collect();
        placed.extend(reserved.iter().copied());
        assert_no_overlap(&placed);
        assert_no_overlap(&result.occupied(&reserved));
    }

    #[test]
    fn test_largest_texture_packed_first() {
        let mut textures = vec![
            indexed_texture(8, 8, BitDepth::Four, 4),
            indexed_texture(64, 16, BitDepth::Four, 4),
        ];
        let result = VramAllocator::default().pack(&mut textures);
        let entries = result.atlases[0].entries();
        assert_eq!(entries[0], (1, Rect::new(0, 0, 16, 16)));
        assert_eq!(entries[1], (0, Rect::new(16, 0, 2, 8)));
    }

    #[test]
    fn test_depth_order_and_texpages() {
        let mut textures = vec![
            indexed_texture(16, 16, BitDepth::Four, 16),
            indexed_texture(16, 16, BitDepth::Eight, 16),
        ];
        let result = VramAllocator::default().pack(&mut textures);
        assert_eq!(result.atlases.len(), 2);
        assert_eq!(result.atlases[0].bit_depth(), BitDepth::Eight);
        assert_eq!(result.atlases[0].rect(), Some(Rect::new(0, 0, 128, 256)));
        assert_eq!(result.atlases[1].rect(), Some(Rect::new(128, 0, 64, 256)));
        assert_eq!(textures[1].placement().unwrap().texpage_x, 0);
        assert_eq!(textures[0].placement().unwrap().texpage_x, 2);
        // column 0 is scanned top to bottom before moving right
        assert_eq!(textures[0].clut(), Some(ClutPlacement { x: 0, y: 256 }));
        assert_eq!(textures[1].clut(), Some(ClutPlacement { x: 0, y: 257 }));
    }

    #[test]
    fn test_overflow_opens_new_atlas() {
        let mut textures: Vec<IndexedTexture> =
            (0..3).map(|_| indexed_texture(256, 200, BitDepth::Four, 2)).collect();
        let result = VramAllocator::default().pack(&mut textures);
        assert!(result.failures.is_empty());
        assert_eq!(result.atlases.len(), 3);
    }

    #[test]
    fn test_oversized_texture_fails() {
        let mut textures = vec![indexed_texture(300, 10, BitDepth::Four, 2)];
        let result = VramAllocator::default().pack(&mut textures);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].item, PackedItem::Texture(0));
        assert!(textures[0].placement().is_none());
        assert!(result.atlases.is_empty());
    }

    #[test]
    fn test_atlas_placement_failure_is_reported() {
        // whole canvas reserved
        let reserved = vec![Rect::new(0, 0, VRAM_WIDTH, VRAM_HEIGHT)];
        let mut textures = vec![indexed_texture(8, 8, BitDepth::Four, 2)];
        let result = VramAllocator::new(reserved).pack(&mut textures);
        assert!(result.atlases.is_empty());
        assert!(result.failures.iter().any(|f| f.item == PackedItem::Atlas(0)));
        assert!(result.failures.iter().any(|f| f.item == PackedItem::Texture(0)));
        assert!(textures[0].placement().is_none());
    }

    #[test]
    fn test_materialize_writes_words_and_palette() {
        let mut textures = vec![indexed_texture(4, 2, BitDepth::Four, 3)];
        let result = VramAllocator::default().pack(&mut textures);
        let atlas = &result.atlases[0];
        // bottom source row is stored first
        assert_eq!(result.canvas.get(0, 0), textures[0].words()[0]);
        assert_eq!(result.canvas.get(0, 1), textures[0].words()[1]);
        assert_eq!(atlas.pixels().len(), 64 * 256);
        assert_eq!(atlas.pixels()[0], textures[0].words()[0]);
        assert_eq!(atlas.pixels()[64], textures[0].words()[1]);

        let clut = textures[0].clut().unwrap();
        let palette = textures[0].palette().unwrap();
        for (i, entry) in palette.iter().enumerate() {
            assert_eq!(result.canvas.get(clut.x + i as u16, clut.y), entry.pack());
        }
    }

    #[test]
    fn test_sixteen_bit_texture_needs_no_clut() {
        let image = crate::image::Image::from_rgb(2, 2, &[[1.0, 0.0, 0.0]; 4]).unwrap();
        let mut textures = vec![IndexedTexture::from_image(
            &image,
            BitDepth::Sixteen,
            &Default::default(),
        )];
        let result = VramAllocator::default().pack(&mut textures);
        assert!(result.cluts.is_empty());
        assert!(textures[0].placement().is_some());
        assert!(textures[0].clut().is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_placements_never_overlap(
            sizes in prop::collection::vec((1usize..=256, 1usize..=256, 0u8..3), 1..12),
            reserved_w in 0u16..=640,
            reserved_h in 0u16..=480,
        ) {
            let depths = [BitDepth::Four, BitDepth::Eight, BitDepth::Sixteen];
            let mut textures: Vec<IndexedTexture> = sizes
                .iter()
                .map(|&(w, h, d)| {
                    let depth = depths[d as usize];
                    if depth == BitDepth::Sixteen {
                        let image = crate::image::Image::from_rgb(w, h, &vec![[0.5; 3]; w * h]).unwrap();
                        IndexedTexture::from_image(&image, depth, &Default::default())
                    } else {
                        indexed_texture(w, h, depth, 2)
                    }
                })
                .collect();
            let reserved = vec![Rect::new(0, 0, reserved_w, reserved_h)];
            let result = VramAllocator::new(reserved.clone()).pack(&mut textures);

            let occupied = result.occupied(&reserved);
            for (i, a) in occupied.iter().enumerate() {
                prop_assert!(a.within_canvas());
                for b in &occupied[i + 1..] {
                    prop_assert!(!a.intersects(b), "{:?} overlaps {:?}", a, b);
                }
            }
            for atlas in &result.atlases {
                let entries = atlas.entries();
                for (i, (_, a)) in entries.iter().enumerate() {
                    prop_assert!(a.right() <= atlas.width() as u32 && a.bottom() <= 256);
                    for (_, b) in &entries[i + 1..] {
                        prop_assert!(!a.intersects(b));
                    }
                }
            }
        }
    }
}
