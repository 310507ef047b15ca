//! Scene bundle writer.
//!
//! Layout, all little-endian:
//! - header (12 bytes): `b"SP"`, version, object/atlas/CLUT counts,
//!   navmesh triangle count
//! - object metadata (56 bytes each)
//! - atlas metadata (12 bytes each)
//! - CLUT metadata (12 bytes each)
//! - mesh blocks, atlas blocks, CLUT blocks, then the optional navmesh block,
//!   each starting on a 4-byte boundary
//!
//! Metadata entries carry an i32 placeholder for their data block's absolute
//! offset. Placeholders are recorded as they are written and filled in once
//! every block has been emitted.

use std::io::{Seek, SeekFrom, Write};

use crate::error::{BlockKind, SerializationInvariantError, SerializeError};
use crate::vram::Rect;

pub const MAGIC: [u8; 2] = *b"SP";
pub const VERSION: u16 = 1;

pub const HEADER_SIZE: usize = 12;
pub const OBJECT_META_SIZE: usize = 56;
pub const ATLAS_META_SIZE: usize = 12;
pub const CLUT_META_SIZE: usize = 12;
pub const TRIANGLE_SIZE: usize = 52;
pub const NAV_TRIANGLE_SIZE: usize = 18;
/// CLUT blocks always hold a full 8-bit palette
pub const CLUT_BLOCK_ENTRIES: usize = 256;
pub const BLOCK_ALIGN: u64 = 4;

// ============================================================================
// Records
// ============================================================================

/// One triangle in device format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriangleRecord {
    pub positions: [[i16; 3]; 3],
    pub normal: [i16; 3],
    pub colors: [[u8; 3]; 3],
    /// Atlas-relative texel coordinates
    pub uvs: [[u8; 2]; 3],
    pub tpage: u16,
    pub clut: [u16; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectRecord {
    pub position: [i32; 3],
    pub rotation: [[i32; 3]; 3],
    pub triangles: Vec<TriangleRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasRecord {
    pub rect: Rect,
    /// width × height words, raster order
    pub pixels: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClutRecord {
    pub x: u16,
    pub y: u16,
    pub palette: Vec<u16>,
}

pub type NavRecord = [[i16; 3]; 3];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    pub objects: Vec<ObjectRecord>,
    pub atlases: Vec<AtlasRecord>,
    pub cluts: Vec<ClutRecord>,
    pub navmesh: Vec<NavRecord>,
}

// ============================================================================
// Little-endian helpers
// ============================================================================

trait WriteLe: Write {
    fn put_u16(&mut self, v: u16) -> std::io::Result<()> {
        self.write_all(&v.to_le_bytes())
    }

    fn put_i16(&mut self, v: i16) -> std::io::Result<()> {
        self.write_all(&v.to_le_bytes())
    }

    fn put_i32(&mut self, v: i32) -> std::io::Result<()> {
        self.write_all(&v.to_le_bytes())
    }
}

impl<W: Write + ?Sized> WriteLe for W {}

/// Zero-pad the stream to the next 4-byte boundary.
fn align<W: Write + Seek>(out: &mut W) -> std::io::Result<u64> {
    let pos = out.stream_position()?;
    let pad = (BLOCK_ALIGN - pos % BLOCK_ALIGN) % BLOCK_ALIGN;
    out.write_all(&[0u8; BLOCK_ALIGN as usize][..pad as usize])?;
    Ok(pos + pad)
}

// ============================================================================
// Offset table
// ============================================================================

/// Placeholder positions and block start offsets, per block kind.
#[derive(Debug, Default)]
pub struct OffsetTable {
    placeholders: [Vec<u64>; 3],
    blocks: [Vec<u64>; 3],
}

fn slot(kind: BlockKind) -> usize {
    match kind {
        BlockKind::Mesh => 0,
        BlockKind::Atlas => 1,
        BlockKind::Clut => 2,
    }
}

const KINDS: [BlockKind; 3] = [BlockKind::Mesh, BlockKind::Atlas, BlockKind::Clut];

impl OffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a zero i32 placeholder and remember where it went.
    pub fn reserve<W: Write + Seek>(&mut self, kind: BlockKind, out: &mut W) -> std::io::Result<()> {
        let pos = out.stream_position()?;
        self.placeholders[slot(kind)].push(pos);
        out.put_i32(0)
    }

    /// Align the stream and record the start of the next block.
    pub fn mark_block<W: Write + Seek>(&mut self, kind: BlockKind, out: &mut W) -> std::io::Result<u64> {
        let pos = align(out)?;
        self.blocks[slot(kind)].push(pos);
        Ok(pos)
    }

    pub fn placeholder_count(&self, kind: BlockKind) -> usize {
        self.placeholders[slot(kind)].len()
    }

    pub fn block_count(&self, kind: BlockKind) -> usize {
        self.blocks[slot(kind)].len()
    }

    /// Check that every placeholder has a block and vice versa.
    pub fn validate(&self) -> Result<(), SerializationInvariantError> {
        for kind in KINDS {
            let (placeholders, blocks) = (self.placeholder_count(kind), self.block_count(kind));
            if placeholders != blocks {
                return Err(SerializationInvariantError {
                    kind,
                    placeholders,
                    blocks,
                });
            }
        }
        Ok(())
    }

    /// Overwrite every placeholder with its block offset, then return to the
    /// end of the stream. Nothing is written if validation fails.
    pub fn backfill<W: Write + Seek>(&self, out: &mut W) -> Result<(), SerializeError> {
        self.validate()?;
        let end = out.seek(SeekFrom::End(0))?;
        for kind in KINDS {
            let i = slot(kind);
            for (&at, &offset) in self.placeholders[i].iter().zip(&self.blocks[i]) {
                let offset = i32::try_from(offset).map_err(|_| SerializeError::TooMany {
                    what: "bundle byte",
                    count: offset as usize,
                    limit: i32::MAX as usize,
                })?;
                out.seek(SeekFrom::Start(at))?;
                out.put_i32(offset)?;
            }
        }
        out.seek(SeekFrom::Start(end))?;
        Ok(())
    }
}

// ============================================================================
// Writer
// ============================================================================

fn count_u16(what: &'static str, count: usize) -> Result<u16, SerializeError> {
    u16::try_from(count).map_err(|_| SerializeError::TooMany {
        what,
        count,
        limit: u16::MAX as usize,
    })
}

/// Write `bundle` to `out`, returning the number of bytes written.
pub fn serialize_bundle<W: Write + Seek>(out: &mut W, bundle: &Bundle) -> Result<u64, SerializeError> {
    let start = out.stream_position()?;
    let mut table = OffsetTable::new();

    // Header
    out.write_all(&MAGIC)?;
    out.put_u16(VERSION)?;
    out.put_u16(count_u16("object", bundle.objects.len())?)?;
    out.put_u16(count_u16("atlas", bundle.atlases.len())?)?;
    out.put_u16(count_u16("CLUT", bundle.cluts.len())?)?;
    out.put_u16(count_u16("navmesh triangle", bundle.navmesh.len())?)?;

    // Metadata
    for object in &bundle.objects {
        for v in object.position {
            out.put_i32(v)?;
        }
        for row in object.rotation {
            for v in row {
                out.put_i32(v)?;
            }
        }
        table.reserve(BlockKind::Mesh, out)?;
        let triangles = i32::try_from(object.triangles.len()).map_err(|_| SerializeError::TooMany {
            what: "triangle",
            count: object.triangles.len(),
            limit: i32::MAX as usize,
        })?;
        out.put_i32(triangles)?;
    }

    for atlas in &bundle.atlases {
        table.reserve(BlockKind::Atlas, out)?;
        out.put_u16(atlas.rect.w)?;
        out.put_u16(atlas.rect.h)?;
        out.put_u16(atlas.rect.x)?;
        out.put_u16(atlas.rect.y)?;
    }

    for clut in &bundle.cluts {
        if clut.palette.len() > CLUT_BLOCK_ENTRIES {
            return Err(SerializeError::TooMany {
                what: "palette entry",
                count: clut.palette.len(),
                limit: CLUT_BLOCK_ENTRIES,
            });
        }
        table.reserve(BlockKind::Clut, out)?;
        out.put_u16(clut.x)?;
        out.put_u16(clut.y)?;
        out.put_u16(clut.palette.len() as u16)?;
        out.put_u16(0)?;
    }

    // Data blocks
    for object in &bundle.objects {
        table.mark_block(BlockKind::Mesh, out)?;
        for tri in &object.triangles {
            write_triangle(out, tri)?;
        }
    }

    for atlas in &bundle.atlases {
        table.mark_block(BlockKind::Atlas, out)?;
        for &word in &atlas.pixels {
            out.put_u16(word)?;
        }
    }

    for clut in &bundle.cluts {
        table.mark_block(BlockKind::Clut, out)?;
        for i in 0..CLUT_BLOCK_ENTRIES {
            out.put_u16(clut.palette.get(i).copied().unwrap_or(0))?;
        }
    }

    if !bundle.navmesh.is_empty() {
        align(out)?;
        for tri in &bundle.navmesh {
            for vertex in tri {
                for &v in vertex {
                    out.put_i16(v)?;
                }
            }
        }
    }

    table.backfill(out)?;
    let end = out.stream_position()?;
    log::info!(
        "bundle written: {} objects, {} atlases, {} CLUTs, {} bytes",
        bundle.objects.len(),
        bundle.atlases.len(),
        bundle.cluts.len(),
        end - start
    );
    Ok(end - start)
}

fn write_triangle<W: Write>(out: &mut W, tri: &TriangleRecord) -> std::io::Result<()> {
    for vertex in tri.positions {
        for v in vertex {
            out.put_i16(v)?;
        }
    }
    for v in tri.normal {
        out.put_i16(v)?;
    }
    for [r, g, b] in tri.colors {
        out.write_all(&[r, g, b, 0])?;
    }
    for [u, v] in tri.uvs {
        out.write_all(&[u, v])?;
    }
    out.put_u16(0)?;
    out.put_u16(tri.tpage)?;
    out.put_u16(tri.clut[0])?;
    out.put_u16(tri.clut[1])?;
    out.put_u16(0)
}
