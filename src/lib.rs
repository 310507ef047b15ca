//! Splashpack - scene exporter for fixed-function console renderers
//!
//! Turns a plain scene description (objects, quantized textures, shaded
//! triangles) into a single binary bundle:
//! - textures are reduced to 4/8-bit palettes or 5-5-5 direct color
//! - textures, atlases and CLUTs are laid out in a 1024×512 VRAM canvas
//! - geometry is converted to 3.12 fixed point and written together with the
//!   VRAM blocks and an offset table
//!
//! Every stage is a plain function over explicit structs; only the CLI binary
//! touches the filesystem.

pub mod color;
pub mod error;
pub mod fixed;
pub mod image;
pub mod kdtree;
pub mod preview;
pub mod quantize;
pub mod scene;
pub mod serialize;
pub mod texture;
pub mod tpage;
pub mod vram;

use std::io::Cursor;

use error::{ExportError, ExportReport, InputError, SerializeError};
use fixed::{matrix_to_fixed12, to_fixed12};
use scene::{ExportConfig, Scene, SceneObject, Triangle};
use serialize::{serialize_bundle, AtlasRecord, Bundle, ClutRecord, NavRecord, ObjectRecord, TriangleRecord};
use texture::IndexedTexture;
use tpage::TexpageAttr;
use vram::{PackResult, VramAllocator};

/// Result of a completed export pass.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    /// Bundle bytes; `None` when the report is fatal
    pub bundle: Option<Vec<u8>>,
    pub report: ExportReport,
    /// VRAM layout and canvas contents
    pub pack: PackResult,
    /// Scene textures with their placements filled in
    pub textures: Vec<IndexedTexture>,
}

/// Pack, convert and serialize `scene`.
///
/// Packing failures and broken object references end up in the report; the
/// affected assets are left out. A placeholder/block mismatch produces no
/// bundle at all.
pub fn export_scene(scene: &Scene, config: &ExportConfig) -> Result<ExportOutput, ExportError> {
    let mut report = ExportReport::default();

    let mut textures = scene.textures.clone();
    let pack = VramAllocator::new(config.reserved_regions()).pack(&mut textures);
    report.packing_failures = pack.failures.clone();

    let mut objects = Vec::with_capacity(scene.objects.len());
    for object in &scene.objects {
        match convert_object(object, &textures, config.gte_scaling) {
            Ok((record, dropped)) => {
                if let Some(err) = dropped {
                    log::warn!("{}", err);
                    report.input_errors.push(err);
                }
                objects.push(record);
            }
            Err(err) => {
                log::warn!("skipping object: {}", err);
                report.input_errors.push(err);
            }
        }
    }

    let atlases = pack
        .atlases
        .iter()
        .filter_map(|atlas| {
            atlas.rect().map(|rect| AtlasRecord {
                rect,
                pixels: atlas.pixels().to_vec(),
            })
        })
        .collect();

    let cluts = pack
        .cluts
        .iter()
        .map(|slot| ClutRecord {
            x: slot.rect.x,
            y: slot.rect.y,
            palette: textures[slot.texture]
                .palette()
                .map(|p| p.iter().map(|e| e.pack()).collect())
                .unwrap_or_default(),
        })
        .collect();

    let navmesh: Vec<NavRecord> = scene
        .navmesh
        .iter()
        .map(|tri| tri.vertices.map(|v| scale_position(v, config.gte_scaling)))
        .collect();

    let bundle = Bundle {
        objects,
        atlases,
        cluts,
        navmesh,
    };

    let mut out = Cursor::new(Vec::new());
    let bytes = match serialize_bundle(&mut out, &bundle) {
        Ok(_) => Some(out.into_inner()),
        Err(SerializeError::Invariant(err)) => {
            log::error!("{}", err);
            report.invariant_errors.push(err);
            None
        }
        Err(SerializeError::Io(err)) => return Err(ExportError::Io(err)),
        Err(err @ SerializeError::TooMany { .. }) => return Err(ExportError::SceneTooLarge(err.to_string())),
    };

    log::info!(
        "export finished: {} objects, {} packing failures, {} input errors",
        bundle.objects.len(),
        report.packing_failures.len(),
        report.input_errors.len()
    );

    Ok(ExportOutput {
        bundle: bytes,
        report,
        pack,
        textures,
    })
}

fn scale_position(v: [f32; 3], gte_scaling: f32) -> [i16; 3] {
    v.map(|c| to_fixed12(c / gte_scaling))
}

/// Convert one object. On success, also returns the error describing any
/// triangles that had to be dropped.
fn convert_object(
    object: &SceneObject,
    textures: &[IndexedTexture],
    gte_scaling: f32,
) -> Result<(ObjectRecord, Option<InputError>), InputError> {
    let mesh = object.mesh.as_ref().ok_or_else(|| InputError::MissingMesh {
        object: object.name.clone(),
    })?;

    let texture = match object.texture {
        Some(index) => Some((
            index,
            textures.get(index).ok_or_else(|| InputError::MissingTexture {
                object: object.name.clone(),
                texture: index,
            })?,
        )),
        None => None,
    };

    let mut dropped = None;
    let triangles = match texture {
        Some((index, texture)) if texture.placement().is_none() => {
            if !mesh.triangles.is_empty() {
                dropped = Some(InputError::UnplacedTexture {
                    object: object.name.clone(),
                    texture: index,
                    triangles: mesh.triangles.len(),
                });
            }
            Vec::new()
        }
        Some((_, texture)) => mesh
            .triangles
            .iter()
            .map(|tri| convert_triangle(tri, Some(texture), gte_scaling))
            .collect(),
        None => mesh
            .triangles
            .iter()
            .map(|tri| convert_triangle(tri, None, gte_scaling))
            .collect(),
    };

    let position = scale_position(object.transform.position, gte_scaling).map(i32::from);
    let rotation = matrix_to_fixed12(&object.transform.rotation).map(|row| row.map(i32::from));

    log::debug!("object '{}': {} triangles", object.name, triangles.len());
    Ok((
        ObjectRecord {
            position,
            rotation,
            triangles,
        },
        dropped,
    ))
}

fn convert_triangle(tri: &Triangle, texture: Option<&IndexedTexture>, gte_scaling: f32) -> TriangleRecord {
    let mut record = TriangleRecord {
        positions: tri.vertices.map(|v| scale_position(v.position, gte_scaling)),
        normal: tri.normal.map(to_fixed12),
        colors: tri.vertices.map(|v| v.color),
        uvs: tri.vertices.map(|v| v.uv),
        tpage: TexpageAttr::new().dithered(true).bits(),
        clut: [0, 0],
    };

    if let Some(texture) = texture {
        if let Some(placement) = texture.placement() {
            let depth = texture.bit_depth();
            let u_offset = (placement.packing_x as usize * depth.pixels_per_word()).min(u8::MAX as usize) as u8;
            let v_offset = placement.packing_y.min(u8::MAX as u16) as u8;
            for uv in &mut record.uvs {
                uv[0] = uv[0].saturating_add(u_offset);
                uv[1] = uv[1].saturating_add(v_offset);
            }
            record.tpage = TexpageAttr::new()
                .page_x(placement.texpage_x)
                .page_y(placement.texpage_y)
                .color_mode(depth)
                .dithered(true)
                .bits();
        }
        if let Some(clut) = texture.clut() {
            record.clut = [clut.x, clut.y];
        }
    }
    record
}
