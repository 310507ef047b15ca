//! Plain scene description handed to `export_scene`.
//!
//! The caller resolves everything up front: textures are already quantized,
//! vertex data is already shaded, and configuration is a plain struct.

use serde::{Deserialize, Serialize};

use crate::quantize::{DitherMode, QuantizeOptions};
use crate::texture::IndexedTexture;
use crate::vram::{framebuffer_rects, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: [f32; 3],
    /// Row-major 3×3 rotation matrix
    pub rotation: [[f32; 3]; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vertex {
    /// Model-space position in scene units
    pub position: [f32; 3],
    /// Pre-shaded vertex color
    pub color: [u8; 3],
    /// Texel coordinate inside the texture
    pub uv: [u8; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    /// Unit face normal
    pub normal: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    /// Index into `Scene::textures`; `None` for untextured objects
    pub texture: Option<usize>,
}

/// Navigation mesh triangle, world-space positions in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NavTriangle {
    pub vertices: [[f32; 3]; 3],
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub textures: Vec<IndexedTexture>,
    pub navmesh: Vec<NavTriangle>,
}

// ============================================================================
// Export configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Display resolution in pixels
    pub resolution: [u16; 2],
    pub dual_buffering: bool,
    /// Stack the second buffer below the first instead of beside it
    pub vertical_buffering: bool,
    /// Extra VRAM regions the allocator must leave alone
    pub reserved: Vec<Rect>,
    /// Scene units per GTE unit
    pub gte_scaling: f32,
    pub dither: DitherMode,
    pub max_iterations: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            resolution: [320, 240],
            dual_buffering: true,
            vertical_buffering: true,
            reserved: Vec::new(),
            gte_scaling: 100.0,
            dither: DitherMode::default(),
            max_iterations: 10,
        }
    }
}

impl ExportConfig {
    /// Framebuffers followed by user regions.
    pub fn reserved_regions(&self) -> Vec<Rect> {
        let mut regions = framebuffer_rects(self.resolution, self.dual_buffering, self.vertical_buffering);
        regions.extend(self.reserved.iter().copied());
        regions
    }

    pub fn quantize_options(&self) -> QuantizeOptions {
        QuantizeOptions {
            max_iterations: self.max_iterations,
            dither: self.dither,
            ..Default::default()
        }
    }
}
