//! JSON scene manifest and texture loading

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::ImageReader;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use splashpack::image::Image;
use splashpack::quantize::QuantizeOptions;
use splashpack::scene::{ExportConfig, Mesh, NavTriangle, Scene, SceneObject, Transform, Triangle};
use splashpack::texture::{BitDepth, IndexedTexture};

/// Largest texture the atlases can hold, in texels
const MAX_TEXTURE_SIZE: u32 = 256;

#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub config: ExportConfig,
    #[serde(default)]
    pub textures: Vec<TextureEntry>,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
    #[serde(default)]
    pub navmesh: Vec<NavTriangle>,
}

#[derive(Debug, Deserialize)]
pub struct TextureEntry {
    /// Image path, relative to the manifest
    pub path: PathBuf,
    pub bit_depth: BitDepth,
    /// Resize to [width, height] before quantizing
    #[serde(default)]
    pub resize: Option<[u32; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub texture: Option<usize>,
    /// Missing means the object has no mesh
    #[serde(default)]
    pub triangles: Option<Vec<Triangle>>,
}

impl Manifest {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Failed to parse manifest {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load and quantize every texture, producing the scene to export.
    pub fn into_scene(self, base_dir: &Path, options: &QuantizeOptions) -> Result<Scene> {
        let mut textures = Vec::with_capacity(self.textures.len());
        for (i, entry) in self.textures.iter().enumerate() {
            let path = base_dir.join(&entry.path);
            let image = load_image(&path, entry.resize)
                .with_context(|| format!("Texture {} ({})", i, path.display()))?;
            let texture = IndexedTexture::from_image(&image, entry.bit_depth, options);
            log::info!(
                "texture {}: {} {}x{} at {}-bit",
                i,
                entry.path.display(),
                texture.width(),
                texture.height(),
                entry.bit_depth.bits()
            );
            textures.push(texture);
        }

        let objects = self
            .objects
            .into_iter()
            .map(|entry| SceneObject {
                name: entry.name,
                transform: entry.transform,
                mesh: entry.triangles.map(|triangles| Mesh { triangles }),
                texture: entry.texture,
            })
            .collect();

        Ok(Scene {
            objects,
            textures,
            navmesh: self.navmesh,
        })
    }
}

/// Decode an image file into a normalized RGB `Image`.
fn load_image(path: &Path, resize: Option<[u32; 2]>) -> Result<Image> {
    let mut img = ImageReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .with_guessed_format()
        .context("Failed to detect format")?
        .decode()
        .context("Failed to decode image")?;

    if let Some([w, h]) = resize {
        if w == 0 || h == 0 || w > MAX_TEXTURE_SIZE || h > MAX_TEXTURE_SIZE {
            bail!("resize target {}x{} must be between 1x1 and {}x{}", w, h, MAX_TEXTURE_SIZE, MAX_TEXTURE_SIZE);
        }
        img = img.resize_exact(w, h, FilterType::Lanczos3);
    }

    let rgb = img.to_rgb32f();
    let (width, height) = rgb.dimensions();
    Ok(Image::new(width as usize, height as usize, 3, rgb.into_raw())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_defaults() {
        let manifest = Manifest::from_json("{}").unwrap();
        assert!(manifest.textures.is_empty());
        assert_eq!(manifest.config, ExportConfig::default());
    }

    #[test]
    fn test_manifest_objects() {
        let manifest = Manifest::from_json(
            r#"{
                "config": {"gte_scaling": 50},
                "textures": [{"path": "brick.png", "bit_depth": 4, "resize": [64, 64]}],
                "objects": [
                    {"name": "wall", "texture": 0, "triangles": [
                        {"vertices": [
                            {"position": [0, 0, 0], "uv": [0, 0]},
                            {"position": [1, 0, 0], "uv": [63, 0]},
                            {"position": [0, 1, 0], "uv": [0, 63]}
                        ], "normal": [0, 0, -1]}
                    ]},
                    {"name": "marker"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(manifest.config.gte_scaling, 50.0);
        assert_eq!(manifest.textures[0].bit_depth, BitDepth::Four);
        assert_eq!(manifest.textures[0].resize, Some([64, 64]));

        let scene = Manifest {
            textures: Vec::new(),
            ..manifest
        }
        .into_scene(Path::new("."), &QuantizeOptions::default())
        .unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.objects[0].mesh.as_ref().unwrap().triangles.len(), 1);
        assert_eq!(scene.objects[0].mesh.as_ref().unwrap().triangles[0].vertices[1].uv, [63, 0]);
        assert!(scene.objects[1].mesh.is_none());
    }

    #[test]
    fn test_bad_bit_depth_is_rejected() {
        let err = Manifest::from_json(r#"{"textures": [{"path": "a.png", "bit_depth": 2}]}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("unsupported bit depth"));
    }
}
