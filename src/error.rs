//! Error and diagnostic types for the export pipeline.
//!
//! Only two things abort an export: an I/O failure on the output stream and a
//! placeholder/data-block count mismatch in the serializer. Everything else
//! (textures that don't fit, objects with broken references) is recorded in an
//! [`ExportReport`] and the export carries on without the affected asset.

use serde::Serialize;
use std::fmt;

/// Which offset table a placeholder or data block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Mesh,
    Atlas,
    Clut,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Mesh => write!(f, "mesh"),
            BlockKind::Atlas => write!(f, "atlas"),
            BlockKind::Clut => write!(f, "clut"),
        }
    }
}

/// Placeholder count and data block count disagree for one block kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind} offset table mismatch: {placeholders} placeholders, {blocks} data blocks")]
pub struct SerializationInvariantError {
    pub kind: BlockKind,
    pub placeholders: usize,
    pub blocks: usize,
}

/// Item the allocator could not place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "item", content = "index")]
pub enum PackedItem {
    /// Index into the texture list handed to the allocator
    Texture(usize),
    /// Index into the allocator's atlas list
    Atlas(usize),
    /// CLUT of the texture with this index
    Clut(usize),
}

/// Non-fatal placement failure for a single texture, atlas or CLUT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("could not place {item:?}: {reason}")]
pub struct PackingFailure {
    pub item: PackedItem,
    pub reason: String,
}

/// Problem with an exported object's references. The object (or the
/// triangles involved) is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum InputError {
    #[error("object '{object}' has no mesh")]
    MissingMesh { object: String },

    #[error("object '{object}' references missing texture {texture}")]
    MissingTexture { object: String, texture: usize },

    #[error("object '{object}': {triangles} triangles dropped, texture {texture} was not placed in VRAM")]
    UnplacedTexture {
        object: String,
        texture: usize,
        triangles: usize,
    },
}

/// Errors returned by the bundle serializer.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("I/O error while writing bundle: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Invariant(#[from] SerializationInvariantError),

    #[error("{what} count {count} does not fit the bundle's {limit} limit")]
    TooMany {
        what: &'static str,
        count: usize,
        limit: usize,
    },
}

/// Errors that abort `export_scene`.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("scene too large: {0}")]
    SceneTooLarge(String),
}

/// Diagnostics gathered over one export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub packing_failures: Vec<PackingFailure>,
    pub input_errors: Vec<InputError>,
    pub invariant_errors: Vec<SerializationInvariantError>,
}

impl ExportReport {
    /// True when the bundle was not produced.
    pub fn is_fatal(&self) -> bool {
        !self.invariant_errors.is_empty()
    }

    /// True when nothing at all went wrong.
    pub fn is_clean(&self) -> bool {
        self.packing_failures.is_empty()
            && self.input_errors.is_empty()
            && self.invariant_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_error_message() {
        let err = SerializationInvariantError {
            kind: BlockKind::Atlas,
            placeholders: 3,
            blocks: 2,
        };
        assert_eq!(
            err.to_string(),
            "atlas offset table mismatch: 3 placeholders, 2 data blocks"
        );
    }

    #[test]
    fn test_report_fatality() {
        let mut report = ExportReport::default();
        assert!(report.is_clean());
        assert!(!report.is_fatal());

        report.packing_failures.push(PackingFailure {
            item: PackedItem::Texture(0),
            reason: "too wide".to_string(),
        });
        assert!(!report.is_clean());
        assert!(!report.is_fatal());

        report.invariant_errors.push(SerializationInvariantError {
            kind: BlockKind::Mesh,
            placeholders: 1,
            blocks: 0,
        });
        assert!(report.is_fatal());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = ExportReport {
            packing_failures: vec![PackingFailure {
                item: PackedItem::Clut(4),
                reason: "no free row".to_string(),
            }],
            input_errors: vec![InputError::MissingMesh {
                object: "crate".to_string(),
            }],
            invariant_errors: Vec::new(),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"item\":\"clut\""));
        assert!(json.contains("\"kind\":\"missing_mesh\""));
    }
}
