//! Command-line argument definitions and type conversions

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

use splashpack::quantize::DitherMode;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DitherMethod {
    /// Floyd-Steinberg with standard left-to-right scanning
    FsStandard,
    /// Floyd-Steinberg with serpentine (alternating) scanning
    FsSerpentine,
    /// No error diffusion - each pixel mapped to its nearest palette entry
    None,
}

impl DitherMethod {
    pub fn to_dither_mode(self) -> DitherMode {
        match self {
            DitherMethod::FsStandard => DitherMode::FloydSteinberg,
            DitherMethod::FsSerpentine => DitherMode::FloydSteinbergSerpentine,
            DitherMethod::None => DitherMode::None,
        }
    }
}

// ============================================================================
// Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "splashpack")]
#[command(author, version, about = "Splashpack - scene bundle exporter", long_about = None)]
pub struct Args {
    /// Scene manifest (JSON)
    #[arg(short, long)]
    pub scene: PathBuf,

    /// Output bundle path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write the packed VRAM canvas as a PNG
    #[arg(long, value_name = "PNG")]
    pub vram_preview: Option<PathBuf>,

    /// Write every quantized texture as a PNG into this directory
    #[arg(long, value_name = "DIR")]
    pub texture_preview: Option<PathBuf>,

    /// Write every texture's raw VRAM words and CLUT words into this directory
    #[arg(long, value_name = "DIR")]
    pub texture_dump: Option<PathBuf>,

    /// Write the export report as JSON
    #[arg(long, value_name = "JSON")]
    pub report: Option<PathBuf>,

    /// Treat packing failures as errors
    #[arg(long)]
    pub strict: bool,

    /// Override the manifest's dithering method
    #[arg(long, value_enum)]
    pub dither: Option<DitherMethod>,

    /// Override the manifest's K-Means iteration cap
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn log_level(&self) -> log::LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => log::LevelFilter::Warn,
            (false, 0) => log::LevelFilter::Info,
            (false, 1) => log::LevelFilter::Debug,
            (false, _) => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let args = Args::try_parse_from(["splashpack", "--scene", "scene.json", "-o", "out.bin"]).unwrap();
        assert_eq!(args.scene, PathBuf::from("scene.json"));
        assert!(!args.strict);
        assert_eq!(args.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_verbosity_flags() {
        let args = Args::try_parse_from(["splashpack", "-s", "a.json", "-o", "b", "-vv"]).unwrap();
        assert_eq!(args.log_level(), log::LevelFilter::Trace);
        let args = Args::try_parse_from(["splashpack", "-s", "a.json", "-o", "b", "-q"]).unwrap();
        assert_eq!(args.log_level(), log::LevelFilter::Warn);
        assert!(Args::try_parse_from(["splashpack", "-s", "a.json", "-o", "b", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_texture_dump_dir() {
        let args =
            Args::try_parse_from(["splashpack", "-s", "a.json", "-o", "b", "--texture-dump", "dump"]).unwrap();
        assert_eq!(args.texture_dump, Some(PathBuf::from("dump")));
        assert_eq!(args.texture_preview, None);
    }

    #[test]
    fn test_dither_override() {
        let args =
            Args::try_parse_from(["splashpack", "-s", "a.json", "-o", "b", "--dither", "fs-serpentine"]).unwrap();
        assert_eq!(
            args.dither.map(DitherMethod::to_dither_mode),
            Some(DitherMode::FloydSteinbergSerpentine)
        );
    }
}
