//! Splashpack - scene bundle exporter CLI
//!
//! Pipeline: JSON manifest -> load + quantize textures -> pack VRAM ->
//! serialize bundle -> optional previews and report
//!
//! The bundle is assembled in memory and only written once the export
//! succeeded, so a failed run never leaves a truncated file behind.

mod args;
mod manifest;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

use manifest::Manifest;
use splashpack::error::ExportReport;
use splashpack::export_scene;
use splashpack::preview::{dump_clut_words, dump_texture_words, encode_texture_png, encode_vram_png};

fn init_logging(args: &Args) {
    let level = args.log_level().to_string().to_lowercase();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn write_report(path: &Path, report: &ExportReport) -> Result<()> {
    let json = serde_json::to_vec_pretty(report).context("Failed to encode report")?;
    write_file(path, &json)?;
    log::info!("report written to {}", path.display());
    Ok(())
}

fn run(args: &Args) -> Result<ExitCode> {
    let manifest = Manifest::from_path(&args.scene)?;
    let base_dir = args.scene.parent().unwrap_or_else(|| Path::new("."));

    let mut config = manifest.config.clone();
    if let Some(method) = args.dither {
        config.dither = method.to_dither_mode();
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }

    let scene = manifest.into_scene(base_dir, &config.quantize_options())?;
    let output = export_scene(&scene, &config).context("Export failed")?;

    if let Some(path) = &args.report {
        write_report(path, &output.report)?;
    }

    if let Some(path) = &args.vram_preview {
        let png = encode_vram_png(&output.pack.canvas).context("Failed to encode VRAM preview")?;
        write_file(path, &png)?;
    }

    if let Some(dir) = &args.texture_preview {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        for (i, texture) in output.textures.iter().enumerate() {
            if texture.width() == 0 || texture.height() == 0 {
                continue;
            }
            let png = encode_texture_png(texture).with_context(|| format!("Failed to encode texture {}", i))?;
            write_file(&dir.join(format!("texture_{:03}.png", i)), &png)?;
        }
    }

    if let Some(dir) = &args.texture_dump {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        for (i, texture) in output.textures.iter().enumerate() {
            write_file(&dir.join(format!("texture_{:03}.bin", i)), &dump_texture_words(texture))?;
            if let Some(clut) = dump_clut_words(texture) {
                write_file(&dir.join(format!("texture_{:03}_clut.bin", i)), &clut)?;
            }
        }
        log::info!("dumped {} textures to {}", output.textures.len(), dir.display());
    }

    let Some(bundle) = output.bundle else {
        for err in &output.report.invariant_errors {
            log::error!("{}", err);
        }
        log::error!("bundle not written: {}", args.output.display());
        return Ok(ExitCode::FAILURE);
    };
    write_file(&args.output, &bundle)?;
    log::info!("wrote {} bytes to {}", bundle.len(), args.output.display());

    if args.strict && !output.report.packing_failures.is_empty() {
        log::error!(
            "{} packing failures (--strict)",
            output.report.packing_failures.len()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
