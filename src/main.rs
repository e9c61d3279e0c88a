//! vfxe command line.
//!
//! With no mode flag a window opens. `RUST_LOG` controls logging.

use std::path::{Path, PathBuf};

use clap::{error::ErrorKind, Parser};

use vfxe::config::{AppConfig, DEFAULT_CONFIG_FILE};
use vfxe::renderer::HeadlessRenderer;
use vfxe::{snapshot, AppError};

/// Default step for headless runs without a configured fixed delta.
const HEADLESS_DELTA: f32 = 1.0 / 60.0;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug, PartialEq)]
#[command(name = "vfxe")]
#[command(about = "Visual Effects Engine")]
#[command(version)]
struct Args {
    /// Configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Effect started at launch
    #[arg(long)]
    effect: Option<String>,

    /// Run this many frames without a window
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u64>,

    /// Render the effect to a PNG and exit
    #[arg(long, value_name = "OUT.png")]
    snapshot: Option<PathBuf>,

    /// Window or snapshot size
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    size: Option<(u32, u32)>,

    /// Write the effective configuration and exit
    #[arg(long, value_name = "FILE")]
    write_config: Option<PathBuf>,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let bad = || format!("bad size '{}', expected WxH", s);
    let (w, h) = s.split_once('x').ok_or_else(bad)?;
    let w: u32 = w.parse().map_err(|_| bad())?;
    let h: u32 = h.parse().map_err(|_| bad())?;
    if w == 0 || h == 0 {
        return Err(bad());
    }
    Ok((w, h))
}

fn load_config(args: &Args) -> Result<AppConfig, AppError> {
    let mut config = match &args.config {
        // An explicit file must load
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default(DEFAULT_CONFIG_FILE),
    };
    if let Some(effect) = &args.effect {
        config.default_effect = effect.clone();
    }
    if let Some((w, h)) = args.size {
        config.window.width = w;
        config.window.height = h;
    }
    Ok(config)
}

fn run_headless(config: &AppConfig, frames: u64) {
    let mut driver = config.build_driver();
    let mut renderer = HeadlessRenderer::new(config.window.width, config.window.height);
    let delta = config.fixed_delta.unwrap_or(HEADLESS_DELTA);

    for _ in 0..frames {
        driver.frame_with_delta(delta, &mut renderer);
    }
    log::info!(
        "headless run: {} frames, {:.2}s simulated, last frame {:?}",
        renderer.frames(),
        driver.clock.elapsed(),
        renderer.last_frame()
    );
    driver.shutdown();
}

fn run_snapshot(config: &AppConfig, path: &Path) -> Result<(), AppError> {
    let mut driver = config.build_driver();
    let image = snapshot::render_effect(
        &driver.registry,
        &config.default_effect,
        &driver.camera,
        config.window.width,
        config.window.height,
        &config.grading,
    )?;
    snapshot::save(&image, path)?;
    driver.shutdown();
    Ok(())
}

fn run() -> Result<(), AppError> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{}", e);
            return Ok(());
        }
        Err(e) => return Err(AppError::Args(e.to_string())),
    };

    let config = load_config(&args)?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        log::info!("wrote config to {}", path.display());
        return Ok(());
    }
    if let Some(path) = &args.snapshot {
        return run_snapshot(&config, path);
    }
    if let Some(frames) = args.headless {
        run_headless(&config, frames);
        return Ok(());
    }
    vfxe::window::run(config)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("vfxe").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_snapshot_args() {
        let parsed = args(&["--snapshot", "out.png", "--effect", "raytrace", "--size", "320x180"]).unwrap();
        assert_eq!(parsed.snapshot, Some(PathBuf::from("out.png")));
        assert_eq!(parsed.effect.as_deref(), Some("raytrace"));
        assert_eq!(parsed.size, Some((320, 180)));
        assert_eq!(parsed.headless, None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(args(&["--headless"]).is_err());
        assert!(args(&["--headless", "many"]).is_err());
        assert!(args(&["--size", "10by10"]).is_err());
        assert!(args(&["--size", "0x10"]).is_err());
        assert!(args(&["--fullscreen"]).is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("64x32"), Ok((64, 32)));
        assert!(parse_size("64x0").is_err());
        assert!(parse_size("64").is_err());
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = args(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let parsed = args(&["--config", "/nonexistent/vfxe.json"]).unwrap();
        assert!(matches!(load_config(&parsed), Err(AppError::Config(_))));
    }

    #[test]
    fn test_cli_overrides_config() {
        let parsed = args(&["--effect", "fluid", "--size", "64x32"]).unwrap();
        let config = load_config(&parsed).unwrap();
        assert_eq!(config.default_effect, "fluid");
        assert_eq!((config.window.width, config.window.height), (64, 32));
    }
}
