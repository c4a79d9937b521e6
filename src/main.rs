use std::path::{Path, PathBuf};
use std::process::ExitCode;

use shell_thumbnail::{Config, ThumbnailError, load_config};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: shell-thumbnail <file> [size | width height]";

fn config_path() -> PathBuf {
    std::env::var_os("SHELL_THUMBNAIL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

/// Apply `[size | width height]` on top of the configured size.
fn apply_size_args(config: &mut Config, args: &[String]) -> Result<(), String> {
    let parse = |s: &str| {
        s.parse::<u32>()
            .map_err(|e| format!("invalid size '{s}': {e}"))
    };
    match args {
        [] => {}
        [size] => {
            let size = parse(size)?;
            config.width = size;
            config.height = size;
        }
        [width, height] => {
            config.width = parse(width)?;
            config.height = parse(height)?;
        }
        _ => return Err(USAGE.to_string()),
    }
    Ok(())
}

#[cfg(windows)]
fn run(config: &Config, file: &Path) -> Result<PathBuf, ThumbnailError> {
    let bitmap = config.request_for(file).fetch()?;
    info!(
        "Thumbnail for '{}' is {}x{} ({:?})",
        file.display(),
        bitmap.width(),
        bitmap.height(),
        bitmap.format()
    );
    std::fs::create_dir_all(&config.output_dir)?;
    let out = config.output_path(file);
    bitmap.save_png(&out)?;
    Ok(out)
}

#[cfg(not(windows))]
fn run(_config: &Config, file: &Path) -> Result<PathBuf, ThumbnailError> {
    Err(ThumbnailError::Io(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!(
            "shell thumbnails need Windows, cannot read '{}'",
            file.display()
        ),
    )))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((file, size_args)) = args.split_first() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let config_path = config_path();
    info!("Loading config from '{}'...", config_path.display());
    let mut config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = apply_size_args(&mut config, size_args) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(&config, Path::new(file)) {
        Ok(out) => {
            info!("Wrote '{}'", out.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.code() {
                Some(code) => error!(hresult = code, "Failed to get thumbnail: {}", e),
                None => error!("Failed to get thumbnail: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}
