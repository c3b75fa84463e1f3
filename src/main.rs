use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use script_hub::paths::log_file;
use script_hub::{tui, FlatFile, HubPaths, Navigator, Stores, ThemeDir};

fn main() -> Result<()> {
    let paths = HubPaths::from_env();
    init_logging(&paths);
    tracing::info!("Script hub starting in {}", paths.root.display());

    let warnings = paths.ensure_dirs();
    let themes = ThemeDir::new(&paths.theme_dir);
    match themes.seed_presets() {
        Ok(0) => {}
        Ok(count) => tracing::info!("Wrote {count} theme presets to {}", themes.dir().display()),
        Err(err) => tracing::warn!("{err:#}"),
    }

    let stores = Stores {
        config: Box::new(FlatFile::new(&paths.config_file)),
        settings: Box::new(FlatFile::new(&paths.settings_file)),
        themes: Box::new(themes),
    };
    let mut nav = Navigator::new(paths, stores);
    nav.absorb(warnings);

    tui::run(&mut nav)?;
    tracing::info!("Script hub closed");
    Ok(())
}

/// Logs go to a file since the terminal belongs to the menu. Level comes from
/// `RUST_LOG`, default `info`.
fn init_logging(paths: &HubPaths) {
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file(paths))
    else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}
