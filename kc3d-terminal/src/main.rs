/// KC3D - terminal keycap configurator
///
/// Loads the product's STL models, renders them with an orbit camera, and
/// lets the user recolor the keycaps, legend text, and switch board from
/// swatch trays.
///
/// Usage: kc3d <model-dir> [--catalog <file>] [--slots <n>] [--no-board]
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use kc3d_core::{default_tray_specs, Catalog, Configurator};
use kc3d_terminal::TerminalApp;

#[derive(Parser, Debug)]
#[command(name = "kc3d")]
#[command(about = "Terminal keycap configurator (STL models, orbit camera, swatch trays)")]
struct Cli {
    /// Directory holding keycap.stl, text.stl, and switch-board-<n>.stl
    model_dir: PathBuf,

    /// Swatch catalog TOML; defaults to <model-dir>/catalog.toml when
    /// present, else a built-in colorway
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Keycap positions to start with
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=9))]
    slots: u8,

    /// Leave the switch-board slot empty
    #[arg(long)]
    no_board: bool,

    /// Disable camera auto-rotate
    #[arg(long)]
    no_auto_rotate: bool,

    /// Append logs to this file (the UI owns the terminal)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("warn");
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            env_logger::Builder::from_env(env)
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        None => {
            // Without a sink of their own, logs stay quiet unless RUST_LOG
            // asks for them; stderr shares the screen with the UI.
            env_logger::Builder::from_env(env)
                .filter_level(log::LevelFilter::Off)
                .init();
        }
    }
    Ok(())
}

fn load_catalog(cli: &Cli) -> anyhow::Result<Catalog> {
    if let Some(path) = &cli.catalog {
        return Catalog::from_path(path)
            .with_context(|| format!("loading catalog {}", path.display()));
    }
    let default_path = cli.model_dir.join("catalog.toml");
    if default_path.exists() {
        return Catalog::from_path(&default_path)
            .with_context(|| format!("loading catalog {}", default_path.display()));
    }
    Ok(Catalog::builtin())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let catalog = load_catalog(&cli)?;
    let cfg = Configurator::new(
        cli.model_dir.clone(),
        catalog,
        &default_tray_specs(),
        cli.slots as usize,
        !cli.no_board,
    )
    .context("building configurator session")?;

    let mut app = TerminalApp::new(cfg, !cli.no_auto_rotate)?;
    app.run()?;

    Ok(())
}
