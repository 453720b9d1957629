//! Display Slots - hot-key display presets
//!
//! Entry point for the desktop application.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use displayslots::app::{AppOptions, DisplaySlotsApp, FatalSlot};
use displayslots::config::AppConfig;
use displayslots::{ui_channel, UiCommand};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "displayslots", version, about = "Hot-key display presets")]
struct Cli {
    /// Config file (default: <data_dir>/displayslots/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Milliseconds between automatic layout passes
    #[arg(short = 'i', long)]
    interval_ms: Option<u64>,

    /// Tray icon image
    #[arg(long)]
    icon: Option<PathBuf>,

    /// Start hidden in the system tray
    #[arg(short, long)]
    tray: bool,

    /// Print the config file path and exit
    #[arg(long)]
    print_config_path: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("displayslots=info".parse()?)
                .add_directive("displayslots_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(AppConfig::path);
    if cli.print_config_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    let mut config = AppConfig::load_from(&config_path);
    if let Some(ms) = cli.interval_ms {
        config.refresh_interval_ms = ms;
    }
    if let Some(icon) = cli.icon {
        config.tray_icon_path = Some(icon);
    }
    config
        .refresh_interval()
        .context("Invalid refresh interval")?;

    info!("Starting Display Slots v{}", displayslots::VERSION);

    let (dispatcher, inbox) = ui_channel();

    // Ctrl+C closes the window through the UI thread
    let signal_dispatcher = dispatcher.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        signal_dispatcher.post(UiCommand::Shutdown);
    }) {
        warn!(error = %e, "Failed to install Ctrl+C handler");
    }

    let fatal: FatalSlot = Arc::new(OnceLock::new());
    let app_fatal = Arc::clone(&fatal);
    let options = AppOptions {
        config,
        config_path,
        start_in_tray: cli.tray,
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Display Slots")
            .with_inner_size([320.0, 240.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Display Slots",
        native_options,
        Box::new(move |cc| {
            let app = DisplaySlotsApp::new(cc, options, dispatcher, inbox, app_fatal)?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("Event loop failed: {e}"))?;

    if let Some(error) = fatal.get() {
        return Err(anyhow!(error.clone())).context("Display Slots stopped");
    }

    info!("Display Slots exited");
    Ok(())
}
