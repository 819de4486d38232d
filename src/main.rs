// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Alumni Card
//!
//! A desktop application that collects alumni details, encodes them as a
//! QR code, and presents them on an interactive 3D card.

mod app;
mod config;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::AlumniCardApp;
use clap::Parser;
use config::AppConfig;
use std::path::PathBuf;

/// Command line options.
#[derive(Debug, Parser)]
#[command(name = "alumni-card", version, about)]
struct Args {
    /// YAML or JSON configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    let config = match args.config {
        Some(ref path) => io::serialization::import_config(path).map_err(|e| {
            log::error!("{:#}", e);
            e
        })?,
        None => AppConfig::default(),
    };

    if args.print_config {
        print!("{}", io::serialization::export_yaml(&config)?);
        return Ok(());
    }

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 760.0])
            .with_min_inner_size([640.0, 560.0])
            .with_drag_and_drop(true)
            .with_title("Alumni Card"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Alumni Card",
        options,
        Box::new(|_cc| Ok(Box::new(AlumniCardApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
