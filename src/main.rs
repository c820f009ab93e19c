//! src/main.rs
//!
//! Entrypoint: parse flags, wire up logging, delegate to `app::run()`.

mod app;
mod chart;
mod cli;
mod net;
mod panels;
mod ui;

use clap::Parser;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = cli::Cli::parse();

    // Logging goes to a file or nowhere; stdout belongs to the UI.
    if let Some(path) = &cli.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        simplelog::WriteLogger::init(
            simplelog::LevelFilter::Debug,
            simplelog::Config::default(),
            file,
        )?;
    }

    app::run(cli)
}
