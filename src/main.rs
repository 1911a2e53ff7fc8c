//! Cardiotriage: heart-attack risk triage
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiotriage::adapters::sanitize::SanitizingMakeWriter;
use cardiotriage::config::TriageConfig;
use cardiotriage::tui::App;

fn main() -> Result<()> {
    let config = TriageConfig::from_env();

    // Logs on the terminal would corrupt the TUI's alternate screen, so an
    // interactive session logs to a file unless told otherwise.
    let interactive = std::io::stdout().is_terminal();
    let (writer, _guard) = if config.logging.mode.use_file(interactive) {
        let log_file = &config.logging.file;
        if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            // Best-effort; the open below reports the real failure.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Cardiotriage...");

    let mut app = App::new(&config.artifacts);
    app.run()?;

    tracing::info!("Cardiotriage shutdown complete.");
    Ok(())
}
