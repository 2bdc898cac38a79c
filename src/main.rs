use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use serial_looper::{
    cli,
    config::Config,
    listener::ListenerResult,
    logging,
    looper::{Looper, PortInfo},
    mock::{MockLines, MockPort},
    records::{DataRecord, LineStatusRecord},
};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use tracing::{debug, info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = cli::Cli::parse();

    if let Some(command) = cli.command {
        return cli::handle_command(command);
    }

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    logging::init(level, cli.log_dir.map(|dir| (Level::DEBUG, dir))).await;

    let config = if let Some(config_path) = cli.config {
        debug!(?config_path, "Config from path");
        Config::new_from_path(config_path)?
    } else {
        debug!("Default config");
        Config::default()
    };

    let looper = Arc::new(Looper::new(config.looper, PortInfo::new(0, "mock"))?);
    let lines = MockLines::default();

    looper.start_data_loop(|record: DataRecord| -> ListenerResult {
        debug!(%record, "Data");
        Ok(())
    })?;
    looper.start_event_loop(
        |record: LineStatusRecord| -> ListenerResult {
            info!(%record, changed = %record.changed(), "Line event");
            Ok(())
        },
        &mut lines.clone(),
    )?;

    let mock = MockPort::spawn(Arc::clone(&looper), lines, config.mock);

    wait_for_shutdown().await?;

    let produced = mock.stop().await;
    looper.stop_data_loop()?;
    looper.stop_event_loop()?;

    info!(%produced, stats = ?looper.stats(), "Done");

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() -> Result<()> {
    let mut hangup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C, quitting")
        }
        _ = hangup.recv() => {
            info!("Told to hang up, quitting")
        }
    }

    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C, quitting");

    Ok(())
}
