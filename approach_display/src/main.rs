pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod flight_finder;
pub(crate) mod poll_loop;
pub(crate) mod render;
pub(crate) mod runway_monitor;
pub(crate) mod selector;
pub(crate) mod source;
pub(crate) mod weather_monitor;

use std::{io, path::PathBuf};

use clap::Parser;
use crate::config::{LogFormat, PortalConfig};
use error::ApplicationResult;
use flight_finder::FlightFinder;
use jiff::Timestamp;
use poll_loop::{PollLoop, PollTiming};
use render::ConsoleRenderer;
use runway_monitor::RunwayMonitor;
use selector::DisplaySelector;
use source::HttpSource;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use weather_monitor::WeatherMonitor;

#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[clap(long, short)]
    /// Rewrites the config file with the bundled defaults
    clean_config: bool,
    #[clap(long)]
    /// Reads the config from this file instead of the user config directory
    config: Option<PathBuf>,
    #[clap(long)]
    /// Runs a single display cycle and exits
    once: bool,
    #[clap(long)]
    /// Prints the effective config and exits
    show_config: bool,
}

/// Console logging goes to stderr so it never mixes with the display output.
/// The returned guard flushes the log file when dropped.
fn init_tracing(config: &PortalConfig) -> ApplicationResult<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.log_level())?,
    };
    let console = match config.log_format() {
        LogFormat::Pretty => fmt::layer().with_writer(io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(io::stderr).boxed(),
    };
    let (file, guard) = match config.log_directory() {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "approach_display.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    Ok(guard)
}

async fn run(config: PortalConfig, once: bool) -> ApplicationResult<()> {
    let client = reqwest::ClientBuilder::new()
        .connect_timeout(config.connection_timeout())
        .timeout(config.connection_timeout())
        .build()?;
    let advisory = HttpSource::new(client.clone(), config.advisory_url());
    let weather = HttpSource::new(client.clone(), config.weather_url());
    let feed = HttpSource::new(client, config.flight_feed_url())
        .with_headers(config.request_headers()?);

    let selector = DisplaySelector::new(
        RunwayMonitor::new(advisory, config.monitored_runway(), config.runway_ttl()),
        WeatherMonitor::new(weather, config.weather_ttl()),
        FlightFinder::new(
            feed,
            config.max_approach_altitude_ft(),
            config.airport_code(),
        ),
    );
    let renderer = ConsoleRenderer::new(io::stdout(), config.monitored_runway());
    let mut poll_loop = PollLoop::new(selector, renderer, PollTiming::from_config(&config));

    if once {
        let state = poll_loop.run_cycle(Timestamp::now()).await?;
        info!(?state, "Single display cycle done");
        return Ok(());
    }

    info!(
        airport = config.airport_code(),
        runway = config.monitored_runway(),
        "Starting approach display"
    );
    tokio::select! {
        _ = poll_loop.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down");
        }
    }
    poll_loop.shutdown()
}

fn main() -> ApplicationResult<()> {
    let cli = Cli::parse();
    let config = PortalConfig::load(cli.clean_config, cli.config.as_deref())?;
    if cli.show_config {
        println!("# {}", config.config_file_path().display());
        print!("{}", config.to_toml()?);
        return Ok(());
    }
    let _guard = init_tracing(&config)?;
    info!(path = %config.config_file_path().display(), "Loaded config");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(config, cli.once))?;
    Ok(())
}
