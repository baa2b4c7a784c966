//! venue-discovery - location-aware venue browser
//!
//! Module structure:
//! - `domain/` - Core types (Venue, Position, FilterState)
//! - `io/` - External collaborators (location, geocoder, catalog, deep links, sinks)
//! - `services/` - Discovery logic (pipeline, tracker, coordinator, viewport, session)
//! - `infra/` - Infrastructure (Config, Metrics)

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use url::Url;
use venue_discovery::domain::{Favourites, FilterMode, FilterState, Position, SearchScope, VenueId};
use venue_discovery::infra::{Config, GeocoderKind, Metrics};
use venue_discovery::io::{
    open_in_maps, Catalog, LogMapSurface, LogPresenter, MapsTarget, NominatimGeocoder,
    OfflineGeocoder, ReplayLocationProvider, ReverseGeocoder, UrlOpener,
};
use venue_discovery::services::{
    CoordinatorSettings, DiscoverySession, FilterPipeline, GeolocationTracker, MapViewportController,
    ResultsView, TrackerSettings, TrackerState, UiCommand, ViewSyncCoordinator,
};

/// Location-aware venue discovery
#[derive(Parser, Debug)]
#[command(name = "venue-discovery", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Venues within the configured radius of a position
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long, default_value = "all")]
        mode: FilterMode,
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Free-text search over the whole catalog
    Search {
        query: String,
        #[arg(long, default_value = "all")]
        mode: FilterMode,
    },
    /// Print the maps deep link for a venue
    Link {
        venue_id: String,
        #[arg(long, default_value = "web")]
        target: MapsTarget,
    },
    /// Run the full discovery loop against a recorded position track
    Session {
        /// JSON-lines track file
        #[arg(long)]
        positions: String,
        /// Delay between replayed fixes
        #[arg(long, default_value_t = 500)]
        pace_ms: u64,
        #[arg(long, default_value = "all")]
        mode: FilterMode,
        /// Venue to show on the map once the session is running
        #[arg(long)]
        focus: Option<String>,
    },
}

/// Opener for a terminal: prints the link instead of launching an app
struct PrintOpener;

#[async_trait]
impl UrlOpener for PrintOpener {
    async fn open_url(&self, url: &Url) -> Result<(), String> {
        println!("{}", url);
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(|| Config::resolve_config_path(&[]));
    let config = Config::load_from_path(&config_path);

    info!(
        version = %env!("CARGO_PKG_VERSION"),
        git_hash = %env!("GIT_HASH"),
        config_file = %config.config_file(),
        catalog_file = %config.catalog_file(),
        radius_miles = %config.radius_miles(),
        geocoder = ?config.geocoder_kind(),
        "venue_discovery_starting"
    );

    let catalog = Arc::new(Catalog::from_file(config.catalog_file())?);

    match args.command {
        Command::Nearby { lat, lng, mode, query } => {
            let filter = FilterState::new(mode).with_query(query);
            let position = Position::new(lat, lng, 0);
            print_results(&config, &catalog, &filter, Some(&position));
        }
        Command::Search { query, mode } => {
            let filter =
                FilterState::new(mode).with_query(query).with_scope(SearchScope::Everywhere);
            print_results(&config, &catalog, &filter, None);
        }
        Command::Link { venue_id, target } => {
            let venue = catalog
                .get(&VenueId::new(venue_id.as_str()))
                .with_context(|| format!("Unknown venue {}", venue_id))?;
            open_in_maps(&PrintOpener, venue, target).await?;
        }
        Command::Session { positions, pace_ms, mode, focus } => {
            run_session(config, catalog, &positions, pace_ms, mode, focus).await?;
        }
    }

    Ok(())
}

fn print_results(
    config: &Config,
    catalog: &Catalog,
    filter: &FilterState,
    position: Option<&Position>,
) {
    let favourites: Favourites = config.favourites().iter().cloned().collect();
    let pipeline = FilterPipeline::new(config.radius_miles());
    let results = pipeline.apply(catalog.venues(), filter, &favourites, position);
    let view = ResultsView::build(0, filter, &results, None);

    if view.is_empty() {
        println!("No venues match.");
        return;
    }
    for row in &view.rows {
        println!(
            "{:<32} {:>22}  {}  [halal: {}, alcohol: {}]",
            row.title, row.distance_label, row.meta, row.halal_label, row.alcohol_label
        );
    }
}

async fn run_session(
    config: Config,
    catalog: Arc<Catalog>,
    positions: &str,
    pace_ms: u64,
    mode: FilterMode,
    focus: Option<String>,
) -> anyhow::Result<()> {
    let metrics = Arc::new(Metrics::new());

    let provider = ReplayLocationProvider::from_file(positions)?
        .with_pace(Duration::from_millis(pace_ms));
    let geocoder: Arc<dyn ReverseGeocoder> = match config.geocoder_kind() {
        GeocoderKind::Nominatim => Arc::new(NominatimGeocoder::from_config(&config)?),
        GeocoderKind::Offline => Arc::new(OfflineGeocoder),
    };
    let tracker = GeolocationTracker::new(
        Arc::new(provider),
        geocoder,
        TrackerSettings::from_config(&config),
        metrics.clone(),
    );
    let mut tracker_state = tracker.subscribe_state();

    let coordinator = ViewSyncCoordinator::new(
        catalog,
        config.favourites().iter().cloned().collect(),
        FilterPipeline::with_metrics(config.radius_miles(), metrics.clone()),
        CoordinatorSettings::from_config(&config),
        MapViewportController::new(LogMapSurface::new(config.initial_region()), metrics.clone()),
        LogPresenter::default(),
        metrics.clone(),
    );
    let mut session = DiscoverySession::new(coordinator, tracker);

    let (command_tx, command_rx) = mpsc::channel(64);
    command_tx.send(UiCommand::MapReady).await?;
    if mode != FilterMode::All {
        command_tx.send(UiCommand::SetMode(mode)).await?;
    }
    if let Some(venue_id) = focus {
        command_tx.send(UiCommand::ExternalFocus(VenueId::new(venue_id))).await?;
    }

    // Close the session once tracking reaches a terminal state or on Ctrl-C
    let shutdown_tx = command_tx.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = tracker_state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *tracker_state.borrow();
                    if matches!(state, TrackerState::Denied | TrackerState::Error) {
                        info!(state = %state.as_str(), "tracking_finished");
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown_signal_received");
                    break;
                }
            }
        }
        let _ = shutdown_tx.send(UiCommand::Teardown).await;
    });

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs().max(1);
    let reporter = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(metrics_interval));
        interval.tick().await;
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    session.run(command_rx).await;
    reporter.abort();
    metrics.report().log();
    Ok(())
}
