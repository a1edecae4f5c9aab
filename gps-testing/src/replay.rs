use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand, ValueEnum};
use gps_logic::{Sampler, SamplerSettings, SamplingMode, SpeedUnit, StateUpdateSender};
use gps_test_shared::{ReplaySource, Track, format_reading, history_table, prelude::*};
use log::{info, warn};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(version, about = "Feed a scripted or simulated device through the location sampler")]
struct Cli {
    /// JSON file with sampler settings, any flags given override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Poll the device every N milliseconds instead of watching it
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Unit to display speeds in
    #[arg(long, value_enum)]
    unit: Option<UnitValue>,

    /// Print the final history as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Pretend the device has no location capability
    #[arg(long)]
    no_gps: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum UnitValue {
    Mps,
    Kmh,
}

impl From<UnitValue> for SpeedUnit {
    fn from(value: UnitValue) -> Self {
        match value {
            UnitValue::Mps => SpeedUnit::MetersPerSecond,
            UnitValue::Kmh => SpeedUnit::KilometersPerHour,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON track file
    Replay {
        /// Path to the track
        track: PathBuf,
    },
    /// Simulate a device moving in a straight line
    Simulate {
        /// Number of fixes to report
        #[arg(long, default_value_t = 10)]
        points: usize,
        /// Time between fixes in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Starting latitude
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        latitude: f64,
        /// Starting longitude
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        longitude: f64,
        /// Degrees of longitude moved between fixes
        #[arg(long, default_value_t = 0.0001, allow_hyphen_values = true)]
        step: f64,
    },
}

struct UpdateSender(mpsc::UnboundedSender<()>);

impl StateUpdateSender for UpdateSender {
    fn send_update(&self) {
        self.0.send(()).ok();
    }
}

fn load_settings(cli: &Cli) -> Result<SamplerSettings> {
    let mut settings = if let Some(path) = &cli.config {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&raw).context("Failed to parse config")?
    } else {
        SamplerSettings::default()
    };

    if let Some(interval_ms) = cli.poll_ms {
        settings.mode = SamplingMode::Poll { interval_ms };
    }

    if let Some(unit) = cli.unit {
        settings.speed_unit = unit.into();
    }

    Ok(settings)
}

fn load_track(command: &Commands) -> Result<Track> {
    match command {
        Commands::Replay { track } => Track::load(track),
        Commands::Simulate {
            points,
            interval_ms,
            latitude,
            longitude,
            step,
        } => {
            let start_millis = chrono::Utc::now().timestamp_millis();
            Ok(Track::straight_line(
                *points,
                (*latitude, *longitude),
                (0.0, *step),
                *interval_ms,
                start_millis,
            ))
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let track = load_track(&cli.command)?;
    let unit = settings.speed_unit;
    let polling = settings.poll_interval().is_some();

    info!(
        "Replaying {} fixes ({} steps) with {:?}",
        track.fix_count(),
        track.steps.len(),
        settings.mode
    );

    let source = Arc::new(ReplaySource::new(track).with_available(!cli.no_gps));
    let (tx, mut updates) = mpsc::unbounded_channel();
    let sampler = Sampler::new(settings, source.clone(), UpdateSender(tx));

    sampler
        .start()
        .await
        .context("Failed to start sampling")?;

    let mut shown = 0;
    let mut last_error = None;

    'replay: loop {
        tokio::select! {
            Ok(_) = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break 'replay;
            }

            Some(()) = updates.recv() => {
                let ui = sampler.get_ui_state().await;

                for reading in ui.history.iter().skip(shown) {
                    println!("{}", format_reading(reading, unit));
                }
                shown = ui.history.len();

                // Polling past the end of the track is expected to fail, not worth a warning
                let done = !ui.active || (polling && source.requests_exhausted());

                if !done && ui.last_error != last_error {
                    if let Some(why) = &ui.last_error {
                        warn!("{why}");
                    }
                    last_error = ui.last_error;
                }

                if done {
                    break 'replay;
                }
            }
        }
    }

    sampler.stop().await;

    let history = sampler.history().await;

    if cli.json {
        let encoded =
            serde_json::to_string_pretty(&history).context("Failed to encode history")?;
        println!("{encoded}");
    } else {
        println!("{}", history_table(&history, unit));
    }

    Ok(())
}
