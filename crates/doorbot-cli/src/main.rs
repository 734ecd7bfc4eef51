mod rig;

use clap::Parser;
use tracing::info;

use doorbot_core::api::ApiClient;
use doorbot_core::config::Config;
use doorbot_core::event_log::{EventLogger, LocalEventLog};
use doorbot_core::hardware::{ActuatorRig, SimulatedRig};
use doorbot_core::health::HealthReporter;
use doorbot_core::sequencer::UnlockSequencer;
use doorbot_core::supervisor::{ExitReason, Supervisor};
use sound_player::AplayPlayer;

/// Door unlock client: polls the authorization server and drives the lock
/// hardware. Takes no arguments; configuration comes from `DOORBOT_*`
/// environment variables.
#[derive(Parser)]
#[command(name = "doorbot", version)]
struct Cli {}

fn main() {
    Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    info!(server = %config.server_url, "doorbot client starting");

    let rig = build_rig(&config)?;
    let player = AplayPlayer::new(&config.sounds_dir, config.alsa_device.clone());
    let api = ApiClient::new(config.server_url.clone(), config.api_key.clone())?;
    let events = EventLogger::new(api.clone(), LocalEventLog::new(&config.log_file));
    let sequencer = UnlockSequencer::new(rig, Box::new(player), events, config.timings.clone());
    let mut supervisor = Supervisor::new(api, sequencer, HealthReporter::new(), &config);

    let reason = tokio::select! {
        reason = supervisor.run() => reason,
        _ = tokio::signal::ctrl_c() => ExitReason::Interrupted,
    };
    supervisor.safe_shutdown();

    match reason {
        ExitReason::Interrupted => {
            info!("interrupted; shutdown complete");
            Ok(())
        }
        ExitReason::TooManyErrors => anyhow::bail!("giving up after repeated poll failures"),
    }
}

fn build_rig(config: &Config) -> anyhow::Result<Box<dyn ActuatorRig>> {
    if config.simulate {
        info!("hardware simulation enabled; no GPIO access");
        return Ok(Box::new(SimulatedRig::new()));
    }
    rig::open()
}
