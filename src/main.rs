use std::io::BufRead;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;

use intrusion_alarm_rs::logger;
use intrusion_alarm_rs::motion_pipeline::{
    CommandNotifier, DetectorConfig, DirectoryOverlay, ImageSequenceSource, MonitorSession,
    Notifier, NullOverlay, OperatorHandle, OverlaySink, SilentNotifier, SnapshotStore,
    SystemClock, command_channel,
};

use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "intrusion-alarm", about = "Motion-triggered intrusion alarm over a frame sequence")]
struct Args {
    /// Directory of frames, processed in file-name order
    frames: PathBuf,
    /// JSON detector configuration
    #[arg(long, value_name = "PATH", conflicts_with = "adaptive")]
    config: Option<PathBuf>,
    /// Use the adaptive-background preset
    #[arg(long)]
    adaptive: bool,
    #[arg(long, value_name = "DIR")]
    snapshot_dir: Option<PathBuf>,
    /// Write every annotated frame here
    #[arg(long, value_name = "DIR")]
    overlay_dir: Option<PathBuf>,
    /// Log notifications instead of playing a sound
    #[arg(long)]
    silent: bool,
    /// Program run on each notification, followed by its arguments
    #[arg(long, num_args = 1.., value_name = "CMD", conflicts_with = "silent")]
    notify_command: Option<Vec<String>>,
    /// Write the effective configuration to this file and exit
    #[arg(long, value_name = "PATH")]
    dump_config: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_with_level(if args.verbose { "debug" } else { "info" });

    info!("Starting intrusion-alarm...");

    let mut config = match &args.config {
        Some(path) => DetectorConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None if args.adaptive => DetectorConfig::adaptive(),
        None => DetectorConfig::default(),
    };
    if let Some(dir) = &args.snapshot_dir {
        config.snapshot_dir = dir.clone();
    }
    config.validate()?;

    if let Some(path) = &args.dump_config {
        config.save(path)?;
        info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let notifier: Box<dyn Notifier> = if args.silent {
        Box::new(SilentNotifier)
    } else if let Some(command) = &args.notify_command {
        let (program, rest) = command
            .split_first()
            .context("--notify-command needs a program")?;
        Box::new(CommandNotifier::new(program.clone(), rest.to_vec())?)
    } else {
        Box::new(CommandNotifier::system_default()?)
    };

    let overlay: Box<dyn OverlaySink> = match &args.overlay_dir {
        Some(dir) => Box::new(DirectoryOverlay::new(dir.clone())?),
        None => Box::new(NullOverlay),
    };

    let snapshots = SnapshotStore::new(config.snapshot_dir.clone(), config.snapshot_compression);
    let mut source = ImageSequenceSource::open(&args.frames)
        .with_context(|| format!("opening frames in {}", args.frames.display()))?;
    info!("{} frames queued from {}", source.len(), args.frames.display());

    let mut session =
        MonitorSession::with_custom(config, notifier, snapshots, overlay, Box::new(SystemClock))?;

    let (handle, commands) = command_channel();
    spawn_keyboard(handle);

    let outcome = session.run(&mut source, &commands);
    let summary = session.finish();
    info!(
        "{} frames, {} alarm episodes, {} notifications ({} dropped), {} snapshots",
        summary.frames_processed,
        summary.alarm_episodes,
        summary.notifications,
        summary.notifications_dropped,
        summary.snapshots
    );

    outcome?;
    Ok(())
}

/// `c` recaptures the background, `r` resets it to the next frame, `q` stops.
fn spawn_keyboard(handle: OperatorHandle) {
    let spawned = thread::Builder::new()
        .name("operator-input".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let delivered = match line.trim() {
                    "c" => handle.capture_background(),
                    "r" => handle.reset_background(),
                    "q" => handle.stop(),
                    "" => true,
                    other => {
                        warn!("Unknown command {:?} (c = capture, r = reset, q = quit)", other);
                        true
                    }
                };
                if !delivered {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Operator input unavailable: {}", e);
    }
}
