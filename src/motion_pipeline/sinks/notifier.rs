//! Fire-and-forget intrusion notification.
//!
//! [`Notifier::notify`] must return immediately. The frame loop does not wait
//! for playback and does not care whether it happened.

use std::process::{Command, Stdio};
use std::thread;

use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, info, warn};

use crate::motion_pipeline::common::error::{DetectionError, Result};

/// What became of a notification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Handed to the notification backend.
    Sent,
    /// Discarded because the backend was still busy with an earlier one.
    Dropped,
}

pub trait Notifier {
    /// Requests a notification. `Err` only means the request could not be
    /// handed off; the caller logs it and carries on.
    fn notify(&self) -> Result<Dispatch>;
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn notify(&self) -> Result<Dispatch> {
        (**self).notify()
    }
}

/// Logs the trigger and nothing else.
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self) -> Result<Dispatch> {
        info!("Intrusion notification (silent)");
        Ok(Dispatch::Sent)
    }
}

/// Runs an external command (typically an audio player) on a dedicated thread.
///
/// At most one trigger is queued behind the one playing. Extra triggers while
/// the player is busy are dropped rather than piling up.
pub struct CommandNotifier {
    trigger: Sender<()>,
}

impl CommandNotifier {
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> Result<Self> {
        let program = program.into();
        let (trigger, pending) = crossbeam_channel::bounded::<()>(1);

        // The thread ends once every sender is gone.
        thread::Builder::new()
            .name("alarm-notifier".into())
            .spawn(move || {
                for () in pending.iter() {
                    let outcome = Command::new(&program)
                        .args(&args)
                        .stdin(Stdio::null())
                        .stdout(Stdio::null())
                        .stderr(Stdio::null())
                        .status();
                    match outcome {
                        Ok(status) if status.success() => debug!(program = %program, "Notification played"),
                        Ok(status) => warn!(program = %program, %status, "Notification command failed"),
                        Err(e) => warn!(program = %program, error = %e, "Notification command could not start"),
                    }
                }
            })
            .map_err(|e| DetectionError::SinkUnavailable(format!("notifier thread: {}", e)))?;

        Ok(Self { trigger })
    }

    /// Plays `alarm.wav` from the working directory.
    pub fn system_default() -> Result<Self> {
        Self::with_sound_file("alarm.wav")
    }

    /// Plays `sound_file` with the platform's stock command-line player.
    pub fn with_sound_file(sound_file: &str) -> Result<Self> {
        if cfg!(windows) {
            Self::new(
                "powershell",
                vec![
                    "-NoProfile".into(),
                    "-Command".into(),
                    format!("(New-Object Media.SoundPlayer '{}').PlaySync()", sound_file),
                ],
            )
        } else if cfg!(target_os = "macos") {
            Self::new("afplay", vec![sound_file.into()])
        } else {
            Self::new("aplay", vec!["-q".into(), sound_file.into()])
        }
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self) -> Result<Dispatch> {
        match self.trigger.try_send(()) {
            Ok(()) => Ok(Dispatch::Sent),
            Err(TrySendError::Full(())) => {
                debug!("Previous notification still pending, dropping trigger");
                Ok(Dispatch::Dropped)
            }
            Err(TrySendError::Disconnected(())) => Err(DetectionError::SinkUnavailable(
                "notifier thread has stopped".into(),
            )),
        }
    }
}
