//! Operator commands
//!
//! Commands arrive from outside the frame loop (a keyboard thread, a control
//! socket) and are applied between frames.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Rebuild the background from the next warm-up window.
    CaptureBackground,
    /// Replace the background with the next frame.
    ResetBackground,
    Stop,
}

/// Sending side, cheap to clone.
#[derive(Debug, Clone)]
pub struct OperatorHandle {
    sender: Sender<OperatorCommand>,
}

impl OperatorHandle {
    /// Returns `false` once the session has been dropped.
    pub fn send(&self, command: OperatorCommand) -> bool {
        self.sender.send(command).is_ok()
    }

    pub fn capture_background(&self) -> bool {
        self.send(OperatorCommand::CaptureBackground)
    }

    pub fn reset_background(&self) -> bool {
        self.send(OperatorCommand::ResetBackground)
    }

    pub fn stop(&self) -> bool {
        self.send(OperatorCommand::Stop)
    }
}

#[derive(Debug)]
pub struct CommandReceiver {
    receiver: Receiver<OperatorCommand>,
}

impl CommandReceiver {
    /// Next pending command, without blocking.
    ///
    /// Once every handle is gone the loop simply runs until the source ends.
    pub fn try_next(&self) -> Option<OperatorCommand> {
        match self.receiver.try_recv() {
            Ok(command) => Some(command),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

pub fn command_channel() -> (OperatorHandle, CommandReceiver) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (OperatorHandle { sender }, CommandReceiver { receiver })
}
