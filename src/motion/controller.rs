//! Drives motion operations over a session by polling status updates.

use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::protocol::{Reply, decode_reply, status_request};
use crate::transport::{DeviceSession, TransportError, WriteError};

use super::operation::MotionOperation;

/// Errors from motion operations.
#[derive(Error, Debug)]
pub enum MotionError {
    /// Writing the motion command failed
    #[error("motion command failed")]
    CommandFailed(#[source] WriteError),

    /// A transport failure interrupted the poll loop
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The configured deadline elapsed before the operation finished
    #[error("operation timed out after {elapsed:?}")]
    OperationTimedOut {
        /// Time spent before giving up
        elapsed: Duration,
    },
}

/// Timing knobs for the poll loops.
#[derive(Debug, Clone, Copy)]
pub struct MotionConfig {
    /// Budget for each framed-reply wait inside the poll loop.
    pub status_poll_timeout: Duration,
    /// Pause between the start phase and the completion-wait phase.
    pub settle_delay: Duration,
    /// Overall bound on one operation. `None` reproduces the legacy
    /// behavior of looping until the device answers, which never returns
    /// against a dead device.
    pub deadline: Option<Duration>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            status_poll_timeout: Duration::from_millis(250),
            settle_delay: Duration::from_millis(50),
            deadline: Some(Duration::from_secs(120)),
        }
    }
}

/// Progress reported by one poll iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    /// No usable reply this tick
    None,
    /// The status word shows the motion has started
    Started,
    /// The status word or a terminal frame shows the motion has finished
    Complete,
}

/// Which predicate a poll applies to incoming status words.
///
/// During the start phase only the start predicate is trusted: a move that
/// has not begun yet reports idle status bits, which must not be mistaken
/// for completion. Terminal frames complete the operation in either phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitStart,
    AwaitCompletion,
}

/// Runs homing and relative moves as explicit state machines over one
/// exclusively-owned session.
#[derive(Debug)]
pub struct MotionController<'s> {
    session: &'s mut DeviceSession,
    config: MotionConfig,
}

impl<'s> MotionController<'s> {
    /// Create a controller with default timing over the given session.
    pub fn new(session: &'s mut DeviceSession) -> Self {
        Self::with_config(session, MotionConfig::default())
    }

    /// Create a controller with explicit timing knobs.
    pub fn with_config(session: &'s mut DeviceSession, config: MotionConfig) -> Self {
        Self { session, config }
    }

    /// Home the axis and block until the device reports it homed.
    #[instrument(level = "debug", skip(self))]
    pub fn home(&mut self) -> Result<(), MotionError> {
        self.drive(MotionOperation::Home)
    }

    /// Move the axis by `distance` device units and block until the device
    /// reports the move complete. Single-channel addressing.
    #[instrument(level = "debug", skip(self))]
    pub fn move_relative(&mut self, distance: i32) -> Result<(), MotionError> {
        self.drive(MotionOperation::MoveRelative {
            channel: 1,
            distance,
        })
    }

    /// Run an operation to its terminal state.
    ///
    /// Phases: flush and send the command, poll until the device reports the
    /// motion started (or already finished - the fast path skips straight to
    /// success), settle briefly, then poll until completion.
    pub fn drive(&mut self, operation: MotionOperation) -> Result<(), MotionError> {
        let started_at = Instant::now();

        self.session.flush_pending()?;
        self.session
            .send_command(&operation.command())
            .map_err(MotionError::CommandFailed)?;
        debug!(?operation, "motion command sent");

        // start phase: wait for motion to begin, accepting an early terminal
        loop {
            match self.poll(operation, Phase::AwaitStart)? {
                Progress::Started => break,
                Progress::Complete => {
                    debug!(?operation, "completed before motion was observed");
                    return Ok(());
                }
                Progress::None => {}
            }
            self.check_deadline(started_at)?;
        }

        thread::sleep(self.config.settle_delay);

        // completion phase
        loop {
            if self.poll(operation, Phase::AwaitCompletion)? == Progress::Complete {
                debug!(?operation, elapsed = ?started_at.elapsed(), "motion complete");
                return Ok(());
            }
            self.check_deadline(started_at)?;
        }
    }

    /// One poll iteration: request a status update, wait for any framed
    /// reply, and interpret whichever signal arrives.
    fn poll(&mut self, operation: MotionOperation, phase: Phase) -> Result<Progress, MotionError> {
        let family = self.session.family();
        if let Err(err) = self.session.send_command(&status_request(family)) {
            // the reference behavior tolerates a failed status request and
            // keeps polling; only the motion command itself is fatal
            trace!(error = %err, "status request failed");
        }

        let Some(frame) = self
            .session
            .wait_for_framed_reply(self.config.status_poll_timeout)?
        else {
            return Ok(Progress::None);
        };

        let reply = match decode_reply(&frame, family) {
            Ok(reply) => reply,
            Err(err) => {
                trace!(error = %err, "undecodable frame ignored");
                return Ok(Progress::None);
            }
        };

        match reply {
            Some(Reply::Status(status)) => {
                trace!(status = %status.status, "status update");
                match phase {
                    Phase::AwaitStart if operation.started(status.status) => Ok(Progress::Started),
                    Phase::AwaitCompletion if operation.completed(status.status) => {
                        Ok(Progress::Complete)
                    }
                    _ => Ok(Progress::None),
                }
            }
            Some(Reply::Terminal(id)) if id == operation.terminal_id() => Ok(Progress::Complete),
            _ => Ok(Progress::None),
        }
    }

    fn check_deadline(&self, started_at: Instant) -> Result<(), MotionError> {
        if let Some(deadline) = self.config.deadline {
            let elapsed = started_at.elapsed();
            if elapsed >= deadline {
                return Err(MotionError::OperationTimedOut { elapsed });
            }
        }
        Ok(())
    }
}
