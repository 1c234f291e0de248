//! Per-message processing states.

use std::fmt;
use std::time::{Duration, Instant};

/// Why a message left the pipeline without completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The payload could not be decoded for its subject.
    Undecodable,
    /// The handler returned an error.
    HandlerFailed,
    /// The handler exceeded the processing timeout.
    TimedOut,
}

impl DropReason {
    /// Stable label used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undecodable => "undecodable",
            Self::HandlerFailed => "handler_failed",
            Self::TimedOut => "timed_out",
        }
    }
}

/// State of one received message.
///
/// `Received → Processing → Completed`, or `Dropped` from either
/// non-terminal state. Nothing is redelivered once terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    /// Taken off the subscription, not yet decoded.
    Received,
    /// Decoded and handed to the handler.
    Processing,
    /// The handler succeeded.
    Completed,
    /// Abandoned; see [`DropReason`].
    Dropped(DropReason),
}

impl MessageState {
    /// Whether no further transition is possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Dropped(_))
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => f.write_str("received"),
            Self::Processing => f.write_str("processing"),
            Self::Completed => f.write_str("completed"),
            Self::Dropped(reason) => write!(f, "dropped:{}", reason.as_str()),
        }
    }
}

/// Tracks one message through its states.
///
/// Terminal transitions consume the tracker, so a finished message cannot
/// be moved again.
#[derive(Debug)]
pub(crate) struct MessageLifecycle {
    state: MessageState,
    received_at: Instant,
}

impl MessageLifecycle {
    pub(crate) fn received() -> Self {
        Self {
            state: MessageState::Received,
            received_at: Instant::now(),
        }
    }

    pub(crate) fn state(&self) -> MessageState {
        self.state
    }

    pub(crate) fn processing(&mut self) {
        self.state = MessageState::Processing;
    }

    pub(crate) fn complete(self) -> (MessageState, Duration) {
        (MessageState::Completed, self.received_at.elapsed())
    }

    pub(crate) fn drop_with(self, reason: DropReason) -> (MessageState, Duration) {
        (MessageState::Dropped(reason), self.received_at.elapsed())
    }
}
