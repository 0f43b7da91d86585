//! Error types for Horizon Trellis core.

use std::fmt;

/// The main error type for core operations.
#[derive(Debug)]
pub enum TrellisError {
    /// Timer-related error.
    Timer(TimerError),
    /// Dispatch-related error.
    Dispatch(DispatchError),
    /// Signal-related error.
    Signal(SignalError),
}

impl fmt::Display for TrellisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer(err) => write!(f, "Timer error: {err}"),
            Self::Dispatch(err) => write!(f, "Dispatch error: {err}"),
            Self::Signal(err) => write!(f, "Signal error: {err}"),
        }
    }
}

impl std::error::Error for TrellisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timer(err) => Some(err),
            Self::Dispatch(err) => Some(err),
            Self::Signal(err) => Some(err),
        }
    }
}

/// Timer-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The timer ID is invalid, has fired, or has been canceled.
    InvalidTimerId,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimerId => write!(f, "Invalid or expired timer ID"),
        }
    }
}

impl std::error::Error for TimerError {}

impl From<TimerError> for TrellisError {
    fn from(err: TimerError) -> Self {
        Self::Timer(err)
    }
}

/// Dispatch-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The dispatcher has been stopped and no longer accepts work.
    Stopped,
    /// A token was requested from a thread other than the owning thread.
    WrongThread,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "The dispatcher has been stopped"),
            Self::WrongThread => {
                write!(f, "Dispatch token requested outside the owning thread")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<DispatchError> for TrellisError {
    fn from(err: DispatchError) -> Self {
        Self::Dispatch(err)
    }
}

/// Signal-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The connection ID is invalid or has already been disconnected.
    InvalidConnection,
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConnection => write!(f, "Invalid or disconnected connection ID"),
        }
    }
}

impl std::error::Error for SignalError {}

impl From<SignalError> for TrellisError {
    fn from(err: SignalError) -> Self {
        Self::Signal(err)
    }
}

/// A specialized Result type for Horizon Trellis core operations.
pub type Result<T> = std::result::Result<T, TrellisError>;
