//! Failure values carried on a sequence's terminal channel.
//!
//! Failures never unwind through operators. Every fallible step converts its
//! error into a [`SeqError`] that travels downstream as the final event of the
//! sequence, after which nothing else is delivered.

use std::fmt;
use thiserror::Error;

/// Error delivered as the `Failed` terminal event of a [`Seq`](crate::Seq)
/// or [`Opt`](crate::Opt).
///
/// Errors are `Clone` so a cold definition such as [`Seq::fail`](crate::Seq::fail)
/// can replay the same failure on every subscription.
///
/// # Examples
///
/// ```
/// use composable_reactor_core::{ErrorKind, SeqError};
///
/// let error = SeqError::upstream("connection reset");
/// assert_eq!(error.kind(), ErrorKind::UpstreamFailure);
/// assert_eq!(error.message(), "connection reset");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeqError {
    /// A source failed while producing values
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// A function supplied to an operator returned an error
    #[error("transform failure: {0}")]
    Transform(String),
}

impl SeqError {
    /// Create an [`SeqError::Upstream`] from any displayable cause.
    #[must_use]
    pub fn upstream(cause: impl fmt::Display) -> Self {
        Self::Upstream(cause.to_string())
    }

    /// Create an [`SeqError::Transform`] from any displayable cause.
    #[must_use]
    pub fn transform(cause: impl fmt::Display) -> Self {
        Self::Transform(cause.to_string())
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Upstream(_) => ErrorKind::UpstreamFailure,
            Self::Transform(_) => ErrorKind::TransformFailure,
        }
    }

    /// The message this error was created with.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Upstream(message) | Self::Transform(message) => message,
        }
    }
}

/// Coarse classification of a [`SeqError`], used by test harnesses to
/// assert on the failure without matching its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A source failed
    UpstreamFailure,
    /// An operator's function failed
    TransformFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpstreamFailure => write!(f, "upstream failure"),
            Self::TransformFailure => write!(f, "transform failure"),
        }
    }
}

/// Result alias used by sequence streams and futures.
pub type Result<T> = std::result::Result<T, SeqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_capture_message() {
        let upstream = SeqError::upstream("disk full");
        let transform = SeqError::transform(format_args!("bad item {}", 3));

        assert_eq!(upstream, SeqError::Upstream("disk full".to_string()));
        assert_eq!(transform.message(), "bad item 3");
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(SeqError::upstream("x").kind(), ErrorKind::UpstreamFailure);
        assert_eq!(SeqError::transform("x").kind(), ErrorKind::TransformFailure);
    }

    #[test]
    fn display() {
        assert_eq!(
            SeqError::transform("boom").to_string(),
            "transform failure: boom"
        );
        assert_eq!(ErrorKind::UpstreamFailure.to_string(), "upstream failure");
    }
}
