//! Terminal signals and the driving seam shared by [`Seq`](crate::Seq) and
//! [`Opt`](crate::Opt).

use crate::context::Context;
use crate::error::{ErrorKind, SeqError};
use crate::seq::BoxSeqStream;
use std::fmt;

/// The single event that ends a drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    /// The source finished normally
    Complete,

    /// An [`Opt`](crate::Opt) finished without a value
    Empty,

    /// The source failed
    Failed(SeqError),
}

impl Terminal {
    /// Check if the source finished without failing (`Complete` or `Empty`)
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Complete | Self::Empty)
    }

    /// The failure, if any
    #[must_use]
    pub const fn error(&self) -> Option<&SeqError> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Complete | Self::Empty => None,
        }
    }

    /// The failure kind, if any
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed(error) => Some(error.kind()),
            Self::Complete | Self::Empty => None,
        }
    }

    /// Short label used for logs and metrics
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Empty => "empty",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(error) => write!(f, "failed ({error})"),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Something a driver can subscribe to.
///
/// Both [`Seq`](crate::Seq) and [`Opt`](crate::Opt) implement this, so
/// drivers and test harnesses work uniformly over either kind. The only
/// difference they expose is the terminal reported when nothing was emitted.
pub trait Publisher: Send + Sync {
    /// The value type emitted
    type Item: Send + 'static;

    /// Start a fresh execution of this source.
    fn open(&self, cx: &Context) -> BoxSeqStream<Self::Item>;

    /// Terminal reported when the source ends without emitting anything.
    fn terminal_when_empty(&self) -> Terminal {
        Terminal::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_errors() {
        let failed = Terminal::Failed(SeqError::upstream("gone"));

        assert!(Terminal::Complete.is_success());
        assert!(Terminal::Empty.is_success());
        assert!(!failed.is_success());
        assert_eq!(failed.error_kind(), Some(ErrorKind::UpstreamFailure));
        assert_eq!(Terminal::Empty.error(), None);
    }

    #[test]
    fn display() {
        assert_eq!(Terminal::Complete.to_string(), "complete");
        assert_eq!(
            Terminal::Failed(SeqError::transform("x")).to_string(),
            "failed (transform failure: x)"
        );
    }
}
