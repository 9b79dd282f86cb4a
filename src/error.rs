//! Error types for layout operations and the host boundary

use thiserror::Error;

use crate::host::MarkerId;

/// Errors raised by a host document implementation.
///
/// `Cancelled` is not a failure: it marks a user-aborted interactive
/// pick and is surfaced to callers as a cancelled outcome.
#[derive(Debug, Error)]
pub enum HostError {
    /// The user cancelled an interactive selection
    #[error("operation cancelled")]
    Cancelled,

    /// A marker handle no longer resolves to a document element
    #[error("marker {0:?} not found in document")]
    MarkerNotFound(MarkerId),

    /// A transaction primitive was used out of order
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Writing back to a marker failed
    #[error("host mutation failed: {0}")]
    Mutation(String),
}

/// Errors that abort a layout call.
///
/// Per-marker geometric failures (an unresolvable owner view, a missing
/// bounding box) are not represented here: they are recovered locally by
/// skipping the marker and counted in the [`LayoutSummary`].
///
/// [`LayoutSummary`]: crate::LayoutSummary
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Fewer markers than the operation needs; nothing was mutated
    #[error("{needed} or more markers must be selected ({got} given)")]
    InsufficientSelection { needed: usize, got: usize },

    /// Arrange requires an active crop box on the view
    #[error("please set a crop box to the view")]
    CropBoxRequired,

    /// The document has no active view to fall back to
    #[error("no active view")]
    NoActiveView,

    /// The user cancelled; any started transaction was rolled back
    #[error("cancelled")]
    Cancelled,

    /// A hard host failure; the whole layout call was rolled back
    #[error(transparent)]
    Host(HostError),
}

impl LayoutError {
    /// True when the call ended by user choice rather than by failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LayoutError::Cancelled)
    }
}

impl From<HostError> for LayoutError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Cancelled => LayoutError::Cancelled,
            other => LayoutError::Host(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_maps_to_cancelled() {
        let err: LayoutError = HostError::Cancelled.into();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_mutation_maps_to_host() {
        let err: LayoutError = HostError::Mutation("locked element".into()).into();
        assert!(!err.is_cancelled());
        assert!(err.to_string().contains("locked element"));
    }

    #[test]
    fn test_insufficient_selection_message() {
        let err = LayoutError::InsufficientSelection { needed: 2, got: 1 };
        assert!(err.to_string().contains("2 or more"));
    }
}
