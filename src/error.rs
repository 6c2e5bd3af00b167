//! Workflow error types

use thiserror::Error;

/// Construction-time configuration errors.
///
/// Unlike turn-time failures, these are fatal: the host must not dispatch
/// turns to a workflow that failed to construct.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("a form source is required: set either `xform` or `xform_url`")]
    MissingFormSource,
}

/// Failure of a single outbound HTTP exchange, with classification.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Status(code), message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Decode, message)
    }
}

/// Transport failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection failure or timeout
    Network,
    /// Non-success HTTP status
    Status(u16),
    /// Response body did not match the expected shape
    Decode,
}

/// Turn-time failures, grouped by the exchange that failed.
///
/// None of these propagate out of a turn: the driver logs the cause and the
/// turn ends with a user-facing fallback message.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The form definition could not be fetched or produced.
    #[error("failed to acquire the form definition: {0}")]
    Acquisition(#[source] TransportError),

    /// A forms-service exchange (registration, question, answer, result)
    /// failed.
    #[error("xforms service call failed: {0}")]
    Service(#[source] TransportError),

    /// The completed result could not be delivered to the results endpoint.
    #[error("failed to submit completed results: {0}")]
    Submission(#[source] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_cause() {
        let err = WorkflowError::Service(TransportError::status(502, "bad gateway"));
        assert_eq!(err.to_string(), "xforms service call failed: bad gateway");
    }

    #[test]
    fn classification_is_preserved() {
        let err = TransportError::status(404, "not found");
        assert_eq!(err.kind, TransportErrorKind::Status(404));
        assert!(matches!(
            TransportError::network("x").kind,
            TransportErrorKind::Network
        ));
    }
}
