//! Error types for gap generation and segmentation.

/// Errors raised by the simulation core.
///
/// A segment break is an ordinary outcome and never surfaces here; a censored
/// exit time is not an error either.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// A distribution or correlation parameter is outside its domain.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A point handed to the segmentation engine breaks its ordering contract.
    #[error("point #{index} (x = {x}, y = {y}) rejected: {reason}")]
    PreconditionViolation {
        /// Number of points admitted to the current region before this one.
        index: usize,
        x: f64,
        y: f64,
        reason: &'static str,
    },
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        SimError::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    /// Whether this error aborted a single trajectory rather than the whole run.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, SimError::PreconditionViolation { .. })
    }
}

/// Result alias for the simulation core.
pub type Result<T> = std::result::Result<T, SimError>;
