//! Error taxonomy for the core.
//!
//! Every condition fails fast at the point of detection. The core never retries
//! and never recovers partially; callers own presentation.

use thiserror::Error;

/// Errors raised by core computations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Two arrays that must be aligned have different lengths.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Metrics inputs `actual`, `lower`, `upper` differ in length.
    #[error("length mismatch: lower={lower}, actual={actual}, upper={upper}")]
    LengthMismatch {
        lower: usize,
        actual: usize,
        upper: usize,
    },

    /// A zero-length series where a non-empty one is required.
    #[error("empty input: {context}")]
    EmptyInput { context: &'static str },

    /// Confidence outside the open interval (0, 1).
    #[error("confidence must lie in (0, 1), got {0}")]
    InvalidConfidence(f64),

    /// Quantile level outside the open interval (0, 1).
    #[error("quantile must lie in (0, 1), got {0}")]
    InvalidQuantile(f64),

    /// Opaque failure reported by a quantile estimator.
    #[error("estimator '{name}' failed: {reason}")]
    Estimator { name: String, reason: String },
}

impl CoreError {
    /// Shorthand for a [`CoreError::ShapeMismatch`].
    pub fn shape(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            context,
            expected,
            actual,
        }
    }

    pub fn estimator(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Estimator {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Fail with [`CoreError::ShapeMismatch`] unless `actual == expected`.
pub(crate) fn ensure_len(
    context: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), CoreError> {
    if expected != actual {
        return Err(CoreError::shape(context, expected, actual));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_message_names_context() {
        let err = CoreError::shape("ensemble low", 3, 2);
        assert_eq!(
            err.to_string(),
            "shape mismatch in ensemble low: expected 3, got 2"
        );
    }

    #[test]
    fn ensure_len_accepts_equal_lengths() {
        assert!(ensure_len("x", 4, 4).is_ok());
        assert!(matches!(
            ensure_len("x", 4, 5),
            Err(CoreError::ShapeMismatch { expected: 4, actual: 5, .. })
        ));
    }
}
