//! Reference quantile estimators.
//!
//! Both are deterministic and feature-table driven so the pipeline runs end to
//! end without an external model service. Any other model family plugs in by
//! implementing [`QuantileEstimator`](crate::estimator::QuantileEstimator).

pub mod empirical;
pub mod linear;

pub use empirical::{empirical_quantile, EmpiricalQuantileEstimator, EMPIRICAL_NAME};
pub use linear::{pinball_loss, LinearQuantileEstimator, LINEAR_NAME};
