//! Error types for astrocal-ephem

use thiserror::Error;

/// Result type for ephemeris operations
pub type Result<T> = std::result::Result<T, EphemError>;

/// Errors that can occur when computing ephemerides
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemError {
    /// Geographic position outside the valid range or not finite
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// Julian day or calendar date that cannot be processed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// An iterative search did not converge
    #[error("No convergence: {0}")]
    NoConvergence(String),
}

impl EphemError {
    pub(crate) fn check_jd(jd: f64) -> Result<()> {
        if jd.is_finite() {
            Ok(())
        } else {
            Err(EphemError::InvalidDate(format!("julian day {} is not finite", jd)))
        }
    }
}
