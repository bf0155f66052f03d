//! Error types for building a rig

use thiserror::Error;

/// Errors that can occur while binding a codec to a radio
#[derive(Debug, Error)]
pub enum RigError {
    /// Model name not in the rig database
    #[error("unknown rig model: {0}")]
    UnknownModel(String),

    /// CI-V radio with no address configured
    #[error("no CI-V address for {0}")]
    MissingAddress(String),
}
