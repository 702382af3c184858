//! Provides [`SimError`] and wraps the errors of the crates underneath it.
use std::fmt::{self, Debug, Display};
use std::io;

/// The error type for everything that can go wrong while loading input,
/// preparing a simulation, or writing results.
#[derive(Debug)]
pub enum SimError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    DateError(chrono::ParseError),
    ThreadPoolError(rayon::ThreadPoolBuildError),
    SimError(String),
}

impl From<io::Error> for SimError {
    fn from(error: io::Error) -> Self {
        SimError::IoError(error)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(error: serde_json::Error) -> Self {
        SimError::JsonError(error)
    }
}

impl From<chrono::ParseError> for SimError {
    fn from(error: chrono::ParseError) -> Self {
        SimError::DateError(error)
    }
}

impl From<rayon::ThreadPoolBuildError> for SimError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        SimError::ThreadPoolError(error)
    }
}

impl From<String> for SimError {
    fn from(error: String) -> Self {
        SimError::SimError(error)
    }
}

impl From<&str> for SimError {
    fn from(error: &str) -> Self {
        SimError::SimError(error.to_string())
    }
}

impl std::error::Error for SimError {}

impl Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {self:?}")?;
        Ok(())
    }
}
