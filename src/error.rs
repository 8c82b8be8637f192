use sqlx::Error as SqlxError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum GateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Config error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Invalid seed account list: {0}")]
    InvalidSeed(String),

    /// Readiness signal not observed yet. Used as the retry signal while polling.
    #[error("readiness signal not present yet")]
    NotReady,

    #[error("readiness signal {} not observed after {:?}", .path.display(), .waited)]
    ReadinessTimeout { path: PathBuf, waited: Duration },

    #[error("Server hand-off failed: {0}")]
    Handoff(String),
}

impl From<figment::Error> for GateError {
    fn from(e: figment::Error) -> Self {
        GateError::Config(Box::new(e))
    }
}

impl GateError {
    /// Only a missing signal is worth polling again; everything else is fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GateError::NotReady)
    }
}
