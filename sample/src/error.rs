use thiserror::Error;

/// Errors raised by the sample application.
#[derive(Debug, Error)]
pub enum SampleError {
  #[error("Invalid {field}: {message}")]
  Validation { field: &'static str, message: String },

  #[error("Email '{0}' is already registered")]
  DuplicateEmail(String),

  #[error("No record with id {0}")]
  NotFound(i64),

  #[error(transparent)]
  Bridge(#[from] fibre_bridge::Error),
}

pub type Result<T, E = SampleError> = std::result::Result<T, E>;
