//! Error types for the task model.

use thiserror::Error;

use crate::task::TaskId;

/// Errors raised by store mutations, persistence and date parsing.
///
/// Every variant leaves the task store in the state it had before the
/// rejected operation.
#[derive(Error, Debug)]
pub enum DaybookError {
  #[error("validation error: {0}")]
  Validation(String),

  #[error(
    "task position {index} is out of \
     range (store holds {len} tasks)"
  )]
  IndexOutOfRange { index: usize, len: usize },

  #[error("task not found: {0}")]
  TaskNotFound(TaskId),

  #[error("persistence error: {0}")]
  Persistence(String),

  #[error("invalid date: {0}")]
  InvalidDate(String),

  #[error("configuration error: {0}")]
  Config(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error)
}

pub type DaybookResult<T> =
  Result<T, DaybookError>;
