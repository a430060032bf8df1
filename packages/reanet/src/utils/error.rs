use thiserror::Error;

/// Failure conditions of the graph core. Everything here is fatal to the current
/// graft; the ingest driver halts on the first occurrence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
  #[error("node '{0}' already exists in the network")]
  DuplicateName(String),

  #[error("node '{0}' not found in the network")]
  NodeNotFound(String),

  #[error("node '{child}' is not a child of node '{parent}'")]
  NotAChild { parent: String, child: String },

  #[error("node '{0}' already has a parent")]
  ParentAlreadySet(String),

  #[error("branch from '{parent}' to '{child}' would make '{child}' an ancestor of itself")]
  CycleDetected { parent: String, child: String },

  #[error("row {row}: expected {expected} columns, found {found}")]
  MalformedRow {
    row: usize,
    expected: usize,
    found: usize,
  },

  #[error("placement of '{sample}' on segment '{segment}' exceeded {limit} search steps")]
  SearchDivergence {
    sample: String,
    segment: String,
    limit: usize,
  },

  #[error(
    "segments of '{sample}' attach at '{child}' and at its parent '{parent}'; rewriting this placement is not supported"
  )]
  Unsupported {
    sample: String,
    parent: String,
    child: String,
  },
}

#[macro_export]
macro_rules! make_report {
  ($($arg:tt)*) => {
    eyre::eyre!($($arg)*)
  };
}

#[macro_export]
macro_rules! make_error {
  ($($arg:tt)*) => {
    Err($crate::make_report!($($arg)*))
  };
}

#[macro_export]
macro_rules! make_internal_report {
  ($($arg:tt)*) => {
    eyre::eyre!(
      "{}. This is an internal issue. Please report it to developers, providing data and parameters you used, in order to replicate the error.",
      format!($($arg)*)
    )
  };
}

#[macro_export]
macro_rules! make_internal_error {
  ($($arg:tt)*) => {
    Err($crate::make_internal_report!($($arg)*))
  };
}
