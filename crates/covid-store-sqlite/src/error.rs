//! Error type for `covid-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// The file opened lacks one of the expected tables.
  #[error("missing table: {0}")]
  MissingTable(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
