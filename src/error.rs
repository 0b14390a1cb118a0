//! Errors that are reported to the caller instead of aborting the run.
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be read or parsed.
    #[error("unable to read configuration file {path:?}")]
    Config {
        path: PathBuf,
        #[source]
        source: config_file::ConfigFileError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Writing the learned value table failed. The table itself is untouched.
    #[error("unable to write value table to {path:?}")]
    TableWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to write episode statistics")]
    Stats(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
