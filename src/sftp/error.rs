//! SFTP error types

use std::io;

use thiserror::Error;

use crate::path::PathError;

/// Errors raised while listing or transferring
///
/// Every variant names the path it concerns so that a failure deep inside a
/// recursive transfer can be reported on its own.
#[derive(Error, Debug)]
pub enum SftpError {
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Failed to list remote directory {path}: {source}")]
    Listing {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read local directory {path}: {source}")]
    LocalListing {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Cannot find index {index} in a list with size {len}")]
    Range { index: usize, len: usize },

    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create remote directory {path}: {source}")]
    RemoteCreate {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Error while reading from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Error while writing to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Directory {path} already exists")]
    AlreadyExists { path: String },

    #[error("Not overwriting existing file {path}")]
    OverwriteDeclined { path: String },

    #[error("SFTP subsystem not available: {0}")]
    SubsystemNotAvailable(String),

    #[error("SFTP session error: {0}")]
    Session(String),
}
