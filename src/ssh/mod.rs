//! SSH module - connection setup for the SFTP browser
//!
//! # Features
//! - Password and private key authentication
//! - Host key verification via ~/.ssh/known_hosts
//! - SFTP subsystem on an authenticated connection

mod client;
mod config;
mod error;

pub use client::{ClientHandler, SshClient, SshConnection};
pub use config::{AuthMethod, SshConfig};
pub use error::SshError;
