//! SFTP browsing and transfers
//!
//! Directory listings, the recursive transfer engine and the russh-sftp
//! session that backs them.

pub mod error;
pub mod listing;
pub mod progress;
pub mod remote;
pub mod session;
pub mod transfer;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::SftpError;
pub use listing::EntryList;
pub use progress::{
    observer, ConsoleProgress, FnObserver, NoOpObserver, ProgressObserver, ProgressThrottle,
};
pub use remote::{RemoteFs, RemoteReader, RemoteWriter};
pub use session::SftpSession;
pub use transfer::{AlwaysOverwrite, NeverOverwrite, OverwriteConfirm, TransferEngine};
pub use types::*;
