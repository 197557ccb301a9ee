//! Access to the remote file server.
//!
//! - [`RemoteStore`]: The operations the pipeline needs from a remote store
//! - [`FtpStore`]: Passive-mode FTP implementation
//! - [`listing`]: Parsing of raw directory listings

mod ftp_store;
pub mod listing;

use std::io::Read;

use crate::utils::RemoteError;

pub use ftp_store::FtpStore;
pub use listing::{RemoteEntry, parse_listing};

/// A blocking session against the remote store.
///
/// One session is shared by every step of a run, so implementations keep a
/// single connection and must be able to re-establish it on demand.
pub trait RemoteStore {
    /// Raw listing lines for `directory`.
    fn list(&mut self, directory: &str) -> Result<Vec<String>, RemoteError>;

    /// Downloads the file at `path`.
    fn get(&mut self, path: &str) -> Result<Vec<u8>, RemoteError>;

    /// Uploads everything `source` yields to `path`, replacing any existing file.
    fn put(&mut self, path: &str, source: &mut dyn Read) -> Result<(), RemoteError>;

    fn delete(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Drops the current connection and opens a fresh one.
    fn reconnect(&mut self) -> Result<(), RemoteError>;

    /// Ends the session. Errors are not interesting at this point.
    fn close(&mut self) {}
}

impl<S: RemoteStore + ?Sized> RemoteStore for &mut S {
    fn list(&mut self, directory: &str) -> Result<Vec<String>, RemoteError> {
        (**self).list(directory)
    }

    fn get(&mut self, path: &str) -> Result<Vec<u8>, RemoteError> {
        (**self).get(path)
    }

    fn put(&mut self, path: &str, source: &mut dyn Read) -> Result<(), RemoteError> {
        (**self).put(path, source)
    }

    fn delete(&mut self, path: &str) -> Result<(), RemoteError> {
        (**self).delete(path)
    }

    fn reconnect(&mut self) -> Result<(), RemoteError> {
        (**self).reconnect()
    }

    fn close(&mut self) {
        (**self).close()
    }
}
