// src/remote/ftp_store.rs

//! Passive-mode FTP session backed by the `ftp` crate.

use std::io::Read;

use ftp::types::FileType;
use ftp::{FtpError, FtpStream};
use tracing::{debug, warn};

use crate::core::AppConfig;
use crate::remote::RemoteStore;
use crate::utils::RemoteError;

/// FTP connection that remembers its credentials so it can reconnect.
pub struct FtpStore {
    address: String,
    username: String,
    password: String,
    stream: Option<FtpStream>,
}

impl FtpStore {
    /// Connects, logs in and switches to binary transfers.
    pub fn connect(address: &str, username: &str, password: &str) -> Result<Self, RemoteError> {
        let mut store = Self {
            address: address.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            stream: None,
        };
        store.open()?;
        Ok(store)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, RemoteError> {
        Self::connect(&config.address(), &config.username, &config.password)
    }

    fn open(&mut self) -> Result<(), RemoteError> {
        debug!("Connecting to {}", self.address);
        let mut stream = FtpStream::connect(self.address.as_str()).map_err(map_ftp_error)?;
        stream
            .login(&self.username, &self.password)
            .map_err(map_ftp_error)?;
        // The ftp crate always opens data connections with PASV.
        stream.transfer_type(FileType::Binary).map_err(map_ftp_error)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stream(&mut self) -> Result<&mut FtpStream, RemoteError> {
        self.stream
            .as_mut()
            .ok_or_else(|| RemoteError::Transport("not connected".to_string()))
    }
}

impl RemoteStore for FtpStore {
    fn list(&mut self, directory: &str) -> Result<Vec<String>, RemoteError> {
        self.stream()?.list(Some(directory)).map_err(map_ftp_error)
    }

    fn get(&mut self, path: &str) -> Result<Vec<u8>, RemoteError> {
        self.stream()?
            .simple_retr(path)
            .map(|cursor| cursor.into_inner())
            .map_err(map_ftp_error)
    }

    fn put(&mut self, path: &str, mut source: &mut dyn Read) -> Result<(), RemoteError> {
        self.stream()?.put(path, &mut source).map_err(map_ftp_error)
    }

    fn delete(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream()?.rm(path).map_err(map_ftp_error)
    }

    fn reconnect(&mut self) -> Result<(), RemoteError> {
        if let Some(mut stream) = self.stream.take() {
            // the old control connection is usually already dead
            let _ = stream.quit();
        }
        self.open()
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.quit() {
                warn!("Failed to close FTP session: {}", e);
            }
        }
    }
}

impl Drop for FtpStore {
    fn drop(&mut self) {
        self.close();
    }
}

fn map_ftp_error(err: FtpError) -> RemoteError {
    match err {
        FtpError::InvalidResponse(message) => RemoteError::Rejected(message),
        other => RemoteError::Transport(other.to_string()),
    }
}
