//! Core types for variant settings, run options and queue items.

use serde::Deserialize;
use std::fmt;

/// Bounding box for a "fit" resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Target dimensions for every derived variant.
///
/// The original variant is a raw copy and has no target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageConfig {
    pub product: Dimensions,
    pub related: Dimensions,
    pub thumbnail: Dimensions,
    pub popup: Dimensions,
}

/// Options for one optimization run, as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Re-optimize images that already have an original backup
    pub force: bool,
    /// Only report what would be optimized
    pub dry_run: bool,
    /// Maximum number of images to queue; `None` or `Some(0)` is unlimited
    pub limit: Option<usize>,
    /// Optimize only this remote path, bypassing the directory scan
    pub explicit_image: Option<String>,
}

impl RunOptions {
    /// Effective limit, with zero meaning unlimited.
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|&limit| limit > 0)
    }
}

/// One image waiting to be optimized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Remote directory without leading or trailing slashes
    pub directory: String,
    /// File the optimization starts from
    pub filename: String,
}

impl QueueItem {
    pub fn new(directory: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            filename: filename.into(),
        }
    }

    /// Builds the item for an explicit remote path such as `/images/shoe-p.jpg`.
    pub fn from_remote_path(path: &str) -> Self {
        let trimmed = path.trim_matches('/');
        match trimmed.rsplit_once('/') {
            Some((directory, filename)) => Self::new(directory, filename),
            None => Self::new("", trimmed),
        }
    }

    /// Path of the item's source file on the remote store.
    pub fn remote_path(&self) -> String {
        join_remote(&self.directory, &self.filename)
    }

    /// Path of a sibling file in the item's directory.
    pub fn sibling(&self, filename: &str) -> String {
        join_remote(&self.directory, filename)
    }
}

impl fmt::Display for QueueItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.remote_path())
    }
}

/// Joins a remote directory and a file name with a single `/`.
pub fn join_remote(directory: &str, filename: &str) -> String {
    let directory = directory.trim_end_matches('/');
    if directory.is_empty() {
        filename.to_string()
    } else {
        format!("{directory}/{filename}")
    }
}
