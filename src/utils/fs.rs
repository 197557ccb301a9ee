use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use crate::utils::{OptimizerError, OptimizerResult};

/// Local scratch file shared by all transfers of one queue item.
///
/// The file is removed when the value is dropped, whichever way the item
/// finishes.
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Creates an empty scratch file whose name ends in `.{extension}`.
    pub fn new(extension: Option<&str>) -> OptimizerResult<Self> {
        let suffix = extension.map(|ext| format!(".{ext}")).unwrap_or_default();
        let file = tempfile::Builder::new()
            .prefix("ftp-image-optimizer-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| OptimizerError::io(format!("Failed to create scratch file: {e}")))?;
        Ok(Self { file })
    }

    /// Replaces the file content with `bytes` and returns the handle rewound
    /// to the start, ready to be streamed to the remote store.
    pub fn stage(&mut self, bytes: &[u8]) -> OptimizerResult<&mut File> {
        let handle = self.file.as_file_mut();
        handle.set_len(0)?;
        handle.seek(SeekFrom::Start(0))?;
        handle.write_all(bytes)?;
        handle.flush()?;
        handle.seek(SeekFrom::Start(0))?;
        Ok(handle)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Get file extension as lowercase string
pub fn get_extension(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
