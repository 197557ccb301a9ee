use std::str::FromStr;
use crate::utils::OptimizerError;

/// Image formats the shop stores variants for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    JPEG,
    PNG,
    GIF,
}

impl FromStr for ImageFormat {
    type Err = OptimizerError;

    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "jpg" => Ok(Self::JPEG),
            "png" => Ok(Self::PNG),
            "gif" => Ok(Self::GIF),
            _ => Err(OptimizerError::validation(format!(
                "Unsupported image format: {}", ext
            ))),
        }
    }
}

/// True when `ext` (without the dot) is one of the recognized image extensions.
pub fn is_image_extension(ext: &str) -> bool {
    ImageFormat::from_str(ext).is_ok()
}

/// Get format from file extension
pub fn format_from_extension(path: &str) -> Result<ImageFormat, OptimizerError> {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| OptimizerError::validation(
            format!("File has no extension: {}", path)
        ))?;

    ImageFormat::from_str(ext)
}
