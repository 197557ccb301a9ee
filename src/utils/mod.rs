pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;
pub mod lock;

pub use error::{
    ListingError,
    OptimizerError,
    OptimizerResult,
    PathError,
    RemoteError,
    ServiceError,
    ValidationError,
};
pub use validation::{validate_config, validate_input_path, validate_settings};
pub use formats::{ImageFormat, format_from_extension, is_image_extension};
pub use fs::{ScratchFile, get_extension};
pub use lock::InstanceLock;
