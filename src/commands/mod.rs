//! Entry points used by the command line front end.
//!
//! - [`optimize_remote`]: Scan the FTP directories and optimize what is missing
//! - [`upload_image`]: Optimize a local image straight onto the FTP server

mod optimize;

pub use optimize::*;
