//! Bus subscribers owned by the CLI: logging, persistence, and run stats.

mod log;
mod stats;
mod upload;

pub use log::LogHandler;
pub use stats::StatsHandler;
pub use upload::UploadHandler;
