//! Posterpack discovery over a set of root directories.

mod cache;
mod scanner;

pub use cache::{FileStamp, PackCache};
pub use scanner::{ScanReport, ScanRun, ScanWarning, Scanner, relative_archive_path};
