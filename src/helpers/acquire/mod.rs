//! Getting artifacts onto disk
//!
//! - **download**: one URL to one file, streamed in chunks
//! - **fallback**: an ordered source list, first success wins

pub mod download;
pub mod fallback;

pub use download::{Downloader, HttpDownloader};
pub use fallback::FallbackDownloader;
