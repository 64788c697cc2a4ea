//! Pipeline mechanics
//!
//! The stages a missing dependency passes through:
//! acquire -> build (extract) -> install.
//!
//! ## Categories
//!
//! - **acquire**: Downloader, FallbackDownloader
//! - **build**: ArchiveExtractor
//! - **install**: archive, disk-image and package-manager strategies
//! - **internal**: filesystem, hashing and progress utilities

pub mod acquire;
pub mod build;
pub mod install;
pub mod internal;
