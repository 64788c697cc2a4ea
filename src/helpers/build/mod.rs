//! Unpacking downloaded artifacts into the vendor directory.

pub mod extract;

pub use extract::{ArchiveExtractor, EntryInfo, ExtractReport};
