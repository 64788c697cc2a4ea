//! Core of the acquisition pipeline
//!
//! Catalog, platform resolution, consent, configuration and the run itself.
//! The download, extract and install mechanics live in `helpers`.

pub mod catalog;
pub mod config;
pub mod consent;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod platform;
pub mod preflight;
