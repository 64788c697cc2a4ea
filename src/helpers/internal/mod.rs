//! Internal utilities shared by the helpers.

pub mod fs_utils;
pub mod hash;
pub mod progress;
