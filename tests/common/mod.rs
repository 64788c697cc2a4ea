//! Common test utilities for pipeline and CLI tests.

#![allow(dead_code)]

mod fixtures;

pub use fixtures::*;
