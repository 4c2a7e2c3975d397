//! Common utilities for the Quire layout engine.
//!
//! This crate provides shared infrastructure used by all layout components:
//! - **Warning System** - per-run deduplicated warnings for unsupported features

pub mod warning;
