//! Internal implementation modules for `manywheel-core`.

pub mod config;
pub mod python;
pub mod runtime;
pub mod tooling;
pub mod wheels;
