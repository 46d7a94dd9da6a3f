//! Dialect definitions.

pub mod core;
pub mod sprig;
