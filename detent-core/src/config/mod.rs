//! Configuration types
//!
//! Board-agnostic encoder configuration.

pub mod encoder;

pub use encoder::*;
