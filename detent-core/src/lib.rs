//! Board-agnostic rotary encoder decoding
//!
//! This crate contains everything that does not depend on a specific chip:
//!
//! - Gray-code transition tables (full-step and half-step)
//! - The interrupt-safe quadrature decoder and its lifecycle
//! - Range policies (unbounded, wrap, bounded)
//! - Change listener registry
//! - Encoder configuration types
//!
//! Pins are reached through the `detent-hal` traits.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod decoder;

pub use config::{ConfigError, DecoderOptions, EncoderConfig, Reconfigure};
pub use decoder::{
    DecoderError, Direction, Listener, ListenerError, ListenerFault, QuadratureDecoder,
    RangePolicy, StepMode,
};
