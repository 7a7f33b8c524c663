//! Detent Hardware Abstraction Layer
//!
//! This crate defines the pin traits the decoder needs from a chip-specific
//! HAL. The decoder only ever reads levels and switches edge interrupts on
//! and off, so the surface is deliberately small.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  detent-core (QuadratureDecoder)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  detent-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  detent-drivers (embedded-hal adapter)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::InputPin`] - Level reads
//! - [`gpio::EdgeInput`] - Level reads plus edge interrupt control

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;

// Re-export key traits at crate root for convenience
pub use gpio::{EdgeInput, InputPin, Line, Pull};
