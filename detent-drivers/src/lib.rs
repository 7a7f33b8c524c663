//! Board-side glue for Detent
//!
//! This crate connects the chip-independent decoder in detent-core to real
//! hardware:
//!
//! - [`gpio::EdgePin`] adapts any `embedded-hal` 1.0 input pin
//! - [`encoder::EncoderPins`] owns the CLK/DT pair and routes interrupts
//! - [`encoder::PinConfig`] parses pin strings such as `"^!gpio4"`

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod encoder;
pub mod gpio;

pub use encoder::{EncoderPinConfig, EncoderPins, PinConfig, PinError};
pub use gpio::EdgePin;
