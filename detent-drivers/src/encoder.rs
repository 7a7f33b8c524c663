//! Board wiring for one rotary encoder
//!
//! Pins are described with the usual config-string syntax:
//!
//! - `"gpio11"` - plain input
//! - `"!gpio12"` - active-low (inverted)
//! - `"^gpio4"` - internal pull-up enabled
//!
//! Prefixes may be combined in either order (`"^!gpio4"`).

use core::fmt;

use detent_core::{ConfigError, DecoderOptions, EncoderConfig, QuadratureDecoder};
use detent_hal::{EdgeInput, Line};
use embedded_hal::digital::InputPin as HalInputPin;

use crate::gpio::EdgePin;

/// Pin description errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Not of the form `[!^]gpioN`
    InvalidFormat,
    /// Pin number not present on this chip
    InvalidPin(u8),
    /// CLK and DT name the same pin
    SamePin(u8),
    /// Only one of CLK and DT is marked inverted
    MixedInversion,
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::InvalidFormat => f.write_str("expected a pin like \"^!gpio4\""),
            PinError::InvalidPin(pin) => write!(f, "gpio{} does not exist", pin),
            PinError::SamePin(pin) => write!(f, "CLK and DT both use gpio{}", pin),
            PinError::MixedInversion => f.write_str("CLK and DT must share the same polarity"),
        }
    }
}

impl core::error::Error for PinError {}

/// One encoder line as written in the board config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO pin number
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
    /// Enable internal pull-up
    pub pull_up: bool,
}

impl PinConfig {
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: false,
        }
    }

    /// Parse a pin string such as `"^!gpio4"`
    pub fn parse(s: &str) -> Result<Self, PinError> {
        let mut rest = s.trim();
        let mut config = PinConfig::default();

        loop {
            if let Some(stripped) = rest.strip_prefix('!') {
                config.inverted = true;
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix('^') {
                config.pull_up = true;
                rest = stripped;
            } else {
                break;
            }
        }

        let number = rest.strip_prefix("gpio").ok_or(PinError::InvalidFormat)?;
        config.pin = number.parse().map_err(|_| PinError::InvalidFormat)?;
        Ok(config)
    }
}

/// CLK/DT wiring plus detection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderPinConfig {
    pub clk: PinConfig,
    pub dt: PinConfig,
    pub half_step: bool,
}

impl EncoderPinConfig {
    /// Parse both lines, e.g. `EncoderPinConfig::parse("^gpio4", "^gpio5", false)`
    pub fn parse(clk: &str, dt: &str, half_step: bool) -> Result<Self, PinError> {
        Ok(Self {
            clk: PinConfig::parse(clk)?,
            dt: PinConfig::parse(dt)?,
            half_step,
        })
    }

    /// Check the wiring against a chip with `gpio_count` pins
    pub fn validate(&self, gpio_count: u8) -> Result<(), PinError> {
        for pin in [self.clk.pin, self.dt.pin] {
            if pin >= gpio_count {
                return Err(PinError::InvalidPin(pin));
            }
        }
        if self.clk.pin == self.dt.pin {
            return Err(PinError::SamePin(self.clk.pin));
        }
        if self.clk.inverted != self.dt.inverted {
            return Err(PinError::MixedInversion);
        }
        Ok(())
    }

    /// Decoder options implied by the wiring
    ///
    /// Pull-up is applied to both lines if either asks for it.
    pub fn options(&self) -> DecoderOptions {
        DecoderOptions::new()
            .inverted(self.clk.inverted)
            .half_step(self.half_step)
            .pull_up(self.clk.pull_up || self.dt.pull_up)
    }
}

/// The two encoder inputs of a board
pub struct EncoderPins<C, D> {
    pub clk: EdgePin<C>,
    pub dt: EdgePin<D>,
}

impl<C: HalInputPin, D: HalInputPin> EncoderPins<C, D> {
    pub const fn new(clk: C, dt: D) -> Self {
        Self {
            clk: EdgePin::new(clk),
            dt: EdgePin::new(dt),
        }
    }

    /// Build a decoder over these pins
    pub fn decoder<const N: usize>(
        &self,
        config: EncoderConfig,
        options: DecoderOptions,
    ) -> Result<QuadratureDecoder<'_, EdgePin<C>, EdgePin<D>, N>, ConfigError> {
        QuadratureDecoder::new(&self.clk, &self.dt, config, options)
    }

    /// Forward a GPIO interrupt for `line` to the decoder
    ///
    /// Call from the board's GPIO interrupt routine after acknowledging
    /// the interrupt. Edges on a line whose interrupts are disabled are
    /// discarded, as the hardware would.
    pub fn on_interrupt<const N: usize>(
        &self,
        decoder: &QuadratureDecoder<'_, EdgePin<C>, EdgePin<D>, N>,
        line: Line,
    ) {
        let enabled = match line {
            Line::Clk => self.clk.edge_interrupts_enabled(),
            Line::Dt => self.dt.edge_interrupts_enabled(),
        };
        if enabled {
            decoder.on_edge(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::mock::ScriptedPin;
    use detent_core::{RangePolicy, Reconfigure, StepMode};
    use detent_hal::Pull;

    #[test]
    fn test_parse_pin_string() {
        assert_eq!(PinConfig::parse("gpio11"), Ok(PinConfig::new(11)));
        assert_eq!(
            PinConfig::parse("!gpio12"),
            Ok(PinConfig {
                pin: 12,
                inverted: true,
                pull_up: false
            })
        );
        assert_eq!(
            PinConfig::parse(" ^!gpio4 "),
            Ok(PinConfig {
                pin: 4,
                inverted: true,
                pull_up: true
            })
        );
        assert_eq!(PinConfig::parse("!^gpio4"), PinConfig::parse("^!gpio4"));

        // Invalid
        assert_eq!(PinConfig::parse("pin11"), Err(PinError::InvalidFormat));
        assert_eq!(PinConfig::parse("gpio"), Err(PinError::InvalidFormat));
        assert_eq!(PinConfig::parse("gpio300"), Err(PinError::InvalidFormat));
        assert_eq!(PinConfig::parse(""), Err(PinError::InvalidFormat));
    }

    #[test]
    fn test_validate_wiring() {
        let ok = EncoderPinConfig::parse("^gpio4", "^gpio5", false).unwrap();
        assert_eq!(ok.validate(30), Ok(()));
        assert_eq!(ok.validate(5), Err(PinError::InvalidPin(5)));

        let same = EncoderPinConfig::parse("gpio4", "gpio4", false).unwrap();
        assert_eq!(same.validate(30), Err(PinError::SamePin(4)));

        let mixed = EncoderPinConfig::parse("!gpio4", "gpio5", false).unwrap();
        assert_eq!(mixed.validate(30), Err(PinError::MixedInversion));
    }

    #[test]
    fn test_options_from_wiring() {
        let wiring = EncoderPinConfig::parse("!gpio2", "!^gpio3", true).unwrap();
        let options = wiring.options();
        assert!(options.invert);
        assert_eq!(options.step_mode, StepMode::HalfStep);
        assert_eq!(options.pull, Pull::Up);
    }

    fn drive(pins: &EncoderPins<ScriptedPin, ScriptedPin>, sample: u8) {
        pins.clk.with_pin(|p| p.level.set(sample & 0b10 != 0));
        pins.dt.with_pin(|p| p.level.set(sample & 0b01 != 0));
    }

    #[test]
    fn test_decoder_over_hal_pins() {
        let pins = EncoderPins::new(ScriptedPin::new(true), ScriptedPin::new(true));
        let wiring = EncoderPinConfig::parse("^gpio4", "^gpio5", false).unwrap();
        let config = EncoderConfig::new()
            .with_bounds(0, 3)
            .with_policy(RangePolicy::Wrap);
        let decoder = pins.decoder::<2>(config, wiring.options()).unwrap();
        assert_eq!(pins.clk.pull(), Pull::Up);

        // One clockwise detent: DT falls, CLK falls, DT rises, CLK rises
        let edges = [
            (0b10, Line::Dt),
            (0b00, Line::Clk),
            (0b01, Line::Dt),
            (0b11, Line::Clk),
        ];
        for (sample, line) in edges {
            drive(&pins, sample);
            pins.on_interrupt(&decoder, line);
        }
        assert_eq!(decoder.value(), 1);

        decoder.reconfigure(Reconfigure::new().value(3)).unwrap();
        for (sample, line) in edges {
            drive(&pins, sample);
            pins.on_interrupt(&decoder, line);
        }
        assert_eq!(decoder.value(), 0);

        decoder.close();
        assert!(!pins.clk.edge_interrupts_enabled());
        for (sample, line) in edges {
            drive(&pins, sample);
            pins.on_interrupt(&decoder, line);
        }
        assert_eq!(decoder.value(), 0);
    }
}
