//! Encoder configuration types
//!
//! [`EncoderConfig`] holds everything that can change while the decoder is
//! running. [`DecoderOptions`] holds what is fixed at construction.

use core::fmt;

use detent_hal::Pull;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::decoder::{RangePolicy, StepMode};

/// Invalid encoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Lower bound above upper bound with a policy that uses bounds
    InvertedBounds { lower: i32, upper: i32 },
    /// Increment must be a positive magnitude
    NonPositiveIncrement(i32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvertedBounds { lower, upper } => {
                write!(f, "lower bound {} is above upper bound {}", lower, upper)
            }
            ConfigError::NonPositiveIncrement(incr) => {
                write!(f, "increment {} is not positive", incr)
            }
        }
    }
}

impl core::error::Error for ConfigError {}

/// Runtime-adjustable encoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EncoderConfig {
    /// Value the decoder starts from
    pub initial: i32,
    /// Lower bound (used by `Wrap` and `Bounded`)
    pub lower: i32,
    /// Upper bound (used by `Wrap` and `Bounded`)
    pub upper: i32,
    /// Step applied per detent, always positive
    pub increment: i32,
    /// Swap clockwise and counter-clockwise
    pub reversed: bool,
    /// Out-of-range handling
    pub policy: RangePolicy,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderConfig {
    /// Unbounded counter starting at 0 with bounds `[0, 10]` and step 1
    pub const fn new() -> Self {
        Self {
            initial: 0,
            lower: 0,
            upper: 10,
            increment: 1,
            reversed: false,
            policy: RangePolicy::Unbounded,
        }
    }

    /// Set both bounds; the initial value follows the lower bound
    pub const fn with_bounds(mut self, lower: i32, upper: i32) -> Self {
        self.lower = lower;
        self.upper = upper;
        self.initial = lower;
        self
    }

    /// Set the starting value
    pub const fn with_initial(mut self, initial: i32) -> Self {
        self.initial = initial;
        self
    }

    pub const fn with_increment(mut self, increment: i32) -> Self {
        self.increment = increment;
        self
    }

    pub const fn with_policy(mut self, policy: RangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn with_reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    /// Check the configuration invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.increment <= 0 {
            return Err(ConfigError::NonPositiveIncrement(self.increment));
        }
        if self.policy.uses_bounds() && self.lower > self.upper {
            return Err(ConfigError::InvertedBounds {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    /// Bring `value` into range under the active policy
    ///
    /// Wrap folds the value into `[lower, upper]`, Bounded clamps it and
    /// Unbounded leaves it alone.
    pub fn normalize(&self, value: i32) -> i32 {
        self.policy.apply(value, 0, self.lower, self.upper)
    }
}

/// Partial update applied by `QuadratureDecoder::reconfigure`
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reconfigure {
    pub value: Option<i32>,
    pub lower: Option<i32>,
    pub upper: Option<i32>,
    pub increment: Option<i32>,
    pub reversed: Option<bool>,
    pub policy: Option<RangePolicy>,
}

impl Reconfigure {
    pub const fn new() -> Self {
        Self {
            value: None,
            lower: None,
            upper: None,
            increment: None,
            reversed: None,
            policy: None,
        }
    }

    pub const fn value(mut self, value: i32) -> Self {
        self.value = Some(value);
        self
    }

    pub const fn lower(mut self, lower: i32) -> Self {
        self.lower = Some(lower);
        self
    }

    pub const fn upper(mut self, upper: i32) -> Self {
        self.upper = Some(upper);
        self
    }

    pub const fn bounds(self, lower: i32, upper: i32) -> Self {
        self.lower(lower).upper(upper)
    }

    pub const fn increment(mut self, increment: i32) -> Self {
        self.increment = Some(increment);
        self
    }

    pub const fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = Some(reversed);
        self
    }

    pub const fn policy(mut self, policy: RangePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Merge onto the current configuration and value
    ///
    /// Returns the validated configuration and the value the decoder should
    /// hold afterwards, already brought into range.
    pub fn apply_to(
        &self,
        config: &EncoderConfig,
        value: i32,
    ) -> Result<(EncoderConfig, i32), ConfigError> {
        let merged = EncoderConfig {
            initial: config.initial,
            lower: self.lower.unwrap_or(config.lower),
            upper: self.upper.unwrap_or(config.upper),
            increment: self.increment.unwrap_or(config.increment),
            reversed: self.reversed.unwrap_or(config.reversed),
            policy: self.policy.unwrap_or(config.policy),
        };
        merged.validate()?;

        let value = merged.normalize(self.value.unwrap_or(value));
        Ok((merged, value))
    }
}

/// Construction-time decoder options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderOptions {
    /// Complement the 2-bit sample before lookup (active-low wiring)
    pub invert: bool,
    /// Full-step or half-step table
    pub step_mode: StepMode,
    /// Bias applied to both lines
    pub pull: Pull,
}

impl DecoderOptions {
    pub const fn new() -> Self {
        Self {
            invert: false,
            step_mode: StepMode::FullStep,
            pull: Pull::None,
        }
    }

    pub const fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub const fn half_step(mut self, half_step: bool) -> Self {
        self.step_mode = if half_step {
            StepMode::HalfStep
        } else {
            StepMode::FullStep
        };
        self
    }

    pub const fn pull_up(mut self, pull_up: bool) -> Self {
        self.pull = if pull_up { Pull::Up } else { Pull::None };
        self
    }
}
