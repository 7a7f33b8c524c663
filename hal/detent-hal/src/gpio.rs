//! GPIO pin abstractions
//!
//! Provides the input traits an encoder decoder needs. Every method takes
//! `&self`: pins are shared between foreground code and the interrupt that
//! delivers edges, so implementations are expected to use register writes
//! or their own interior mutability.

/// Which encoder line raised an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    /// CLK line (also called A)
    Clk,
    /// DT line (also called B)
    Dt,
}

/// Internal bias resistor setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// Floating input, external resistors expected
    #[default]
    None,
    /// Internal pull-up enabled
    Up,
}

/// Digital input pin
///
/// Implementations should handle the actual hardware register reading
/// for the specific chip.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }

    /// Current level as a single bit
    fn level(&self) -> u8 {
        u8::from(self.is_high())
    }
}

/// Input pin that can raise an interrupt on both rising and falling edges
///
/// The interrupt routine itself is owned by the application: it is expected
/// to call the decoder's edge handler whenever this pin reports an edge and
/// edge interrupts are enabled.
pub trait EdgeInput: InputPin {
    /// Configure the internal bias resistor
    fn set_pull(&self, pull: Pull);

    /// Enable or disable edge interrupts (rising and falling)
    ///
    /// Disabling must take effect before this call returns: no edge
    /// delivered afterwards may reach the decoder.
    fn set_edge_interrupts(&self, enabled: bool);

    /// Check whether edge interrupts are currently enabled
    fn edge_interrupts_enabled(&self) -> bool;
}
