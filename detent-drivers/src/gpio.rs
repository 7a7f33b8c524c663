//! embedded-hal input adapter
//!
//! `embedded-hal` 1.0 input pins read through `&mut self` and have no notion
//! of interrupts. [`EdgePin`] wraps one so it can be shared with the
//! decoder: reads go through a critical section, and the interrupt enable
//! is a flag the board's interrupt routine checks before forwarding an
//! edge (see [`crate::encoder::EncoderPins::on_interrupt`]).

use core::cell::RefCell;

use critical_section::Mutex;
use detent_hal::{EdgeInput, InputPin, Pull};
use embedded_hal::digital::InputPin as HalInputPin;
use portable_atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Shareable edge input built on an `embedded-hal` pin
pub struct EdgePin<P> {
    pin: Mutex<RefCell<P>>,
    listening: AtomicBool,
    pull: AtomicU8,
    /// Level returned when a read fails
    last_level: AtomicBool,
    read_errors: AtomicU32,
}

impl<P: HalInputPin> EdgePin<P> {
    /// Wrap a pin; edge interrupts start disabled
    pub const fn new(pin: P) -> Self {
        Self {
            pin: Mutex::new(RefCell::new(pin)),
            listening: AtomicBool::new(false),
            pull: AtomicU8::new(0),
            last_level: AtomicBool::new(true),
            read_errors: AtomicU32::new(0),
        }
    }

    /// Bias the decoder asked for
    ///
    /// `embedded-hal` cannot change pin bias after construction, so board
    /// code reads this when building the concrete pin.
    pub fn pull(&self) -> Pull {
        match self.pull.load(Ordering::Relaxed) {
            1 => Pull::Up,
            _ => Pull::None,
        }
    }

    /// Number of failed level reads
    pub fn read_errors(&self) -> u32 {
        self.read_errors.load(Ordering::Relaxed)
    }

    /// Give the wrapped pin back
    pub fn into_inner(self) -> P {
        self.pin.into_inner().into_inner()
    }

    #[cfg(test)]
    pub(crate) fn with_pin<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        critical_section::with(|cs| f(&self.pin.borrow_ref(cs)))
    }
}

impl<P: HalInputPin> InputPin for EdgePin<P> {
    /// Read the level; a failed read repeats the last good level, which
    /// the transition table treats as "no movement"
    fn is_high(&self) -> bool {
        let read = critical_section::with(|cs| self.pin.borrow_ref_mut(cs).is_high());
        match read {
            Ok(high) => {
                self.last_level.store(high, Ordering::Relaxed);
                high
            }
            Err(_) => {
                self.read_errors.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "defmt")]
                defmt::warn!("Encoder pin read failed");
                self.last_level.load(Ordering::Relaxed)
            }
        }
    }
}

impl<P: HalInputPin> EdgeInput for EdgePin<P> {
    fn set_pull(&self, pull: Pull) {
        let bits = match pull {
            Pull::None => 0,
            Pull::Up => 1,
        };
        self.pull.store(bits, Ordering::Relaxed);
    }

    fn set_edge_interrupts(&self, enabled: bool) {
        self.listening.store(enabled, Ordering::Release);
    }

    fn edge_interrupts_enabled(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }
}
