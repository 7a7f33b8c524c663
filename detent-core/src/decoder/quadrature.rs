//! Interrupt-driven quadrature decoder
//!
//! [`QuadratureDecoder`] is meant to live in a `static` shared between the
//! GPIO interrupt routine, which calls [`QuadratureDecoder::on_edge`], and
//! foreground code, which reads the value and reconfigures the decoder.
//! Every method takes `&self`.
//!
//! Decoder state is held in individual atomics written with whole-value
//! stores, so readers see either the old or the new value of a field and
//! never a torn one. Edges are decoded inside a critical section, so an
//! edge raised while another is being decoded (a higher-priority line, or
//! another core) waits and is then looked up in order rather than lost.
//! Configuration changes follow a suspend/resume
//! discipline: both pins stop raising edge interrupts, the edge gate is
//! closed, the change is applied with the state machine back at `Start`,
//! and edges are re-enabled.

use core::cell::RefCell;
use core::fmt;

use critical_section::{CriticalSection, Mutex};
use detent_hal::{EdgeInput, Line};
use heapless::String;
use portable_atomic::{AtomicBool, AtomicI32, AtomicI8, AtomicU8, Ordering};

use super::bar::{self, BarError};
use super::lifecycle::{Gate, Lifecycle};
use super::listener::{Listener, ListenerError, ListenerRegistry, DEFAULT_LISTENERS};
use super::range::RangePolicy;
use super::table::{self, Direction, Node, StepMode, TransitionTable};
use crate::config::{ConfigError, DecoderOptions, EncoderConfig, Reconfigure};

/// Errors from foreground decoder operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderError {
    /// The requested configuration is invalid; nothing was changed
    Config(ConfigError),
    /// The decoder has been closed
    Closed,
}

impl From<ConfigError> for DecoderError {
    fn from(err: ConfigError) -> Self {
        DecoderError::Config(err)
    }
}

impl fmt::Display for DecoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoderError::Config(err) => write!(f, "invalid configuration: {}", err),
            DecoderError::Closed => f.write_str("decoder is closed"),
        }
    }
}

impl core::error::Error for DecoderError {}

/// Rotary encoder decoder driven by CLK/DT edge interrupts
///
/// `N` is the number of listener slots.
pub struct QuadratureDecoder<'a, C, D, const N: usize = DEFAULT_LISTENERS>
where
    C: EdgeInput,
    D: EdgeInput,
{
    clk: &'a C,
    dt: &'a D,
    table: &'static TransitionTable,
    step_mode: StepMode,
    invert: bool,
    gate: Gate,

    // State
    node: AtomicU8,
    value: AtomicI32,
    previous: AtomicI32,
    direction: AtomicI8,

    // Configuration, only written while suspended
    initial: AtomicI32,
    lower: AtomicI32,
    upper: AtomicI32,
    increment: AtomicI32,
    reversed: AtomicBool,
    policy: AtomicU8,

    listeners: Mutex<RefCell<ListenerRegistry<'a, N>>>,
}

impl<'a, C, D, const N: usize> QuadratureDecoder<'a, C, D, N>
where
    C: EdgeInput,
    D: EdgeInput,
{
    /// Create a decoder and enable edge interrupts on both pins
    ///
    /// The tracked value starts at `config.initial`, brought into range
    /// under a `Wrap` or `Bounded` policy.
    pub fn new(
        clk: &'a C,
        dt: &'a D,
        config: EncoderConfig,
        options: DecoderOptions,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        clk.set_pull(options.pull);
        dt.set_pull(options.pull);

        let value = config.normalize(config.initial);
        let decoder = Self {
            clk,
            dt,
            table: options.step_mode.table(),
            step_mode: options.step_mode,
            invert: options.invert,
            gate: Gate::new(),
            node: AtomicU8::new(Node::Start.bits()),
            value: AtomicI32::new(value),
            previous: AtomicI32::new(value),
            direction: AtomicI8::new(0),
            initial: AtomicI32::new(config.initial),
            lower: AtomicI32::new(config.lower),
            upper: AtomicI32::new(config.upper),
            increment: AtomicI32::new(config.increment),
            reversed: AtomicBool::new(config.reversed),
            policy: AtomicU8::new(config.policy as u8),
            listeners: Mutex::new(RefCell::new(ListenerRegistry::new())),
        };

        decoder.set_interrupts(true);
        Ok(decoder)
    }

    /// Edge handler; call from the GPIO interrupt for either line
    ///
    /// Both lines are re-sampled on every call, so `line` only documents
    /// the source. Never fails: edges arriving while suspended or closed
    /// are ignored. Edges are serialized; one delivered while another is
    /// being decoded waits for it and then performs its own lookup.
    pub fn on_edge(&self, _line: Line) {
        critical_section::with(|cs| {
            if !self.gate.enter_edge() {
                return;
            }
            self.decode(cs);
            self.gate.leave_edge();
        });
    }

    fn decode(&self, cs: CriticalSection<'_>) {
        let previous = self.value.load(Ordering::Relaxed);
        self.previous.store(previous, Ordering::Relaxed);

        let transition = table::lookup(self.table, self.node(), self.sample());
        self.node.store(transition.next.bits(), Ordering::Relaxed);

        let Some(direction) = transition.direction else {
            return;
        };
        let direction = if self.reversed.load(Ordering::Relaxed) {
            direction.reversed()
        } else {
            direction
        };
        self.direction.store(direction.sign(), Ordering::Relaxed);

        let increment = self.increment.load(Ordering::Relaxed);
        let step = match direction {
            Direction::Clockwise => increment,
            Direction::CounterClockwise => -increment,
        };
        let policy = RangePolicy::from_bits(self.policy.load(Ordering::Relaxed));
        let value = policy.apply(
            previous,
            step,
            self.lower.load(Ordering::Relaxed),
            self.upper.load(Ordering::Relaxed),
        );
        self.value.store(value, Ordering::Relaxed);

        if value != previous {
            self.notify(cs);
        }
    }

    /// Current 2-bit sample, `(clk << 1) | dt`, after optional inversion
    fn sample(&self) -> u8 {
        let sample = (self.clk.level() << 1) | self.dt.level();
        if self.invert {
            !sample & 0b11
        } else {
            sample
        }
    }

    fn notify(&self, cs: CriticalSection<'_>) {
        let listeners = self.listeners.borrow_ref(cs);
        if listeners.is_empty() {
            return;
        }
        let _faults = listeners.notify_all();
        #[cfg(feature = "defmt")]
        if _faults > 0 {
            defmt::debug!("{} encoder listener(s) faulted", _faults);
        }
    }

    /// Apply a partial configuration update
    ///
    /// The merged configuration is validated first; on error nothing
    /// changes. Edge processing is suspended for the whole update and the
    /// state machine restarts from `Start`.
    pub fn reconfigure(&self, update: Reconfigure) -> Result<(), DecoderError> {
        if self.is_closed() {
            return Err(DecoderError::Closed);
        }
        // Reject bad input without touching the pins
        update.apply_to(&self.config(), self.value())?;

        let _suspended = self.suspend()?;

        let (config, value) = update.apply_to(&self.config(), self.value())?;
        self.store_config(&config);
        self.value.store(value, Ordering::Relaxed);
        self.node.store(Node::Start.bits(), Ordering::Relaxed);

        #[cfg(feature = "defmt")]
        defmt::debug!("Encoder reconfigured: {}, value {}", config, value);
        Ok(())
    }

    /// Set the tracked value back to 0 (brought into range)
    pub fn reset(&self) -> Result<(), DecoderError> {
        let _suspended = self.suspend()?;

        let value = self.config().normalize(0);
        self.value.store(value, Ordering::Relaxed);
        self.node.store(Node::Start.bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Permanently stop edge processing; calling again is a no-op
    pub fn close(&self) {
        if !self.gate.close() {
            return;
        }
        self.set_interrupts(false);

        #[cfg(feature = "defmt")]
        defmt::debug!("Encoder closed at value {}", self.value());
    }

    /// Register a change listener; listeners run in registration order
    pub fn add_listener(&self, listener: &'a dyn Listener) -> Result<(), ListenerError> {
        critical_section::with(|cs| self.listeners.borrow_ref_mut(cs).add(listener))
    }

    /// Remove the first registration of `listener`
    pub fn remove_listener(&self, listener: &dyn Listener) -> Result<(), ListenerError> {
        critical_section::with(|cs| self.listeners.borrow_ref_mut(cs).remove(listener))
    }

    pub fn listener_count(&self) -> usize {
        critical_section::with(|cs| self.listeners.borrow_ref(cs).len())
    }

    /// Current tracked value
    pub fn value(&self) -> i32 {
        self.value.load(Ordering::Relaxed)
    }

    /// Value before the most recent edge
    pub fn previous_value(&self) -> i32 {
        self.previous.load(Ordering::Relaxed)
    }

    /// Last resolved direction: +1, -1, or 0 before the first detent
    ///
    /// Reflects the direction actually applied, so it is negated when the
    /// configuration is reversed.
    pub fn direction(&self) -> i8 {
        self.direction.load(Ordering::Relaxed)
    }

    /// Current state machine node
    pub fn node(&self) -> Node {
        Node::from_bits(self.node.load(Ordering::Relaxed))
    }

    /// Snapshot of the active configuration
    pub fn config(&self) -> EncoderConfig {
        EncoderConfig {
            initial: self.initial.load(Ordering::Relaxed),
            lower: self.lower.load(Ordering::Relaxed),
            upper: self.upper.load(Ordering::Relaxed),
            increment: self.increment.load(Ordering::Relaxed),
            reversed: self.reversed.load(Ordering::Relaxed),
            policy: RangePolicy::from_bits(self.policy.load(Ordering::Relaxed)),
        }
    }

    pub fn step_mode(&self) -> StepMode {
        self.step_mode
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.gate.state()
    }

    pub fn is_closed(&self) -> bool {
        self.gate.state().is_closed()
    }

    /// Render the value as a text bar over the configured bounds
    pub fn bar<const S: usize>(
        &self,
        width: usize,
        fill: char,
        empty: char,
    ) -> Result<String<S>, BarError> {
        let config = self.config();
        bar::render(self.value(), config.lower, config.upper, width, fill, empty)
    }

    fn store_config(&self, config: &EncoderConfig) {
        self.initial.store(config.initial, Ordering::Relaxed);
        self.lower.store(config.lower, Ordering::Relaxed);
        self.upper.store(config.upper, Ordering::Relaxed);
        self.increment.store(config.increment, Ordering::Relaxed);
        self.reversed.store(config.reversed, Ordering::Relaxed);
        self.policy.store(config.policy as u8, Ordering::Relaxed);
    }

    fn set_interrupts(&self, enabled: bool) {
        self.clk.set_edge_interrupts(enabled);
        self.dt.set_edge_interrupts(enabled);
    }

    /// Silence both pins and close the gate until the guard drops
    fn suspend(&self) -> Result<Suspension<'_, 'a, C, D, N>, DecoderError> {
        if self.gate.state().is_closed() {
            return Err(DecoderError::Closed);
        }
        self.set_interrupts(false);
        if self.gate.suspend().is_err() {
            return Err(DecoderError::Closed);
        }
        Ok(Suspension { decoder: self })
    }
}

impl<C, D, const N: usize> Drop for QuadratureDecoder<'_, C, D, N>
where
    C: EdgeInput,
    D: EdgeInput,
{
    fn drop(&mut self) {
        self.close();
    }
}

/// Resumes edge processing when dropped
struct Suspension<'d, 'a, C, D, const N: usize>
where
    C: EdgeInput,
    D: EdgeInput,
{
    decoder: &'d QuadratureDecoder<'a, C, D, N>,
}

impl<C, D, const N: usize> Drop for Suspension<'_, '_, C, D, N>
where
    C: EdgeInput,
    D: EdgeInput,
{
    fn drop(&mut self) {
        // Edges landing between these two calls are still dropped by the gate
        self.decoder.set_interrupts(true);
        self.decoder.gate.resume();
    }
}
