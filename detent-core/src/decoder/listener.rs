//! Change listeners
//!
//! Listeners are borrowed, never owned: the registry stores `&dyn Listener`
//! handles purely for invocation and removal.

use core::fmt;

use heapless::Vec;

/// Default number of listener slots per decoder
pub const DEFAULT_LISTENERS: usize = 4;

/// Failure reported by a listener
///
/// The decoder contains it: a faulting listener never stops the edge
/// handler or the listeners registered after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ListenerFault(pub &'static str);

impl fmt::Display for ListenerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener fault: {}", self.0)
    }
}

/// Listener registration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ListenerError {
    /// Handle was never registered (or already removed)
    NotFound,
    /// All listener slots are in use
    RegistryFull,
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::NotFound => f.write_str("listener is not installed"),
            ListenerError::RegistryFull => f.write_str("listener registry is full"),
        }
    }
}

impl core::error::Error for ListenerError {}

/// Callback invoked after a detent changed the tracked value
///
/// Runs in interrupt context: it must be short and must not block. It may
/// read the decoder's accessors but must not reconfigure, reset or close
/// the decoder, nor add or remove listeners.
pub trait Listener: Sync {
    fn notify(&self) -> Result<(), ListenerFault>;
}

impl<F> Listener for F
where
    F: Fn() -> Result<(), ListenerFault> + Sync,
{
    fn notify(&self) -> Result<(), ListenerFault> {
        self()
    }
}

/// Ordered, fixed-capacity listener list
pub struct ListenerRegistry<'a, const N: usize = DEFAULT_LISTENERS> {
    listeners: Vec<&'a dyn Listener, N>,
}

impl<const N: usize> Default for ListenerRegistry<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> ListenerRegistry<'a, N> {
    pub const fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Append a listener; duplicates are allowed
    pub fn add(&mut self, listener: &'a dyn Listener) -> Result<(), ListenerError> {
        self.listeners
            .push(listener)
            .map_err(|_| ListenerError::RegistryFull)
    }

    /// Remove the first registration of exactly this handle
    pub fn remove(&mut self, listener: &dyn Listener) -> Result<(), ListenerError> {
        let index = self
            .listeners
            .iter()
            .position(|l| same_listener(*l, listener))
            .ok_or(ListenerError::NotFound)?;
        self.listeners.remove(index);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Invoke every listener in registration order
    ///
    /// Returns the number of listeners that reported a fault.
    pub fn notify_all(&self) -> usize {
        let mut faults = 0;
        for listener in &self.listeners {
            if let Err(_fault) = listener.notify() {
                #[cfg(feature = "defmt")]
                defmt::warn!("Encoder listener failed: {}", _fault);
                faults += 1;
            }
        }
        faults
    }
}

/// Identity comparison on the data pointer; vtable pointers for one type
/// may differ between codegen units.
fn same_listener(a: &dyn Listener, b: &dyn Listener) -> bool {
    if core::mem::size_of_val(a) == 0 {
        // Zero-sized listeners (fn items, capture-less closures) share an
        // address, only the vtable tells them apart
        core::ptr::eq(a, b)
    } else {
        core::ptr::addr_eq(a as *const dyn Listener, b as *const dyn Listener)
    }
}
