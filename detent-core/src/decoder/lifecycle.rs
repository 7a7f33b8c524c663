//! Decoder lifecycle and the edge gate
//!
//! ```text
//! Active ──edge──▶ Handling ──done──▶ Active
//! Active ──suspend──▶ Suspended ──resume──▶ Active
//! Active ──close──▶ Closed (terminal)
//! ```
//!
//! The edge handler claims `Active -> Handling` from inside a critical
//! section, so edges never run concurrently with each other: a second edge
//! waits for the section and is then handled in order. Foreground operations
//! only mutate after winning `Active -> Suspended`, so they never overlap an
//! edge either. On a single core the handler preempts foreground code and
//! always finishes first; the spin in [`Gate::suspend`] and [`Gate::close`]
//! only ever waits on another core.

use portable_atomic::{AtomicU8, Ordering};

/// Decoder lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Lifecycle {
    /// Edges are processed
    Active = 0,
    /// An edge is being processed right now
    Handling = 1,
    /// Configuration is being changed; edges are dropped
    Suspended = 2,
    /// Permanently stopped; edges are dropped
    Closed = 3,
}

impl Lifecycle {
    const fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Lifecycle::Active,
            1 => Lifecycle::Handling,
            2 => Lifecycle::Suspended,
            _ => Lifecycle::Closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Lifecycle::Closed)
    }
}

/// Returned when a foreground operation hits a closed decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GateClosed;

/// Software side of the suspend/resume discipline
pub(crate) struct Gate {
    state: AtomicU8,
}

impl Gate {
    pub(crate) const fn new() -> Self {
        Self {
            state: AtomicU8::new(Lifecycle::Active as u8),
        }
    }

    pub(crate) fn state(&self) -> Lifecycle {
        Lifecycle::from_bits(self.state.load(Ordering::Acquire))
    }

    /// Claim the gate for one edge; `false` means the decoder is suspended
    /// or closed and the edge is dropped
    ///
    /// Callers hold a critical section, so `Handling` is never observed here
    /// except on reentry from the handler itself.
    pub(crate) fn enter_edge(&self) -> bool {
        self.state
            .compare_exchange(
                Lifecycle::Active as u8,
                Lifecycle::Handling as u8,
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    pub(crate) fn leave_edge(&self) {
        self.state.store(Lifecycle::Active as u8, Ordering::Release);
    }

    /// Move to `Suspended`, waiting out an in-flight edge
    pub(crate) fn suspend(&self) -> Result<(), GateClosed> {
        self.transition_from_active(Lifecycle::Suspended)
    }

    pub(crate) fn resume(&self) {
        self.state.store(Lifecycle::Active as u8, Ordering::Release);
    }

    /// Move to `Closed`; returns `false` if it already was
    pub(crate) fn close(&self) -> bool {
        self.transition_from_active(Lifecycle::Closed).is_ok()
    }

    fn transition_from_active(&self, target: Lifecycle) -> Result<(), GateClosed> {
        loop {
            match self.state.compare_exchange_weak(
                Lifecycle::Active as u8,
                target as u8,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(current) if Lifecycle::from_bits(current).is_closed() => {
                    return Err(GateClosed)
                }
                Err(_) => core::hint::spin_loop(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_enter_leave() {
        let gate = Gate::new();
        assert_eq!(gate.state(), Lifecycle::Active);

        assert!(gate.enter_edge());
        assert_eq!(gate.state(), Lifecycle::Handling);
        // Reentry from inside the handler is refused
        assert!(!gate.enter_edge());

        gate.leave_edge();
        assert_eq!(gate.state(), Lifecycle::Active);
    }

    #[test]
    fn test_suspended_drops_edges() {
        let gate = Gate::new();
        gate.suspend().unwrap();
        assert!(!gate.enter_edge());
        assert_eq!(gate.state(), Lifecycle::Suspended);

        gate.resume();
        assert!(gate.enter_edge());
    }

    #[test]
    fn test_close_is_terminal_and_idempotent() {
        let gate = Gate::new();
        assert!(gate.close());
        assert!(!gate.close());
        assert!(gate.state().is_closed());
        assert!(!gate.enter_edge());
        assert_eq!(gate.suspend(), Err(GateClosed));
    }

    #[test]
    fn test_suspend_waits_for_edge_on_other_thread() {
        use std::sync::atomic::AtomicBool;
        use std::time::Duration;

        let gate = Gate::new();
        let suspended = AtomicBool::new(false);
        assert!(gate.enter_edge());

        std::thread::scope(|s| {
            s.spawn(|| {
                gate.suspend().unwrap();
                suspended.store(true, std::sync::atomic::Ordering::SeqCst);
            });

            std::thread::sleep(Duration::from_millis(20));
            assert!(!suspended.load(std::sync::atomic::Ordering::SeqCst));
            gate.leave_edge();
        });

        assert!(suspended.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(gate.state(), Lifecycle::Suspended);
    }
}
