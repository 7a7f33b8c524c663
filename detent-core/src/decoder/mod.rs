//! Quadrature decoding
//!
//! Turns CLK/DT edges into validated detents and a tracked value.

pub mod bar;
pub mod lifecycle;
pub mod listener;
pub mod quadrature;
pub mod range;
pub mod table;

pub use bar::BarError;
pub use lifecycle::Lifecycle;
pub use listener::{Listener, ListenerError, ListenerFault, ListenerRegistry, DEFAULT_LISTENERS};
pub use quadrature::{DecoderError, QuadratureDecoder};
pub use range::RangePolicy;
pub use table::{Direction, Node, StepMode, Transition, TransitionTable, FULL_STEP, HALF_STEP};
