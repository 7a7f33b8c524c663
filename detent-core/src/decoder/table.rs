//! Gray-code transition tables
//!
//! A mechanical encoder produces the 2-bit sequence `11 -> 10 -> 00 -> 01 -> 11`
//! for one clockwise detent and the reverse for counter-clockwise. The
//! state machine only emits a direction once a complete, ordered sequence
//! has been seen, so contact bounce just walks back and forth between
//! intermediate nodes without ever producing a count.
//!
//! Samples are packed as `(clk << 1) | dt` and index the table columns.

/// Mask applied to a stored node id before indexing a table row
pub const NODE_MASK: u8 = 0x07;

/// State machine node
///
/// Eight nodes cover every 3-bit value, so a masked id always decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Node {
    /// Resting, both lines high
    Start = 0,
    /// Clockwise path, first step
    Cw1 = 1,
    /// Clockwise path, second step
    Cw2 = 2,
    /// Clockwise path, third step
    Cw3 = 3,
    /// Counter-clockwise path, first step
    Ccw1 = 4,
    /// Counter-clockwise path, second step
    Ccw2 = 5,
    /// Counter-clockwise path, third step
    Ccw3 = 6,
    /// Unreachable sink; every sample leads back to `Start`
    Illegal = 7,
}

impl Node {
    /// All nodes in id order
    pub const ALL: [Node; 8] = [
        Node::Start,
        Node::Cw1,
        Node::Cw2,
        Node::Cw3,
        Node::Ccw1,
        Node::Ccw2,
        Node::Ccw3,
        Node::Illegal,
    ];

    /// Decode a stored node id, ignoring bits above [`NODE_MASK`]
    pub const fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & NODE_MASK) as usize]
    }

    /// Node id as stored by the decoder
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Rotation direction resolved by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    /// +1 for clockwise, -1 for counter-clockwise
    pub const fn sign(self) -> i8 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }

    /// The opposite rotation
    pub const fn reversed(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

/// One table entry: where to go next and, at a detent boundary, which way
/// the shaft turned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub next: Node,
    pub direction: Option<Direction>,
}

impl Transition {
    const fn to(next: Node) -> Self {
        Self {
            next,
            direction: None,
        }
    }

    const fn cw(next: Node) -> Self {
        Self {
            next,
            direction: Some(Direction::Clockwise),
        }
    }

    const fn ccw(next: Node) -> Self {
        Self {
            next,
            direction: Some(Direction::CounterClockwise),
        }
    }
}

/// Rows indexed by node id, columns by 2-bit sample
pub type TransitionTable = [[Transition; 4]; 8];

use Node::*;
use Transition as T;

/// One count per detent, emitted when the lines return to `11`
pub static FULL_STEP: TransitionTable = [
    //  00            01            10            11
    [T::to(Start), T::to(Ccw1), T::to(Cw1), T::to(Start)], // Start
    [T::to(Cw2), T::to(Start), T::to(Cw1), T::to(Start)],  // Cw1
    [T::to(Cw2), T::to(Cw3), T::to(Cw1), T::to(Start)],    // Cw2
    [T::to(Cw2), T::to(Cw3), T::to(Start), T::cw(Start)],  // Cw3
    [T::to(Ccw2), T::to(Ccw1), T::to(Start), T::to(Start)], // Ccw1
    [T::to(Ccw2), T::to(Ccw1), T::to(Ccw3), T::to(Start)], // Ccw2
    [T::to(Ccw2), T::to(Start), T::to(Ccw3), T::ccw(Start)], // Ccw3
    [T::to(Start), T::to(Start), T::to(Start), T::to(Start)], // Illegal
];

/// Two counts per quadrature cycle, emitted at `00` and again at `11`
///
/// Nodes are reused with half-step meanings: `Start` rests at `11`, `Cw3`
/// rests at `00`, `Cw1`/`Cw2` leave `11` and `Ccw1`/`Ccw2` leave `00`.
///
/// Direction tags are oriented so half-step counts with the same sign as
/// [`FULL_STEP`]. The commonly published half-step table tags the `Cw` rows
/// at `00` and the `Ccw` rows at `11` the other way round, which makes a
/// clockwise turn count down there; this table swaps those tags.
pub static HALF_STEP: TransitionTable = [
    //  00            01            10            11
    [T::to(Cw3), T::to(Cw2), T::to(Cw1), T::to(Start)],   // Start (rest 11)
    [T::cw(Cw3), T::to(Start), T::to(Cw1), T::to(Start)], // Cw1 (11 -> 10)
    [T::ccw(Cw3), T::to(Cw2), T::to(Start), T::to(Start)], // Cw2 (11 -> 01)
    [T::to(Cw3), T::to(Ccw2), T::to(Ccw1), T::to(Start)], // Cw3 (rest 00)
    [T::to(Cw3), T::to(Cw2), T::to(Ccw1), T::ccw(Start)], // Ccw1 (00 -> 10)
    [T::to(Cw3), T::to(Ccw2), T::to(Cw3), T::cw(Start)],  // Ccw2 (00 -> 01)
    [T::to(Start), T::to(Start), T::to(Start), T::to(Start)], // unused
    [T::to(Start), T::to(Start), T::to(Start), T::to(Start)], // Illegal
];

/// Detection resolution, fixed for the lifetime of a decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepMode {
    /// One count per detent; best noise immunity
    #[default]
    FullStep,
    /// Two counts per quadrature cycle
    HalfStep,
}

impl StepMode {
    /// Table implementing this mode
    pub fn table(self) -> &'static TransitionTable {
        match self {
            StepMode::FullStep => &FULL_STEP,
            StepMode::HalfStep => &HALF_STEP,
        }
    }
}

/// Look up the transition for `node` on `sample` (low two bits used)
#[inline]
pub fn lookup(table: &TransitionTable, node: Node, sample: u8) -> Transition {
    table[node as usize][(sample & 0b11) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CW_DETENT: [u8; 4] = [0b10, 0b00, 0b01, 0b11];
    const CCW_DETENT: [u8; 4] = [0b01, 0b00, 0b10, 0b11];

    fn run(table: &TransitionTable, samples: &[u8]) -> (Node, i32) {
        let mut node = Node::Start;
        let mut net = 0;
        for &sample in samples {
            let t = lookup(table, node, sample);
            node = t.next;
            if let Some(dir) = t.direction {
                net += i32::from(dir.sign());
            }
        }
        (node, net)
    }

    /// Sample a full-step node expects to be sitting on
    fn resting_sample(node: Node) -> u8 {
        match node {
            Start => 0b11,
            Cw1 | Ccw3 => 0b10,
            Cw2 | Ccw2 => 0b00,
            Cw3 | Ccw1 => 0b01,
            Illegal => 0b11,
        }
    }

    #[test]
    fn test_full_step_detents() {
        assert_eq!(run(&FULL_STEP, &CW_DETENT), (Start, 1));
        assert_eq!(run(&FULL_STEP, &CCW_DETENT), (Start, -1));
    }

    #[test]
    fn test_half_step_detents() {
        assert_eq!(run(&HALF_STEP, &CW_DETENT), (Start, 2));
        assert_eq!(run(&HALF_STEP, &CCW_DETENT), (Start, -2));
    }

    #[test]
    fn test_half_step_reports_at_both_rest_positions() {
        let first = lookup(&HALF_STEP, Cw1, 0b00);
        assert_eq!(first.direction, Some(Direction::Clockwise));
        assert_eq!(first.next, Cw3);
    }

    #[test]
    fn test_illegal_row_returns_to_start() {
        for table in [&FULL_STEP, &HALF_STEP] {
            for sample in 0..4 {
                let t = lookup(table, Illegal, sample);
                assert_eq!(t, Transition::to(Start));
            }
        }
    }

    #[test]
    fn test_full_step_double_flip_resets() {
        // Both bits changing at once cannot happen on a Gray-coded signal
        for node in [Start, Cw1, Cw2, Cw3, Ccw1, Ccw2, Ccw3] {
            let bounced = !resting_sample(node) & 0b11;
            let t = lookup(&FULL_STEP, node, bounced);
            assert_eq!(t, Transition::to(Start), "node {:?}", node);
        }
    }

    #[test]
    fn test_partial_detent_then_bounce_back() {
        // Half a turn forward then back again emits nothing
        let samples = [0b10, 0b00, 0b10, 0b11];
        assert_eq!(run(&FULL_STEP, &samples), (Start, 0));
    }

    #[test]
    fn test_node_bits_roundtrip_masks_high_bits() {
        for node in Node::ALL {
            assert_eq!(Node::from_bits(node.bits()), node);
            assert_eq!(Node::from_bits(node.bits() | 0x30), node);
        }
    }

    #[test]
    fn test_step_mode_tables() {
        assert!(core::ptr::eq(StepMode::FullStep.table(), &FULL_STEP));
        assert!(core::ptr::eq(StepMode::HalfStep.table(), &HALF_STEP));
        assert_eq!(StepMode::default(), StepMode::FullStep);
    }

    proptest! {
        #[test]
        fn prop_full_step_counts_only_complete_detents(
            samples in proptest::collection::vec(0u8..4, 0..64)
        ) {
            // Every emitted count lands on Start: no partial sequence counts
            let mut node = Start;
            for sample in samples {
                let t = lookup(&FULL_STEP, node, sample);
                if t.direction.is_some() {
                    prop_assert_eq!(t.next, Start);
                    prop_assert_eq!(sample, 0b11);
                }
                node = t.next;
            }
        }

        #[test]
        fn prop_illegal_never_reached(
            node in 0u8..7,
            sample in 0u8..4,
        ) {
            for table in [&FULL_STEP, &HALF_STEP] {
                let t = lookup(table, Node::from_bits(node), sample);
                prop_assert_ne!(t.next, Illegal);
            }
        }

        #[test]
        fn prop_repeated_sample_is_stable(
            node in 0u8..8,
            sample in 0u8..4,
        ) {
            // Re-reading the same level twice never counts twice
            for table in [&FULL_STEP, &HALF_STEP] {
                let first = lookup(table, Node::from_bits(node), sample);
                let second = lookup(table, first.next, sample);
                prop_assert_eq!(second.direction, None);
            }
        }
    }
}
