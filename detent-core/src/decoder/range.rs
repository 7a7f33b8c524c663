//! Range policies for the tracked value

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a step that would leave `[lower, upper]` is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum RangePolicy {
    /// Bounds are ignored
    #[default]
    Unbounded = 0,
    /// Stepping past one end continues at the other
    Wrap = 1,
    /// Saturate at either end
    Bounded = 2,
}

impl RangePolicy {
    /// Whether this policy uses the configured bounds
    pub const fn uses_bounds(self) -> bool {
        !matches!(self, RangePolicy::Unbounded)
    }

    pub(crate) const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => RangePolicy::Wrap,
            2 => RangePolicy::Bounded,
            _ => RangePolicy::Unbounded,
        }
    }

    /// Apply a signed step to `value`
    ///
    /// Never panics or overflows: unbounded values saturate at the `i32`
    /// limits and bounded arithmetic is carried out in `i64`. Callers
    /// guarantee `lower <= upper` for `Wrap` and `Bounded`.
    pub fn apply(self, value: i32, step: i32, lower: i32, upper: i32) -> i32 {
        match self {
            RangePolicy::Unbounded => value.saturating_add(step),
            RangePolicy::Bounded => bound(value, step, lower, upper),
            RangePolicy::Wrap => wrap(value, step, lower, upper),
        }
    }
}

fn bound(value: i32, step: i32, lower: i32, upper: i32) -> i32 {
    let next = i64::from(value) + i64::from(step);
    // Result lies in [lower, upper] so it fits back into i32
    next.clamp(i64::from(lower), i64::from(upper)) as i32
}

fn wrap(value: i32, step: i32, lower: i32, upper: i32) -> i32 {
    let lower = i64::from(lower);
    let span = i64::from(upper) - lower + 1;
    let offset = (i64::from(value) + i64::from(step) - lower).rem_euclid(span);
    (lower + offset) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unbounded_ignores_bounds() {
        assert_eq!(RangePolicy::Unbounded.apply(10, 5, 0, 10), 15);
        assert_eq!(RangePolicy::Unbounded.apply(0, -3, 0, 10), -3);
        assert_eq!(RangePolicy::Unbounded.apply(i32::MAX, 1, 0, 10), i32::MAX);
    }

    #[test]
    fn test_bounded_saturates() {
        assert_eq!(RangePolicy::Bounded.apply(10, 1, 0, 10), 10);
        assert_eq!(RangePolicy::Bounded.apply(0, -1, 0, 10), 0);
        assert_eq!(RangePolicy::Bounded.apply(9, 5, 0, 10), 10);
        assert_eq!(RangePolicy::Bounded.apply(10, -1, 0, 10), 9);
    }

    #[test]
    fn test_bounded_pulls_outside_value_in() {
        // A value left below a freshly raised lower bound lands on it
        assert_eq!(RangePolicy::Bounded.apply(25, 10, 50, 200), 50);
    }

    #[test]
    fn test_wrap_both_ends() {
        assert_eq!(RangePolicy::Wrap.apply(9, 1, 0, 9), 0);
        assert_eq!(RangePolicy::Wrap.apply(0, -1, 0, 9), 9);
        assert_eq!(RangePolicy::Wrap.apply(5, 23, 0, 9), 8);
    }

    #[test]
    fn test_wrap_negative_range() {
        assert_eq!(RangePolicy::Wrap.apply(-5, -1, -5, 5), 5);
        assert_eq!(RangePolicy::Wrap.apply(5, 1, -5, 5), -5);
        assert_eq!(RangePolicy::Wrap.apply(-5, -23, -5, 5), 5);
    }

    #[test]
    fn test_wrap_full_i32_range() {
        assert_eq!(RangePolicy::Wrap.apply(i32::MAX, 1, i32::MIN, i32::MAX), i32::MIN);
        assert_eq!(RangePolicy::Wrap.apply(i32::MIN, -1, i32::MIN, i32::MAX), i32::MAX);
    }

    #[test]
    fn test_single_value_range() {
        assert_eq!(RangePolicy::Wrap.apply(3, 7, 3, 3), 3);
        assert_eq!(RangePolicy::Bounded.apply(3, -7, 3, 3), 3);
    }

    #[test]
    fn test_policy_bits() {
        for policy in [RangePolicy::Unbounded, RangePolicy::Wrap, RangePolicy::Bounded] {
            assert_eq!(RangePolicy::from_bits(policy as u8), policy);
        }
        assert!(!RangePolicy::Unbounded.uses_bounds());
        assert!(RangePolicy::Wrap.uses_bounds());
    }

    proptest! {
        #[test]
        fn prop_bounded_stays_in_range(
            value in -1000i32..1000,
            step in -50i32..50,
            lower in -100i32..100,
            width in 0i32..100,
        ) {
            let upper = lower + width;
            let next = RangePolicy::Bounded.apply(value, step, lower, upper);
            prop_assert!(next >= lower && next <= upper);
        }

        #[test]
        fn prop_wrap_stays_in_range(
            value in -1000i32..1000,
            step in -50i32..50,
            lower in -100i32..100,
            width in 0i32..100,
        ) {
            let upper = lower + width;
            let next = RangePolicy::Wrap.apply(value, step, lower, upper);
            prop_assert!(next >= lower && next <= upper);
        }

        #[test]
        fn prop_wrap_step_and_back(
            offset in 0i32..10,
            step in 1i32..40,
        ) {
            // Wrapping forward then back by the same step is the identity
            let start = 100 + offset;
            let there = RangePolicy::Wrap.apply(start, step, 100, 109);
            prop_assert_eq!(RangePolicy::Wrap.apply(there, -step, 100, 109), start);
        }
    }
}
