//! Odometer iteration over joint assignments.
//!
//! The enumeration set is an ordered list of positions into a query's state
//! vector. [`Odometer::advance`] treats it as a mixed-radix counter: position 0
//! is the least-significant digit and the radix of each digit is the
//! cardinality of its event. Starting from the all-zero assignment, repeated
//! calls visit every combination exactly once and then report exhaustion.
//!
//! ```text
//! radices [2, 3]:  (0,0) (1,0) (0,1) (1,1) (0,2) (1,2)  -> exhausted
//! ```

use crate::engine::event_state::EventState;

/// The ordered set of states varied during one enumeration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Odometer {
    positions: Vec<usize>,
}

impl Odometer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Appends a state index as the next (more significant) digit.
    pub fn push(&mut self, position: usize) {
        self.positions.push(position);
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Moves `states` to the next combination.
    ///
    /// Returns `false` once every combination has been produced; the digits are
    /// then all back at 0. An empty set is exhausted on the first call, so the
    /// caller processes exactly one (empty) combination.
    pub fn advance(&self, states: &mut [EventState]) -> bool {
        for &position in &self.positions {
            let state = &mut states[position];
            let next = state.value() + 1;
            if next < state.cardinality() {
                state.assign(next);
                return true;
            }
            state.assign(0);
        }
        false
    }

    /// Number of combinations one full pass visits, saturating at `u64::MAX`.
    pub fn combinations(&self, states: &[EventState]) -> u64 {
        self.positions.iter().fold(1u64, |acc, &position| {
            acc.saturating_mul(states[position].cardinality() as u64)
        })
    }
}

/// Rolls a bare argument vector forward by one, odometer style.
///
/// `args[i]` ranges over `0..cardinalities[i]`. Returns `false` when the
/// vector wraps back to all zeros (or is empty).
pub fn roll(cardinalities: &[usize], args: &mut [usize]) -> bool {
    debug_assert_eq!(cardinalities.len(), args.len());
    for (arg, &cardinality) in args.iter_mut().zip(cardinalities) {
        *arg += 1;
        if *arg < cardinality {
            return true;
        }
        *arg = 0;
    }
    false
}
