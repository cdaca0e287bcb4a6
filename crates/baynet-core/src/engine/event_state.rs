//! Per-query state wrapped around each network event.
//!
//! An [`EventState`] holds the value an event currently takes during
//! enumeration, the value the query asks about (`compare_value`) and the role the
//! event plays in the query. States are owned by exactly one query session and
//! never shared.

use std::fmt;

use rand::Rng;

use crate::engine::errors::ExecError;
use crate::engine::network::{BayesianEvent, EventId, ProbabilityTable};

/// The part an event plays in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventRole {
    /// Neither observed nor asked about; marginalised out.
    #[default]
    Hidden,
    /// Observed; pinned to its compare value in both passes.
    Evidence,
    /// Asked about; pinned in the numerator pass, enumerated in the denominator.
    Outcome,
}

impl fmt::Display for EventRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventRole::Hidden => "hidden",
            EventRole::Evidence => "evidence",
            EventRole::Outcome => "outcome",
        };
        f.write_str(name)
    }
}

/// Mutable state of one event during one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventState {
    event: EventId,
    cardinality: usize,
    value: usize,
    compare_value: usize,
    role: EventRole,
    calculated: bool,
}

impl EventState {
    pub fn new(event: &BayesianEvent) -> Self {
        Self {
            event: event.id(),
            cardinality: event.choice_count(),
            value: 0,
            compare_value: 0,
            role: EventRole::Hidden,
            calculated: false,
        }
    }

    pub fn event(&self) -> EventId {
        self.event
    }

    /// Number of choices of the underlying event.
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn value(&self) -> usize {
        self.value
    }

    pub fn compare_value(&self) -> usize {
        self.compare_value
    }

    pub fn role(&self) -> EventRole {
        self.role
    }

    /// Whether a value has been assigned since the last reset.
    pub fn is_calculated(&self) -> bool {
        self.calculated
    }

    /// Sets the current value and marks the state calculated.
    ///
    /// # Errors
    ///
    /// `ExecError::InvalidArgument` if `value` is not a choice code of the event.
    pub fn set_value(&mut self, value: usize) -> Result<(), ExecError> {
        if value >= self.cardinality {
            return Err(ExecError::InvalidArgument(format!(
                "value {} out of range for event {} ({} choices)",
                value, self.event, self.cardinality
            )));
        }
        self.assign(value);
        Ok(())
    }

    /// Whether the current value equals the asked-for value.
    ///
    /// Values are categorical codes, so this is exact integer equality.
    ///
    /// # Errors
    ///
    /// `ExecError::InvalidState` for a hidden event; satisfaction only has meaning
    /// for observed or asked-about events.
    pub fn is_satisfied(&self) -> Result<bool, ExecError> {
        if self.role == EventRole::Hidden {
            return Err(ExecError::InvalidState(format!(
                "satisfaction is undefined for hidden event {}",
                self.event
            )));
        }
        Ok(self.compare_value == self.value)
    }

    /// Draws a new value from `table` conditioned on `parent_args`.
    pub fn randomize<R: Rng + ?Sized>(
        &mut self,
        table: &ProbabilityTable,
        parent_args: &[usize],
        rng: &mut R,
    ) -> Result<(), ExecError> {
        let value = table.generate_random(parent_args, rng)?;
        self.set_value(value)
    }

    /// Writes a value already known to be in range.
    #[inline]
    pub(crate) fn assign(&mut self, value: usize) {
        debug_assert!(value < self.cardinality);
        self.value = value;
        self.calculated = true;
    }

    /// Installs the role and target for a fresh query and clears the value.
    pub(crate) fn configure(&mut self, role: EventRole, compare_value: usize) {
        self.role = role;
        self.compare_value = compare_value;
        self.value = 0;
        self.calculated = false;
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[EventState:event={},type={},value={},compare={},calc={}]",
            self.event,
            self.role,
            self.value,
            self.compare_value,
            if self.calculated { "y" } else { "n" }
        )
    }
}
