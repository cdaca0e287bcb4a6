//! Exact inference by enumeration.
//!
//! A query asks for `P(outcomes | evidence)`. The session answers it with two
//! enumeration passes over the joint distribution, scoring every assignment by
//! the chain rule (the product of every event's CPT factor):
//!
//! - **numerator**: hidden events enumerated, evidence and outcome pinned,
//!   giving `P(outcomes, evidence)`;
//! - **denominator**: hidden and outcome events enumerated, evidence pinned,
//!   giving `P(evidence)`.
//!
//! The probability is the ratio of the two. Cost is the number of combinations
//! times the number of events times the CPT size; every event is rescored for
//! every combination, including events whose parents did not change.
//!
//! Roles and target values come from an explicit [`QueryDescriptor`] rather than
//! flags on the network, so the network stays immutable and any number of
//! sessions can share it.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::engine::enumeration::Odometer;
use crate::engine::errors::ExecError;
use crate::engine::event_state::{EventRole, EventState};
use crate::engine::network::{BayesianEvent, BayesianNetwork, EventId, TableArgs};

/// One event's role and target value within a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    pub event: EventId,
    pub role: EventRole,
    pub value: usize,
}

/// Which events are observed or asked about, and at what values.
///
/// Events not listed are hidden. Assigning an event twice keeps the latest
/// assignment; assigning it `Hidden` removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryDescriptor {
    assignments: Vec<Assignment>,
}

impl QueryDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `assign(event, EventRole::Evidence, value)`.
    pub fn evidence(mut self, event: EventId, value: usize) -> Self {
        self.assign(event, EventRole::Evidence, value);
        self
    }

    /// Builder form of `assign(event, EventRole::Outcome, value)`.
    pub fn outcome(mut self, event: EventId, value: usize) -> Self {
        self.assign(event, EventRole::Outcome, value);
        self
    }

    pub fn assign(&mut self, event: EventId, role: EventRole, value: usize) {
        self.assignments.retain(|a| a.event != event);
        if role != EventRole::Hidden {
            self.assignments.push(Assignment { event, role, value });
        }
    }

    pub fn get(&self, event: EventId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.event == event)
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Checks every assignment against the network's events and choices.
    pub fn validate(&self, network: &BayesianNetwork) -> Result<(), ExecError> {
        for assignment in &self.assignments {
            let event = network.event(assignment.event).ok_or_else(|| {
                ExecError::InvalidArgument(format!(
                    "query references unknown event {}",
                    assignment.event
                ))
            })?;
            if assignment.value >= event.choice_count() {
                return Err(ExecError::InvalidArgument(format!(
                    "value {} out of range for '{}' ({} choices)",
                    assignment.value,
                    event.label(),
                    event.choice_count()
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for enumeration queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryConfig {
    /// Check every CPT for completeness and normalisation before enumerating.
    pub validate_tables: bool,
    /// Allowed deviation from 1 for a CPT row sum when validating tables.
    pub table_tolerance: f64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            validate_tables: false,
            table_tolerance: 1e-9,
        }
    }
}

impl QueryConfig {
    pub fn validate(self) -> Result<Self, ExecError> {
        if self.table_tolerance <= 0.0 || !self.table_tolerance.is_finite() {
            return Err(ExecError::Validation(
                "query: table_tolerance must be finite and > 0".into(),
            ));
        }
        Ok(self)
    }
}

/// Lifecycle of a single `execute()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Idle,
    Classified,
    NumeratorPass,
    DenominatorPass,
    Done,
}

/// Common surface of Bayesian query sessions.
pub trait BayesianQuery {
    /// The network this query runs against.
    fn network(&self) -> &Arc<BayesianNetwork>;

    /// Runs the query and returns the probability.
    fn execute(&mut self) -> Result<f64, ExecError>;

    /// The result of the last successful `execute()`.
    fn probability(&self) -> Option<f64>;

    /// The question being asked, e.g. `P(b=true|a=false)`.
    fn problem(&self) -> String;

    /// A fresh session over the same network with no query configured.
    fn clone_query(&self) -> Self
    where
        Self: Sized;
}

/// Exact probability by full enumeration over hidden assignments.
#[derive(Debug)]
pub struct EnumerationQuery {
    network: Arc<BayesianNetwork>,
    config: QueryConfig,
    descriptor: QueryDescriptor,
    /// Indexed by `EventId`.
    states: Vec<EventState>,
    enumeration: Odometer,
    phase: QueryPhase,
    probability: Option<f64>,
}

impl EnumerationQuery {
    pub fn new(network: Arc<BayesianNetwork>) -> Self {
        let states = network.events().iter().map(EventState::new).collect();
        Self {
            network,
            config: QueryConfig::default(),
            descriptor: QueryDescriptor::default(),
            states,
            enumeration: Odometer::new(),
            phase: QueryPhase::Idle,
            probability: None,
        }
    }

    pub fn with_config(
        network: Arc<BayesianNetwork>,
        config: QueryConfig,
    ) -> Result<Self, ExecError> {
        let config = config.validate()?;
        let mut query = Self::new(network);
        query.config = config;
        Ok(query)
    }

    /// Installs the roles and target values for the next `execute()`.
    pub fn set_descriptor(&mut self, descriptor: QueryDescriptor) -> Result<(), ExecError> {
        descriptor.validate(&self.network)?;
        self.descriptor = descriptor;
        self.invalidate();
        Ok(())
    }

    /// Marks the event labelled `label` as observed at `choice`.
    pub fn define_evidence(&mut self, label: &str, choice: &str) -> Result<(), ExecError> {
        self.define(label, choice, EventRole::Evidence)
    }

    /// Marks the event labelled `label` as asked about at `choice`.
    pub fn define_outcome(&mut self, label: &str, choice: &str) -> Result<(), ExecError> {
        self.define(label, choice, EventRole::Outcome)
    }

    /// Returns the event labelled `label` to the hidden role.
    pub fn define_hidden(&mut self, label: &str) -> Result<(), ExecError> {
        let id = self.resolve_label(label)?.id();
        self.descriptor.assign(id, EventRole::Hidden, 0);
        self.invalidate();
        Ok(())
    }

    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> QueryConfig {
        self.config
    }

    pub fn phase(&self) -> QueryPhase {
        self.phase
    }

    /// Per-event states, indexed by `EventId`.
    pub fn states(&self) -> &[EventState] {
        &self.states
    }

    pub fn state(&self, event: EventId) -> Option<&EventState> {
        self.states.get(event.index())
    }

    /// State indices varied by the current pass.
    pub fn enumeration(&self) -> &Odometer {
        &self.enumeration
    }

    /// Copies each event's role and target from the descriptor into its state.
    pub fn classify(&mut self) {
        for state in &mut self.states {
            let (role, value) = self
                .descriptor
                .get(state.event())
                .map_or((EventRole::Hidden, 0), |a| (a.role, a.value));
            state.configure(role, value);
        }
        self.phase = QueryPhase::Classified;
    }

    /// Rebuilds the enumeration set for a pass.
    ///
    /// Hidden events are always enumerated; evidence and outcome events are
    /// enumerated when requested. Enumerated events start at 0, every other
    /// event is pinned to its compare value.
    pub fn reset_enumeration(&mut self, include_evidence: bool, include_outcome: bool) {
        self.enumeration.clear();
        for (position, state) in self.states.iter_mut().enumerate() {
            let enumerate = match state.role() {
                EventRole::Hidden => true,
                EventRole::Evidence => include_evidence,
                EventRole::Outcome => include_outcome,
            };
            if enumerate {
                self.enumeration.push(position);
                state.assign(0);
            } else {
                let target = state.compare_value();
                state.assign(target);
            }
        }
    }

    /// Sums the joint probability of every combination of the enumeration set.
    pub fn perform_enumeration(&mut self) -> Result<f64, ExecError> {
        let mut total = 0.0;
        loop {
            let mut joint = 1.0;
            for position in 0..self.states.len() {
                joint *= self.calculate_probability(position)?;
            }
            total += joint;

            if !self.enumeration.advance(&mut self.states) {
                break;
            }
        }

        if !total.is_finite() {
            return Err(ExecError::Numerical(format!(
                "enumeration for {} produced non-finite mass {}",
                self.problem(),
                total
            )));
        }
        Ok(total)
    }

    /// `P(event = current value | parents = current values)` for one state.
    ///
    /// # Errors
    ///
    /// `ExecError::Configuration` if the CPT has no matching line; a missing line
    /// is a defect in the table, never probability zero.
    pub fn calculate_probability(&self, position: usize) -> Result<f64, ExecError> {
        let state = self.states.get(position).ok_or_else(|| {
            ExecError::Internal(format!("no event state at position {}", position))
        })?;
        let event = self.event_for(state)?;
        let args = self.obtain_args(event);

        event
            .table()
            .find_line(&args, state.value())
            .map(|line| line.probability())
            .ok_or_else(|| {
                ExecError::Configuration(format!(
                    "no matching table line for {} (parent arguments {:?})",
                    state, args
                ))
            })
    }

    /// Whether every outcome state currently holds its asked-for value.
    pub fn satisfies_desired_outcome(&self) -> Result<bool, ExecError> {
        for state in self
            .states
            .iter()
            .filter(|s| s.role() == EventRole::Outcome)
        {
            if !state.is_satisfied()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn obtain_args(&self, event: &BayesianEvent) -> TableArgs {
        event
            .parents()
            .iter()
            .map(|parent| self.states[parent.index()].value())
            .collect::<SmallVec<_>>()
    }

    fn event_for(&self, state: &EventState) -> Result<&BayesianEvent, ExecError> {
        self.network.event(state.event()).ok_or_else(|| {
            ExecError::Internal(format!("state refers to unknown event {}", state.event()))
        })
    }

    fn define(&mut self, label: &str, choice: &str, role: EventRole) -> Result<(), ExecError> {
        let event = self.resolve_label(label)?;
        let value = event.choice_index(choice).ok_or_else(|| {
            ExecError::InvalidArgument(format!("event '{}' has no choice '{}'", label, choice))
        })?;
        let id = event.id();
        self.descriptor.assign(id, role, value);
        self.invalidate();
        Ok(())
    }

    fn resolve_label(&self, label: &str) -> Result<&BayesianEvent, ExecError> {
        self.network
            .event_by_label(label)
            .ok_or_else(|| ExecError::InvalidArgument(format!("unknown event '{}'", label)))
    }

    fn invalidate(&mut self) {
        self.phase = QueryPhase::Idle;
        self.probability = None;
    }

    fn format_role(&self, role: EventRole) -> String {
        self.network
            .events()
            .iter()
            .filter_map(|event| {
                self.descriptor
                    .get(event.id())
                    .filter(|a| a.role == role)
                    .map(|a| event.format_value(a.value))
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl BayesianQuery for EnumerationQuery {
    fn network(&self) -> &Arc<BayesianNetwork> {
        &self.network
    }

    fn execute(&mut self) -> Result<f64, ExecError> {
        self.probability = None;
        if self.config.validate_tables {
            self.network.validate(self.config.table_tolerance)?;
        }

        self.classify();

        self.phase = QueryPhase::NumeratorPass;
        self.reset_enumeration(false, false);
        let numerator = self.perform_enumeration()?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "numerator pass: {} free events, {} combinations, mass {:.6e}",
            self.enumeration.len(),
            self.enumeration.combinations(&self.states),
            numerator
        );

        self.phase = QueryPhase::DenominatorPass;
        self.reset_enumeration(false, true);
        let denominator = self.perform_enumeration()?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "denominator pass: {} free events, {} combinations, mass {:.6e}",
            self.enumeration.len(),
            self.enumeration.combinations(&self.states),
            denominator
        );

        if denominator <= 0.0 {
            return Err(ExecError::UnsatisfiableEvidence(format!(
                "evidence for {} has zero probability",
                self.problem()
            )));
        }

        let probability = numerator / denominator;
        self.probability = Some(probability);
        self.phase = QueryPhase::Done;
        #[cfg(feature = "tracing")]
        tracing::debug!("{} = {:.6}", self.problem(), probability);
        Ok(probability)
    }

    fn probability(&self) -> Option<f64> {
        self.probability
    }

    fn problem(&self) -> String {
        let outcome = self.format_role(EventRole::Outcome);
        let evidence = self.format_role(EventRole::Evidence);
        if evidence.is_empty() {
            format!("P({})", outcome)
        } else {
            format!("P({}|{})", outcome, evidence)
        }
    }

    fn clone_query(&self) -> Self {
        let mut query = Self::new(Arc::clone(&self.network));
        query.config = self.config;
        query
    }
}

impl fmt::Display for EnumerationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[EnumerationQuery: {}=", self.problem())?;
        match self.probability {
            Some(p) => write!(f, "{:.2}%]", p * 100.0),
            None => write!(f, "?]"),
        }
    }
}
