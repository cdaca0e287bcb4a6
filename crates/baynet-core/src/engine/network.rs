//! # Discrete Bayesian Network
//!
//! The static graph consumed by queries: events (discrete random variables),
//! their parent links, and one conditional probability table per event.
//!
//! ## Design
//!
//! - Events are stored densely and addressed by [`EventId`], which doubles as the
//!   index into the event vector and into every query's state vector.
//! - Parent declaration order is the argument order of every CPT line.
//! - A network is built once and then shared read-only (`Arc<BayesianNetwork>`)
//!   between any number of query sessions. Nothing in this module holds per-query
//!   state.
//!
//! ## Example
//!
//! ```rust,ignore
//! use baynet_core::engine::network::BayesianNetwork;
//!
//! let mut net = BayesianNetwork::new();
//! let a = net.add_boolean_event("a")?;
//! let b = net.add_boolean_event("b")?;
//! net.create_dependency(a, b)?;
//! net.add_line(a, 0.3, 0, &[])?;
//! net.add_line(a, 0.7, 1, &[])?;
//! net.add_line(b, 0.8, 0, &[0])?;
//! net.add_line(b, 0.2, 1, &[0])?;
//! net.add_line(b, 0.1, 0, &[1])?;
//! net.add_line(b, 0.9, 1, &[1])?;
//! net.validate(1e-9)?;
//! ```

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::engine::enumeration::roll;
use crate::engine::errors::ExecError;

/// Choice labels used by [`BayesianNetwork::add_boolean_event`]. Code 0 is `true`.
pub const BOOLEAN_CHOICES: [&str; 2] = ["true", "false"];

/// Parent arguments for one CPT line; most events have few parents.
pub type TableArgs = SmallVec<[usize; 4]>;

/// A unique identifier for an event in the network.
///
/// Ids are assigned densely in insertion order, so iteration by id is stable and
/// deterministic.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(pub u32);

impl EventId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One line of a conditional probability table.
///
/// Reads as `P(event = result | parents = args) = probability`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLine {
    args: TableArgs,
    result: usize,
    probability: f64,
}

impl TableLine {
    pub fn new(probability: f64, result: usize, args: &[usize]) -> Self {
        Self {
            args: TableArgs::from_slice(args),
            result,
            probability,
        }
    }

    /// Parent argument codes, in parent declaration order.
    pub fn args(&self) -> &[usize] {
        &self.args
    }

    /// The event's own value code for this line.
    pub fn result(&self) -> usize {
        self.result
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Exact element-wise match against a parent argument vector.
    pub fn compare_args(&self, args: &[usize]) -> bool {
        self.args.as_slice() == args
    }
}

/// Conditional probability table for a single event.
///
/// The table is an unordered bag of lines. Lookups are linear scans; tables are
/// small and a lookup must return the first matching line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbabilityTable {
    lines: Vec<TableLine>,
}

impl ProbabilityTable {
    pub fn lines(&self) -> &[TableLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Finds the line for `P(event = result | parents = args)`.
    pub fn find_line(&self, args: &[usize], result: usize) -> Option<&TableLine> {
        self.lines
            .iter()
            .find(|line| line.compare_args(args) && line.result == result)
    }

    /// Draws a result code from the distribution conditioned on `args`.
    ///
    /// Walks the matching lines accumulating probability mass until the uniform
    /// draw falls under the running total. If rounding leaves the draw above the
    /// accumulated mass, the last matching line wins.
    pub fn generate_random<R: Rng + ?Sized>(
        &self,
        args: &[usize],
        rng: &mut R,
    ) -> Result<usize, ExecError> {
        let draw: f64 = rng.gen();
        let mut limit = 0.0;
        let mut last = None;

        for line in self.lines.iter().filter(|line| line.compare_args(args)) {
            limit += line.probability;
            if draw < limit {
                return Ok(line.result);
            }
            last = Some(line.result);
        }

        last.ok_or_else(|| {
            ExecError::Configuration(format!(
                "no table line matches parent arguments {:?}",
                args
            ))
        })
    }

    fn push(&mut self, line: TableLine) {
        self.lines.push(line);
    }
}

/// A discrete random variable with an ordered set of mutually exclusive choices.
#[derive(Debug, Clone)]
pub struct BayesianEvent {
    id: EventId,
    label: Arc<str>,
    choices: Vec<Arc<str>>,
    parents: SmallVec<[EventId; 4]>,
    children: SmallVec<[EventId; 4]>,
    table: ProbabilityTable,
}

impl BayesianEvent {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn choices(&self) -> &[Arc<str>] {
        &self.choices
    }

    /// Number of choices; value codes range over `0..choice_count()`.
    pub fn choice_count(&self) -> usize {
        self.choices.len()
    }

    pub fn choice_index(&self, choice: &str) -> Option<usize> {
        self.choices.iter().position(|c| c.as_ref() == choice)
    }

    pub fn parents(&self) -> &[EventId] {
        &self.parents
    }

    pub fn children(&self) -> &[EventId] {
        &self.children
    }

    pub fn table(&self) -> &ProbabilityTable {
        &self.table
    }

    pub fn is_boolean(&self) -> bool {
        self.choices.len() == 2
            && self.choices[0].as_ref() == BOOLEAN_CHOICES[0]
            && self.choices[1].as_ref() == BOOLEAN_CHOICES[1]
    }

    /// Renders `label=choice`, falling back to `label=#code` for an unknown code.
    pub fn format_value(&self, value: usize) -> String {
        match self.choices.get(value) {
            Some(choice) => format!("{}={}", self.label, choice),
            None => format!("{}=#{}", self.label, value),
        }
    }
}

impl fmt::Display for BayesianEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P({}", self.label)?;
        if !self.parents.is_empty() {
            write!(f, "|{} parents", self.parents.len())?;
        }
        write!(f, ")")
    }
}

/// A directed acyclic graph of discrete events with their CPTs.
#[derive(Debug, Clone, Default)]
pub struct BayesianNetwork {
    events: Vec<BayesianEvent>,
    by_label: FxHashMap<Arc<str>, EventId>,
}

impl BayesianNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event with the given ordered choices.
    ///
    /// # Errors
    ///
    /// `ExecError::Validation` if the label is empty or already used, if there are
    /// no choices, or if two choices share a label.
    pub fn add_event<S: AsRef<str>>(
        &mut self,
        label: &str,
        choices: &[S],
    ) -> Result<EventId, ExecError> {
        if label.is_empty() {
            return Err(ExecError::Validation("event label must not be empty".into()));
        }
        if self.by_label.contains_key(label) {
            return Err(ExecError::Validation(format!(
                "duplicate event label '{}'",
                label
            )));
        }
        if choices.is_empty() {
            return Err(ExecError::Validation(format!(
                "event '{}' must have at least one choice",
                label
            )));
        }

        let mut owned: Vec<Arc<str>> = Vec::with_capacity(choices.len());
        for choice in choices {
            let choice = choice.as_ref();
            if owned.iter().any(|c| c.as_ref() == choice) {
                return Err(ExecError::Validation(format!(
                    "event '{}' has duplicate choice '{}'",
                    label, choice
                )));
            }
            owned.push(Arc::from(choice));
        }

        let id = EventId(u32::try_from(self.events.len()).map_err(|_| {
            ExecError::Validation("network exceeds the maximum number of events".into())
        })?);
        let label: Arc<str> = Arc::from(label);
        self.by_label.insert(Arc::clone(&label), id);
        self.events.push(BayesianEvent {
            id,
            label,
            choices: owned,
            parents: SmallVec::new(),
            children: SmallVec::new(),
            table: ProbabilityTable::default(),
        });
        Ok(id)
    }

    /// Adds a two-valued event with choices `true` (code 0) and `false` (code 1).
    pub fn add_boolean_event(&mut self, label: &str) -> Result<EventId, ExecError> {
        self.add_event(label, &BOOLEAN_CHOICES)
    }

    /// Declares `parent` as the next parent of `child`.
    ///
    /// Must be called before any CPT line is added to `child`, since the parent
    /// list fixes the arity of its table lines.
    pub fn create_dependency(&mut self, parent: EventId, child: EventId) -> Result<(), ExecError> {
        self.event_checked(parent)?;
        self.event_checked(child)?;
        if parent == child {
            return Err(ExecError::Validation(format!(
                "event '{}' cannot depend on itself",
                self.events[child.index()].label
            )));
        }
        let child_event = &self.events[child.index()];
        if child_event.parents.contains(&parent) {
            return Err(ExecError::Validation(format!(
                "'{}' is already a parent of '{}'",
                self.events[parent.index()].label,
                child_event.label
            )));
        }
        if !child_event.table.is_empty() {
            return Err(ExecError::Validation(format!(
                "cannot add a parent to '{}' after its table lines were defined",
                child_event.label
            )));
        }
        if self.is_ancestor(child, parent) {
            return Err(ExecError::Validation(format!(
                "dependency '{}' -> '{}' would create a cycle",
                self.events[parent.index()].label,
                child_event.label
            )));
        }

        self.events[child.index()].parents.push(parent);
        self.events[parent.index()].children.push(child);
        Ok(())
    }

    /// Appends `P(event = result | parents = args) = probability` to the event's CPT.
    pub fn add_line(
        &mut self,
        event: EventId,
        probability: f64,
        result: usize,
        args: &[usize],
    ) -> Result<(), ExecError> {
        let target = self.event_checked(event)?;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ExecError::Validation(format!(
                "probability {} for '{}' must be finite and in [0, 1]",
                probability, target.label
            )));
        }
        if result >= target.choice_count() {
            return Err(ExecError::Validation(format!(
                "result code {} out of range for '{}' ({} choices)",
                result,
                target.label,
                target.choice_count()
            )));
        }
        if args.len() != target.parents.len() {
            return Err(ExecError::Validation(format!(
                "'{}' has {} parents but the line supplies {} arguments",
                target.label,
                target.parents.len(),
                args.len()
            )));
        }
        for (&arg, parent) in args.iter().zip(target.parents.iter()) {
            let parent = &self.events[parent.index()];
            if arg >= parent.choice_count() {
                return Err(ExecError::Validation(format!(
                    "argument {} out of range for parent '{}' of '{}'",
                    arg, parent.label, target.label
                )));
            }
        }

        self.events[event.index()]
            .table
            .push(TableLine::new(probability, result, args));
        Ok(())
    }

    /// Checks that every CPT is complete and normalised.
    ///
    /// For every event and every parent argument vector, each result value must
    /// have a line and the probabilities must sum to 1 within `tolerance`.
    pub fn validate(&self, tolerance: f64) -> Result<(), ExecError> {
        for event in &self.events {
            let cardinalities: SmallVec<[usize; 4]> = event
                .parents
                .iter()
                .map(|p| self.events[p.index()].choice_count())
                .collect();
            let mut args: TableArgs = SmallVec::from_elem(0, cardinalities.len());

            loop {
                let mut total = 0.0;
                for result in 0..event.choice_count() {
                    let line = event.table.find_line(&args, result).ok_or_else(|| {
                        ExecError::Configuration(format!(
                            "missing table line for {} given {}",
                            event.format_value(result),
                            self.format_args(event, &args)
                        ))
                    })?;
                    total += line.probability;
                }
                if (total - 1.0).abs() > tolerance {
                    return Err(ExecError::Configuration(format!(
                        "probabilities for '{}' given {} sum to {}",
                        event.label,
                        self.format_args(event, &args),
                        total
                    )));
                }
                if !roll(&cardinalities, &mut args) {
                    break;
                }
            }
        }
        Ok(())
    }

    pub fn event(&self, id: EventId) -> Option<&BayesianEvent> {
        self.events.get(id.index())
    }

    pub fn event_id(&self, label: &str) -> Option<EventId> {
        self.by_label.get(label).copied()
    }

    pub fn event_by_label(&self, label: &str) -> Option<&BayesianEvent> {
        self.event_id(label).and_then(|id| self.event(id))
    }

    /// Events in insertion order.
    pub fn events(&self) -> &[BayesianEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn event_checked(&self, id: EventId) -> Result<&BayesianEvent, ExecError> {
        self.event(id)
            .ok_or_else(|| ExecError::Validation(format!("unknown event id {}", id)))
    }

    /// True if `ancestor` is reachable from `event` by following parent links.
    fn is_ancestor(&self, ancestor: EventId, event: EventId) -> bool {
        let mut stack = vec![event];
        let mut seen = vec![false; self.events.len()];
        while let Some(current) = stack.pop() {
            if current == ancestor {
                return true;
            }
            if std::mem::replace(&mut seen[current.index()], true) {
                continue;
            }
            stack.extend(self.events[current.index()].parents.iter().copied());
        }
        false
    }

    fn format_args(&self, event: &BayesianEvent, args: &[usize]) -> String {
        if args.is_empty() {
            return "no parents".into();
        }
        event
            .parents
            .iter()
            .zip(args)
            .map(|(parent, &value)| self.events[parent.index()].format_value(value))
            .collect::<Vec<_>>()
            .join(",")
    }
}
