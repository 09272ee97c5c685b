//! Nondeterministic models.
//!
//! A nondeterministic specification steps into a set of possible next
//! states instead of one. [`StateSet`] lifts such a specification into
//! the deterministic [`Model`] interface by tracking the set of states
//! the system could be in: a step is legal as long as some state
//! survives it.

use crate::model::{Model, Operation};

/// A sequential specification whose step relation is a set of
/// possibilities, e.g. a "put-any"/"get-any" register.
pub trait NondeterministicModel: Clone + PartialEq + Sized {
    /// Input type
    type In;

    /// Output type
    type Out;

    /// All initial states of the system.
    fn init() -> Vec<Self>;

    /// All states the system could step into with the given input and
    /// output. An empty set means the step is impossible from `self`.
    fn step(&self, input: &Self::In, output: &Self::Out) -> Vec<Self>;

    /// Equality on states, defaulting to structural identity.
    fn equal(&self, other: &Self) -> bool {
        self == other
    }

    /// See [`Model::partition`].
    fn partition(
        history: Vec<Operation<Self::In, Self::Out>>,
    ) -> Vec<Vec<Operation<Self::In, Self::Out>>> {
        vec![history]
    }

    /// See [`Model::unknown_output`].
    fn unknown_output() -> Option<Self::Out> {
        None
    }

    /// See [`Model::describe_operation`].
    fn describe_operation(_input: &Self::In, _output: &Self::Out) -> String {
        "<op>".to_string()
    }

    /// See [`Model::describe_state`].
    fn describe_state(&self) -> String {
        "<state>".to_string()
    }
}

/// The set-of-states lift of a [`NondeterministicModel`].
#[derive(Debug, Clone)]
pub struct StateSet<M> {
    states: Vec<M>,
}

impl<M: NondeterministicModel> StateSet<M> {
    fn dedup(states: Vec<M>) -> Vec<M> {
        let mut out: Vec<M> = Vec::with_capacity(states.len());
        for s in states {
            if !out.iter().any(|t| t.equal(&s)) {
                out.push(s);
            }
        }
        out
    }
}

/// Set equality modulo the underlying state equality.
impl<M: NondeterministicModel> PartialEq for StateSet<M> {
    fn eq(&self, other: &Self) -> bool {
        self.states
            .iter()
            .all(|s| other.states.iter().any(|t| t.equal(s)))
            && other
                .states
                .iter()
                .all(|s| self.states.iter().any(|t| t.equal(s)))
    }
}

impl<M: NondeterministicModel> Model for StateSet<M> {
    type In = M::In;
    type Out = M::Out;

    fn init() -> Self {
        StateSet {
            states: Self::dedup(M::init()),
        }
    }

    fn step(&self, input: &Self::In, output: &Self::Out) -> (bool, Self) {
        let mut next: Vec<M> = Vec::new();
        for s in &self.states {
            for n in s.step(input, output) {
                if !next.iter().any(|t| t.equal(&n)) {
                    next.push(n);
                }
            }
        }
        (!next.is_empty(), StateSet { states: next })
    }

    fn partition(
        history: Vec<Operation<Self::In, Self::Out>>,
    ) -> Vec<Vec<Operation<Self::In, Self::Out>>> {
        M::partition(history)
    }

    fn unknown_output() -> Option<Self::Out> {
        M::unknown_output()
    }

    fn describe_operation(input: &Self::In, output: &Self::Out) -> String {
        M::describe_operation(input, output)
    }

    fn describe_state(&self) -> String {
        let parts: Vec<String> = self.states.iter().map(M::describe_state).collect();
        format!("{{{}}}", parts.join(", "))
    }
}
