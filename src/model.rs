//! History model.

/// A single completed client operation.
#[derive(Debug, Clone)]
pub struct Operation<In, Out> {
    /// optional, unless you want per-client evidence
    pub client_id: Option<usize>,
    pub input: In,
    /// invocation time
    pub call: u64,
    pub output: Out,
    /// response time
    pub ret: u64,
}

/// Payload of an [`Event`]: an invocation carries the input, a response
/// carries the output.
#[derive(Debug, Clone)]
pub enum EventValue<In, Out> {
    Call(In),
    Return(Out),
}

/// One element of an event-form history.
///
/// A valid event sequence is totally ordered and contains exactly one
/// `Call` and at most one `Return` per `id`, the `Call` first. An `id`
/// whose `Return` never shows up is a never-returning operation; see
/// [`Model::unknown_output`].
#[derive(Debug, Clone)]
pub struct Event<In, Out> {
    pub client_id: Option<usize>,
    pub value: EventValue<In, Out>,
    /// pairs a `Call` with its `Return`
    pub id: usize,
}

/// A sequential specification of the system under test.
///
/// The implementing type is the abstract state itself; `init` and `step`
/// are the transition system. `PartialEq` gives `equal` its default of
/// structural identity; override `equal` when distinct representations
/// denote the same abstract state.
pub trait Model: Clone + PartialEq + Sized {
    /// Input type
    type In;

    /// Output type
    type Out;

    /// Initial state of the system.
    fn init() -> Self;

    /// Step function for the system.
    ///
    /// Returns whether or not the system could take this step with the
    /// given input and output, along with the resulting state.
    fn step(&self, input: &Self::In, output: &Self::Out) -> (bool, Self);

    /// Equality on states. Must be an equivalence relation consistent
    /// with `step`: equal states produce equal step results.
    fn equal(&self, other: &Self) -> bool {
        self == other
    }

    /// Partition operations, such that the history is linearizable if and
    /// only if each partition is linearizable. Operations in distinct
    /// partitions must commute in every reachable state (the typical use
    /// is partitioning by key).
    fn partition(
        history: Vec<Operation<Self::In, Self::Out>>,
    ) -> Vec<Vec<Operation<Self::In, Self::Out>>> {
        vec![history]
    }

    /// The output used to complete a never-returning call, e.g. a
    /// compare-and-swap whose client timed out. The model must accept it
    /// as legal against any state. `None` (the default) makes unmatched
    /// calls in an event history a precondition error.
    fn unknown_output() -> Option<Self::Out> {
        None
    }

    /// Human-readable rendering of an operation, for evidence output.
    fn describe_operation(_input: &Self::In, _output: &Self::Out) -> String {
        "<op>".to_string()
    }

    /// Human-readable rendering of a state, for evidence output.
    fn describe_state(&self) -> String {
        "<state>".to_string()
    }
}
