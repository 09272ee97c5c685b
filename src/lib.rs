//! A tool to check linearizability.
//!
//! Given a history of concurrent client operations and a sequential
//! specification ([`Model`]), decides whether some total order of the
//! operations respects real-time precedence and is legal against the
//! specification. Histories can be supplied as completed operations with
//! timestamps ([`Operation`]) or as a call/return event stream
//! ([`Event`]); verbose checks additionally report the longest partial
//! linearizations found, as evidence suitable for visualization.
//!
//! ```
//! use linearizability::{check_operations, Model, Operation};
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! struct Register(i64);
//!
//! #[derive(Debug, Clone, Copy)]
//! enum Input {
//!     Put(i64),
//!     Get,
//! }
//!
//! impl Model for Register {
//!     type In = Input;
//!     type Out = i64;
//!
//!     fn init() -> Self {
//!         Register(0)
//!     }
//!
//!     fn step(&self, input: &Input, output: &i64) -> (bool, Self) {
//!         match input {
//!             Input::Put(v) => (true, Register(*v)),
//!             Input::Get => (*output == self.0, *self),
//!         }
//!     }
//! }
//!
//! let history = vec![
//!     Operation { client_id: Some(0), input: Input::Put(100), call: 0, output: 0, ret: 100 },
//!     Operation { client_id: Some(1), input: Input::Get, call: 25, output: 100, ret: 75 },
//!     Operation { client_id: Some(2), input: Input::Get, call: 30, output: 0, ret: 60 },
//! ];
//! assert!(check_operations::<Register>(history));
//! ```

#[macro_use]
extern crate log;

mod checker;
mod evidence;
mod history;
mod utils;

pub mod kv;
pub mod model;
pub mod nondet;

pub use checker::CheckResult;
pub use evidence::{Annotation, HistoryElement, LinearizationInfo, PartitionInfo};
pub use history::{operations_from_events, HistoryError};
pub use model::{Event, EventValue, Model, Operation};
pub use nondet::{NondeterministicModel, StateSet};

use std::time::Duration;

/// Checks whether the history is linearizable against the model.
pub fn check_operations<M: Model>(history: Vec<Operation<M::In, M::Out>>) -> bool
where
    M::In: Sync,
    M::Out: Sync,
{
    checker::check::<M>(history, false, None).0 == CheckResult::Ok
}

/// Like [`check_operations`], with a wall-clock budget and evidence.
///
/// `timeout: None` means unbounded. When the budget elapses before a
/// verdict is reached the result is [`CheckResult::Unknown`] and the
/// evidence reflects progress at the abort point. A timed-out check may
/// therefore be a false positive for the caller that treats `Unknown`
/// as passing.
pub fn check_operations_verbose<M: Model>(
    history: Vec<Operation<M::In, M::Out>>,
    timeout: Option<Duration>,
) -> (CheckResult, LinearizationInfo)
where
    M::In: Sync,
    M::Out: Sync,
{
    checker::check::<M>(history, true, timeout)
}

/// Checks whether the event-form history is linearizable against the
/// model.
///
/// # Panics
///
/// On a structurally invalid event stream (see [`HistoryError`]). Use
/// [`operations_from_events`] directly to validate untrusted input.
pub fn check_events<M: Model>(history: Vec<Event<M::In, M::Out>>) -> bool
where
    M::In: Sync,
    M::Out: Sync,
{
    let ops = operations_from_events::<M>(history)
        .unwrap_or_else(|e| panic!("invalid event history: {}", e));
    checker::check::<M>(ops, false, None).0 == CheckResult::Ok
}

/// Like [`check_events`], with a wall-clock budget and evidence.
///
/// # Panics
///
/// On a structurally invalid event stream (see [`HistoryError`]).
pub fn check_events_verbose<M: Model>(
    history: Vec<Event<M::In, M::Out>>,
    timeout: Option<Duration>,
) -> (CheckResult, LinearizationInfo)
where
    M::In: Sync,
    M::Out: Sync,
{
    let ops = operations_from_events::<M>(history)
        .unwrap_or_else(|e| panic!("invalid event history: {}", e));
    checker::check::<M>(ops, true, timeout)
}
