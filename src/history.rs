//! History normalization.
//!
//! Converts call/return event streams into operation tuples with
//! synthetic timestamps, completes never-returning calls, and lays the
//! entries of a sub-history out in checking order.

use crate::model::{Event, EventValue, Model, Operation};
use std::collections::HashMap;
use thiserror::Error;

/// A structurally invalid event history. These are programmer errors in
/// the caller's recording pipeline; the `check_events*` entry points
/// treat them as fatal preconditions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("call event {id} occurs twice")]
    DuplicateCall { id: usize },
    #[error("return event {id} occurs twice")]
    DuplicateReturn { id: usize },
    #[error("return event {id} has no matching call")]
    UnmatchedReturn { id: usize },
    #[error("return event {id} precedes its call")]
    ReturnBeforeCall { id: usize },
    #[error("call event {id} never returns and the model declares no unknown output")]
    MissingUnknownOutput { id: usize },
}

/// Pairs each `Call` with its `Return` and produces operations whose
/// timestamps are the event positions, so that relative order is
/// preserved exactly. Operations come out in call order.
///
/// A call without a return is completed with the model's
/// [`unknown output`](Model::unknown_output) and a response time past
/// every real timestamp: it stays pending forever and may be linearized
/// at any point after its call.
pub fn operations_from_events<M: Model>(
    events: Vec<Event<M::In, M::Out>>,
) -> Result<Vec<Operation<M::In, M::Out>>, HistoryError> {
    let mut calls: Vec<(usize, Option<usize>, M::In, u64)> = Vec::new();
    let mut seen_calls: HashMap<usize, u64> = HashMap::new();
    let mut returns: HashMap<usize, (u64, M::Out)> = HashMap::new();
    for (pos, ev) in events.into_iter().enumerate() {
        let pos = pos as u64;
        match ev.value {
            EventValue::Call(input) => {
                if seen_calls.insert(ev.id, pos).is_some() {
                    return Err(HistoryError::DuplicateCall { id: ev.id });
                }
                calls.push((ev.id, ev.client_id, input, pos));
            }
            EventValue::Return(output) => {
                if returns.insert(ev.id, (pos, output)).is_some() {
                    return Err(HistoryError::DuplicateReturn { id: ev.id });
                }
            }
        }
    }

    let mut ops = Vec::with_capacity(calls.len());
    for (id, client_id, input, call) in calls {
        match returns.remove(&id) {
            Some((ret, output)) => {
                if ret < call {
                    return Err(HistoryError::ReturnBeforeCall { id });
                }
                ops.push(Operation {
                    client_id,
                    input,
                    call,
                    output,
                    ret,
                });
            }
            None => {
                let output =
                    M::unknown_output().ok_or(HistoryError::MissingUnknownOutput { id })?;
                ops.push(Operation {
                    client_id,
                    input,
                    call,
                    output,
                    ret: u64::MAX,
                });
            }
        }
    }
    if let Some(&id) = returns.keys().min() {
        return Err(HistoryError::UnmatchedReturn { id });
    }
    Ok(ops)
}

/// Lays out the call and return entries of a sub-history in search
/// order: ascending timestamp, calls before returns on equal
/// timestamps, as-provided order otherwise. Returns `(id, is_call)`
/// pairs, where `id` is the operation's index in `ops`.
pub(crate) fn schedule<In, Out>(ops: &[Operation<In, Out>]) -> Vec<(usize, bool)> {
    let mut entries: Vec<(u64, u8, usize)> = Vec::with_capacity(ops.len() * 2);
    for (id, op) in ops.iter().enumerate() {
        assert!(
            op.call <= op.ret,
            "operation {} returns before it is called",
            id
        );
        entries.push((op.call, 0, id));
        entries.push((op.ret, 1, id));
    }
    entries.sort_by_key(|&(time, kind, _)| (time, kind));
    entries.into_iter().map(|(_, kind, id)| (id, kind == 0)).collect()
}
