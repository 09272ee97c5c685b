//! Evidence for failed (and partially failed) checks.
//!
//! A verbose check reports, per partition, the operations with their raw
//! timestamps, the longest partial linearizations found by the search,
//! and which of those each operation belongs to. Caller-supplied
//! annotations ride along unchanged for downstream rendering.

use crate::checker::Longest;
use crate::model::{Model, Operation};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One operation of a partition, described for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryElement {
    pub client_id: Option<usize>,
    pub call: u64,
    pub ret: u64,
    pub description: String,
}

/// A timestamped diagnostic attached by the caller, associated with a
/// client or a free-form tag. `end: None` marks a point in time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Annotation {
    pub client_id: Option<usize>,
    pub tag: String,
    pub start: u64,
    pub end: Option<u64>,
    pub description: String,
    pub details: String,
    pub background_color: String,
}

/// Evidence for one partition.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionInfo {
    /// operations in partition order, indexed by the entries of
    /// `partial_linearizations`
    pub history: Vec<HistoryElement>,
    /// each a sequence of (operation index, state description after the
    /// step), in order of first appearance scanning operations by index
    pub partial_linearizations: Vec<Vec<(usize, String)>>,
    /// operation index -> index of the longest partial linearization
    /// containing it
    pub largest: HashMap<usize, usize>,
}

/// Diagnostic output of a verbose check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinearizationInfo {
    partitions: Vec<PartitionInfo>,
    annotations: Vec<Annotation>,
}

impl LinearizationInfo {
    pub fn partitions(&self) -> &[PartitionInfo] {
        &self.partitions
    }

    /// Attach caller-supplied annotations; they are passed through to
    /// the output unchanged.
    pub fn add_annotations(&mut self, mut annotations: Vec<Annotation>) {
        self.annotations.append(&mut annotations);
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl fmt::Display for LinearizationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.partitions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let best = p
                .partial_linearizations
                .iter()
                .map(Vec::len)
                .max()
                .unwrap_or(0);
            write!(
                f,
                "partition {}: linearized {} of {} operations",
                i,
                best,
                p.history.len()
            )?;
        }
        Ok(())
    }
}

/// Replays the recorded prefixes into displayable evidence.
pub(crate) fn build_info<M: Model>(
    partitions: &[Vec<Operation<M::In, M::Out>>],
    results: &[(crate::checker::CheckResult, Longest)],
) -> LinearizationInfo {
    let mut out = Vec::with_capacity(partitions.len());
    for (ops, (_, longest)) in partitions.iter().zip(results) {
        let history = ops
            .iter()
            .map(|op| HistoryElement {
                client_id: op.client_id,
                call: op.call,
                ret: op.ret,
                description: M::describe_operation(&op.input, &op.output),
            })
            .collect();

        // prefixes are shared between the operations they cover; collect
        // distinct ones in order of first appearance
        let mut seqs: Vec<Arc<Vec<usize>>> = Vec::new();
        let mut largest = HashMap::new();
        for (id, slot) in longest.iter().enumerate() {
            if let Some(seq) = slot {
                let idx = match seqs.iter().position(|s| Arc::ptr_eq(s, seq)) {
                    Some(i) => i,
                    None => {
                        seqs.push(seq.clone());
                        seqs.len() - 1
                    }
                };
                largest.insert(id, idx);
            }
        }

        let partial_linearizations = seqs
            .iter()
            .map(|seq| {
                let mut state = M::init();
                seq.iter()
                    .map(|&id| {
                        let op = &ops[id];
                        state = state.step(&op.input, &op.output).1;
                        (id, state.describe_state())
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        out.push(PartitionInfo {
            history,
            partial_linearizations,
            largest,
        });
    }
    LinearizationInfo {
        partitions: out,
        annotations: Vec::new(),
    }
}
