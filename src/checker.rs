//! Parallel linearizability checker.

use crate::evidence::{self, LinearizationInfo};
use crate::history;
use crate::model::{Model, Operation};
use crate::utils::LinkedEntries;
use bit_vec::BitVec;
use crossbeam_channel::RecvTimeoutError;
use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Outcome of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    /// A full linearization was found.
    Ok,
    /// The search was exhausted without finding one.
    Illegal,
    /// The wall-clock budget elapsed before a verdict was reached.
    Unknown,
}

/// For each operation, the longest linearization prefix observed to
/// contain it. Prefixes are shared, so equality of the recorded prefix
/// is pointer identity.
pub(crate) type Longest = Vec<Option<Arc<Vec<usize>>>>;

fn cache_contains<M: Model>(cache: &HashMap<BitVec, Vec<M>>, bv: &BitVec, state: &M) -> bool {
    cache
        .get(bv)
        .map_or(false, |states| states.iter().any(|s| s.equal(state)))
}

fn record_longest<M>(list: &LinkedEntries, calls: &[(usize, M)], longest: &mut Longest) {
    let len = calls.len();
    let mut seq: Option<Arc<Vec<usize>>> = None;
    for &(node, _) in calls {
        let id = list.id(node);
        if longest[id].as_ref().map_or(true, |s| len > s.len()) {
            let seq = seq
                .get_or_insert_with(|| Arc::new(calls.iter().map(|&(n, _)| list.id(n)).collect()));
            longest[id] = Some(seq.clone());
        }
    }
}

/// Check a single sub-history.
///
/// The cursor walks the entry list in timestamp order. A call entry is a
/// candidate for the next commit; it goes through when the model accepts
/// the step and the resulting (linearized set, state) pair has not been
/// visited. Hitting a return entry means every candidate overlapping the
/// pending window has been tried, so the latest commit is revoked. The
/// history is linearizable when the list drains.
pub(crate) fn check_single<M: Model>(
    ops: &[Operation<M::In, M::Out>],
    compute_partial: bool,
    failed: &AtomicBool,
    deadline: &AtomicBool,
) -> (CheckResult, Longest) {
    let n = ops.len();
    let mut longest: Longest = vec![None; n];
    if n == 0 {
        return (CheckResult::Ok, longest);
    }

    let mut list = LinkedEntries::new(history::schedule(ops));
    let mut linearized = BitVec::from_elem(n, false); // committed call set
    let mut cache: HashMap<BitVec, Vec<M>> = HashMap::new(); // call set -> states seen
    let mut calls: Vec<(usize, M)> = Vec::with_capacity(n); // commit order, with the state before each
    let mut state = M::init();
    let mut entry = list.front();

    while !list.is_empty() {
        if failed.load(Ordering::Relaxed) || deadline.load(Ordering::Relaxed) {
            return (CheckResult::Unknown, longest);
        }
        if list.is_call(entry) {
            let id = list.id(entry);
            let op = &ops[id];
            let (ok, new_state) = state.step(&op.input, &op.output);
            if ok {
                let mut new_linearized = linearized.clone();
                new_linearized.set(id, true);
                if !cache_contains(&cache, &new_linearized, &new_state) {
                    trace!("commit {}", id);
                    cache
                        .entry(new_linearized)
                        .or_default()
                        .push(new_state.clone());
                    calls.push((entry, mem::replace(&mut state, new_state)));
                    linearized.set(id, true);
                    list.lift(entry);
                    entry = list.front();
                } else {
                    // this prefix and state were visited before
                    entry = list.next(entry);
                }
            } else {
                entry = list.next(entry);
            }
        } else {
            // an undecided return: a call committed before this point has
            // to be revoked, or the sub-history is not linearizable
            if calls.is_empty() {
                return (CheckResult::Illegal, longest);
            }
            if compute_partial {
                record_longest(&list, &calls, &mut longest);
            }
            let (top, prev_state) = calls.pop().unwrap();
            trace!("revoke {}", list.id(top));
            state = prev_state;
            linearized.set(list.id(top), false);
            list.unlift(top);
            entry = list.next(top);
        }
    }

    let seq: Arc<Vec<usize>> = Arc::new(calls.iter().map(|&(node, _)| list.id(node)).collect());
    for slot in longest.iter_mut() {
        *slot = Some(seq.clone());
    }
    (CheckResult::Ok, longest)
}

/// Partition the history and check the partitions on a bounded pool of
/// worker threads. Workers share nothing but the two cancellation
/// flags, polled once per search node. With `verbose` the first illegal
/// partition does not cancel its siblings, so every partition
/// contributes evidence; without it the check fails fast.
pub(crate) fn check<M: Model>(
    history: Vec<Operation<M::In, M::Out>>,
    verbose: bool,
    timeout: Option<Duration>,
) -> (CheckResult, LinearizationInfo)
where
    M::In: Sync,
    M::Out: Sync,
{
    let partitions = M::partition(history);
    let failed = AtomicBool::new(false);
    let deadline = AtomicBool::new(false);
    if timeout.map_or(false, |t| t.is_zero()) {
        deadline.store(true, Ordering::Relaxed);
    }

    let mut results: Vec<(CheckResult, Longest)> = partitions
        .iter()
        .map(|_| (CheckResult::Ok, Vec::new()))
        .collect();

    if !partitions.is_empty() {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(partitions.len());
        debug!(
            "checking {} partitions on {} workers",
            partitions.len(),
            workers
        );
        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        for idx in 0..partitions.len() {
            let _ = job_tx.send(idx);
        }
        drop(job_tx);
        let (res_tx, res_rx) = crossbeam_channel::unbounded();
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(0);

        let parts = &partitions;
        let failed = &failed;
        let deadline = &deadline;
        thread::scope(|s| {
            if let Some(budget) = timeout {
                s.spawn(move || {
                    // the single timer: done_tx is dropped once results
                    // are in, which unblocks this before the budget
                    if matches!(done_rx.recv_timeout(budget), Err(RecvTimeoutError::Timeout)) {
                        deadline.store(true, Ordering::Relaxed);
                    }
                });
            }
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let res_tx = res_tx.clone();
                s.spawn(move || {
                    while let Ok(idx) = job_rx.recv() {
                        let (res, longest) =
                            check_single::<M>(&parts[idx], verbose, failed, deadline);
                        if res == CheckResult::Illegal && !verbose {
                            failed.store(true, Ordering::Relaxed);
                        }
                        if res_tx.send((idx, res, longest)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(res_tx);
            for (idx, res, longest) in res_rx.iter() {
                results[idx] = (res, longest);
            }
            drop(done_tx);
        });
    }

    let mut verdict = CheckResult::Ok;
    for (res, _) in &results {
        match res {
            CheckResult::Illegal => {
                verdict = CheckResult::Illegal;
                break;
            }
            CheckResult::Unknown => verdict = CheckResult::Unknown,
            CheckResult::Ok => {}
        }
    }
    let info = if verbose {
        evidence::build_info::<M>(&partitions, &results)
    } else {
        LinearizationInfo::default()
    };
    (verdict, info)
}
