//! A key-value model.

use crate::model::{Model, Operation};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvOp {
    Get,
    Put,
    Append,
}

#[derive(Debug, Clone)]
pub struct KvInput {
    pub op: KvOp,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct KvOutput {
    pub value: String,
}

/// Models a single key's value. Histories are partitioned by key, so
/// each partition checks against an independent register of this kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvModel {
    state: String,
}

impl Model for KvModel {
    type In = KvInput;
    type Out = KvOutput;

    fn partition(
        history: Vec<Operation<KvInput, KvOutput>>,
    ) -> Vec<Vec<Operation<KvInput, KvOutput>>> {
        let mut by_key: BTreeMap<String, Vec<Operation<KvInput, KvOutput>>> = BTreeMap::new();
        for op in history {
            by_key.entry(op.input.key.clone()).or_default().push(op);
        }
        by_key.into_values().collect()
    }

    fn init() -> Self {
        KvModel::default()
    }

    fn step(&self, input: &KvInput, output: &KvOutput) -> (bool, Self) {
        match input.op {
            KvOp::Get => (output.value == self.state, self.clone()),
            KvOp::Put => (
                true,
                KvModel {
                    state: input.value.clone(),
                },
            ),
            KvOp::Append => (
                true,
                KvModel {
                    state: format!("{}{}", self.state, input.value),
                },
            ),
        }
    }

    fn describe_operation(input: &KvInput, output: &KvOutput) -> String {
        match input.op {
            KvOp::Get => format!("get('{}') -> '{}'", input.key, output.value),
            KvOp::Put => format!("put('{}', '{}')", input.key, input.value),
            KvOp::Append => format!("append('{}', '{}')", input.key, input.value),
        }
    }

    fn describe_state(&self) -> String {
        self.state.clone()
    }
}
