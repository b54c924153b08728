//! Tensor-to-operator maps and emission order
//!
//! Built on demand from the operator list; operators refer to tensors by
//! [`TensorId`] and are themselves identified by their list position.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::op::Operator;
use crate::tensor::TensorId;

/// Type alias for producer map: tensor → producing operator
pub type ProducerMap = FxHashMap<TensorId, usize>;

/// Type alias for consumer map: tensor → consuming operators
/// SmallVec optimized for common case of 1-4 consumers
pub type ConsumerMap = FxHashMap<TensorId, SmallVec<[usize; 4]>>;

/// Build producer map from the operator list
pub fn build_producer_map(ops: &[Operator]) -> ProducerMap {
    let mut map = FxHashMap::default();

    for (index, op) in ops.iter().enumerate() {
        for &output in &op.outputs {
            map.insert(output, index);
        }
    }

    map
}

/// Build consumer map from the operator list
pub fn build_consumer_map(ops: &[Operator]) -> ConsumerMap {
    let mut map: ConsumerMap = FxHashMap::default();

    for (index, op) in ops.iter().enumerate() {
        for &input in &op.inputs {
            let consumers = map.entry(input).or_default();
            if !consumers.contains(&index) {
                consumers.push(index);
            }
        }
    }

    map
}

/// Operators ordered so every producer precedes its consumers.
///
/// Among ready operators the lowest list index goes first, so source order
/// is kept wherever the data flow allows. Returns `None` on a cycle.
pub fn topological_order(ops: &[Operator]) -> Option<Vec<usize>> {
    let producers = build_producer_map(ops);
    let consumers = build_consumer_map(ops);

    let mut pending: Vec<usize> = ops
        .iter()
        .enumerate()
        .map(|(index, op)| {
            op.inputs
                .iter()
                .filter_map(|t| producers.get(t))
                .filter(|&&p| p != index)
                .collect::<FxHashSet<_>>()
                .len()
        })
        .collect();

    let mut ready: BTreeSet<usize> = pending
        .iter()
        .enumerate()
        .filter(|(_, n)| **n == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(ops.len());
    while let Some(index) = ready.pop_first() {
        order.push(index);
        let downstream: BTreeSet<usize> = ops[index]
            .outputs
            .iter()
            .filter_map(|t| consumers.get(t))
            .flatten()
            .copied()
            .filter(|&c| c != index)
            .collect();
        for consumer in downstream {
            pending[consumer] -= 1;
            if pending[consumer] == 0 {
                ready.insert(consumer);
            }
        }
    }

    (order.len() == ops.len()).then_some(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{OpKind, UnaryKind};

    fn unary(input: usize, output: usize) -> Operator {
        let mut op = Operator::new(OpKind::Unary(UnaryKind::Abs), Some(0));
        op.inputs.push(TensorId(input));
        op.outputs.push(TensorId(output));
        op
    }

    #[test]
    fn test_producer_consumer_maps() {
        let ops = vec![unary(0, 1), unary(1, 2), unary(1, 3)];
        let producers = build_producer_map(&ops);
        let consumers = build_consumer_map(&ops);

        assert_eq!(producers.get(&TensorId(2)), Some(&1));
        assert_eq!(consumers.get(&TensorId(1)).unwrap().as_slice(), &[1, 2]);
        assert!(!consumers.contains_key(&TensorId(3)));
    }

    #[test]
    fn test_topological_order_reorders_appended_producer() {
        // op 0 consumes t1, which op 1 (appended later) produces
        let ops = vec![unary(1, 2), unary(0, 1), unary(2, 3)];
        assert_eq!(topological_order(&ops), Some(vec![1, 0, 2]));
    }

    #[test]
    fn test_topological_order_is_stable() {
        let ops = vec![unary(0, 1), unary(0, 2), unary(1, 3)];
        assert_eq!(topological_order(&ops), Some(vec![0, 1, 2]));
    }

    #[test]
    fn test_cycle() {
        let ops = vec![unary(0, 1), unary(1, 0)];
        assert_eq!(topological_order(&ops), None);
    }
}
