//! Synthesized `Transpose` operators

use crate::proto::{AttributeProto, NodeProto};
use crate::tensor::TensorId;

use super::{OpKind, Operator};

/// Transpose from `input` to `output`
pub fn new(perm: Vec<i64>, input: TensorId, output: TensorId) -> Operator {
    let mut op = Operator::new(OpKind::Transpose { perm }, None);
    op.inputs.push(input);
    op.outputs.push(output);
    op
}

/// Attach `perm`
pub fn attributes(perm: &[i64], node: NodeProto) -> NodeProto {
    node.with_attribute(AttributeProto::new_ints("perm", perm.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::extensions::make_node;

    #[test]
    fn test_new_transpose() {
        let op = new(vec![0, 3, 1, 2], TensorId(0), TensorId(1));
        assert!(op.is_synthesized());
        assert_eq!(op.kind.op_type(), "Transpose");
        assert_eq!(op.inputs.as_slice(), &[TensorId(0)]);
    }

    #[test]
    fn test_perm_attribute() {
        let node = attributes(&[0, 2, 3, 1], make_node("Transpose", &["a"], &["b"], "b"));
        assert_eq!(node.get_attribute_ints("perm"), Some(&[0, 2, 3, 1][..]));
    }
}
