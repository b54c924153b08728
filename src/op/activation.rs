//! Fused activations
//!
//! TFLite folds an activation into the producing operator's options. ONNX has
//! no such field, so the activation becomes its own node between the producer
//! and the producer's output.

use crate::error::{ConvertError, ConvertResult};
use crate::graph::Graph;
use crate::tensor::{encode_scalar, Tensor, TensorId};
use crate::tflite::schema::activation;

use super::{OpKind, Operator};

/// Activation synthesized from `ActivationFunctionType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationKind {
    /// `RELU`
    Relu,
    /// `RELU6`, a `Clip` to `[0, 6]`
    Relu6,
    /// `RELU_N1_TO_1`, a `Clip` to `[-1, 1]`
    ReluN1To1,
    /// `TANH`
    Tanh,
}

impl ActivationKind {
    /// Decode a fused activation; `Ok(None)` when there is none
    pub fn from_fused(value: i8) -> Result<Option<ActivationKind>, String> {
        match value {
            activation::NONE => Ok(None),
            activation::RELU => Ok(Some(ActivationKind::Relu)),
            activation::RELU6 => Ok(Some(ActivationKind::Relu6)),
            activation::RELU_N1_TO_1 => Ok(Some(ActivationKind::ReluN1To1)),
            activation::TANH => Ok(Some(ActivationKind::Tanh)),
            activation::SIGN_BIT => Err("fused SIGN_BIT activation".to_string()),
            other => Err(format!("unknown fused activation {}", other)),
        }
    }

    /// ONNX op type
    pub fn op_type(self) -> &'static str {
        match self {
            ActivationKind::Relu => "Relu",
            ActivationKind::Relu6 | ActivationKind::ReluN1To1 => "Clip",
            ActivationKind::Tanh => "Tanh",
        }
    }

    /// `Clip` bounds in real values
    pub fn bounds(self) -> Option<(f64, f64)> {
        match self {
            ActivationKind::Relu6 => Some((0.0, 6.0)),
            ActivationKind::ReluN1To1 => Some((-1.0, 1.0)),
            ActivationKind::Relu | ActivationKind::Tanh => None,
        }
    }
}

/// Insert an activation after output 0 of `producer`. Returns the new
/// operator's index.
///
/// The producer is rewired to a fresh tensor; the activation writes the
/// tensor the producer used to write.
pub fn insert_after(
    graph: &mut Graph<'_>,
    producer: usize,
    kind: ActivationKind,
    opcode: &'static str,
) -> ConvertResult<usize> {
    let output = graph.op(producer).outputs[0];
    let template = graph.tensor_ref(output).clone();

    let mut pre = Tensor::new(
        format!("{}_preact", template.name),
        template.shape.clone(),
        template.dtype,
    );
    pre.quant = template.quant.clone();
    pre.layout = template.layout;
    let pre = graph.add_tensor(pre);
    graph.op_mut(producer).outputs[0] = pre;

    let mut op = Operator::new(OpKind::Activation(kind), None);
    op.inputs.push(pre);
    if let Some((lo, hi)) = kind.bounds() {
        let min = clip_bound(graph, &template, lo, "min", producer, opcode)?;
        let max = clip_bound(graph, &template, hi, "max", producer, opcode)?;
        op.inputs.push(min);
        op.inputs.push(max);
        op.weights.push(min);
        op.weights.push(max);
    }
    op.outputs.push(output);
    Ok(graph.add_op(op))
}

/// Scalar constant holding `value` in the element type of `template`,
/// quantized with its parameters when it has them.
fn clip_bound(
    graph: &mut Graph<'_>,
    template: &Tensor,
    value: f64,
    which: &str,
    producer: usize,
    opcode: &'static str,
) -> ConvertResult<TensorId> {
    let stored = match &template.quant {
        Some(q) if q.scale.len() == 1 && q.scale[0] != 0.0 => {
            value / q.scale[0] as f64 + q.zero_point.first().copied().unwrap_or(0) as f64
        }
        _ => value,
    };
    let bytes = encode_scalar(template.dtype, stored).ok_or_else(|| {
        ConvertError::UnsupportedOperatorConfiguration {
            opcode,
            index: graph.op(producer).source_index.unwrap_or_default(),
            reason: format!("cannot clip a {:?} tensor", template.dtype),
        }
    })?;
    let name = format!("{}_clip_{}", template.name, which);
    Ok(graph.add_tensor(Tensor::constant(name, Vec::new(), template.dtype, bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fused() {
        assert_eq!(ActivationKind::from_fused(activation::NONE), Ok(None));
        assert_eq!(
            ActivationKind::from_fused(activation::RELU6),
            Ok(Some(ActivationKind::Relu6))
        );
        assert!(ActivationKind::from_fused(activation::SIGN_BIT).is_err());
        assert!(ActivationKind::from_fused(42).is_err());
    }

    #[test]
    fn test_op_types() {
        assert_eq!(ActivationKind::Relu.op_type(), "Relu");
        assert_eq!(ActivationKind::Relu6.op_type(), "Clip");
        assert_eq!(ActivationKind::ReluN1To1.bounds(), Some((-1.0, 1.0)));
        assert_eq!(ActivationKind::Tanh.bounds(), None);
    }
}
