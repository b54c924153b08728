//! Elementwise unary operators
//!
//! Layout-agnostic: the output takes whatever layout the input has. With the
//! propagation approach a unary operator reading the output of an operator
//! that computes channel-first moves onto that channel-first tensor, so
//! consecutive layout-sensitive operators are not separated by a transpose
//! pair. Twins made by input transposes are left alone.

use crate::error::ConvertResult;
use crate::graph::Graph;
use crate::layout::{Layout, LayoutApproach};
use crate::tflite::schema::builtin_op;

use super::{OpKind, Operator, ParseArgs};

/// Unary math operator, named after its ONNX op type
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryKind {
    Abs,
    Ceil,
    Cos,
    Exp,
    Floor,
    Log,
    Sigmoid,
    Neg,
    Relu,
    Sin,
    Sqrt,
    Tanh,
}

impl UnaryKind {
    /// Kind for a TFLite opcode
    pub fn from_opcode(opcode: i32) -> Option<UnaryKind> {
        let kind = match opcode {
            builtin_op::ABS => UnaryKind::Abs,
            builtin_op::CEIL => UnaryKind::Ceil,
            builtin_op::COS => UnaryKind::Cos,
            builtin_op::EXP => UnaryKind::Exp,
            builtin_op::FLOOR => UnaryKind::Floor,
            builtin_op::LOG => UnaryKind::Log,
            builtin_op::LOGISTIC => UnaryKind::Sigmoid,
            builtin_op::NEG => UnaryKind::Neg,
            builtin_op::RELU => UnaryKind::Relu,
            builtin_op::SIN => UnaryKind::Sin,
            builtin_op::SQRT => UnaryKind::Sqrt,
            builtin_op::TANH => UnaryKind::Tanh,
            _ => return None,
        };
        Some(kind)
    }

    /// ONNX op type
    pub fn op_type(self) -> &'static str {
        match self {
            UnaryKind::Abs => "Abs",
            UnaryKind::Ceil => "Ceil",
            UnaryKind::Cos => "Cos",
            UnaryKind::Exp => "Exp",
            UnaryKind::Floor => "Floor",
            UnaryKind::Log => "Log",
            UnaryKind::Sigmoid => "Sigmoid",
            UnaryKind::Neg => "Neg",
            UnaryKind::Relu => "Relu",
            UnaryKind::Sin => "Sin",
            UnaryKind::Sqrt => "Sqrt",
            UnaryKind::Tanh => "Tanh",
        }
    }
}

/// Parse any registered unary opcode
pub fn parse(args: ParseArgs<'_>, _graph: &mut Graph<'_>) -> ConvertResult<Operator> {
    let kind = UnaryKind::from_opcode(args.entry.opcode)
        .ok_or_else(|| args.config_error("not an elementwise unary opcode"))?;
    if args.inputs.len() != 1 || args.outputs.len() != 1 {
        return Err(args.config_error("optional operand slots are not allowed"));
    }
    Ok(args.into_operator(OpKind::Unary(kind)))
}

/// Move onto the channel-first tensor the input's producer writes, if any
pub fn build_graph(graph: &mut Graph<'_>, index: usize) -> ConvertResult<()> {
    if graph.approach() != LayoutApproach::Propagation {
        return Ok(());
    }
    let input = graph.op(index).inputs[0];
    let output = graph.op(index).outputs[0];
    let Some(twin) = graph.find_written_twin(input, Layout::Nchw) else {
        return Ok(());
    };

    graph.op_mut(index).inputs[0] = twin;
    graph.tag(output, Layout::Nhwc)?;
    graph.transpose_output(index, 0, Layout::Nchw, Layout::Nhwc)?;
    Ok(())
}
