//! Operator descriptors and their phase dispatch
//!
//! Source operators are parsed through the [`registry`]; transposes and fused
//! activations are synthesized while the graph is built. Each phase is a
//! function over `(graph, operator index)` so an operator can rewire the
//! shared tensor arena while it runs.

pub mod activation;
pub mod conv;
pub mod registry;
pub mod transpose;
pub mod unary;

use log::debug;
use smallvec::SmallVec;

use crate::error::ConvertResult;
use crate::graph::Graph;
use crate::proto::NodeProto;
use crate::status::Status;
use crate::tensor::TensorId;

pub use activation::ActivationKind;
pub use conv::{ConvParams, Padding};
pub use registry::{lookup, OpEntry, ParseArgs, REGISTRY};
pub use unary::UnaryKind;

/// Type-specific part of an operator
#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    /// 2D or depthwise convolution
    Conv(ConvParams),
    /// Elementwise unary math
    Unary(UnaryKind),
    /// Synthesized layout change
    Transpose {
        /// `out[i] = in[perm[i]]`
        perm: Vec<i64>,
    },
    /// Synthesized from a fused activation
    Activation(ActivationKind),
}

impl OpKind {
    /// ONNX op type
    pub fn op_type(&self) -> &'static str {
        match self {
            OpKind::Conv(_) => "Conv",
            OpKind::Unary(kind) => kind.op_type(),
            OpKind::Transpose { .. } => "Transpose",
            OpKind::Activation(kind) => kind.op_type(),
        }
    }

    /// Whether the layout of the input carries through to the output
    pub fn is_layout_agnostic(&self) -> bool {
        matches!(self, OpKind::Unary(_) | OpKind::Activation(_))
    }
}

/// One node of the graph
#[derive(Debug, Clone)]
pub struct Operator {
    /// Type and parameters
    pub kind: OpKind,
    /// Inputs in ONNX order
    pub inputs: SmallVec<[TensorId; 4]>,
    /// Outputs in ONNX order
    pub outputs: SmallVec<[TensorId; 1]>,
    /// Subset of inputs that are constants owned by this operator
    pub weights: SmallVec<[TensorId; 2]>,
    /// Pipeline status, advanced by the graph driver
    pub status: Status,
    /// Index in the source subgraph, absent for synthesized operators
    pub source_index: Option<usize>,
}

impl Operator {
    /// Operator with no tensors bound yet
    pub fn new(kind: OpKind, source_index: Option<usize>) -> Self {
        Self {
            kind,
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
            weights: SmallVec::new(),
            status: Status::Initialized,
            source_index,
        }
    }

    /// True for transposes and activations created by the converter
    pub fn is_synthesized(&self) -> bool {
        self.source_index.is_none()
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self.source_index {
            Some(i) => format!("{}[{}]", self.kind.op_type(), i),
            None => format!("{}[synth]", self.kind.op_type()),
        }
    }
}

/// Insert the transposes and helper operators this operator needs
pub fn build_graph(graph: &mut Graph<'_>, index: usize) -> ConvertResult<()> {
    graph.op(index).status.require(Status::Parsed);
    debug!("Building graph in {}...", graph.op(index).describe());
    let kind = graph.op(index).kind.clone();
    match kind {
        OpKind::Conv(_) => conv::build_graph(graph, index),
        OpKind::Unary(_) => unary::build_graph(graph, index),
        OpKind::Transpose { .. } | OpKind::Activation(_) => Ok(()),
    }
}

/// Copy layout tags across a layout-agnostic operator. Returns whether any
/// tag changed.
pub fn propagate(graph: &mut Graph<'_>, index: usize) -> ConvertResult<bool> {
    graph.op(index).status.require(Status::GraphBuilt);
    if !graph.op(index).kind.is_layout_agnostic() {
        return Ok(false);
    }

    let op = graph.op(index);
    let (input, output) = match (op.inputs.first(), op.outputs.first()) {
        (Some(&i), Some(&o)) => (i, o),
        _ => return Ok(false),
    };

    let mut changed = false;
    if let Some(layout) = graph.tensor_ref(input).layout {
        changed |= graph.tag(output, layout)?;
    }
    if let Some(layout) = graph.tensor_ref(output).layout {
        changed |= graph.tag(input, layout)?;
    }
    Ok(changed)
}

/// Emit the ONNX node of this operator
pub fn convert(graph: &Graph<'_>, index: usize) -> ConvertResult<NodeProto> {
    let op = graph.op(index);
    op.status.require(Status::Propagated);
    debug!("Converting {}...", op.describe());

    let inputs: Vec<&str> = op
        .inputs
        .iter()
        .map(|&t| graph.tensor_ref(t).name.as_str())
        .collect();
    let outputs: Vec<&str> = op
        .outputs
        .iter()
        .map(|&t| graph.tensor_ref(t).name.as_str())
        .collect();
    let name = outputs.first().copied().unwrap_or_default();
    let node = crate::proto::extensions::make_node(op.kind.op_type(), &inputs, &outputs, name);

    match &op.kind {
        OpKind::Conv(params) => Ok(conv::attributes(params, node)),
        OpKind::Unary(_) => Ok(node),
        OpKind::Transpose { perm } => Ok(transpose::attributes(perm, node)),
        OpKind::Activation(_) => Ok(node),
    }
}
