//! ONNX model conformance checks
//!
//! Structural checks over the emitted graph (every input defined before use,
//! one producer per tensor, declared outputs produced) plus the per-op
//! attribute rules of the operators this converter emits.

use std::collections::HashSet;

use rustc_hash::FxHashMap;

use crate::error::{ConvertError, ConvertResult};
use crate::proto::onnx::tensor_proto::DataType;
use crate::proto::{GraphProto, ModelProto, NodeProto, TensorProto};
use crate::tensor::dtype_size;

/// Validation result with detailed issues
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the model is valid
    pub is_valid: bool,
    /// List of errors (critical issues)
    pub errors: Vec<String>,
    /// List of warnings (non-critical issues)
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
        self.is_valid = false;
    }

    /// Add a warning
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Merge with another result
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Lowest default-domain opset the emitted operators are defined for
pub const MIN_OPSET_VERSION: i64 = 11;
/// Highest default-domain opset accepted
pub const MAX_OPSET_VERSION: i64 = 21;

/// Check if opset version is supported
pub fn is_opset_supported(version: i64) -> bool {
    (MIN_OPSET_VERSION..=MAX_OPSET_VERSION).contains(&version)
}

/// Validate an ONNX model
pub fn validate_model(model: &ModelProto) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if model.ir_version < 3 {
        result.add_error(format!("IR version {} is not supported", model.ir_version));
    }

    match model.get_opset_version() {
        Some(v) if is_opset_supported(v) => {}
        Some(v) => result.add_error(format!("Default opset {} is not supported", v)),
        None => result.add_error("No default-domain opset import"),
    }

    match &model.graph {
        Some(graph) => result.merge(validate_graph(graph)),
        None => result.add_error("Model does not contain a graph"),
    }

    result
}

/// Validate a graph
pub fn validate_graph(graph: &GraphProto) -> ValidationResult {
    let mut result = ValidationResult::valid();

    let mut known: HashSet<&str> = HashSet::new();
    for input in &graph.input {
        if input.name.is_empty() {
            result.add_error("Graph input has empty name");
        } else {
            known.insert(&input.name);
        }
    }
    for init in &graph.initializer {
        if init.name.is_empty() {
            result.add_error("Initializer has empty name");
        } else if !known.insert(&init.name) {
            result.add_error(format!("Initializer '{}' defined twice", init.name));
        }
        check_initializer(init, &mut result);
    }

    for (idx, node) in graph.node.iter().enumerate() {
        if node.op_type.is_empty() {
            result.add_error(format!("Node {} has empty op_type", idx));
        }

        // Nodes must be topologically sorted
        for input in &node.input {
            if !input.is_empty() && !known.contains(input.as_str()) {
                result.add_error(format!(
                    "Node '{}' ({}): input '{}' not defined before use",
                    node.name, node.op_type, input
                ));
            }
        }

        if node.output.is_empty() {
            result.add_error(format!("Node '{}' ({}) has no outputs", node.name, node.op_type));
        }
        for output in &node.output {
            if output.is_empty() {
                continue;
            }
            // `known` already holds graph inputs and initializers
            if !known.insert(output.as_str()) {
                result.add_error(format!(
                    "Duplicate output '{}' in node '{}'",
                    output, node.name
                ));
            }
        }

        check_node(node, &mut result);
    }

    for output in &graph.output {
        if output.name.is_empty() {
            result.add_error("Graph output has empty name");
        } else if !known.contains(output.name.as_str()) {
            result.add_error(format!(
                "Graph output '{}' not produced by any node",
                output.name
            ));
        }
    }

    for annotation in &graph.quantization_annotation {
        if !known.contains(annotation.tensor_name.as_str()) {
            result.add_error(format!(
                "Quantization annotation for unknown tensor '{}'",
                annotation.tensor_name
            ));
        }
        for entry in &annotation.quant_parameter_tensor_names {
            if !graph.initializer.iter().any(|i| i.name == entry.value) {
                result.add_error(format!(
                    "Quantization parameter '{}' of '{}' has no initializer",
                    entry.value, annotation.tensor_name
                ));
            }
        }
    }

    if graph.node.is_empty() {
        result.add_warning("Graph has no nodes");
    }

    result
}

fn check_initializer(init: &TensorProto, result: &mut ValidationResult) {
    if init.raw_data.is_empty() {
        return;
    }
    let Ok(dtype) = DataType::try_from(init.data_type) else {
        result.add_error(format!(
            "Initializer '{}' has unknown data type {}",
            init.name, init.data_type
        ));
        return;
    };
    if let Some(size) = dtype_size(dtype) {
        let expected = init.num_elements() * size;
        if init.raw_data.len() != expected {
            result.add_error(format!(
                "Initializer '{}' holds {} bytes, dims {:?} need {}",
                init.name,
                init.raw_data.len(),
                init.dims,
                expected
            ));
        }
    }
}

fn check_node(node: &NodeProto, result: &mut ValidationResult) {
    let arity = |result: &mut ValidationResult, min: usize, max: usize| {
        if node.input.len() < min || node.input.len() > max || node.output.len() != 1 {
            result.add_error(format!(
                "Node '{}' ({}): {} inputs and {} outputs",
                node.name,
                node.op_type,
                node.input.len(),
                node.output.len()
            ));
        }
    };

    match node.op_type.as_str() {
        "Conv" => {
            arity(result, 2, 3);
            for name in ["kernel_shape", "strides", "dilations"] {
                match node.get_attribute_ints(name) {
                    Some(v) if v.len() == 2 && v.iter().all(|&x| x > 0) => {}
                    _ => result.add_error(format!(
                        "Conv '{}': '{}' must be two positive values",
                        node.name, name
                    )),
                }
            }
            if node.get_attribute_int("group", 1) < 1 {
                result.add_error(format!("Conv '{}': group must be positive", node.name));
            }
            let auto_pad = node.get_attribute_string("auto_pad");
            let pads = node.get_attribute_ints("pads");
            if auto_pad.is_some_and(|p| p != "NOTSET") && pads.is_some() {
                result.add_error(format!(
                    "Conv '{}': pads and auto_pad are exclusive",
                    node.name
                ));
            }
            if pads.is_some_and(|p| p.len() != 4) {
                result.add_error(format!("Conv '{}': pads must have 4 values", node.name));
            }
        }
        "Transpose" => {
            arity(result, 1, 1);
            let perm = node.get_attribute_ints("perm").unwrap_or_default();
            let mut sorted = perm.to_vec();
            sorted.sort_unstable();
            if sorted.iter().enumerate().any(|(i, &p)| p != i as i64) {
                result.add_error(format!(
                    "Transpose '{}': perm {:?} is not a permutation",
                    node.name, perm
                ));
            }
        }
        "Clip" => arity(result, 1, 3),
        _ => arity(result, 1, 1),
    }
}

/// Quick validation that returns an error if invalid
pub fn check_model(model: &ModelProto) -> ConvertResult<()> {
    let result = validate_model(model);
    if result.is_valid {
        Ok(())
    } else {
        Err(ConvertError::DestinationConformanceFailure(
            result.errors.join("; "),
        ))
    }
}

/// Node count per op type, sorted by op type
pub fn op_histogram(graph: &GraphProto) -> Vec<(String, usize)> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for node in &graph.node {
        *counts.entry(node.op_type.as_str()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    counts.sort();
    counts
}
