//! File-level conversion
//!
//! # Example
//!
//! ```ignore
//! use tflite2onnx::io::{convert_file, ConvertOptions};
//!
//! let stats = convert_file("model.tflite", "model.onnx", &ConvertOptions::default())?;
//! println!("{} nodes, {} transposes", stats.nodes, stats.transposes);
//! ```

pub mod reader;
pub mod validation;
pub mod writer;

// Re-exports
pub use reader::{
    get_source_info, load_onnx, load_onnx_from_bytes, load_tflite, SourceInfo,
};
pub use validation::{
    check_model, is_opset_supported, op_histogram, validate_graph, validate_model,
    ValidationResult, MAX_OPSET_VERSION, MIN_OPSET_VERSION,
};
pub use writer::{model_size, model_to_bytes, save_model, SaveStats};

use std::path::Path;

use crate::error::ConvertResult;
use crate::layout::LayoutApproach;
use crate::model::Model;
use crate::proto::ModelProto;
use crate::{IR_VERSION, OPSET_VERSION, PRODUCER_NAME, VERSION};

/// Conversion options
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// How layout mismatches are resolved
    pub approach: LayoutApproach,
    /// Default-domain opset of the emitted model
    pub opset_version: i64,
    /// ONNX IR version of the emitted model
    pub ir_version: i64,
    /// `producer_name` of the emitted model
    pub producer_name: String,
    /// `producer_version` of the emitted model
    pub producer_version: String,
    /// Run the conformance check in [`convert_bytes`] and [`convert_file`].
    /// [`Model::save`](crate::Model::save) checks regardless.
    pub validate: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            approach: LayoutApproach::default(),
            opset_version: OPSET_VERSION,
            ir_version: IR_VERSION,
            producer_name: PRODUCER_NAME.to_string(),
            producer_version: VERSION.to_string(),
            validate: true,
        }
    }
}

/// Conversion statistics
#[derive(Debug, Clone, Default)]
pub struct ConvertStats {
    /// Operators in the source subgraph
    pub source_operators: usize,
    /// Nodes in the emitted graph
    pub nodes: usize,
    /// Emitted `Transpose` nodes
    pub transposes: usize,
    /// Encoded size of the emitted model
    pub output_size: usize,
}

impl ConvertStats {
    fn new(source_operators: usize, model: &ModelProto) -> Self {
        let (nodes, transposes) = model
            .graph
            .as_ref()
            .map(|g| (g.node.len(), g.nodes_of_type("Transpose").count()))
            .unwrap_or_default();
        Self {
            source_operators,
            nodes,
            transposes,
            output_size: model_size(model),
        }
    }

    /// Emitted nodes that are not one-for-one lowerings of source operators
    pub fn synthesized(&self) -> usize {
        self.nodes.saturating_sub(self.source_operators)
    }
}

/// Convert TFLite bytes in memory
pub fn convert_bytes(
    bytes: &[u8],
    options: &ConvertOptions,
) -> ConvertResult<(ModelProto, ConvertStats)> {
    let source_operators = SourceInfo::from_bytes(bytes)?.operator_count;
    let mut model = Model::new(bytes, options)?;
    let proto = model.convert()?;
    if options.validate {
        check_model(&proto)?;
    }
    let stats = ConvertStats::new(source_operators, &proto);
    Ok((proto, stats))
}

/// Convert a TFLite file and save the ONNX model to another file
///
/// This is the main entry point for file-based conversion.
pub fn convert_file<P1: AsRef<Path>, P2: AsRef<Path>>(
    input: P1,
    output: P2,
    options: &ConvertOptions,
) -> ConvertResult<ConvertStats> {
    let bytes = load_tflite(input)?;
    let (proto, stats) = convert_bytes(&bytes, options)?;
    save_model(&proto, output)?;
    Ok(stats)
}
