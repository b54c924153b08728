//! Error types for tflite2onnx
//!
//! Every error is fatal to a conversion: a partially converted graph has no
//! meaning, so phases propagate these unchanged up to the caller.

use thiserror::Error;

/// Main error type for TFLite to ONNX conversion
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The source model does not contain exactly one subgraph
    #[error("Unsupported topology: ONNX supports one graph per model, the TFLite model has {subgraphs}")]
    UnsupportedTopology {
        /// Number of subgraphs found in the source model
        subgraphs: usize,
    },

    /// An operator record does not carry the input/output count its opcode requires
    #[error(
        "Operator {index} ({opcode}): expected {expected_inputs} inputs and {expected_outputs} outputs, \
         found {inputs} and {outputs}"
    )]
    OperatorArityMismatch {
        /// Source opcode name
        opcode: &'static str,
        /// Operator index in the source subgraph
        index: usize,
        /// Required input count
        expected_inputs: usize,
        /// Required output count
        expected_outputs: usize,
        /// Inputs present in the source record
        inputs: usize,
        /// Outputs present in the source record
        outputs: usize,
    },

    /// Recognized opcode with an option value that cannot be lowered
    #[error("Operator {index} ({opcode}): unsupported configuration: {reason}")]
    UnsupportedOperatorConfiguration {
        /// Source opcode name
        opcode: &'static str,
        /// Operator index in the source subgraph
        index: usize,
        /// What was not handled
        reason: String,
    },

    /// Opcode with no entry in the operator registry
    #[error("Operator {index}: unsupported opcode {opcode}")]
    UnsupportedOperator {
        /// Raw builtin opcode
        opcode: i32,
        /// Operator index in the source subgraph
        index: usize,
    },

    /// Layout propagation could not settle a tensor's layout
    #[error("Unresolved layout for tensor '{name}' (#{tensor}): {reason}")]
    UnresolvedLayout {
        /// Arena index of the tensor
        tensor: usize,
        /// Tensor name
        name: String,
        /// Why the layout could not be decided
        reason: String,
    },

    /// The built ONNX model failed schema conformance
    #[error("Destination conformance failure: {0}")]
    DestinationConformanceFailure(String),

    /// The source bytes are not a readable TFLite flatbuffer
    #[error("Invalid TFLite model: {0}")]
    InvalidSource(String),

    /// TFLite tensor type with no ONNX counterpart
    #[error("Invalid TFLite tensor type: {0}")]
    InvalidDataType(i8),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Protobuf decode error
    #[error("Protobuf decode error: {0}")]
    ProtoDecode(#[from] prost::DecodeError),

    /// Protobuf encode error
    #[error("Protobuf encode error: {0}")]
    ProtoEncode(#[from] prost::EncodeError),
}

impl From<flatbuffers::InvalidFlatbuffer> for ConvertError {
    fn from(err: flatbuffers::InvalidFlatbuffer) -> Self {
        ConvertError::InvalidSource(err.to_string())
    }
}

/// Result type alias for conversion operations
pub type ConvertResult<T> = Result<T, ConvertError>;
