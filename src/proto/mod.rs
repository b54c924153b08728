//! ONNX Protocol Buffer types
//!
//! The destination format's messages, declared as `prost` types.
//! Additional builder helpers are provided in the `extensions` submodule.

/// ONNX protobuf types
#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod onnx;

// Re-export commonly used types at module level
pub use onnx::{
    AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto,
    StringStringEntryProto, TensorAnnotation, TensorProto, TensorShapeProto, TypeProto,
    ValueInfoProto,
};

// Re-export submodules for nested types
pub use onnx::attribute_proto;
pub use onnx::tensor_proto;
pub use onnx::tensor_shape_proto;
pub use onnx::type_proto;

/// Extension methods for ONNX protobuf types
pub mod extensions;

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_model_proto_default() {
        let model = ModelProto::default();
        assert_eq!(model.ir_version, 0);
        assert!(model.graph.is_none());
    }

    #[test]
    fn test_node_proto_encode_decode() {
        let node = NodeProto {
            op_type: "Abs".to_string(),
            input: vec!["x".to_string()],
            output: vec!["y".to_string()],
            ..Default::default()
        };
        let bytes = node.encode_to_vec();
        let decoded = NodeProto::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, node);
    }
}
