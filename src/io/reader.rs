//! Model readers
//!
//! TFLite sources are read into memory once and borrowed by the converter;
//! ONNX files are decoded for inspection of converted output.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use prost::Message;

use crate::error::{ConvertError, ConvertResult};
use crate::proto::ModelProto;
use crate::tflite::root_as_model;

/// Read a TFLite flatbuffer from a file path
///
/// # Example
///
/// ```ignore
/// use tflite2onnx::io::load_tflite;
///
/// let bytes = load_tflite("model.tflite")?;
/// let model = tflite2onnx::model::Model::new(&bytes, &Default::default())?;
/// ```
pub fn load_tflite<P: AsRef<Path>>(path: P) -> ConvertResult<Vec<u8>> {
    let path = path.as_ref();

    let file = File::open(path).map_err(|e| {
        ConvertError::InvalidSource(format!("Failed to open file '{}': {}", path.display(), e))
    })?;

    let mut reader = BufReader::new(file);
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    Ok(buffer)
}

/// Decode an ONNX model from bytes
pub fn load_onnx_from_bytes(bytes: &[u8]) -> ConvertResult<ModelProto> {
    Ok(ModelProto::decode(bytes)?)
}

/// Load an ONNX model from a file path
pub fn load_onnx<P: AsRef<Path>>(path: P) -> ConvertResult<ModelProto> {
    let bytes = std::fs::read(path)?;
    load_onnx_from_bytes(&bytes)
}

/// Summary of a TFLite model
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Schema version
    pub version: u32,
    /// Description string
    pub description: String,
    /// Number of subgraphs
    pub subgraph_count: usize,
    /// Number of operators in the first subgraph
    pub operator_count: usize,
    /// Number of tensors in the first subgraph
    pub tensor_count: usize,
    /// Builtin opcodes referenced by the opcode table
    pub opcodes: Vec<i32>,
}

impl SourceInfo {
    /// Extract a summary from flatbuffer bytes
    pub fn from_bytes(bytes: &[u8]) -> ConvertResult<Self> {
        let model = root_as_model(bytes)?;
        let subgraphs = model.subgraphs();
        let first = subgraphs.filter(|s| !s.is_empty()).map(|s| s.get(0));

        Ok(Self {
            version: model.version(),
            description: model.description().unwrap_or_default().to_string(),
            subgraph_count: subgraphs.map(|s| s.len()).unwrap_or(0),
            operator_count: first
                .and_then(|g| g.operators())
                .map(|o| o.len())
                .unwrap_or(0),
            tensor_count: first.and_then(|g| g.tensors()).map(|t| t.len()).unwrap_or(0),
            opcodes: model
                .operator_codes()
                .map(|c| c.iter().map(|code| code.builtin_code()).collect())
                .unwrap_or_default(),
        })
    }
}

/// Summarize a TFLite file
pub fn get_source_info<P: AsRef<Path>>(path: P) -> ConvertResult<SourceInfo> {
    let bytes = load_tflite(path)?;
    SourceInfo::from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tflite::schema::{builtin_op, tensor_type};
    use crate::tflite::{OptionsDef, TfliteBuilder};
    use std::io::Write;

    fn abs_model() -> Vec<u8> {
        let mut b = TfliteBuilder::new();
        let x = b.add_tensor("x", &[1, 4], tensor_type::FLOAT32);
        let y = b.add_tensor("y", &[1, 4], tensor_type::FLOAT32);
        b.add_operator(builtin_op::ABS, &[x], &[y], OptionsDef::None);
        b.set_inputs(&[x]);
        b.set_outputs(&[y]);
        b.finish()
    }

    #[test]
    fn test_source_info() {
        let info = SourceInfo::from_bytes(&abs_model()).unwrap();
        assert_eq!(info.version, 3);
        assert_eq!(info.subgraph_count, 1);
        assert_eq!(info.operator_count, 1);
        assert_eq!(info.tensor_count, 2);
        assert_eq!(info.opcodes, vec![builtin_op::ABS]);
    }

    #[test]
    fn test_load_tflite() {
        let bytes = abs_model();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let loaded = load_tflite(file.path()).unwrap();
        assert_eq!(loaded, bytes);
        assert_eq!(get_source_info(file.path()).unwrap().operator_count, 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_tflite("/nonexistent/model.tflite").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidSource(_)));
    }

    #[test]
    fn test_invalid_bytes() {
        assert!(SourceInfo::from_bytes(&[0, 1, 2, 3]).is_err());
        assert!(load_onnx_from_bytes(&[0xff, 0xff, 0xff]).is_err());
    }
}
