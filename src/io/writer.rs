//! ONNX model writer
//!
//! The destination is replaced atomically: bytes go to a temporary file in the
//! same directory, which is renamed over the destination once fully written.

use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;
use prost::Message;
use tempfile::NamedTempFile;

use crate::error::{ConvertError, ConvertResult};
use crate::proto::ModelProto;

/// Save an ONNX model to a file
///
/// # Example
///
/// ```ignore
/// use tflite2onnx::io::save_model;
///
/// save_model(&model, "model.onnx")?;
/// ```
pub fn save_model<P: AsRef<Path>>(model: &ModelProto, path: P) -> ConvertResult<SaveStats> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut bytes = Vec::with_capacity(model.encoded_len());
    model.encode(&mut bytes)?;
    let stats = SaveStats::new(model, bytes.len());

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        writer.write_all(&bytes)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| ConvertError::Io(e.error))?;

    debug!("Wrote {} bytes to {}", stats.size_bytes, path.display());
    Ok(stats)
}

/// Encode an ONNX model to bytes
pub fn model_to_bytes(model: &ModelProto) -> Vec<u8> {
    model.encode_to_vec()
}

/// Calculate the size of an encoded model in bytes
pub fn model_size(model: &ModelProto) -> usize {
    model.encoded_len()
}

/// What a save wrote
#[derive(Debug, Clone)]
pub struct SaveStats {
    /// Size in bytes
    pub size_bytes: usize,
    /// Number of nodes
    pub node_count: usize,
    /// Number of initializers
    pub initializer_count: usize,
}

impl SaveStats {
    fn new(model: &ModelProto, size_bytes: usize) -> Self {
        Self {
            size_bytes,
            node_count: model.node_count(),
            initializer_count: model
                .graph
                .as_ref()
                .map(|g| g.initializer.len())
                .unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::reader::load_onnx;
    use crate::proto::extensions::make_node;
    use crate::proto::{GraphProto, ValueInfoProto};

    fn create_test_model() -> ModelProto {
        ModelProto {
            ir_version: 6,
            producer_name: "test".to_string(),
            graph: Some(GraphProto {
                name: "test_graph".to_string(),
                node: vec![make_node("Relu", &["X"], &["Y"], "Y")],
                input: vec![ValueInfoProto {
                    name: "X".to_string(),
                    ..Default::default()
                }],
                output: vec![ValueInfoProto {
                    name: "Y".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_model_size() {
        let model = create_test_model();
        assert_eq!(model_size(&model), model_to_bytes(&model).len());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        let model = create_test_model();

        let stats = save_model(&model, &path).unwrap();
        assert_eq!(stats.node_count, 1);
        assert_eq!(stats.size_bytes, model_size(&model));

        let loaded = load_onnx(&path).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_save_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"stale").unwrap();

        save_model(&create_test_model(), &path).unwrap();
        assert_eq!(load_onnx(&path).unwrap().producer_name, "test");
        // Only the destination remains
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_to_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("model.onnx");
        assert!(matches!(
            save_model(&create_test_model(), &path),
            Err(ConvertError::Io(_))
        ));
    }
}
