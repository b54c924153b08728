//! Model driver
//!
//! Wraps the single [`Graph`] of a TFLite model and produces the ONNX
//! `ModelProto` around it.

use std::path::Path;

use log::info;

use crate::error::{ConvertError, ConvertResult};
use crate::graph::Graph;
use crate::io::validation::check_model;
use crate::io::writer::{save_model, SaveStats};
use crate::io::ConvertOptions;
use crate::proto::{ModelProto, OperatorSetIdProto};
use crate::status::Status;
use crate::tflite::root_as_model;

/// A TFLite model being converted
pub struct Model<'a> {
    options: ConvertOptions,
    graph: Graph<'a>,
    description: String,
    converted: Option<ModelProto>,
    status: Status,
}

impl<'a> Model<'a> {
    /// Verify `buf` and take its only subgraph.
    ///
    /// ONNX has a single graph per model, so a source with any other number
    /// of subgraphs is rejected.
    pub fn new(buf: &'a [u8], options: &ConvertOptions) -> ConvertResult<Self> {
        let model = root_as_model(buf)?;
        let subgraphs = model.subgraphs();
        let count = subgraphs.map(|s| s.len()).unwrap_or(0);
        let subgraph = match subgraphs {
            Some(s) if count == 1 => s.get(0),
            _ => return Err(ConvertError::UnsupportedTopology { subgraphs: count }),
        };

        info!(
            "Loaded TFLite model (schema v{}, {} operators, {} layout)",
            model.version(),
            subgraph.operators().map(|o| o.len()).unwrap_or(0),
            options.approach
        );

        Ok(Self {
            options: options.clone(),
            graph: Graph::new(model, subgraph, options.approach),
            description: model.description().unwrap_or_default().to_string(),
            converted: None,
            status: Status::Initialized,
        })
    }

    /// The graph being converted
    pub fn graph(&self) -> &Graph<'a> {
        &self.graph
    }

    /// Current pipeline status
    pub fn status(&self) -> Status {
        self.status
    }

    /// Run the conversion. Later calls return the first result.
    pub fn convert(&mut self) -> ConvertResult<ModelProto> {
        if let Some(proto) = &self.converted {
            return Ok(proto.clone());
        }

        let graph = self.graph.convert()?;
        while let Some(next) = self.status.next() {
            self.status.advance(next);
        }
        let proto = ModelProto {
            ir_version: self.options.ir_version,
            opset_import: vec![OperatorSetIdProto {
                domain: String::new(),
                version: self.options.opset_version,
            }],
            producer_name: self.options.producer_name.clone(),
            producer_version: self.options.producer_version.clone(),
            doc_string: self.description.clone(),
            graph: Some(graph),
            ..Default::default()
        };
        info!(
            "Converted {} nodes (opset {})",
            proto.node_count(),
            self.options.opset_version
        );

        self.converted = Some(proto.clone());
        Ok(proto)
    }

    /// Convert if needed, check conformance and write atomically to `path`.
    ///
    /// The check always runs; nothing is written when it fails.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> ConvertResult<SaveStats> {
        let proto = self.convert()?;
        self.status.require(Status::Converted);
        check_model(&proto)?;
        save_model(&proto, path)
    }
}
