//! # tflite2onnx
//!
//! Convert TensorFlow Lite models to ONNX.
//!
//! TFLite lays out activations channel-last (`NHWC`) while ONNX operators
//! expect channel-first (`NCHW`). The converter decides per tensor which
//! layout to emit and inserts `Transpose` nodes where the two disagree.
//!
//! ## Pipeline
//!
//! - **parse**: bind source tensors and build operators through the registry
//! - **build-graph**: insert transposes and materialize fused activations
//! - **propagate**: settle the layout of every tensor
//! - **convert**: emit the ONNX graph in topological order
//!
//! ## Example
//!
//! ```ignore
//! use tflite2onnx::prelude::*;
//!
//! let bytes = load_tflite("model.tflite")?;
//! let mut model = Model::new(&bytes, &ConvertOptions::default())?;
//! model.save("model.onnx")?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Module declarations
// ============================================================================

pub mod error;
pub mod graph;
pub mod io;
pub mod layout;
pub mod logger;
pub mod model;
pub mod op;
pub mod proto;
pub mod status;
pub mod tensor;
pub mod tflite;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module - import commonly used types with `use tflite2onnx::prelude::*`
pub mod prelude {
    pub use crate::error::{ConvertError, ConvertResult};
    pub use crate::graph::Graph;
    pub use crate::io::{
        check_model, convert_bytes, convert_file, load_onnx, load_tflite, save_model,
        ConvertOptions, ConvertStats,
    };
    pub use crate::layout::{Layout, LayoutApproach};
    pub use crate::model::Model;
    pub use crate::proto::onnx::*;
    pub use crate::status::Status;
}

// ============================================================================
// Crate-level re-exports
// ============================================================================

pub use error::{ConvertError, ConvertResult};
pub use io::{convert_file, ConvertOptions};
pub use model::Model;

// ============================================================================
// Version information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default-domain opset of emitted models
pub const OPSET_VERSION: i64 = 11;

/// ONNX IR version of emitted models
pub const IR_VERSION: i64 = 6;

/// `producer_name` of emitted models
pub const PRODUCER_NAME: &str = "tflite2onnx";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_emitted_opset_is_supported() {
        assert!(io::is_opset_supported(OPSET_VERSION));
    }
}
