//! TFLite flatbuffer access
//!
//! - `schema`: verified read-only views over a `.tflite` buffer
//! - `builder`: authoring of small models in memory

pub mod builder;
pub mod schema;

pub use builder::{OptionsDef, QuantDef, TfliteBuilder};
pub use schema::{root_as_model, Model, Operator, SubGraph, Tensor};
