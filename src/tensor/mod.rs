//! Tensor descriptors
//!
//! A [`Tensor`] is created the first time a source tensor index is referenced
//! and shared by every operator touching it. Shape and element type never
//! change after parsing; the layout tag is written at most once.

pub mod dtype;

use std::fmt;

use crate::error::{ConvertError, ConvertResult};
use crate::layout::Layout;
use crate::proto::extensions::{make_entry, make_tensor, make_tensor_value_info};
use crate::proto::onnx::tensor_proto::DataType;
use crate::proto::{TensorAnnotation, TensorProto, ValueInfoProto};
use crate::status::Status;

pub use dtype::{dtype_size, encode_scalar, from_tflite, is_float_type};

/// Handle into the graph's tensor arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(pub usize);

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Affine quantization parameters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Quantization {
    /// One per tensor or one per channel
    pub scale: Vec<f32>,
    /// Same length as `scale`
    pub zero_point: Vec<i64>,
    /// Channel axis for per-channel parameters
    pub axis: i32,
}

impl Quantization {
    /// True for one scale per channel
    pub fn is_per_axis(&self) -> bool {
        self.scale.len() > 1
    }
}

/// One tensor of the graph
#[derive(Debug, Clone)]
pub struct Tensor {
    /// Unique name in the emitted graph
    pub name: String,
    /// Dimensions in this tensor's own layout
    pub shape: Vec<i64>,
    /// ONNX element type
    pub dtype: DataType,
    /// Quantization parameters, if the tensor is quantized
    pub quant: Option<Quantization>,
    /// Reserved scale and zero-point initializer names
    pub quant_names: Option<(String, String)>,
    /// Layout tag; `None` until decided
    pub layout: Option<Layout>,
    /// Constant payload (weights, biases, synthesized constants)
    pub data: Option<Vec<u8>>,
    /// Index in the source subgraph, absent for synthesized tensors
    pub source_index: Option<i32>,
    /// Pipeline status
    pub status: Status,
}

impl Tensor {
    /// Tensor without data or layout
    pub fn new(name: impl Into<String>, shape: Vec<i64>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            shape,
            dtype,
            quant: None,
            quant_names: None,
            layout: None,
            data: None,
            source_index: None,
            status: Status::Initialized,
        }
    }

    /// Synthesized constant
    pub fn constant(
        name: impl Into<String>,
        shape: Vec<i64>,
        dtype: DataType,
        data: Vec<u8>,
    ) -> Self {
        let mut t = Self::new(name, shape, dtype);
        t.data = Some(data);
        t.layout = Some(Layout::None);
        t
    }

    /// True when the tensor carries constant data
    pub fn is_constant(&self) -> bool {
        self.data.is_some()
    }

    /// Number of elements
    pub fn numel(&self) -> i64 {
        self.shape.iter().product()
    }

    /// Write the layout tag. Returns whether the tag changed.
    ///
    /// A tensor keeps its first tag; a conflicting one is an error.
    pub fn tag(&mut self, id: TensorId, layout: Layout) -> ConvertResult<bool> {
        match self.layout {
            None => {
                self.layout = Some(layout);
                Ok(true)
            }
            Some(current) if current == layout => Ok(false),
            Some(current) => Err(ConvertError::UnresolvedLayout {
                tensor: id.0,
                name: self.name.clone(),
                reason: format!("tagged {} but also required as {}", current, layout),
            }),
        }
    }

    /// ONNX value info
    pub fn value_info(&self) -> ValueInfoProto {
        make_tensor_value_info(&self.name, self.dtype as i32, &self.shape)
    }

    /// ONNX initializer, for constant tensors
    pub fn initializer(&self) -> Option<TensorProto> {
        let data = self.data.as_ref()?;
        Some(make_tensor(&self.name, self.dtype as i32, &self.shape, data.clone()))
    }

    /// Quantization annotation plus the scale and zero-point initializers it names
    pub fn quant_annotation(&self) -> Option<(TensorAnnotation, Vec<TensorProto>)> {
        let q = self.quant.as_ref()?;
        if q.scale.is_empty() {
            return None;
        }
        let dims: Vec<i64> = if q.is_per_axis() {
            vec![q.scale.len() as i64]
        } else {
            Vec::new()
        };

        let (scale_name, zp_name) = match &self.quant_names {
            Some((scale, zero_point)) => (scale.clone(), zero_point.clone()),
            None => (
                format!("{}_scale", self.name),
                format!("{}_zero_point", self.name),
            ),
        };
        let scale = make_tensor(
            &scale_name,
            DataType::Float as i32,
            &dims,
            q.scale.iter().flat_map(|s| s.to_le_bytes()).collect(),
        );

        let zp_dtype = match self.dtype {
            DataType::Uint8 | DataType::Int8 => self.dtype,
            _ => DataType::Int64,
        };
        let zp_bytes = q
            .zero_point
            .iter()
            .flat_map(|&z| encode_scalar(zp_dtype, z as f64).unwrap_or_default())
            .collect();
        let zero_point = make_tensor(&zp_name, zp_dtype as i32, &dims, zp_bytes);

        let annotation = TensorAnnotation {
            tensor_name: self.name.clone(),
            quant_parameter_tensor_names: vec![
                make_entry("SCALE_TENSOR", &scale_name),
                make_entry("ZERO_POINT_TENSOR", &zp_name),
            ],
        };
        Some((annotation, vec![scale, zero_point]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_once() {
        let mut t = Tensor::new("x", vec![1, 4, 4, 3], DataType::Float);
        assert!(t.tag(TensorId(0), Layout::Nhwc).unwrap());
        assert!(!t.tag(TensorId(0), Layout::Nhwc).unwrap());
        let err = t.tag(TensorId(0), Layout::Nchw).unwrap_err();
        assert!(matches!(err, ConvertError::UnresolvedLayout { tensor: 0, .. }));
    }

    #[test]
    fn test_constant_initializer() {
        let t = Tensor::constant("c", vec![2], DataType::Float, vec![0; 8]);
        assert!(t.is_constant());
        assert_eq!(t.layout, Some(Layout::None));
        let init = t.initializer().unwrap();
        assert_eq!(init.dims, vec![2]);
        assert_eq!(init.raw_data.len(), 8);
        assert!(Tensor::new("x", vec![1], DataType::Float)
            .initializer()
            .is_none());
    }

    #[test]
    fn test_value_info_shape() {
        let t = Tensor::new("x", vec![1, 3, 8, 8], DataType::Uint8);
        let vi = t.value_info();
        assert_eq!(vi.get_shape(), Some(vec![1, 3, 8, 8]));
        assert_eq!(vi.get_elem_type(), Some(DataType::Uint8 as i32));
    }

    #[test]
    fn test_per_tensor_quant_annotation() {
        let mut t = Tensor::new("x", vec![1, 2, 2, 1], DataType::Uint8);
        t.quant = Some(Quantization {
            scale: vec![0.5],
            zero_point: vec![128],
            axis: 0,
        });
        let (ann, inits) = t.quant_annotation().unwrap();
        assert_eq!(ann.tensor_name, "x");
        assert_eq!(ann.quant_parameter_tensor_names[0].value, "x_scale");
        assert_eq!(inits[0].dims, Vec::<i64>::new());
        assert_eq!(inits[1].data_type, DataType::Uint8 as i32);
        assert_eq!(inits[1].raw_data, vec![128]);
    }

    #[test]
    fn test_reserved_quant_names() {
        let mut t = Tensor::new("x", vec![1, 2], DataType::Uint8);
        t.quant = Some(Quantization {
            scale: vec![0.5],
            zero_point: vec![0],
            axis: 0,
        });
        t.quant_names = Some(("x_scale_1".to_string(), "x_zero_point".to_string()));
        let (ann, inits) = t.quant_annotation().unwrap();
        assert_eq!(ann.quant_parameter_tensor_names[0].value, "x_scale_1");
        assert_eq!(inits[0].name, "x_scale_1");
        assert_eq!(inits[1].name, "x_zero_point");
    }

    #[test]
    fn test_per_axis_quant_annotation() {
        let mut t = Tensor::new("w", vec![4, 3, 3, 3], DataType::Int8);
        t.quant = Some(Quantization {
            scale: vec![0.1, 0.2, 0.3, 0.4],
            zero_point: vec![0; 4],
            axis: 0,
        });
        let (_, inits) = t.quant_annotation().unwrap();
        assert_eq!(inits[0].dims, vec![4]);
        assert_eq!(inits[0].raw_data.len(), 16);
    }
}
