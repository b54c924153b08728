//! In-memory TFLite model authoring
//!
//! Produces small, verifiable TFLite flatbuffers without the TensorFlow
//! toolchain. Tests and benchmarks describe a subgraph with tensors, buffers
//! and operators, then call [`TfliteBuilder::finish`] to get the file bytes.

use flatbuffers::{FlatBufferBuilder, WIPOffset};

use super::schema::{activation, padding, tensor_type, vt, BuiltinOptions};

/// Quantization parameters attached to one tensor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantDef {
    /// One scale per tensor, or one per channel
    pub scale: Vec<f32>,
    /// Zero points, same length as `scale`
    pub zero_point: Vec<i64>,
    /// Axis the per-channel parameters run along
    pub quantized_dimension: i32,
}

/// Builtin options of one operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionsDef {
    /// No options table
    None,
    /// `Conv2DOptions`
    Conv2D {
        /// `Padding` enum value
        padding: i8,
        /// Horizontal stride
        stride_w: i32,
        /// Vertical stride
        stride_h: i32,
        /// `ActivationFunctionType` enum value
        fused_activation: i8,
        /// Horizontal dilation
        dilation_w: i32,
        /// Vertical dilation
        dilation_h: i32,
    },
    /// `DepthwiseConv2DOptions`
    DepthwiseConv2D {
        /// `Padding` enum value
        padding: i8,
        /// Horizontal stride
        stride_w: i32,
        /// Vertical stride
        stride_h: i32,
        /// Output channels per input channel
        depth_multiplier: i32,
        /// `ActivationFunctionType` enum value
        fused_activation: i8,
        /// Horizontal dilation
        dilation_w: i32,
        /// Vertical dilation
        dilation_h: i32,
    },
}

impl OptionsDef {
    /// Unit-stride SAME convolution without fused activation
    pub fn conv_same() -> Self {
        OptionsDef::Conv2D {
            padding: padding::SAME,
            stride_w: 1,
            stride_h: 1,
            fused_activation: activation::NONE,
            dilation_w: 1,
            dilation_h: 1,
        }
    }

    /// Unit-stride SAME depthwise convolution
    pub fn depthwise_same(depth_multiplier: i32) -> Self {
        OptionsDef::DepthwiseConv2D {
            padding: padding::SAME,
            stride_w: 1,
            stride_h: 1,
            depth_multiplier,
            fused_activation: activation::NONE,
            dilation_w: 1,
            dilation_h: 1,
        }
    }

    /// Replace the padding enum value
    pub fn with_padding(mut self, value: i8) -> Self {
        match &mut self {
            OptionsDef::None => {}
            OptionsDef::Conv2D { padding, .. } | OptionsDef::DepthwiseConv2D { padding, .. } => {
                *padding = value
            }
        }
        self
    }

    /// Replace the fused activation enum value
    pub fn with_activation(mut self, value: i8) -> Self {
        match &mut self {
            OptionsDef::None => {}
            OptionsDef::Conv2D {
                fused_activation, ..
            }
            | OptionsDef::DepthwiseConv2D {
                fused_activation, ..
            } => *fused_activation = value,
        }
        self
    }

    /// Replace both strides
    pub fn with_strides(mut self, h: i32, w: i32) -> Self {
        match &mut self {
            OptionsDef::None => {}
            OptionsDef::Conv2D {
                stride_h, stride_w, ..
            }
            | OptionsDef::DepthwiseConv2D {
                stride_h, stride_w, ..
            } => {
                *stride_h = h;
                *stride_w = w;
            }
        }
        self
    }

    /// Replace both dilation factors
    pub fn with_dilations(mut self, h: i32, w: i32) -> Self {
        match &mut self {
            OptionsDef::None => {}
            OptionsDef::Conv2D {
                dilation_h,
                dilation_w,
                ..
            }
            | OptionsDef::DepthwiseConv2D {
                dilation_h,
                dilation_w,
                ..
            } => {
                *dilation_h = h;
                *dilation_w = w;
            }
        }
        self
    }
}

#[derive(Debug, Clone)]
struct TensorDef {
    name: String,
    shape: Vec<i32>,
    dtype: i8,
    buffer: u32,
    quant: Option<QuantDef>,
}

#[derive(Debug, Clone)]
struct OperatorDef {
    opcode_index: u32,
    inputs: Vec<i32>,
    outputs: Vec<i32>,
    options: OptionsDef,
}

/// Builder for a single-subgraph TFLite model
#[derive(Debug, Clone)]
pub struct TfliteBuilder {
    tensors: Vec<TensorDef>,
    buffers: Vec<Vec<u8>>,
    opcodes: Vec<i32>,
    operators: Vec<OperatorDef>,
    inputs: Vec<i32>,
    outputs: Vec<i32>,
    extra_subgraphs: usize,
}

impl Default for TfliteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TfliteBuilder {
    /// Create an empty model. Buffer 0 is the shared empty buffer.
    pub fn new() -> Self {
        Self {
            tensors: Vec::new(),
            buffers: vec![Vec::new()],
            opcodes: Vec::new(),
            operators: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            extra_subgraphs: 0,
        }
    }

    /// Add an activation tensor with no data, returning its index
    pub fn add_tensor(&mut self, name: &str, shape: &[i32], dtype: i8) -> i32 {
        self.tensors.push(TensorDef {
            name: name.to_string(),
            shape: shape.to_vec(),
            dtype,
            buffer: 0,
            quant: None,
        });
        (self.tensors.len() - 1) as i32
    }

    /// Add a constant tensor backed by its own buffer
    pub fn add_constant(&mut self, name: &str, shape: &[i32], dtype: i8, data: Vec<u8>) -> i32 {
        self.buffers.push(data);
        let index = self.add_tensor(name, shape, dtype);
        self.tensors[index as usize].buffer = (self.buffers.len() - 1) as u32;
        index
    }

    /// Add a float32 constant filled with `value`
    pub fn add_f32_constant(&mut self, name: &str, shape: &[i32], value: f32) -> i32 {
        let count: i32 = shape.iter().product();
        let data = (0..count.max(0))
            .flat_map(|_| value.to_le_bytes())
            .collect::<Vec<u8>>();
        self.add_constant(name, shape, tensor_type::FLOAT32, data)
    }

    /// Attach quantization parameters to a tensor
    pub fn set_quantization(&mut self, tensor: i32, quant: QuantDef) {
        if let Some(t) = self.tensors.get_mut(tensor as usize) {
            t.quant = Some(quant);
        }
    }

    /// Add an operator; opcodes are deduplicated into the opcode table
    pub fn add_operator(
        &mut self,
        opcode: i32,
        inputs: &[i32],
        outputs: &[i32],
        options: OptionsDef,
    ) -> usize {
        let opcode_index = match self.opcodes.iter().position(|&c| c == opcode) {
            Some(i) => i,
            None => {
                self.opcodes.push(opcode);
                self.opcodes.len() - 1
            }
        };
        self.operators.push(OperatorDef {
            opcode_index: opcode_index as u32,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            options,
        });
        self.operators.len() - 1
    }

    /// Set the subgraph inputs
    pub fn set_inputs(&mut self, inputs: &[i32]) {
        self.inputs = inputs.to_vec();
    }

    /// Set the subgraph outputs
    pub fn set_outputs(&mut self, outputs: &[i32]) {
        self.outputs = outputs.to_vec();
    }

    /// Append an empty subgraph after the main one
    pub fn add_empty_subgraph(&mut self) {
        self.extra_subgraphs += 1;
    }

    /// Serialize the model
    pub fn finish(&self) -> Vec<u8> {
        let mut fbb = FlatBufferBuilder::with_capacity(1024);

        // Buffers
        let mut buffer_offsets = Vec::with_capacity(self.buffers.len());
        for data in &self.buffers {
            let data = if data.is_empty() {
                None
            } else {
                Some(fbb.create_vector(data))
            };
            let start = fbb.start_table();
            if let Some(data) = data {
                fbb.push_slot_always(vt::buffer::DATA, data);
            }
            buffer_offsets.push(fbb.end_table(start));
        }
        let buffers = fbb.create_vector(&buffer_offsets);

        // Operator codes
        let mut code_offsets = Vec::with_capacity(self.opcodes.len());
        for &code in &self.opcodes {
            let start = fbb.start_table();
            fbb.push_slot::<i8>(
                vt::operator_code::DEPRECATED_BUILTIN_CODE,
                code.min(127) as i8,
                0,
            );
            fbb.push_slot::<i32>(vt::operator_code::VERSION, 1, 1);
            fbb.push_slot_always::<i32>(vt::operator_code::BUILTIN_CODE, code);
            code_offsets.push(fbb.end_table(start));
        }
        let operator_codes = fbb.create_vector(&code_offsets);

        let mut subgraph_offsets = vec![self.build_subgraph(&mut fbb)];
        for i in 0..self.extra_subgraphs {
            let name = fbb.create_string(&format!("subgraph_{}", i + 1));
            let start = fbb.start_table();
            fbb.push_slot_always(vt::sub_graph::NAME, name);
            subgraph_offsets.push(fbb.end_table(start));
        }
        let subgraphs = fbb.create_vector(&subgraph_offsets);

        let description = fbb.create_string("tflite2onnx test model");
        let start = fbb.start_table();
        fbb.push_slot::<u32>(vt::model::VERSION, 3, 0);
        fbb.push_slot_always(vt::model::OPERATOR_CODES, operator_codes);
        fbb.push_slot_always(vt::model::SUBGRAPHS, subgraphs);
        fbb.push_slot_always(vt::model::DESCRIPTION, description);
        fbb.push_slot_always(vt::model::BUFFERS, buffers);
        let model = fbb.end_table(start);

        fbb.finish(model, Some("TFL3"));
        fbb.finished_data().to_vec()
    }

    fn build_subgraph<'fbb>(
        &self,
        fbb: &mut FlatBufferBuilder<'fbb>,
    ) -> WIPOffset<flatbuffers::TableFinishedWIPOffset> {
        let mut tensor_offsets = Vec::with_capacity(self.tensors.len());
        for t in &self.tensors {
            let quant = t.quant.as_ref().map(|q| {
                let scale = fbb.create_vector(&q.scale);
                let zero_point = fbb.create_vector(&q.zero_point);
                let start = fbb.start_table();
                fbb.push_slot_always(vt::quantization::SCALE, scale);
                fbb.push_slot_always(vt::quantization::ZERO_POINT, zero_point);
                fbb.push_slot::<i32>(
                    vt::quantization::QUANTIZED_DIMENSION,
                    q.quantized_dimension,
                    0,
                );
                fbb.end_table(start)
            });
            let shape = fbb.create_vector(&t.shape);
            let name = fbb.create_string(&t.name);
            let start = fbb.start_table();
            fbb.push_slot_always(vt::tensor::SHAPE, shape);
            fbb.push_slot::<i8>(vt::tensor::TYPE, t.dtype, 0);
            fbb.push_slot::<u32>(vt::tensor::BUFFER, t.buffer, 0);
            fbb.push_slot_always(vt::tensor::NAME, name);
            if let Some(quant) = quant {
                fbb.push_slot_always(vt::tensor::QUANTIZATION, quant);
            }
            tensor_offsets.push(fbb.end_table(start));
        }
        let tensors = fbb.create_vector(&tensor_offsets);

        let mut operator_offsets = Vec::with_capacity(self.operators.len());
        for op in &self.operators {
            let (tag, options) = build_options(fbb, &op.options);
            let inputs = fbb.create_vector(&op.inputs);
            let outputs = fbb.create_vector(&op.outputs);
            let start = fbb.start_table();
            fbb.push_slot::<u32>(vt::operator::OPCODE_INDEX, op.opcode_index, 0);
            fbb.push_slot_always(vt::operator::INPUTS, inputs);
            fbb.push_slot_always(vt::operator::OUTPUTS, outputs);
            fbb.push_slot::<u8>(vt::operator::BUILTIN_OPTIONS_TYPE, tag.0, 0);
            if let Some(options) = options {
                fbb.push_slot_always(vt::operator::BUILTIN_OPTIONS, options);
            }
            operator_offsets.push(fbb.end_table(start));
        }
        let operators = fbb.create_vector(&operator_offsets);

        let inputs = fbb.create_vector(&self.inputs);
        let outputs = fbb.create_vector(&self.outputs);
        let name = fbb.create_string("main");
        let start = fbb.start_table();
        fbb.push_slot_always(vt::sub_graph::TENSORS, tensors);
        fbb.push_slot_always(vt::sub_graph::INPUTS, inputs);
        fbb.push_slot_always(vt::sub_graph::OUTPUTS, outputs);
        fbb.push_slot_always(vt::sub_graph::OPERATORS, operators);
        fbb.push_slot_always(vt::sub_graph::NAME, name);
        fbb.end_table(start)
    }
}

fn build_options(
    fbb: &mut FlatBufferBuilder<'_>,
    options: &OptionsDef,
) -> (
    BuiltinOptions,
    Option<WIPOffset<flatbuffers::TableFinishedWIPOffset>>,
) {
    match *options {
        OptionsDef::None => (BuiltinOptions::NONE, None),
        OptionsDef::Conv2D {
            padding,
            stride_w,
            stride_h,
            fused_activation,
            dilation_w,
            dilation_h,
        } => {
            use vt::conv_2d_options as f;
            let start = fbb.start_table();
            fbb.push_slot_always::<i8>(f::PADDING, padding);
            fbb.push_slot_always::<i32>(f::STRIDE_W, stride_w);
            fbb.push_slot_always::<i32>(f::STRIDE_H, stride_h);
            fbb.push_slot_always::<i8>(f::FUSED_ACTIVATION_FUNCTION, fused_activation);
            fbb.push_slot::<i32>(f::DILATION_W_FACTOR, dilation_w, 1);
            fbb.push_slot::<i32>(f::DILATION_H_FACTOR, dilation_h, 1);
            (BuiltinOptions::Conv2DOptions, Some(fbb.end_table(start)))
        }
        OptionsDef::DepthwiseConv2D {
            padding,
            stride_w,
            stride_h,
            depth_multiplier,
            fused_activation,
            dilation_w,
            dilation_h,
        } => {
            use vt::depthwise_conv_2d_options as f;
            let start = fbb.start_table();
            fbb.push_slot_always::<i8>(f::PADDING, padding);
            fbb.push_slot_always::<i32>(f::STRIDE_W, stride_w);
            fbb.push_slot_always::<i32>(f::STRIDE_H, stride_h);
            fbb.push_slot_always::<i32>(f::DEPTH_MULTIPLIER, depth_multiplier);
            fbb.push_slot_always::<i8>(f::FUSED_ACTIVATION_FUNCTION, fused_activation);
            fbb.push_slot::<i32>(f::DILATION_W_FACTOR, dilation_w, 1);
            fbb.push_slot::<i32>(f::DILATION_H_FACTOR, dilation_h, 1);
            (
                BuiltinOptions::DepthwiseConv2DOptions,
                Some(fbb.end_table(start)),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tflite::schema::{builtin_op, root_as_model};

    #[test]
    fn test_builder_round_trip() {
        let mut b = TfliteBuilder::new();
        let x = b.add_tensor("x", &[1, 4, 4, 2], tensor_type::FLOAT32);
        let y = b.add_tensor("y", &[1, 4, 4, 2], tensor_type::FLOAT32);
        b.add_operator(builtin_op::ABS, &[x], &[y], OptionsDef::None);
        b.set_inputs(&[x]);
        b.set_outputs(&[y]);

        let bytes = b.finish();
        let model = root_as_model(&bytes).unwrap();
        assert_eq!(model.version(), 3);
        let subgraphs = model.subgraphs().unwrap();
        assert_eq!(subgraphs.len(), 1);
        let sg = subgraphs.get(0);
        assert_eq!(sg.tensors().unwrap().len(), 2);
        assert_eq!(sg.tensors().unwrap().get(0).name(), Some("x"));
        let op = sg.operators().unwrap().get(0);
        let code = model.operator_codes().unwrap().get(op.opcode_index() as usize);
        assert_eq!(code.builtin_code(), builtin_op::ABS);
    }

    #[test]
    fn test_builder_conv_options() {
        let mut b = TfliteBuilder::new();
        let x = b.add_tensor("x", &[1, 8, 8, 3], tensor_type::FLOAT32);
        let w = b.add_f32_constant("w", &[4, 3, 3, 3], 0.5);
        let bias = b.add_f32_constant("b", &[4], 0.0);
        let y = b.add_tensor("y", &[1, 4, 4, 4], tensor_type::FLOAT32);
        let opts = OptionsDef::conv_same()
            .with_padding(padding::VALID)
            .with_strides(2, 2)
            .with_activation(activation::RELU6);
        b.add_operator(builtin_op::CONV_2D, &[x, w, bias], &[y], opts);

        let bytes = b.finish();
        let model = root_as_model(&bytes).unwrap();
        let sg = model.subgraphs().unwrap().get(0);
        let op = sg.operators().unwrap().get(0);
        assert_eq!(op.builtin_options_type(), BuiltinOptions::Conv2DOptions);
        let conv = op.builtin_options_as_conv_2d_options().unwrap();
        assert_eq!(conv.padding(), padding::VALID);
        assert_eq!(conv.stride_h(), 2);
        assert_eq!(conv.fused_activation_function(), activation::RELU6);
        assert_eq!(conv.dilation_w_factor(), 1);
        assert!(op.builtin_options_as_depthwise_conv_2d_options().is_none());

        let wt = sg.tensors().unwrap().get(w as usize);
        let data = model.buffers().unwrap().get(wt.buffer() as usize).data().unwrap();
        assert_eq!(data.len(), 4 * 3 * 3 * 3 * 4);
    }

    #[test]
    fn test_builder_quantization_and_subgraphs() {
        let mut b = TfliteBuilder::new();
        let x = b.add_tensor("x", &[1, 2, 2, 1], tensor_type::UINT8);
        b.set_quantization(
            x,
            QuantDef {
                scale: vec![0.5],
                zero_point: vec![128],
                quantized_dimension: 0,
            },
        );
        b.add_empty_subgraph();

        let bytes = b.finish();
        let model = root_as_model(&bytes).unwrap();
        assert_eq!(model.subgraphs().unwrap().len(), 2);
        let t = model.subgraphs().unwrap().get(0).tensors().unwrap().get(0);
        let q = t.quantization().unwrap();
        assert_eq!(q.scale().unwrap().get(0), 0.5);
        assert_eq!(q.zero_point().unwrap().get(0), 128);
        assert_eq!(t.type_(), tensor_type::UINT8);
    }
}
