// TFLite flatbuffer bindings (subset of tensorflow/lite/schema/schema.fbs).
//
// Written in the shape flatc emits for Rust so the tables can be verified with
// `flatbuffers::root`. Vtable offsets are `4 + 2 * field_id`.

#![allow(unsafe_code)]
#![allow(missing_docs)]
#![allow(clippy::all)]
#![allow(non_upper_case_globals)]

use flatbuffers::{ForwardsUOffset, Follow, Table, VOffsetT, Vector, Verifiable, Verifier};

/// Vtable slot offsets, shared with the in-memory builder.
pub mod vt {
    pub mod model {
        pub const VERSION: flatbuffers::VOffsetT = 4;
        pub const OPERATOR_CODES: flatbuffers::VOffsetT = 6;
        pub const SUBGRAPHS: flatbuffers::VOffsetT = 8;
        pub const DESCRIPTION: flatbuffers::VOffsetT = 10;
        pub const BUFFERS: flatbuffers::VOffsetT = 12;
    }
    pub mod sub_graph {
        pub const TENSORS: flatbuffers::VOffsetT = 4;
        pub const INPUTS: flatbuffers::VOffsetT = 6;
        pub const OUTPUTS: flatbuffers::VOffsetT = 8;
        pub const OPERATORS: flatbuffers::VOffsetT = 10;
        pub const NAME: flatbuffers::VOffsetT = 12;
    }
    pub mod tensor {
        pub const SHAPE: flatbuffers::VOffsetT = 4;
        pub const TYPE: flatbuffers::VOffsetT = 6;
        pub const BUFFER: flatbuffers::VOffsetT = 8;
        pub const NAME: flatbuffers::VOffsetT = 10;
        pub const QUANTIZATION: flatbuffers::VOffsetT = 12;
    }
    pub mod quantization {
        pub const MIN: flatbuffers::VOffsetT = 4;
        pub const MAX: flatbuffers::VOffsetT = 6;
        pub const SCALE: flatbuffers::VOffsetT = 8;
        pub const ZERO_POINT: flatbuffers::VOffsetT = 10;
        pub const QUANTIZED_DIMENSION: flatbuffers::VOffsetT = 16;
    }
    pub mod buffer {
        pub const DATA: flatbuffers::VOffsetT = 4;
    }
    pub mod operator_code {
        pub const DEPRECATED_BUILTIN_CODE: flatbuffers::VOffsetT = 4;
        pub const CUSTOM_CODE: flatbuffers::VOffsetT = 6;
        pub const VERSION: flatbuffers::VOffsetT = 8;
        pub const BUILTIN_CODE: flatbuffers::VOffsetT = 10;
    }
    pub mod operator {
        pub const OPCODE_INDEX: flatbuffers::VOffsetT = 4;
        pub const INPUTS: flatbuffers::VOffsetT = 6;
        pub const OUTPUTS: flatbuffers::VOffsetT = 8;
        pub const BUILTIN_OPTIONS_TYPE: flatbuffers::VOffsetT = 10;
        pub const BUILTIN_OPTIONS: flatbuffers::VOffsetT = 12;
    }
    pub mod conv_2d_options {
        pub const PADDING: flatbuffers::VOffsetT = 4;
        pub const STRIDE_W: flatbuffers::VOffsetT = 6;
        pub const STRIDE_H: flatbuffers::VOffsetT = 8;
        pub const FUSED_ACTIVATION_FUNCTION: flatbuffers::VOffsetT = 10;
        pub const DILATION_W_FACTOR: flatbuffers::VOffsetT = 12;
        pub const DILATION_H_FACTOR: flatbuffers::VOffsetT = 14;
    }
    pub mod depthwise_conv_2d_options {
        pub const PADDING: flatbuffers::VOffsetT = 4;
        pub const STRIDE_W: flatbuffers::VOffsetT = 6;
        pub const STRIDE_H: flatbuffers::VOffsetT = 8;
        pub const DEPTH_MULTIPLIER: flatbuffers::VOffsetT = 10;
        pub const FUSED_ACTIVATION_FUNCTION: flatbuffers::VOffsetT = 12;
        pub const DILATION_W_FACTOR: flatbuffers::VOffsetT = 14;
        pub const DILATION_H_FACTOR: flatbuffers::VOffsetT = 16;
    }
}

/// `enum TensorType : byte`
pub mod tensor_type {
    pub const FLOAT32: i8 = 0;
    pub const FLOAT16: i8 = 1;
    pub const INT32: i8 = 2;
    pub const UINT8: i8 = 3;
    pub const INT64: i8 = 4;
    pub const STRING: i8 = 5;
    pub const BOOL: i8 = 6;
    pub const INT16: i8 = 7;
    pub const COMPLEX64: i8 = 8;
    pub const INT8: i8 = 9;
    pub const FLOAT64: i8 = 10;
}

/// `enum BuiltinOperator : int32` (the opcodes this crate lowers)
pub mod builtin_op {
    pub const CONV_2D: i32 = 3;
    pub const DEPTHWISE_CONV_2D: i32 = 4;
    pub const FLOOR: i32 = 8;
    pub const LOGISTIC: i32 = 14;
    pub const RELU: i32 = 19;
    pub const TANH: i32 = 28;
    pub const EXP: i32 = 47;
    pub const NEG: i32 = 59;
    pub const SIN: i32 = 66;
    pub const LOG: i32 = 73;
    pub const SQRT: i32 = 75;
    pub const ABS: i32 = 101;
    pub const CEIL: i32 = 104;
    pub const COS: i32 = 108;
}

/// `enum Padding : byte`
pub mod padding {
    pub const SAME: i8 = 0;
    pub const VALID: i8 = 1;
}

/// `enum ActivationFunctionType : byte`
pub mod activation {
    pub const NONE: i8 = 0;
    pub const RELU: i8 = 1;
    pub const RELU_N1_TO_1: i8 = 2;
    pub const RELU6: i8 = 3;
    pub const TANH: i8 = 4;
    pub const SIGN_BIT: i8 = 5;
}

/// `union BuiltinOptions` discriminant
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
#[repr(transparent)]
pub struct BuiltinOptions(pub u8);

impl BuiltinOptions {
    pub const NONE: Self = Self(0);
    pub const Conv2DOptions: Self = Self(1);
    pub const DepthwiseConv2DOptions: Self = Self(2);
}

impl<'a> Follow<'a> for BuiltinOptions {
    type Inner = Self;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        let b = flatbuffers::read_scalar_at::<u8>(buf, loc);
        Self(b)
    }
}

impl Verifiable for BuiltinOptions {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        u8::run_verifier(v, pos)
    }
}

impl flatbuffers::SimpleToVerifyInSlice for BuiltinOptions {}

macro_rules! table {
    ($name:ident) => {
        #[derive(Copy, Clone, PartialEq)]
        pub struct $name<'a> {
            pub _tab: Table<'a>,
        }

        impl<'a> Follow<'a> for $name<'a> {
            type Inner = $name<'a>;
            #[inline]
            unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
                Self {
                    _tab: Table::new(buf, loc),
                }
            }
        }

        impl<'a> $name<'a> {
            #[inline]
            pub unsafe fn init_from_table(table: Table<'a>) -> Self {
                $name { _tab: table }
            }

            #[inline]
            #[allow(dead_code)]
            fn scalar<T: Follow<'a, Inner = T> + Copy + 'a>(&self, slot: VOffsetT, default: T) -> T {
                // Safety: the table was verified by `root_as_model`
                unsafe { self._tab.get::<T>(slot, Some(default)).unwrap_or(default) }
            }

            #[inline]
            #[allow(dead_code)]
            fn field<T: Follow<'a> + 'a>(&self, slot: VOffsetT) -> Option<T::Inner> {
                // Safety: the table was verified by `root_as_model`
                unsafe { self._tab.get::<T>(slot, None) }
            }
        }
    };
}

table!(Model);
table!(SubGraph);
table!(Tensor);
table!(QuantizationParameters);
table!(Buffer);
table!(OperatorCode);
table!(Operator);
table!(Conv2DOptions);
table!(DepthwiseConv2DOptions);

// ============================================================================
// Model
// ============================================================================

impl<'a> Model<'a> {
    pub fn version(&self) -> u32 {
        self.scalar::<u32>(vt::model::VERSION, 0)
    }

    pub fn operator_codes(&self) -> Option<Vector<'a, ForwardsUOffset<OperatorCode<'a>>>> {
        self.field::<ForwardsUOffset<Vector<'a, ForwardsUOffset<OperatorCode<'a>>>>>(
            vt::model::OPERATOR_CODES,
        )
    }

    pub fn subgraphs(&self) -> Option<Vector<'a, ForwardsUOffset<SubGraph<'a>>>> {
        self.field::<ForwardsUOffset<Vector<'a, ForwardsUOffset<SubGraph<'a>>>>>(
            vt::model::SUBGRAPHS,
        )
    }

    pub fn description(&self) -> Option<&'a str> {
        self.field::<ForwardsUOffset<&'a str>>(vt::model::DESCRIPTION)
    }

    pub fn buffers(&self) -> Option<Vector<'a, ForwardsUOffset<Buffer<'a>>>> {
        self.field::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Buffer<'a>>>>>(vt::model::BUFFERS)
    }
}

impl Verifiable for Model<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<u32>("version", vt::model::VERSION, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<OperatorCode>>>>(
                "operator_codes",
                vt::model::OPERATOR_CODES,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<SubGraph>>>>(
                "subgraphs",
                vt::model::SUBGRAPHS,
                false,
            )?
            .visit_field::<ForwardsUOffset<&str>>("description", vt::model::DESCRIPTION, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Buffer>>>>(
                "buffers",
                vt::model::BUFFERS,
                false,
            )?
            .finish();
        Ok(())
    }
}

// ============================================================================
// SubGraph
// ============================================================================

impl<'a> SubGraph<'a> {
    pub fn tensors(&self) -> Option<Vector<'a, ForwardsUOffset<Tensor<'a>>>> {
        self.field::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Tensor<'a>>>>>(
            vt::sub_graph::TENSORS,
        )
    }

    pub fn inputs(&self) -> Option<Vector<'a, i32>> {
        self.field::<ForwardsUOffset<Vector<'a, i32>>>(vt::sub_graph::INPUTS)
    }

    pub fn outputs(&self) -> Option<Vector<'a, i32>> {
        self.field::<ForwardsUOffset<Vector<'a, i32>>>(vt::sub_graph::OUTPUTS)
    }

    pub fn operators(&self) -> Option<Vector<'a, ForwardsUOffset<Operator<'a>>>> {
        self.field::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Operator<'a>>>>>(
            vt::sub_graph::OPERATORS,
        )
    }

    pub fn name(&self) -> Option<&'a str> {
        self.field::<ForwardsUOffset<&'a str>>(vt::sub_graph::NAME)
    }
}

impl Verifiable for SubGraph<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Tensor>>>>(
                "tensors",
                vt::sub_graph::TENSORS,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("inputs", vt::sub_graph::INPUTS, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>(
                "outputs",
                vt::sub_graph::OUTPUTS,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Operator>>>>(
                "operators",
                vt::sub_graph::OPERATORS,
                false,
            )?
            .visit_field::<ForwardsUOffset<&str>>("name", vt::sub_graph::NAME, false)?
            .finish();
        Ok(())
    }
}

// ============================================================================
// Tensor
// ============================================================================

impl<'a> Tensor<'a> {
    pub fn shape(&self) -> Option<Vector<'a, i32>> {
        self.field::<ForwardsUOffset<Vector<'a, i32>>>(vt::tensor::SHAPE)
    }

    pub fn type_(&self) -> i8 {
        self.scalar::<i8>(vt::tensor::TYPE, tensor_type::FLOAT32)
    }

    pub fn buffer(&self) -> u32 {
        self.scalar::<u32>(vt::tensor::BUFFER, 0)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.field::<ForwardsUOffset<&'a str>>(vt::tensor::NAME)
    }

    pub fn quantization(&self) -> Option<QuantizationParameters<'a>> {
        self.field::<ForwardsUOffset<QuantizationParameters<'a>>>(vt::tensor::QUANTIZATION)
    }
}

impl Verifiable for Tensor<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("shape", vt::tensor::SHAPE, false)?
            .visit_field::<i8>("type_", vt::tensor::TYPE, false)?
            .visit_field::<u32>("buffer", vt::tensor::BUFFER, false)?
            .visit_field::<ForwardsUOffset<&str>>("name", vt::tensor::NAME, false)?
            .visit_field::<ForwardsUOffset<QuantizationParameters>>(
                "quantization",
                vt::tensor::QUANTIZATION,
                false,
            )?
            .finish();
        Ok(())
    }
}

// ============================================================================
// QuantizationParameters
// ============================================================================

impl<'a> QuantizationParameters<'a> {
    pub fn min(&self) -> Option<Vector<'a, f32>> {
        self.field::<ForwardsUOffset<Vector<'a, f32>>>(vt::quantization::MIN)
    }

    pub fn max(&self) -> Option<Vector<'a, f32>> {
        self.field::<ForwardsUOffset<Vector<'a, f32>>>(vt::quantization::MAX)
    }

    pub fn scale(&self) -> Option<Vector<'a, f32>> {
        self.field::<ForwardsUOffset<Vector<'a, f32>>>(vt::quantization::SCALE)
    }

    pub fn zero_point(&self) -> Option<Vector<'a, i64>> {
        self.field::<ForwardsUOffset<Vector<'a, i64>>>(vt::quantization::ZERO_POINT)
    }

    pub fn quantized_dimension(&self) -> i32 {
        self.scalar::<i32>(vt::quantization::QUANTIZED_DIMENSION, 0)
    }
}

impl Verifiable for QuantizationParameters<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, f32>>>("min", vt::quantization::MIN, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, f32>>>("max", vt::quantization::MAX, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, f32>>>(
                "scale",
                vt::quantization::SCALE,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, i64>>>(
                "zero_point",
                vt::quantization::ZERO_POINT,
                false,
            )?
            .visit_field::<i32>(
                "quantized_dimension",
                vt::quantization::QUANTIZED_DIMENSION,
                false,
            )?
            .finish();
        Ok(())
    }
}

// ============================================================================
// Buffer
// ============================================================================

impl<'a> Buffer<'a> {
    pub fn data(&self) -> Option<Vector<'a, u8>> {
        self.field::<ForwardsUOffset<Vector<'a, u8>>>(vt::buffer::DATA)
    }
}

impl Verifiable for Buffer<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, u8>>>("data", vt::buffer::DATA, false)?
            .finish();
        Ok(())
    }
}

// ============================================================================
// OperatorCode
// ============================================================================

impl<'a> OperatorCode<'a> {
    pub fn deprecated_builtin_code(&self) -> i8 {
        self.scalar::<i8>(vt::operator_code::DEPRECATED_BUILTIN_CODE, 0)
    }

    pub fn custom_code(&self) -> Option<&'a str> {
        self.field::<ForwardsUOffset<&'a str>>(vt::operator_code::CUSTOM_CODE)
    }

    pub fn version(&self) -> i32 {
        self.scalar::<i32>(vt::operator_code::VERSION, 1)
    }

    /// The opcode, honouring the pre-2.4 `deprecated_builtin_code` slot.
    pub fn builtin_code(&self) -> i32 {
        let code = self.scalar::<i32>(vt::operator_code::BUILTIN_CODE, 0);
        code.max(self.deprecated_builtin_code() as i32)
    }
}

impl Verifiable for OperatorCode<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i8>(
                "deprecated_builtin_code",
                vt::operator_code::DEPRECATED_BUILTIN_CODE,
                false,
            )?
            .visit_field::<ForwardsUOffset<&str>>(
                "custom_code",
                vt::operator_code::CUSTOM_CODE,
                false,
            )?
            .visit_field::<i32>("version", vt::operator_code::VERSION, false)?
            .visit_field::<i32>("builtin_code", vt::operator_code::BUILTIN_CODE, false)?
            .finish();
        Ok(())
    }
}

// ============================================================================
// Operator
// ============================================================================

impl<'a> Operator<'a> {
    pub fn opcode_index(&self) -> u32 {
        self.scalar::<u32>(vt::operator::OPCODE_INDEX, 0)
    }

    pub fn inputs(&self) -> Option<Vector<'a, i32>> {
        self.field::<ForwardsUOffset<Vector<'a, i32>>>(vt::operator::INPUTS)
    }

    pub fn outputs(&self) -> Option<Vector<'a, i32>> {
        self.field::<ForwardsUOffset<Vector<'a, i32>>>(vt::operator::OUTPUTS)
    }

    pub fn builtin_options_type(&self) -> BuiltinOptions {
        self.scalar::<BuiltinOptions>(vt::operator::BUILTIN_OPTIONS_TYPE, BuiltinOptions::NONE)
    }

    pub fn builtin_options(&self) -> Option<Table<'a>> {
        self.field::<ForwardsUOffset<Table<'a>>>(vt::operator::BUILTIN_OPTIONS)
    }

    pub fn builtin_options_as_conv_2d_options(&self) -> Option<Conv2DOptions<'a>> {
        if self.builtin_options_type() != BuiltinOptions::Conv2DOptions {
            return None;
        }
        self.builtin_options()
            // Safety: the union type tag says this table is a Conv2DOptions
            .map(|t| unsafe { Conv2DOptions::init_from_table(t) })
    }

    pub fn builtin_options_as_depthwise_conv_2d_options(
        &self,
    ) -> Option<DepthwiseConv2DOptions<'a>> {
        if self.builtin_options_type() != BuiltinOptions::DepthwiseConv2DOptions {
            return None;
        }
        self.builtin_options()
            // Safety: the union type tag says this table is a DepthwiseConv2DOptions
            .map(|t| unsafe { DepthwiseConv2DOptions::init_from_table(t) })
    }
}

impl Verifiable for Operator<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<u32>("opcode_index", vt::operator::OPCODE_INDEX, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("inputs", vt::operator::INPUTS, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>(
                "outputs",
                vt::operator::OUTPUTS,
                false,
            )?
            .visit_union::<BuiltinOptions, _>(
                "builtin_options_type",
                vt::operator::BUILTIN_OPTIONS_TYPE,
                "builtin_options",
                vt::operator::BUILTIN_OPTIONS,
                false,
                |key, v, pos| match key {
                    BuiltinOptions::Conv2DOptions => v
                        .verify_union_variant::<ForwardsUOffset<Conv2DOptions>>(
                            "BuiltinOptions::Conv2DOptions",
                            pos,
                        ),
                    BuiltinOptions::DepthwiseConv2DOptions => v
                        .verify_union_variant::<ForwardsUOffset<DepthwiseConv2DOptions>>(
                            "BuiltinOptions::DepthwiseConv2DOptions",
                            pos,
                        ),
                    // Options of operators this crate does not lower are never read.
                    _ => Ok(()),
                },
            )?
            .finish();
        Ok(())
    }
}

// ============================================================================
// Conv2DOptions / DepthwiseConv2DOptions
// ============================================================================

impl<'a> Conv2DOptions<'a> {
    pub fn padding(&self) -> i8 {
        self.scalar::<i8>(vt::conv_2d_options::PADDING, padding::SAME)
    }

    pub fn stride_w(&self) -> i32 {
        self.scalar::<i32>(vt::conv_2d_options::STRIDE_W, 0)
    }

    pub fn stride_h(&self) -> i32 {
        self.scalar::<i32>(vt::conv_2d_options::STRIDE_H, 0)
    }

    pub fn fused_activation_function(&self) -> i8 {
        self.scalar::<i8>(vt::conv_2d_options::FUSED_ACTIVATION_FUNCTION, activation::NONE)
    }

    pub fn dilation_w_factor(&self) -> i32 {
        self.scalar::<i32>(vt::conv_2d_options::DILATION_W_FACTOR, 1)
    }

    pub fn dilation_h_factor(&self) -> i32 {
        self.scalar::<i32>(vt::conv_2d_options::DILATION_H_FACTOR, 1)
    }
}

impl Verifiable for Conv2DOptions<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        use vt::conv_2d_options as f;
        v.visit_table(pos)?
            .visit_field::<i8>("padding", f::PADDING, false)?
            .visit_field::<i32>("stride_w", f::STRIDE_W, false)?
            .visit_field::<i32>("stride_h", f::STRIDE_H, false)?
            .visit_field::<i8>("fused_activation_function", f::FUSED_ACTIVATION_FUNCTION, false)?
            .visit_field::<i32>("dilation_w_factor", f::DILATION_W_FACTOR, false)?
            .visit_field::<i32>("dilation_h_factor", f::DILATION_H_FACTOR, false)?
            .finish();
        Ok(())
    }
}

impl<'a> DepthwiseConv2DOptions<'a> {
    pub fn padding(&self) -> i8 {
        self.scalar::<i8>(vt::depthwise_conv_2d_options::PADDING, padding::SAME)
    }

    pub fn stride_w(&self) -> i32 {
        self.scalar::<i32>(vt::depthwise_conv_2d_options::STRIDE_W, 0)
    }

    pub fn stride_h(&self) -> i32 {
        self.scalar::<i32>(vt::depthwise_conv_2d_options::STRIDE_H, 0)
    }

    pub fn depth_multiplier(&self) -> i32 {
        self.scalar::<i32>(vt::depthwise_conv_2d_options::DEPTH_MULTIPLIER, 0)
    }

    pub fn fused_activation_function(&self) -> i8 {
        self.scalar::<i8>(
            vt::depthwise_conv_2d_options::FUSED_ACTIVATION_FUNCTION,
            activation::NONE,
        )
    }

    pub fn dilation_w_factor(&self) -> i32 {
        self.scalar::<i32>(vt::depthwise_conv_2d_options::DILATION_W_FACTOR, 1)
    }

    pub fn dilation_h_factor(&self) -> i32 {
        self.scalar::<i32>(vt::depthwise_conv_2d_options::DILATION_H_FACTOR, 1)
    }
}

impl Verifiable for DepthwiseConv2DOptions<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        use vt::depthwise_conv_2d_options as f;
        v.visit_table(pos)?
            .visit_field::<i8>("padding", f::PADDING, false)?
            .visit_field::<i32>("stride_w", f::STRIDE_W, false)?
            .visit_field::<i32>("stride_h", f::STRIDE_H, false)?
            .visit_field::<i32>("depth_multiplier", f::DEPTH_MULTIPLIER, false)?
            .visit_field::<i8>("fused_activation_function", f::FUSED_ACTIVATION_FUNCTION, false)?
            .visit_field::<i32>("dilation_w_factor", f::DILATION_W_FACTOR, false)?
            .visit_field::<i32>("dilation_h_factor", f::DILATION_H_FACTOR, false)?
            .finish();
        Ok(())
    }
}

/// Verify `buf` and return the root `Model` table.
pub fn root_as_model(buf: &[u8]) -> Result<Model<'_>, flatbuffers::InvalidFlatbuffer> {
    flatbuffers::root::<Model>(buf)
}
