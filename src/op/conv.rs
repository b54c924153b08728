//! Convolution lowering
//!
//! `CONV_2D` and `DEPTHWISE_CONV_2D` both lower to ONNX `Conv`. The source
//! operator works on `NHWC` activations and `OHWI`/`IHWO` weights; the ONNX
//! node needs `NCHW` and `OIHW`, so the build-graph phase asks the graph for a
//! transpose at every layout-sensitive edge.

use crate::error::ConvertResult;
use crate::graph::Graph;
use crate::layout::Layout;
use crate::proto::{AttributeProto, NodeProto};
use crate::tflite::schema::padding;

use super::{activation, ActivationKind, OpKind, Operator, ParseArgs};

/// Padding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Output spatial size is `ceil(in / stride)`; extra padding goes at the end
    Same,
    /// No padding
    Valid,
}

impl Padding {
    /// Decode the TFLite `Padding` enum
    pub fn from_tflite(value: i8) -> Option<Padding> {
        match value {
            padding::SAME => Some(Padding::Same),
            padding::VALID => Some(Padding::Valid),
            _ => None,
        }
    }

    /// Explicit `[h_begin, w_begin, h_end, w_end]` pads, when not using `auto_pad`
    pub fn pads(self) -> Option<[i64; 4]> {
        match self {
            Padding::Same => None,
            Padding::Valid => Some([0; 4]),
        }
    }
}

/// Parameters shared by 2D and depthwise convolution
#[derive(Debug, Clone, PartialEq)]
pub struct ConvParams {
    /// Depthwise variant (`IHWO` weights, one group per input channel)
    pub depthwise: bool,
    /// `[kh, kw]`
    pub kernel_shape: [i64; 2],
    /// `[sh, sw]`
    pub strides: [i64; 2],
    /// `[dh, dw]`
    pub dilations: [i64; 2],
    /// ONNX `group`
    pub group: i64,
    /// Padding scheme
    pub padding: Padding,
    /// Fused activation applied to the output
    pub activation: Option<ActivationKind>,
}

impl ConvParams {
    /// Source layout of the weight tensor
    pub fn weight_layout(&self) -> Layout {
        if self.depthwise {
            Layout::Ihwo
        } else {
            Layout::Ohwi
        }
    }

    /// TFLite opcode name
    pub fn opcode_name(&self) -> &'static str {
        if self.depthwise {
            "DEPTHWISE_CONV_2D"
        } else {
            "CONV_2D"
        }
    }
}

/// Options common to both source option tables
struct RawOptions {
    padding: i8,
    stride: [i32; 2],
    dilation: [i32; 2],
    fused_activation: i8,
    depth_multiplier: Option<i32>,
}

/// Parse `CONV_2D`
pub fn parse_conv_2d(args: ParseArgs<'_>, graph: &mut Graph<'_>) -> ConvertResult<Operator> {
    let opts = args
        .source
        .builtin_options_as_conv_2d_options()
        .ok_or_else(|| args.config_error("missing Conv2DOptions"))?;
    let raw = RawOptions {
        padding: opts.padding(),
        stride: [opts.stride_h(), opts.stride_w()],
        dilation: [opts.dilation_h_factor(), opts.dilation_w_factor()],
        fused_activation: opts.fused_activation_function(),
        depth_multiplier: None,
    };
    parse(args, graph, raw)
}

/// Parse `DEPTHWISE_CONV_2D`
pub fn parse_depthwise_conv_2d(
    args: ParseArgs<'_>,
    graph: &mut Graph<'_>,
) -> ConvertResult<Operator> {
    let opts = args
        .source
        .builtin_options_as_depthwise_conv_2d_options()
        .ok_or_else(|| args.config_error("missing DepthwiseConv2DOptions"))?;
    let raw = RawOptions {
        padding: opts.padding(),
        stride: [opts.stride_h(), opts.stride_w()],
        dilation: [opts.dilation_h_factor(), opts.dilation_w_factor()],
        fused_activation: opts.fused_activation_function(),
        depth_multiplier: Some(opts.depth_multiplier()),
    };
    parse(args, graph, raw)
}

fn parse(args: ParseArgs<'_>, graph: &mut Graph<'_>, raw: RawOptions) -> ConvertResult<Operator> {
    if args.inputs.len() < 2 || args.outputs.len() != 1 {
        return Err(args.config_error("input and weight tensors are required"));
    }
    let (input, weight, output) = (args.inputs[0], args.inputs[1], args.outputs[0]);
    let bias = args.inputs.get(2).copied();

    for (role, id) in [("input", input), ("weight", weight), ("output", output)] {
        let rank = graph.tensor_ref(id).shape.len();
        if rank != 4 {
            return Err(args.config_error(format!("{} must be 4-D, found rank {}", role, rank)));
        }
    }

    let padding = Padding::from_tflite(raw.padding)
        .ok_or_else(|| args.config_error(format!("unknown padding {}", raw.padding)))?;
    if raw.stride.iter().any(|&s| s <= 0) {
        return Err(args.config_error(format!("invalid strides {:?}", raw.stride)));
    }
    if raw.dilation.iter().any(|&d| d <= 0) {
        return Err(args.config_error(format!("invalid dilations {:?}", raw.dilation)));
    }
    let activation = ActivationKind::from_fused(raw.fused_activation)
        .map_err(|reason| args.config_error(reason))?;

    let w_shape = &graph.tensor_ref(weight).shape;
    let kernel_shape = [w_shape[1], w_shape[2]];
    let out_channels = w_shape[3];

    let depthwise = raw.depth_multiplier.is_some();
    let group = match raw.depth_multiplier {
        None => 1,
        Some(multiplier) => {
            let channels = graph.tensor_ref(input).shape[3];
            if multiplier > 0 && channels * multiplier as i64 != out_channels {
                return Err(args.config_error(format!(
                    "depth multiplier {} does not match {} input and {} output channels",
                    multiplier, channels, out_channels
                )));
            }
            channels
        }
    };

    let params = ConvParams {
        depthwise,
        kernel_shape,
        strides: [raw.stride[0] as i64, raw.stride[1] as i64],
        dilations: [raw.dilation[0] as i64, raw.dilation[1] as i64],
        group,
        padding,
        activation,
    };

    graph.tag(input, Layout::Nhwc)?;
    graph.tag(output, Layout::Nhwc)?;
    graph.tag(weight, params.weight_layout())?;
    if let Some(bias) = bias {
        graph.tag(bias, Layout::None)?;
    }

    let mut op = args.into_operator(OpKind::Conv(params));
    op.weights.push(weight);
    op.weights.extend(bias);
    Ok(op)
}

/// Transpose input, weight and output; materialize the fused activation
pub fn build_graph(graph: &mut Graph<'_>, index: usize) -> ConvertResult<()> {
    let OpKind::Conv(params) = graph.op(index).kind.clone() else {
        return Ok(());
    };

    graph.transpose_input(index, 0, Layout::Nhwc, Layout::Nchw)?;
    graph.transpose_input(index, 1, params.weight_layout(), Layout::Oihw)?;
    graph.transpose_output(index, 0, Layout::Nchw, Layout::Nhwc)?;

    if let Some(kind) = params.activation {
        activation::insert_after(graph, index, kind, params.opcode_name())?;
    }
    Ok(())
}

/// Attach the ONNX `Conv` attributes
pub fn attributes(params: &ConvParams, node: NodeProto) -> NodeProto {
    let node = node
        .with_attribute(AttributeProto::new_ints(
            "kernel_shape",
            params.kernel_shape.to_vec(),
        ))
        .with_attribute(AttributeProto::new_ints("strides", params.strides.to_vec()))
        .with_attribute(AttributeProto::new_ints(
            "dilations",
            params.dilations.to_vec(),
        ))
        .with_attribute(AttributeProto::new_int("group", params.group));

    match params.padding.pads() {
        // See ComputePaddingHeightWidth() in TFLite
        None => node.with_attribute(AttributeProto::new_string("auto_pad", "SAME_UPPER")),
        Some(pads) => node.with_attribute(AttributeProto::new_ints("pads", pads.to_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::extensions::make_node;

    fn params(padding: Padding) -> ConvParams {
        ConvParams {
            depthwise: false,
            kernel_shape: [3, 3],
            strides: [1, 1],
            dilations: [1, 1],
            group: 1,
            padding,
            activation: None,
        }
    }

    #[test]
    fn test_padding_from_tflite() {
        assert_eq!(Padding::from_tflite(padding::SAME), Some(Padding::Same));
        assert_eq!(Padding::from_tflite(padding::VALID), Some(Padding::Valid));
        assert_eq!(Padding::from_tflite(7), None);
    }

    #[test]
    fn test_same_attributes() {
        let node = attributes(&params(Padding::Same), make_node("Conv", &[], &[], "c"));
        assert_eq!(node.get_attribute_ints("kernel_shape"), Some(&[3, 3][..]));
        assert_eq!(node.get_attribute_int("group", 0), 1);
        assert_eq!(node.get_attribute_string("auto_pad"), Some("SAME_UPPER"));
        assert!(node.get_attribute("pads").is_none());
    }

    #[test]
    fn test_valid_attributes() {
        let node = attributes(&params(Padding::Valid), make_node("Conv", &[], &[], "c"));
        assert_eq!(node.get_attribute_ints("pads"), Some(&[0, 0, 0, 0][..]));
        assert!(node.get_attribute("auto_pad").is_none());
    }

    #[test]
    fn test_weight_layout() {
        let mut p = params(Padding::Same);
        assert_eq!(p.weight_layout(), Layout::Ohwi);
        p.depthwise = true;
        assert_eq!(p.weight_layout(), Layout::Ihwo);
        assert_eq!(p.opcode_name(), "DEPTHWISE_CONV_2D");
    }
}
