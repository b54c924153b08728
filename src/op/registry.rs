//! Source opcode table
//!
//! Maps a TFLite builtin opcode to its ONNX op type, the fixed operand counts
//! and the parser that builds the operator variant.

use smallvec::SmallVec;

use crate::error::{ConvertError, ConvertResult};
use crate::graph::Graph;
use crate::tensor::TensorId;
use crate::tflite::schema::{self, builtin_op};

use super::{conv, unary, OpKind, Operator};

/// Parser for one opcode
pub type ParseFn = fn(ParseArgs<'_>, &mut Graph<'_>) -> ConvertResult<Operator>;

/// A source operator with its tensors already bound
pub struct ParseArgs<'s> {
    /// Registry row of the opcode
    pub entry: &'static OpEntry,
    /// Source record, for the builtin options
    pub source: schema::Operator<'s>,
    /// Index in the source subgraph
    pub index: usize,
    /// Bound inputs; optional (`-1`) slots are skipped
    pub inputs: SmallVec<[TensorId; 4]>,
    /// Bound outputs
    pub outputs: SmallVec<[TensorId; 1]>,
}

impl ParseArgs<'_> {
    /// `UnsupportedOperatorConfiguration` for this operator
    pub fn config_error(&self, reason: impl Into<String>) -> ConvertError {
        ConvertError::UnsupportedOperatorConfiguration {
            opcode: self.entry.name,
            index: self.index,
            reason: reason.into(),
        }
    }

    /// Operator of `kind` carrying the bound tensors
    pub fn into_operator(self, kind: OpKind) -> Operator {
        let mut op = Operator::new(kind, Some(self.index));
        op.inputs = self.inputs;
        op.outputs = self.outputs;
        op
    }
}

/// One registry row
pub struct OpEntry {
    /// TFLite builtin opcode
    pub opcode: i32,
    /// TFLite opcode name, for diagnostics
    pub name: &'static str,
    /// ONNX op type the opcode lowers to
    pub op_type: &'static str,
    /// Required input count
    pub inputs: usize,
    /// Required output count
    pub outputs: usize,
    /// Variant constructor
    pub parse: ParseFn,
}

impl std::fmt::Debug for OpEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpEntry")
            .field("opcode", &self.opcode)
            .field("name", &self.name)
            .field("op_type", &self.op_type)
            .finish()
    }
}

macro_rules! unary_entry {
    ($code:ident, $op_type:literal) => {
        OpEntry {
            opcode: builtin_op::$code,
            name: stringify!($code),
            op_type: $op_type,
            inputs: 1,
            outputs: 1,
            parse: unary::parse,
        }
    };
}

/// All supported opcodes
pub static REGISTRY: &[OpEntry] = &[
    OpEntry {
        opcode: builtin_op::CONV_2D,
        name: "CONV_2D",
        op_type: "Conv",
        inputs: 3,
        outputs: 1,
        parse: conv::parse_conv_2d,
    },
    OpEntry {
        opcode: builtin_op::DEPTHWISE_CONV_2D,
        name: "DEPTHWISE_CONV_2D",
        op_type: "Conv",
        inputs: 3,
        outputs: 1,
        parse: conv::parse_depthwise_conv_2d,
    },
    unary_entry!(ABS, "Abs"),
    unary_entry!(CEIL, "Ceil"),
    unary_entry!(COS, "Cos"),
    unary_entry!(EXP, "Exp"),
    unary_entry!(FLOOR, "Floor"),
    unary_entry!(LOG, "Log"),
    unary_entry!(LOGISTIC, "Sigmoid"),
    unary_entry!(NEG, "Neg"),
    unary_entry!(RELU, "Relu"),
    unary_entry!(SIN, "Sin"),
    unary_entry!(SQRT, "Sqrt"),
    unary_entry!(TANH, "Tanh"),
];

/// Find the registry row for `opcode`
pub fn lookup(opcode: i32, index: usize) -> ConvertResult<&'static OpEntry> {
    REGISTRY
        .iter()
        .find(|e| e.opcode == opcode)
        .ok_or(ConvertError::UnsupportedOperator { opcode, index })
}

/// Fail unless the source record has the operand counts of `entry`
pub fn check_arity(
    entry: &OpEntry,
    index: usize,
    inputs: usize,
    outputs: usize,
) -> ConvertResult<()> {
    if inputs != entry.inputs || outputs != entry.outputs {
        return Err(ConvertError::OperatorArityMismatch {
            opcode: entry.name,
            index,
            expected_inputs: entry.inputs,
            expected_outputs: entry.outputs,
            inputs,
            outputs,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known() {
        let entry = lookup(builtin_op::CONV_2D, 0).unwrap();
        assert_eq!(entry.op_type, "Conv");
        assert_eq!(entry.inputs, 3);
        assert_eq!(lookup(builtin_op::LOGISTIC, 0).unwrap().op_type, "Sigmoid");
    }

    #[test]
    fn test_lookup_unknown() {
        let err = lookup(9999, 7).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnsupportedOperator {
                opcode: 9999,
                index: 7
            }
        ));
    }

    #[test]
    fn test_registry_unique_opcodes() {
        let mut codes: Vec<i32> = REGISTRY.iter().map(|e| e.opcode).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), REGISTRY.len());
    }

    #[test]
    fn test_check_arity() {
        let entry = lookup(builtin_op::ABS, 0).unwrap();
        assert!(check_arity(entry, 0, 1, 1).is_ok());
        let err = check_arity(entry, 3, 2, 1).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::OperatorArityMismatch {
                opcode: "ABS",
                index: 3,
                inputs: 2,
                ..
            }
        ));
    }
}
