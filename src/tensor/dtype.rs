//! Element type mappings
//!
//! Maps TFLite `TensorType` values onto ONNX `TensorProto.DataType` and
//! encodes scalars in an ONNX element type.

use crate::error::{ConvertError, ConvertResult};
use crate::proto::onnx::tensor_proto::DataType;
use crate::tflite::schema::tensor_type;

/// ONNX element type for a TFLite tensor type
pub fn from_tflite(dtype: i8) -> ConvertResult<DataType> {
    match dtype {
        tensor_type::FLOAT32 => Ok(DataType::Float),
        tensor_type::FLOAT16 => Ok(DataType::Float16),
        tensor_type::INT32 => Ok(DataType::Int32),
        tensor_type::UINT8 => Ok(DataType::Uint8),
        tensor_type::INT64 => Ok(DataType::Int64),
        tensor_type::STRING => Ok(DataType::String),
        tensor_type::BOOL => Ok(DataType::Bool),
        tensor_type::INT16 => Ok(DataType::Int16),
        tensor_type::COMPLEX64 => Ok(DataType::Complex64),
        tensor_type::INT8 => Ok(DataType::Int8),
        tensor_type::FLOAT64 => Ok(DataType::Double),
        other => Err(ConvertError::InvalidDataType(other)),
    }
}

/// Size in bytes of one element, `None` for variable-size types
pub fn dtype_size(dtype: DataType) -> Option<usize> {
    match dtype {
        DataType::Float => Some(4),
        DataType::Uint8 => Some(1),
        DataType::Int8 => Some(1),
        DataType::Uint16 => Some(2),
        DataType::Int16 => Some(2),
        DataType::Int32 => Some(4),
        DataType::Int64 => Some(8),
        DataType::Bool => Some(1),
        DataType::Float16 => Some(2),
        DataType::Double => Some(8),
        DataType::Uint32 => Some(4),
        DataType::Uint64 => Some(8),
        DataType::Complex64 => Some(8),
        DataType::Complex128 => Some(16),
        DataType::Bfloat16 => Some(2),
        DataType::String | DataType::Undefined => None,
    }
}

/// Check if data type is floating point
pub fn is_float_type(dtype: DataType) -> bool {
    matches!(
        dtype,
        DataType::Float | DataType::Double | DataType::Float16 | DataType::Bfloat16
    )
}

/// Representable range of an integer type
pub fn int_range(dtype: DataType) -> Option<(i64, i64)> {
    match dtype {
        DataType::Uint8 => Some((u8::MIN as i64, u8::MAX as i64)),
        DataType::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
        DataType::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
        DataType::Uint16 => Some((u16::MIN as i64, u16::MAX as i64)),
        DataType::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
        DataType::Int64 => Some((i64::MIN, i64::MAX)),
        _ => None,
    }
}

/// Little-endian bytes of one scalar, `None` if the type is not supported.
///
/// Integer values are rounded and saturated to the type's range.
pub fn encode_scalar(dtype: DataType, value: f64) -> Option<Vec<u8>> {
    let int = |v: f64| -> Option<i64> {
        let (lo, hi) = int_range(dtype)?;
        Some((v.round() as i64).clamp(lo, hi))
    };
    match dtype {
        DataType::Float => Some((value as f32).to_le_bytes().to_vec()),
        DataType::Double => Some(value.to_le_bytes().to_vec()),
        DataType::Uint8 => Some(vec![int(value)? as u8]),
        DataType::Int8 => Some(vec![int(value)? as i8 as u8]),
        DataType::Int16 => Some((int(value)? as i16).to_le_bytes().to_vec()),
        DataType::Uint16 => Some((int(value)? as u16).to_le_bytes().to_vec()),
        DataType::Int32 => Some((int(value)? as i32).to_le_bytes().to_vec()),
        DataType::Int64 => Some(int(value)?.to_le_bytes().to_vec()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tflite() {
        assert_eq!(from_tflite(tensor_type::FLOAT32).unwrap(), DataType::Float);
        assert_eq!(from_tflite(tensor_type::UINT8).unwrap(), DataType::Uint8);
        assert_eq!(from_tflite(tensor_type::INT8).unwrap(), DataType::Int8);
        assert_eq!(from_tflite(tensor_type::FLOAT64).unwrap(), DataType::Double);
        assert!(matches!(
            from_tflite(42),
            Err(ConvertError::InvalidDataType(42))
        ));
    }

    #[test]
    fn test_dtype_size() {
        assert_eq!(dtype_size(DataType::Float), Some(4));
        assert_eq!(dtype_size(DataType::Int64), Some(8));
        assert_eq!(dtype_size(DataType::Uint8), Some(1));
        assert_eq!(dtype_size(DataType::String), None);
    }

    #[test]
    fn test_is_float_type() {
        assert!(is_float_type(DataType::Float));
        assert!(is_float_type(DataType::Double));
        assert!(!is_float_type(DataType::Int32));
    }

    #[test]
    fn test_encode_scalar() {
        assert_eq!(
            encode_scalar(DataType::Float, 6.0).unwrap(),
            6.0f32.to_le_bytes().to_vec()
        );
        assert_eq!(encode_scalar(DataType::Uint8, 300.0).unwrap(), vec![255]);
        assert_eq!(encode_scalar(DataType::Int8, -1.0).unwrap(), vec![0xff]);
        assert!(encode_scalar(DataType::Bool, 1.0).is_none());
    }
}
