//! Tensor dimension orderings
//!
//! TFLite stores activations channel-last (`NHWC`) and convolution weights as
//! `OHWI` (or `IHWO` for depthwise). ONNX expects `NCHW` and `OIHW`. A
//! permutation between two layouts is derived from their axis letters.

use std::fmt;

/// Dimension ordering of a 4-D tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Batch, height, width, channel
    Nhwc,
    /// Batch, channel, height, width
    Nchw,
    /// Output channel, height, width, input channel
    Ohwi,
    /// Output channel, input channel, height, width
    Oihw,
    /// Input channel (multiplier), height, width, output channel
    Ihwo,
    /// Layout-insensitive tensor (biases, scalars, quantization parameters)
    None,
}

impl Layout {
    /// Axis letters, or `None` for a layout-insensitive tensor
    pub fn axes(self) -> Option<&'static str> {
        match self {
            Layout::Nhwc => Some("NHWC"),
            Layout::Nchw => Some("NCHW"),
            Layout::Ohwi => Some("OHWI"),
            Layout::Oihw => Some("OIHW"),
            Layout::Ihwo => Some("IHWO"),
            Layout::None => None,
        }
    }

    /// Channel-first counterpart used by ONNX
    pub fn channel_first(self) -> Layout {
        match self {
            Layout::Nhwc | Layout::Nchw => Layout::Nchw,
            Layout::Ohwi | Layout::Oihw | Layout::Ihwo => Layout::Oihw,
            Layout::None => Layout::None,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.axes().unwrap_or("-"))
    }
}

/// How layout mismatches are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutApproach {
    /// Keep channel-first data flowing between layout-sensitive operators and
    /// only transpose at the graph boundary
    #[default]
    Propagation,
    /// Wrap every layout-sensitive operator in its own transposes
    Transpose,
}

impl fmt::Display for LayoutApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutApproach::Propagation => f.write_str("propagation"),
            LayoutApproach::Transpose => f.write_str("transpose"),
        }
    }
}

/// Permutation taking a tensor in `from` to `to`: `out[i] = in[perm[i]]`.
///
/// Returns `None` when either side has no axes or the axis sets differ.
pub fn permutation(from: Layout, to: Layout) -> Option<Vec<i64>> {
    let src = from.axes()?;
    let dst = to.axes()?;
    dst.chars()
        .map(|c| src.find(c).map(|i| i as i64))
        .collect()
}

/// True when `perm` leaves every axis in place
pub fn is_identity(perm: &[i64]) -> bool {
    perm.iter().enumerate().all(|(i, &p)| p == i as i64)
}

/// Apply a permutation to a shape
pub fn permute_shape(shape: &[i64], perm: &[i64]) -> Vec<i64> {
    perm.iter()
        .map(|&p| shape.get(p as usize).copied().unwrap_or(1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_permutations() {
        assert_eq!(
            permutation(Layout::Nhwc, Layout::Nchw),
            Some(vec![0, 3, 1, 2])
        );
        assert_eq!(
            permutation(Layout::Nchw, Layout::Nhwc),
            Some(vec![0, 2, 3, 1])
        );
    }

    #[test]
    fn test_weight_permutations() {
        assert_eq!(
            permutation(Layout::Ohwi, Layout::Oihw),
            Some(vec![0, 3, 1, 2])
        );
        assert_eq!(
            permutation(Layout::Ihwo, Layout::Oihw),
            Some(vec![3, 0, 1, 2])
        );
    }

    #[test]
    fn test_mismatched_axes() {
        assert_eq!(permutation(Layout::Nhwc, Layout::Oihw), None);
        assert_eq!(permutation(Layout::None, Layout::Nchw), None);
    }

    #[test]
    fn test_identity() {
        let perm = permutation(Layout::Nchw, Layout::Nchw).unwrap();
        assert!(is_identity(&perm));
        assert!(!is_identity(&[0, 3, 1, 2]));
    }

    #[test]
    fn test_shape_round_trip() {
        let shape = vec![1, 224, 224, 3];
        let to = permutation(Layout::Nhwc, Layout::Nchw).unwrap();
        let back = permutation(Layout::Nchw, Layout::Nhwc).unwrap();
        let nchw = permute_shape(&shape, &to);
        assert_eq!(nchw, vec![1, 3, 224, 224]);
        assert_eq!(permute_shape(&nchw, &back), shape);
    }

    #[test]
    fn test_depthwise_weight_shape() {
        // [1, kh, kw, C * M] -> [C * M, 1, kh, kw]
        let perm = permutation(Layout::Ihwo, Layout::Oihw).unwrap();
        assert_eq!(permute_shape(&[1, 3, 3, 8], &perm), vec![8, 1, 3, 3]);
    }

    #[test]
    fn test_channel_first() {
        assert_eq!(Layout::Nhwc.channel_first(), Layout::Nchw);
        assert_eq!(Layout::Ihwo.channel_first(), Layout::Oihw);
        assert_eq!(Layout::Nhwc.to_string(), "NHWC");
    }
}
