//! Transpose insertion
//!
//! Layout-sensitive operators ask for a tensor in the layout they need. The
//! graph answers with the tensor itself when no permutation is needed, with a
//! previously created twin, or with a new twin fed by a synthesized
//! `Transpose`.
//!
//! Twins are memoized per `(tensor, layout)`. Under
//! [`LayoutApproach::Propagation`] the reverse direction is recorded as well,
//! which lets a consumer pick up the channel-first tensor a producer wrote
//! before it was transposed back.

use log::debug;

use crate::error::{ConvertError, ConvertResult};
use crate::layout::{is_identity, permutation, permute_shape, Layout, LayoutApproach};
use crate::op::transpose;
use crate::tensor::{Tensor, TensorId};

use super::Graph;

impl<'a> Graph<'a> {
    /// Feed input `slot` of `consumer` with the `to` view of the tensor it
    /// currently reads, which is in `from`. Returns the tensor now read.
    pub fn transpose_input(
        &mut self,
        consumer: usize,
        slot: usize,
        from: Layout,
        to: Layout,
    ) -> ConvertResult<TensorId> {
        let source = self.op(consumer).inputs[slot];
        let perm = self.perm_for(source, from, to)?;
        if is_identity(&perm) {
            return Ok(source);
        }

        let twin = match self.find_twin(source, to) {
            Some(twin) => twin,
            None => {
                let twin = self.add_twin(source, &perm, to);
                self.add_op(transpose::new(perm, source, twin));
                self.remember(source, from, twin, to);
                debug!(
                    "Transposed {} {} -> {}",
                    self.tensor_ref(source).name,
                    from,
                    to
                );
                twin
            }
        };
        self.op_mut(consumer).inputs[slot] = twin;
        Ok(twin)
    }

    /// Make output `slot` of `producer` write a fresh tensor in `internal`
    /// layout and transpose it into the original tensor, which stays in
    /// `external`. Returns the tensor the producer now writes.
    pub fn transpose_output(
        &mut self,
        producer: usize,
        slot: usize,
        internal: Layout,
        external: Layout,
    ) -> ConvertResult<TensorId> {
        let original = self.op(producer).outputs[slot];
        let perm = self.perm_for(original, internal, external)?;
        if is_identity(&perm) {
            return Ok(original);
        }
        let back = self.perm_for(original, external, internal)?;

        let twin = self.add_twin(original, &back, internal);
        self.add_op(transpose::new(perm, twin, original));
        self.remember(twin, internal, original, external);
        self.written_twins.insert(twin);
        self.op_mut(producer).outputs[slot] = twin;
        debug!(
            "Transposed {} {} -> {}",
            self.tensor_ref(original).name,
            internal,
            external
        );
        Ok(twin)
    }

    /// The `layout` view of `id`, if one exists
    pub fn find_twin(&self, id: TensorId, layout: Layout) -> Option<TensorId> {
        self.twins.get(&(id, layout)).copied()
    }

    /// The `layout` view of `id` that an operator writes directly, as opposed
    /// to one a synthesized `Transpose` derives
    pub fn find_written_twin(&self, id: TensorId, layout: Layout) -> Option<TensorId> {
        self.find_twin(id, layout)
            .filter(|twin| self.written_twins.contains(twin))
    }

    /// Record a transpose from `input` (in `from`) to `output` (in `to`)
    fn remember(&mut self, input: TensorId, from: Layout, output: TensorId, to: Layout) {
        self.twins.insert((input, to), output);
        if self.approach == LayoutApproach::Propagation {
            self.twins.insert((output, from), input);
        }
    }

    fn perm_for(&self, id: TensorId, from: Layout, to: Layout) -> ConvertResult<Vec<i64>> {
        let tensor = self.tensor_ref(id);
        let unresolved = |reason: String| ConvertError::UnresolvedLayout {
            tensor: id.0,
            name: tensor.name.clone(),
            reason,
        };
        let perm = permutation(from, to)
            .ok_or_else(|| unresolved(format!("no permutation from {} to {}", from, to)))?;
        if tensor.shape.len() != perm.len() {
            return Err(unresolved(format!(
                "rank {} tensor cannot be transposed from {} to {}",
                tensor.shape.len(),
                from,
                to
            )));
        }
        Ok(perm)
    }

    /// Copy of `source` permuted by `perm`, tagged `layout`
    fn add_twin(&mut self, source: TensorId, perm: &[i64], layout: Layout) -> TensorId {
        let src = self.tensor_ref(source);
        let name = format!("{}_{}", src.name, layout.to_string().to_lowercase());
        let mut twin = Tensor::new(name, permute_shape(&src.shape, perm), src.dtype);
        twin.quant = src.quant.clone().map(|mut q| {
            if let Some(axis) = perm.iter().position(|&p| p == q.axis as i64) {
                q.axis = axis as i32;
            }
            q
        });
        twin.layout = Some(layout);
        self.add_tensor(twin)
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::tests::{conv_model, parsed_graph};
    use crate::layout::{Layout, LayoutApproach};
    use crate::op::OpKind;
    use crate::tflite::schema::root_as_model;

    #[test]
    fn test_identity_creates_nothing() {
        let bytes = conv_model();
        let model = root_as_model(&bytes).unwrap();
        let mut graph = parsed_graph(model, LayoutApproach::Propagation);
        let ops = graph.op_count();
        let tensors = graph.tensor_count();

        let x = graph.op(0).inputs[0];
        let same = graph.transpose_input(0, 0, Layout::Nhwc, Layout::Nhwc).unwrap();
        assert_eq!(same, x);
        assert_eq!(graph.op_count(), ops);
        assert_eq!(graph.tensor_count(), tensors);
    }

    #[test]
    fn test_memoized_by_tensor_and_target() {
        let bytes = conv_model();
        let model = root_as_model(&bytes).unwrap();
        let mut graph = parsed_graph(model, LayoutApproach::Transpose);
        let ops = graph.op_count();

        let first = graph.transpose_input(0, 0, Layout::Nhwc, Layout::Nchw).unwrap();
        assert_eq!(graph.op_count(), ops + 1);
        // Point the slot back at the original tensor and ask again
        let x = graph.op(ops).inputs[0];
        graph.op_mut(0).inputs[0] = x;
        let second = graph.transpose_input(0, 0, Layout::Nhwc, Layout::Nchw).unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.op_count(), ops + 1);

        let t = graph.tensor_ref(first);
        assert_eq!(t.shape, vec![1, 3, 8, 8]);
        assert_eq!(t.layout, Some(Layout::Nchw));
        assert!(matches!(&graph.op(ops).kind, OpKind::Transpose { perm } if perm == &vec![0, 3, 1, 2]));
    }

    #[test]
    fn test_output_twin_registered_only_for_propagation() {
        let bytes = conv_model();
        let model = root_as_model(&bytes).unwrap();

        let mut graph = parsed_graph(model, LayoutApproach::Propagation);
        let y = graph.op(0).outputs[0];
        let twin = graph.transpose_output(0, 0, Layout::Nchw, Layout::Nhwc).unwrap();
        assert_eq!(graph.op(0).outputs[0], twin);
        assert_eq!(graph.find_twin(y, Layout::Nchw), Some(twin));
        assert_eq!(graph.tensor_ref(twin).shape, vec![1, 4, 8, 8]);

        let mut graph = parsed_graph(model, LayoutApproach::Transpose);
        let y = graph.op(0).outputs[0];
        graph.transpose_output(0, 0, Layout::Nchw, Layout::Nhwc).unwrap();
        assert_eq!(graph.find_twin(y, Layout::Nchw), None);
    }

    #[test]
    fn test_written_twin_excludes_input_transposes() {
        let bytes = conv_model();
        let model = root_as_model(&bytes).unwrap();
        let mut graph = parsed_graph(model, LayoutApproach::Propagation);
        let x = graph.op(0).inputs[0];
        let y = graph.op(0).outputs[0];

        let x_nchw = graph.transpose_input(0, 0, Layout::Nhwc, Layout::Nchw).unwrap();
        let y_nchw = graph.transpose_output(0, 0, Layout::Nchw, Layout::Nhwc).unwrap();
        assert_eq!(graph.find_twin(x, Layout::Nchw), Some(x_nchw));
        assert_eq!(graph.find_written_twin(x, Layout::Nchw), None);
        assert_eq!(graph.find_written_twin(y, Layout::Nchw), Some(y_nchw));
    }

    #[test]
    fn test_rank_mismatch_is_unresolved() {
        let bytes = conv_model();
        let model = root_as_model(&bytes).unwrap();
        let mut graph = parsed_graph(model, LayoutApproach::Propagation);
        // bias is 1-D
        let err = graph
            .transpose_input(0, 2, Layout::Nhwc, Layout::Nchw)
            .unwrap_err();
        assert!(matches!(err, crate::error::ConvertError::UnresolvedLayout { .. }));
    }
}
