//! Graph conversion driver
//!
//! A [`Graph`] owns every tensor of the source subgraph (an arena addressed by
//! [`TensorId`]) and the operator list, and runs the four phases in order:
//!
//! | Phase | Effect |
//! |-------|--------|
//! | parse | bind tensors, build operators through the registry |
//! | build-graph | insert transposes and fused activations, prune dead transposes |
//! | propagate | settle every tensor's layout tag |
//! | convert | emit the ONNX `GraphProto` |
//!
//! Operators and tensors are advanced through their [`Status`] here, never by
//! the operators themselves.

pub mod maps;
pub mod transpose;

use indexmap::IndexSet;
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::{ConvertError, ConvertResult};
use crate::layout::{Layout, LayoutApproach};
use crate::op::{self, registry, OpKind, Operator, ParseArgs};
use crate::proto::GraphProto;
use crate::status::Status;
use crate::tensor::{dtype_size, from_tflite, Quantization, Tensor, TensorId};
use crate::tflite::schema;

pub use maps::{build_consumer_map, build_producer_map, topological_order};

/// One subgraph being converted
pub struct Graph<'a> {
    model: schema::Model<'a>,
    subgraph: schema::SubGraph<'a>,
    approach: LayoutApproach,
    tensors: Vec<Tensor>,
    by_source: FxHashMap<i32, TensorId>,
    names: IndexSet<String>,
    ops: Vec<Operator>,
    inputs: Vec<TensorId>,
    outputs: Vec<TensorId>,
    twins: FxHashMap<(TensorId, Layout), TensorId>,
    written_twins: FxHashSet<TensorId>,
    status: Status,
}

impl<'a> Graph<'a> {
    /// Graph over `subgraph` of `model`
    pub fn new(
        model: schema::Model<'a>,
        subgraph: schema::SubGraph<'a>,
        approach: LayoutApproach,
    ) -> Self {
        Self {
            model,
            subgraph,
            approach,
            tensors: Vec::new(),
            by_source: FxHashMap::default(),
            names: IndexSet::new(),
            ops: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            twins: FxHashMap::default(),
            written_twins: FxHashSet::default(),
            status: Status::Initialized,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current pipeline status
    pub fn status(&self) -> Status {
        self.status
    }

    /// Layout approach in effect
    pub fn approach(&self) -> LayoutApproach {
        self.approach
    }

    /// Tensor by handle
    pub fn tensor_ref(&self, id: TensorId) -> &Tensor {
        &self.tensors[id.0]
    }

    /// Number of tensors in the arena, including unreferenced ones
    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }

    /// Operator by position
    pub fn op(&self, index: usize) -> &Operator {
        &self.ops[index]
    }

    /// Mutable operator by position
    pub fn op_mut(&mut self, index: usize) -> &mut Operator {
        &mut self.ops[index]
    }

    /// Number of operators
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Graph inputs
    pub fn inputs(&self) -> &[TensorId] {
        &self.inputs
    }

    /// Graph outputs
    pub fn outputs(&self) -> &[TensorId] {
        &self.outputs
    }

    // ========================================================================
    // Tensor arena
    // ========================================================================

    /// The tensor for source index `index`, created on first use.
    ///
    /// Every referrer of the same index gets the same handle.
    pub fn tensor(&mut self, index: i32) -> ConvertResult<TensorId> {
        if let Some(&id) = self.by_source.get(&index) {
            return Ok(id);
        }

        let source = self
            .subgraph
            .tensors()
            .filter(|ts| index >= 0 && (index as usize) < ts.len())
            .map(|ts| ts.get(index as usize))
            .ok_or_else(|| {
                ConvertError::InvalidSource(format!("tensor index {} out of range", index))
            })?;

        let name = match source.name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                warn!("Tensor {} has no name", index);
                format!("tensor_{}", index)
            }
        };
        let shape: Vec<i64> = source
            .shape()
            .map(|s| s.iter().map(i64::from).collect())
            .unwrap_or_default();
        let dtype = from_tflite(source.type_())?;

        let mut tensor = Tensor::new(name, shape, dtype);
        tensor.source_index = Some(index);
        tensor.quant = source.quantization().and_then(|q| {
            let scale: Vec<f32> = q.scale()?.iter().collect();
            if scale.is_empty() {
                return None;
            }
            let zero_point = q
                .zero_point()
                .map(|z| z.iter().collect())
                .unwrap_or_else(|| vec![0; scale.len()]);
            Some(Quantization {
                scale,
                zero_point,
                axis: q.quantized_dimension(),
            })
        });
        tensor.data = self.buffer_data(source.buffer())?;

        if let (Some(data), Some(size)) = (&tensor.data, dtype_size(dtype)) {
            let expected = tensor.numel().max(0) as usize * size;
            if data.len() != expected {
                warn!(
                    "Tensor '{}' holds {} bytes, shape {:?} needs {}",
                    tensor.name,
                    data.len(),
                    tensor.shape,
                    expected
                );
            }
        }

        debug!(
            "Bound tensor {} '{}' {:?} {:?}",
            index, tensor.name, tensor.shape, dtype
        );
        let id = self.push_tensor(tensor);
        self.by_source.insert(index, id);
        Ok(id)
    }

    fn buffer_data(&self, buffer: u32) -> ConvertResult<Option<Vec<u8>>> {
        if buffer == 0 {
            return Ok(None);
        }
        let buffers = self.model.buffers().ok_or_else(|| {
            ConvertError::InvalidSource("model has no buffer table".to_string())
        })?;
        if buffer as usize >= buffers.len() {
            return Err(ConvertError::InvalidSource(format!(
                "buffer index {} out of range",
                buffer
            )));
        }
        Ok(buffers
            .get(buffer as usize)
            .data()
            .filter(|d| !d.is_empty())
            .map(|d| d.bytes().to_vec()))
    }

    /// Add a synthesized tensor. Its name is made unique.
    pub fn add_tensor(&mut self, mut tensor: Tensor) -> TensorId {
        tensor.status = self.status;
        self.push_tensor(tensor)
    }

    fn push_tensor(&mut self, mut tensor: Tensor) -> TensorId {
        tensor.name = self.unique_name(&tensor.name);
        self.tensors.push(tensor);
        TensorId(self.tensors.len() - 1)
    }

    fn unique_name(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 1;
        while self.names.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        self.names.insert(name.clone());
        name
    }

    /// Write the layout tag of `id`; see [`Tensor::tag`]
    pub fn tag(&mut self, id: TensorId, layout: Layout) -> ConvertResult<bool> {
        self.tensors[id.0].tag(id, layout)
    }

    /// Append a synthesized operator, returning its position
    pub fn add_op(&mut self, mut op: Operator) -> usize {
        op.status = self.status;
        self.ops.push(op);
        self.ops.len() - 1
    }

    // ========================================================================
    // Phases
    // ========================================================================

    /// Bind tensors and build every source operator
    pub fn parse(&mut self) -> ConvertResult<()> {
        self.status.require(Status::Initialized);
        debug!("Parsing the graph...");

        let opcodes = self.model.operator_codes();
        if let Some(operators) = self.subgraph.operators() {
            for (index, source) in operators.iter().enumerate() {
                let code_index = source.opcode_index() as usize;
                let opcode = opcodes
                    .filter(|c| code_index < c.len())
                    .map(|c| c.get(code_index).builtin_code())
                    .ok_or_else(|| {
                        ConvertError::InvalidSource(format!(
                            "operator {} references missing opcode {}",
                            index, code_index
                        ))
                    })?;
                let entry = registry::lookup(opcode, index)?;

                let raw_inputs: Vec<i32> =
                    source.inputs().map(|v| v.iter().collect()).unwrap_or_default();
                let raw_outputs: Vec<i32> =
                    source.outputs().map(|v| v.iter().collect()).unwrap_or_default();
                registry::check_arity(entry, index, raw_inputs.len(), raw_outputs.len())?;

                let mut inputs = SmallVec::new();
                for &i in raw_inputs.iter().filter(|&&i| i >= 0) {
                    inputs.push(self.tensor(i)?);
                }
                let mut outputs = SmallVec::new();
                for &i in raw_outputs.iter().filter(|&&i| i >= 0) {
                    outputs.push(self.tensor(i)?);
                }

                debug!("Parsing {} ({})...", entry.name, index);
                let args = ParseArgs {
                    entry,
                    source,
                    index,
                    inputs,
                    outputs,
                };
                let mut op = (entry.parse)(args, self)?;
                op.status.advance(Status::Parsed);
                self.ops.push(op);
            }
        }

        let graph_inputs: Vec<i32> = self
            .subgraph
            .inputs()
            .map(|v| v.iter().collect())
            .unwrap_or_default();
        for i in graph_inputs {
            let id = self.tensor(i)?;
            self.inputs.push(id);
        }
        let graph_outputs: Vec<i32> = self
            .subgraph
            .outputs()
            .map(|v| v.iter().collect())
            .unwrap_or_default();
        for i in graph_outputs {
            let id = self.tensor(i)?;
            self.outputs.push(id);
        }

        for t in &mut self.tensors {
            t.status.advance(Status::Parsed);
        }
        self.status.advance(Status::Parsed);
        Ok(())
    }

    /// Insert transposes and fused activations, then drop synthesized
    /// transposes nobody reads
    pub fn build_graph(&mut self) -> ConvertResult<()> {
        self.status.require(Status::Parsed);
        debug!("Building graph ({} layout)...", self.approach);

        let mut index = 0;
        while index < self.ops.len() {
            op::build_graph(self, index)?;
            index += 1;
        }
        self.prune_transposes();

        self.advance_all(Status::GraphBuilt);
        Ok(())
    }

    fn prune_transposes(&mut self) {
        loop {
            let consumed: FxHashSet<TensorId> = self
                .ops
                .iter()
                .flat_map(|op| op.inputs.iter().copied())
                .collect();
            let outputs = &self.outputs;
            let before = self.ops.len();
            self.ops.retain(|op| {
                let dead = op.is_synthesized()
                    && matches!(op.kind, OpKind::Transpose { .. })
                    && op
                        .outputs
                        .iter()
                        .all(|t| !consumed.contains(t) && !outputs.contains(t));
                !dead
            });
            if self.ops.len() == before {
                break;
            }
            debug!("Pruned {} unused transposes", before - self.ops.len());
        }
    }

    /// Settle every tensor's layout tag
    pub fn propagate(&mut self) -> ConvertResult<()> {
        self.status.require(Status::GraphBuilt);
        debug!("Propagating...");

        let mut rounds = 0;
        loop {
            let mut changed = false;
            for index in 0..self.ops.len() {
                changed |= op::propagate(self, index)?;
            }
            rounds += 1;
            if !changed {
                break;
            }
        }
        debug!("Layouts settled after {} rounds", rounds);

        for t in &mut self.tensors {
            if t.layout.is_none() {
                t.layout = Some(Layout::None);
            }
        }

        self.advance_all(Status::Propagated);
        Ok(())
    }

    /// Emit the ONNX graph
    pub fn emit(&mut self) -> ConvertResult<GraphProto> {
        self.status.require(Status::Propagated);
        debug!("Converting...");

        let order = topological_order(&self.ops).ok_or_else(|| {
            ConvertError::InvalidSource("operator graph contains a cycle".to_string())
        })?;

        let mut node = Vec::with_capacity(order.len());
        let mut referenced: IndexSet<TensorId> = IndexSet::new();
        referenced.extend(self.inputs.iter().copied());
        for &index in &order {
            node.push(op::convert(self, index)?);
            let op = &self.ops[index];
            referenced.extend(op.inputs.iter().chain(op.outputs.iter()).copied());
        }
        referenced.extend(self.outputs.iter().copied());
        self.reserve_quant_names(&referenced);

        let mut graph = GraphProto {
            name: self.subgraph.name().unwrap_or("main").to_string(),
            node,
            ..Default::default()
        };

        for &id in &referenced {
            let t = self.tensor_ref(id);
            if let Some(init) = t.initializer() {
                graph.initializer.push(init);
            } else if self.inputs.contains(&id) {
                graph.input.push(t.value_info());
            } else if !self.outputs.contains(&id) {
                graph.value_info.push(t.value_info());
            }
            if let Some((annotation, params)) = t.quant_annotation() {
                graph.quantization_annotation.push(annotation);
                graph.initializer.extend(params);
            }
        }
        for &id in &self.outputs {
            graph.output.push(self.tensor_ref(id).value_info());
        }

        self.advance_all(Status::Converted);
        Ok(graph)
    }

    /// Claim unique names for the scale and zero-point initializers of
    /// every quantized tensor in `ids`
    fn reserve_quant_names(&mut self, ids: &IndexSet<TensorId>) {
        for &id in ids {
            let tensor = &self.tensors[id.0];
            if tensor.quant.is_none() || tensor.quant_names.is_some() {
                continue;
            }
            let base = tensor.name.clone();
            let scale = self.unique_name(&format!("{}_scale", base));
            let zero_point = self.unique_name(&format!("{}_zero_point", base));
            self.tensors[id.0].quant_names = Some((scale, zero_point));
        }
    }

    /// Run every remaining phase and emit the ONNX graph
    pub fn convert(&mut self) -> ConvertResult<GraphProto> {
        if self.status < Status::Parsed {
            self.parse()?;
        }
        if self.status < Status::GraphBuilt {
            self.build_graph()?;
        }
        if self.status < Status::Propagated {
            self.propagate()?;
        }
        self.emit()
    }

    fn advance_all(&mut self, to: Status) {
        for t in &mut self.tensors {
            t.status.advance(to);
        }
        for op in &mut self.ops {
            op.status.advance(to);
        }
        self.status.advance(to);
    }
}
