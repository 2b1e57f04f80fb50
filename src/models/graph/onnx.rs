//! Multi-label classification with an exported ONNX graph model.

use std::path::Path;

use crate::core::config::OrtSessionConfig;
use crate::core::errors::{EcgError, SimpleError};
use crate::core::inference::{EDGE_INDEX_INPUT, OrtInfer};
use crate::core::tensor::Tensor3D;
use crate::core::traits::MultiLabelClassifier;
use crate::domain::{ClassProbabilities, DigitizedSignal, LeadGraph};

/// An opaque ONNX model taking a `(1, L, T)` signal and emitting one logit per class.
///
/// When the model declares an `edge_index` input, the lead graph is fed as a `(2, 2E)`
/// `i64` tensor listing both directions of every edge.
#[derive(Debug)]
pub struct OnnxGraphClassifier {
    inference: OrtInfer,
    class_names: Vec<String>,
    feeds_graph: bool,
}

impl OnnxGraphClassifier {
    pub fn new(
        model_path: &Path,
        class_names: Vec<String>,
        ort_config: Option<&OrtSessionConfig>,
        session_pool_size: usize,
    ) -> Result<Self, EcgError> {
        let inference = OrtInfer::from_config(model_path, ort_config, session_pool_size, None)?;
        let feeds_graph = inference.has_input(EDGE_INDEX_INPUT);
        tracing::debug!(
            "Loaded ONNX multi-label model {} (edge_index input: {})",
            model_path.display(),
            feeds_graph
        );
        Ok(Self {
            inference,
            class_names,
            feeds_graph,
        })
    }
}

impl MultiLabelClassifier for OnnxGraphClassifier {
    fn classify(
        &self,
        signal: &DigitizedSignal,
        graph: &LeadGraph,
    ) -> Result<ClassProbabilities, EcgError> {
        let leads_first = signal.view().t().as_standard_layout().into_owned();
        let input: Tensor3D = leads_first.insert_axis(ndarray::Axis(0));
        let edge_index = self.feeds_graph.then(|| graph.edge_index());

        let logits = self.inference.infer_signal(&input, edge_index.as_ref())?;
        let row = logits.rows().into_iter().next().ok_or_else(|| {
            EcgError::inference_error(
                self.inference.model_name(),
                "model returned no rows",
                SimpleError::new("empty output"),
            )
        })?;
        if row.len() != self.class_names.len() {
            return Err(EcgError::shape_mismatch(
                self.inference.model_name(),
                &[1, self.class_names.len()],
                &[1, row.len()],
            ));
        }
        ClassProbabilities::from_logits(&self.class_names, &row.to_vec())
    }

    fn class_names(&self) -> &[String] {
        &self.class_names
    }
}
