use super::*;
use crate::core::errors::SimpleError;
use crate::core::tensor::{Tensor2D, Tensor3D, Tensor4D};
use ndarray::{Array2, ArrayView2};
use ort::session::SessionOutputs;
use ort::value::TensorRef;

impl OrtInfer {
    /// Returns the first output declared by the model.
    fn get_output_name(&self) -> Result<String, EcgError> {
        let session = self.sessions[0]
            .lock()
            .map_err(|_| EcgError::invalid_input("Failed to acquire session lock"))?;
        session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| {
                EcgError::invalid_input(
                    "No outputs available in session - model may be invalid or corrupted",
                )
            })
    }

    /// Returns the model path associated with this inference engine.
    pub fn model_path(&self) -> &std::path::Path {
        &self.model_path
    }

    /// Returns the model name associated with this inference engine.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn next_session(&self) -> Result<std::sync::MutexGuard<'_, Session>, EcgError> {
        let idx = self
            .next_idx
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            % self.sessions.len();
        self.sessions[idx].lock().map_err(|_| {
            EcgError::inference_error(
                &self.model_name,
                &format!(
                    "Failed to acquire session lock for session {}/{}",
                    idx,
                    self.sessions.len()
                ),
                SimpleError::new("Session lock acquisition failed"),
            )
        })
    }

    /// Reads the named output as a `(batch, classes)` matrix.
    fn extract_2d(
        &self,
        outputs: &SessionOutputs<'_>,
        output_name: &str,
        batch_size: usize,
    ) -> Result<Tensor2D, EcgError> {
        let (output_shape, output_data) = outputs[output_name]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                EcgError::inference_error(
                    &self.model_name,
                    &format!("Failed to extract output tensor '{}' as f32", output_name),
                    e,
                )
            })?;

        let num_classes = if batch_size == 0 {
            0
        } else {
            output_data.len() / batch_size
        };
        if num_classes == 0 || output_data.len() != batch_size * num_classes {
            return Err(EcgError::inference_error(
                &self.model_name,
                &format!(
                    "output shape {:?} cannot be read as {} row(s) of class scores",
                    output_shape.to_vec(),
                    batch_size
                ),
                SimpleError::new("Output tensor data size mismatch"),
            ));
        }

        let array_view = ArrayView2::from_shape((batch_size, num_classes), output_data)?;
        Ok(array_view.to_owned())
    }

    /// Runs an image batch in `(N, C, H, W)` layout and returns `(N, classes)` scores.
    pub fn infer_2d(&self, x: &Tensor4D) -> Result<Tensor2D, EcgError> {
        let batch_size = x.shape()[0];
        let output_name = self.get_output_name()?;

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            EcgError::inference_error(
                &self.model_name,
                &format!("Failed to convert input tensor with shape {:?}", x.shape()),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session_guard = self.next_session()?;
        let outputs = session_guard.run(inputs).map_err(|e| {
            EcgError::inference_error(
                &self.model_name,
                &format!(
                    "ONNX Runtime inference failed with input '{}' -> output '{}'",
                    self.input_name, output_name
                ),
                e,
            )
        })?;
        self.extract_2d(&outputs, &output_name, batch_size)
    }

    /// Runs a signal batch in `(N, L, T)` layout, optionally with a `(2, E)` edge list,
    /// and returns `(N, classes)` logits.
    pub fn infer_signal(
        &self,
        x: &Tensor3D,
        edge_index: Option<&Array2<i64>>,
    ) -> Result<Tensor2D, EcgError> {
        let batch_size = x.shape()[0];
        let output_name = self.get_output_name()?;

        let signal_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            EcgError::inference_error(
                &self.model_name,
                &format!("Failed to convert signal tensor with shape {:?}", x.shape()),
                e,
            )
        })?;

        let mut session_guard = self.next_session()?;
        let run_result = match edge_index {
            Some(edges) => {
                let edge_tensor = TensorRef::from_array_view(edges.view()).map_err(|e| {
                    EcgError::inference_error(
                        &self.model_name,
                        "Failed to convert edge_index tensor",
                        e,
                    )
                })?;
                session_guard.run(ort::inputs![
                    self.input_name.as_str() => signal_tensor,
                    EDGE_INDEX_INPUT => edge_tensor
                ])
            }
            None => session_guard.run(ort::inputs![self.input_name.as_str() => signal_tensor]),
        };
        let outputs = run_result.map_err(|e| {
            EcgError::inference_error(
                &self.model_name,
                &format!(
                    "ONNX Runtime inference failed with input '{}' -> output '{}'",
                    self.input_name, output_name
                ),
                e,
            )
        })?;
        self.extract_2d(&outputs, &output_name, batch_size)
    }
}
