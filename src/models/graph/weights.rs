//! Named parameter storage for the native lead-graph network.

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::{ArrayD, IxDyn};
use safetensors::{Dtype, SafeTensors};

use crate::core::errors::{EcgError, SimpleError};

/// Buffers that exported state dicts carry but the forward pass never reads.
const IGNORED_SUFFIXES: [&str; 2] = ["num_batches_tracked", "edge_index"];

/// Whether a state-dict key is a known non-parameter buffer.
pub fn is_ignored_key(name: &str) -> bool {
    IGNORED_SUFFIXES
        .iter()
        .any(|suffix| name == *suffix || name.ends_with(&format!(".{}", suffix)))
}

/// Float tensors keyed by state-dict name.
#[derive(Debug, Clone, Default)]
pub struct ParamStore {
    tensors: BTreeMap<String, ArrayD<f32>>,
}

impl ParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every `F32` tensor of a safetensors file.
    ///
    /// Tensors of other dtypes are skipped; they can only be ignored buffers or
    /// parameters the network cannot use.
    pub fn from_safetensors(path: impl AsRef<Path>) -> Result<Self, EcgError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            EcgError::model_load_error(
                path,
                "failed to read weight file",
                Some("verify the multi-label weight file exists and is readable"),
                Some(e),
            )
        })?;
        Self::from_safetensors_bytes(&bytes).map_err(|e| {
            EcgError::model_load_error(
                path,
                "failed to parse safetensors weights",
                Some("export the state dict with safetensors.torch.save_file"),
                Some(SimpleError::new(e.to_string())),
            )
        })
    }

    /// Parses safetensors data already in memory.
    pub fn from_safetensors_bytes(bytes: &[u8]) -> Result<Self, EcgError> {
        let file = SafeTensors::deserialize(bytes)
            .map_err(|e| EcgError::invalid_input(format!("invalid safetensors data: {}", e)))?;

        let mut store = Self::new();
        for (name, view) in file.tensors() {
            if view.dtype() != Dtype::F32 {
                tracing::debug!("Skipping tensor '{}' with dtype {:?}", name, view.dtype());
                continue;
            }
            let values: Vec<f32> = view
                .data()
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            let array = ArrayD::from_shape_vec(IxDyn(view.shape()), values)?;
            store.insert(name, array);
        }
        Ok(store)
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: ArrayD<f32>) {
        self.tensors.insert(name.into(), tensor);
    }

    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.tensors.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}

/// How well a parameter store matched a network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadResult {
    /// Parameters found with the expected shape.
    pub loaded: Vec<String>,
    /// Parameters absent from the store or present with a different shape.
    pub missing: Vec<String>,
    /// Store entries the network does not use, excluding known buffers.
    pub unexpected: Vec<String>,
}

impl LoadResult {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// One-line summary naming at most `limit` missing and unexpected keys.
    pub fn summary(&self, limit: usize) -> String {
        let head = |names: &[String]| {
            let mut shown: Vec<&str> = names.iter().take(limit).map(String::as_str).collect();
            if names.len() > limit {
                shown.push("...");
            }
            shown.join(", ")
        };
        format!(
            "{} loaded, {} missing [{}], {} unexpected [{}]",
            self.loaded.len(),
            self.missing.len(),
            head(&self.missing),
            self.unexpected.len(),
            head(&self.unexpected)
        )
    }
}
