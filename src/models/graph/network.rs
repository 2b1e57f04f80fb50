//! Native CNN + graph network for multi-label classification.
//!
//! A [`GraphNetSpec`] describes the layer stack and the state-dict names of its
//! parameters. [`GraphNet::load`] binds a spec to a [`ParamStore`], zero-filling anything
//! the store does not provide, and reports the match in a [`LoadResult`].

use std::collections::BTreeSet;

use ndarray::{Array1, Array2, ArrayD, ArrayView1, Axis, Ix1, Ix2, Ix3, IxDyn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::layers::{
    BatchNorm1d, Conv1d, GcnConv, Linear, SageConv, concat_nodes, relu_inplace, time_mean,
};
use super::weights::{LoadResult, ParamStore, is_ignored_key};
use crate::core::constants::LEAD_COUNT;
use crate::core::errors::EcgError;
use crate::core::traits::MultiLabelClassifier;
use crate::domain::{ClassProbabilities, DigitizedSignal, LeadGraph};

const BATCH_NORM_EPS: f32 = 1e-5;

/// One convolution of the per-lead feature extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvSpec {
    pub name: String,
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel: usize,
    pub stride: usize,
    pub padding: usize,
    /// State-dict prefix of the batch norm following the convolution, if any.
    pub batch_norm: Option<String>,
    pub relu: bool,
}

/// Neighborhood aggregation used by the graph layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphAggregation {
    Gcn,
    Sage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphLayerSpec {
    pub name: String,
    pub in_features: usize,
    pub out_features: usize,
    pub relu: bool,
}

/// How node features are reduced to one vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePooling {
    Mean,
    Sum,
    /// Node vectors joined in canonical lead order.
    Concat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearSpec {
    pub name: String,
    pub in_features: usize,
    pub out_features: usize,
    pub relu: bool,
}

/// Architecture of a [`GraphNet`].
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNetSpec {
    pub convs: Vec<ConvSpec>,
    pub aggregation: GraphAggregation,
    pub graph_layers: Vec<GraphLayerSpec>,
    pub pooling: NodePooling,
    pub head: Vec<LinearSpec>,
    pub class_names: Vec<String>,
    pub lead_count: usize,
}

fn conv(
    name: &str,
    channels: (usize, usize),
    kernel: usize,
    stride: usize,
    batch_norm: Option<&str>,
) -> ConvSpec {
    ConvSpec {
        name: name.to_string(),
        in_channels: channels.0,
        out_channels: channels.1,
        kernel,
        stride,
        padding: kernel / 2,
        batch_norm: batch_norm.map(str::to_string),
        relu: true,
    }
}

fn graph_layer(name: &str, features: (usize, usize), relu: bool) -> GraphLayerSpec {
    GraphLayerSpec {
        name: name.to_string(),
        in_features: features.0,
        out_features: features.1,
        relu,
    }
}

fn linear(name: &str, features: (usize, usize), relu: bool) -> LinearSpec {
    LinearSpec {
        name: name.to_string(),
        in_features: features.0,
        out_features: features.1,
        relu,
    }
}

impl GraphNetSpec {
    /// Batch-normalized CNN, two GCN layers, mean pooling and a two-layer head.
    pub fn gcn_mean(class_names: &[String]) -> Self {
        Self {
            convs: vec![
                conv("cnn.conv1", (1, 32), 7, 1, Some("cnn.bn1")),
                conv("cnn.conv2", (32, 64), 5, 1, Some("cnn.bn2")),
                conv("cnn.conv3", (64, 64), 3, 1, Some("cnn.bn3")),
            ],
            aggregation: GraphAggregation::Gcn,
            graph_layers: vec![
                graph_layer("gcn1", (64, 128), true),
                graph_layer("gcn2", (128, 128), true),
            ],
            pooling: NodePooling::Mean,
            head: vec![
                linear("fc1", (128, 64), true),
                linear("fc2", (64, class_names.len()), false),
            ],
            class_names: class_names.to_vec(),
            lead_count: LEAD_COUNT,
        }
    }

    /// Strided CNN, two GraphSAGE layers, concatenation of all leads and a two-layer head.
    pub fn sage_concat(class_names: &[String]) -> Self {
        Self {
            convs: vec![
                conv("cnn.0", (1, 32), 7, 1, None),
                conv("cnn.2", (32, 64), 5, 2, None),
                conv("cnn.4", (64, 64), 5, 2, None),
            ],
            aggregation: GraphAggregation::Sage,
            graph_layers: vec![
                graph_layer("sage1", (64, 64), true),
                graph_layer("sage2", (64, 64), false),
            ],
            pooling: NodePooling::Concat,
            head: vec![
                linear("fc.0", (LEAD_COUNT * 64, 256), true),
                linear("fc.3", (256, class_names.len()), false),
            ],
            class_names: class_names.to_vec(),
            lead_count: LEAD_COUNT,
        }
    }

    /// Width of the per-lead embedding entering the graph layers.
    fn embedding_width(&self) -> usize {
        self.convs.last().map(|c| c.out_channels).unwrap_or(1)
    }

    fn node_width(&self) -> usize {
        self.graph_layers
            .last()
            .map(|g| g.out_features)
            .unwrap_or_else(|| self.embedding_width())
    }

    fn pooled_width(&self) -> usize {
        match self.pooling {
            NodePooling::Mean | NodePooling::Sum => self.node_width(),
            NodePooling::Concat => self.node_width() * self.lead_count,
        }
    }

    /// Every parameter name the network reads, with its expected shape.
    pub fn parameters(&self) -> Vec<(String, Vec<usize>)> {
        let mut params = Vec::new();
        for c in &self.convs {
            params.push((
                format!("{}.weight", c.name),
                vec![c.out_channels, c.in_channels, c.kernel],
            ));
            params.push((format!("{}.bias", c.name), vec![c.out_channels]));
            if let Some(bn) = &c.batch_norm {
                for field in ["weight", "bias", "running_mean", "running_var"] {
                    params.push((format!("{}.{}", bn, field), vec![c.out_channels]));
                }
            }
        }
        for g in &self.graph_layers {
            let (out_dim, in_dim) = (g.out_features, g.in_features);
            match self.aggregation {
                GraphAggregation::Gcn => {
                    params.push((format!("{}.lin.weight", g.name), vec![out_dim, in_dim]));
                    params.push((format!("{}.lin.bias", g.name), vec![out_dim]));
                    params.push((format!("{}.bias", g.name), vec![out_dim]));
                }
                GraphAggregation::Sage => {
                    params.push((format!("{}.lin_l.weight", g.name), vec![out_dim, in_dim]));
                    params.push((format!("{}.lin_l.bias", g.name), vec![out_dim]));
                    params.push((format!("{}.lin_r.weight", g.name), vec![out_dim, in_dim]));
                }
            }
        }
        for l in &self.head {
            params.push((
                format!("{}.weight", l.name),
                vec![l.out_features, l.in_features],
            ));
            params.push((format!("{}.bias", l.name), vec![l.out_features]));
        }
        params
    }

    /// Checks that consecutive layers agree on their widths.
    pub fn validate(&self) -> Result<(), EcgError> {
        if self.class_names.is_empty() {
            return Err(EcgError::config_error("graph network has no classes"));
        }
        if self.lead_count == 0 {
            return Err(EcgError::config_error("graph network has no leads"));
        }
        let mut channels = 1;
        for c in &self.convs {
            if c.in_channels != channels || c.kernel == 0 || c.stride == 0 {
                return Err(EcgError::config_error(format!(
                    "convolution '{}' expects {} input channels, kernel {}, stride {}; previous layer yields {} channels",
                    c.name, c.in_channels, c.kernel, c.stride, channels
                )));
            }
            channels = c.out_channels;
        }
        let mut features = channels;
        for g in &self.graph_layers {
            if g.in_features != features {
                return Err(EcgError::config_error(format!(
                    "graph layer '{}' expects {} features, previous layer yields {}",
                    g.name, g.in_features, features
                )));
            }
            features = g.out_features;
        }
        let mut width = self.pooled_width();
        for l in &self.head {
            if l.in_features != width {
                return Err(EcgError::config_error(format!(
                    "linear layer '{}' expects {} features, previous layer yields {}",
                    l.name, l.in_features, width
                )));
            }
            width = l.out_features;
        }
        if width != self.class_names.len() {
            return Err(EcgError::config_error(format!(
                "graph network emits {} logits for {} classes",
                width,
                self.class_names.len()
            )));
        }
        Ok(())
    }
}

/// Built-in architectures selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphNetPreset {
    GcnMean,
    #[default]
    SageConcat,
}

impl GraphNetPreset {
    pub fn spec(self, class_names: &[String]) -> GraphNetSpec {
        match self {
            GraphNetPreset::GcnMean => GraphNetSpec::gcn_mean(class_names),
            GraphNetPreset::SageConcat => GraphNetSpec::sage_concat(class_names),
        }
    }
}

/// Binds parameter names to store entries while recording what matched.
struct ParamBinder<'a> {
    store: &'a ParamStore,
    requested: BTreeSet<String>,
    result: LoadResult,
}

impl<'a> ParamBinder<'a> {
    fn new(store: &'a ParamStore) -> Self {
        Self {
            store,
            requested: BTreeSet::new(),
            result: LoadResult::default(),
        }
    }

    /// Returns the stored tensor, or a tensor filled with `fill` when it is absent or
    /// shaped differently.
    fn take(&mut self, name: String, shape: &[usize], fill: f32) -> ArrayD<f32> {
        let tensor = match self.store.get(&name) {
            Some(t) if t.shape() == shape => {
                self.result.loaded.push(name.clone());
                t.clone()
            }
            stored => {
                if let Some(t) = stored {
                    tracing::debug!(
                        "Parameter '{}' has shape {:?}, expected {:?}",
                        name,
                        t.shape(),
                        shape
                    );
                }
                self.result.missing.push(name.clone());
                ArrayD::from_elem(IxDyn(shape), fill)
            }
        };
        self.requested.insert(name);
        tensor
    }

    fn vector(&mut self, name: String, len: usize, fill: f32) -> Result<Array1<f32>, EcgError> {
        Ok(self.take(name, &[len], fill).into_dimensionality::<Ix1>()?)
    }

    fn linear(
        &mut self,
        prefix: &str,
        out_dim: usize,
        in_dim: usize,
        bias: bool,
    ) -> Result<Linear, EcgError> {
        let weight = self
            .take(format!("{}.weight", prefix), &[out_dim, in_dim], 0.0)
            .into_dimensionality::<Ix2>()?;
        let bias = if bias {
            Some(self.vector(format!("{}.bias", prefix), out_dim, 0.0)?)
        } else {
            None
        };
        Ok(Linear { weight, bias })
    }

    fn finish(mut self) -> LoadResult {
        self.result.unexpected = self
            .store
            .names()
            .filter(|name| !self.requested.contains(*name) && !is_ignored_key(name))
            .map(str::to_string)
            .collect();
        self.result
    }
}

#[derive(Debug, Clone)]
struct ConvBlock {
    conv: Conv1d,
    batch_norm: Option<BatchNorm1d>,
    relu: bool,
}

#[derive(Debug, Clone)]
enum GraphLayer {
    Gcn(GcnConv),
    Sage(SageConv),
}

#[derive(Debug, Clone)]
struct GraphBlock {
    layer: GraphLayer,
    relu: bool,
}

#[derive(Debug, Clone)]
struct HeadBlock {
    linear: Linear,
    relu: bool,
}

/// A loaded network. Immutable after [`GraphNet::load`].
#[derive(Debug, Clone)]
pub struct GraphNet {
    spec: GraphNetSpec,
    convs: Vec<ConvBlock>,
    graph_layers: Vec<GraphBlock>,
    head: Vec<HeadBlock>,
}

impl GraphNet {
    /// Builds the network from stored parameters.
    ///
    /// Missing or mis-shaped parameters are zero, except batch-norm running variances
    /// which default to one.
    pub fn load(spec: GraphNetSpec, store: &ParamStore) -> Result<(Self, LoadResult), EcgError> {
        spec.validate()?;
        let mut binder = ParamBinder::new(store);

        let mut convs = Vec::with_capacity(spec.convs.len());
        for c in &spec.convs {
            let weight = binder
                .take(
                    format!("{}.weight", c.name),
                    &[c.out_channels, c.in_channels, c.kernel],
                    0.0,
                )
                .into_dimensionality::<Ix3>()?;
            let bias = binder.vector(format!("{}.bias", c.name), c.out_channels, 0.0)?;
            let batch_norm = match &c.batch_norm {
                Some(bn) => Some(BatchNorm1d {
                    weight: binder.vector(format!("{}.weight", bn), c.out_channels, 0.0)?,
                    bias: binder.vector(format!("{}.bias", bn), c.out_channels, 0.0)?,
                    running_mean: binder.vector(
                        format!("{}.running_mean", bn),
                        c.out_channels,
                        0.0,
                    )?,
                    running_var: binder.vector(
                        format!("{}.running_var", bn),
                        c.out_channels,
                        1.0,
                    )?,
                    eps: BATCH_NORM_EPS,
                }),
                None => None,
            };
            convs.push(ConvBlock {
                conv: Conv1d {
                    weight,
                    bias,
                    stride: c.stride,
                    padding: c.padding,
                },
                batch_norm,
                relu: c.relu,
            });
        }

        let mut graph_layers = Vec::with_capacity(spec.graph_layers.len());
        for g in &spec.graph_layers {
            let (out_dim, in_dim) = (g.out_features, g.in_features);
            let layer = match spec.aggregation {
                GraphAggregation::Gcn => GraphLayer::Gcn(GcnConv {
                    lin: binder.linear(&format!("{}.lin", g.name), out_dim, in_dim, true)?,
                    bias: binder.vector(format!("{}.bias", g.name), out_dim, 0.0)?,
                }),
                GraphAggregation::Sage => GraphLayer::Sage(SageConv {
                    lin_l: binder.linear(&format!("{}.lin_l", g.name), out_dim, in_dim, true)?,
                    lin_r: binder.linear(&format!("{}.lin_r", g.name), out_dim, in_dim, false)?,
                }),
            };
            graph_layers.push(GraphBlock {
                layer,
                relu: g.relu,
            });
        }

        let mut head = Vec::with_capacity(spec.head.len());
        for l in &spec.head {
            head.push(HeadBlock {
                linear: binder.linear(&l.name, l.out_features, l.in_features, true)?,
                relu: l.relu,
            });
        }

        let result = binder.finish();
        Ok((
            Self {
                spec,
                convs,
                graph_layers,
                head,
            },
            result,
        ))
    }

    pub fn spec(&self) -> &GraphNetSpec {
        &self.spec
    }

    /// Runs the per-lead CNN on one lead and averages over time.
    fn embed_lead(&self, lead: ArrayView1<'_, f32>) -> Result<Array1<f32>, EcgError> {
        let mut x: Array2<f32> = lead.insert_axis(Axis(0)).to_owned();
        for block in &self.convs {
            x = block.conv.forward(x.view())?;
            if let Some(bn) = &block.batch_norm {
                bn.forward_inplace(&mut x);
            }
            if block.relu {
                relu_inplace(&mut x);
            }
        }
        Ok(time_mean(&x))
    }

    /// Computes one logit per class.
    pub fn forward(
        &self,
        signal: &DigitizedSignal,
        graph: &LeadGraph,
    ) -> Result<Vec<f32>, EcgError> {
        let leads = self.spec.lead_count;
        if signal.lead_count() != leads {
            return Err(EcgError::shape_mismatch(
                "GraphNet",
                &[signal.samples(), leads],
                &[signal.samples(), signal.lead_count()],
            ));
        }

        let embeddings = (0..leads)
            .into_par_iter()
            .map(|l| self.embed_lead(signal.lead(l)))
            .collect::<Result<Vec<_>, EcgError>>()?;
        let views: Vec<ArrayView1<'_, f32>> = embeddings.iter().map(|e| e.view()).collect();
        let mut h = ndarray::stack(Axis(0), &views)?;

        for block in &self.graph_layers {
            h = match &block.layer {
                GraphLayer::Gcn(layer) => layer.forward(h.view(), graph)?,
                GraphLayer::Sage(layer) => layer.forward(h.view(), graph)?,
            };
            if block.relu {
                relu_inplace(&mut h);
            }
        }

        let mut x = match self.spec.pooling {
            NodePooling::Mean => h
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(h.ncols())),
            NodePooling::Sum => h.sum_axis(Axis(0)),
            NodePooling::Concat => concat_nodes(&h),
        };
        for block in &self.head {
            x = block.linear.forward(x.view())?;
            if block.relu {
                relu_inplace(&mut x);
            }
        }
        Ok(x.to_vec())
    }
}

/// Multi-label classifier backed by a native [`GraphNet`].
#[derive(Debug)]
pub struct GraphNetClassifier {
    net: GraphNet,
    degraded: bool,
}

impl GraphNetClassifier {
    pub fn new(net: GraphNet, degraded: bool) -> Self {
        Self { net, degraded }
    }

    pub fn net(&self) -> &GraphNet {
        &self.net
    }
}

impl MultiLabelClassifier for GraphNetClassifier {
    fn classify(
        &self,
        signal: &DigitizedSignal,
        graph: &LeadGraph,
    ) -> Result<ClassProbabilities, EcgError> {
        let logits = self.net.forward(signal, graph)?;
        ClassProbabilities::from_logits(&self.net.spec.class_names, &logits)
    }

    fn class_names(&self) -> &[String] {
        &self.net.spec.class_names
    }

    fn is_degraded(&self) -> bool {
        self.degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::DEFAULT_CLASS_NAMES;
    use crate::domain::{GraphTopology, LeadGraphBuilder, sigmoid};
    use crate::models::graph::weights::tests::safetensors_bytes;
    use ndarray::{Array, arr1};

    fn classes() -> Vec<String> {
        DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect()
    }

    fn signal(samples: usize) -> DigitizedSignal {
        let data = Array2::from_shape_fn((samples, LEAD_COUNT), |(t, l)| {
            ((t as f32) * 0.05 + l as f32).sin()
        });
        DigitizedSignal::from_array(data, samples, LEAD_COUNT).unwrap()
    }

    #[test]
    fn test_presets_are_consistent() {
        let gcn = GraphNetSpec::gcn_mean(&classes());
        gcn.validate().unwrap();
        assert_eq!(gcn.parameters().len(), 3 * 6 + 2 * 3 + 2 * 2);

        let sage = GraphNetSpec::sage_concat(&classes());
        sage.validate().unwrap();
        let params = sage.parameters();
        assert_eq!(params.len(), 3 * 2 + 2 * 3 + 2 * 2);
        assert!(params.contains(&("fc.0.weight".to_string(), vec![256, 768])));
        assert!(params.contains(&("cnn.2.weight".to_string(), vec![64, 32, 5])));
        assert!(params.contains(&("sage2.lin_r.weight".to_string(), vec![64, 64])));
    }

    #[test]
    fn test_validate_rejects_width_mismatch() {
        let mut spec = GraphNetSpec::gcn_mean(&classes());
        spec.head[0].in_features = 64;
        assert!(matches!(spec.validate(), Err(EcgError::ConfigError { .. })));

        let mut spec = GraphNetSpec::sage_concat(&classes());
        spec.class_names.pop();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_preset_default_and_serde() {
        assert_eq!(GraphNetPreset::default(), GraphNetPreset::SageConcat);
        let preset: GraphNetPreset = serde_json::from_str("\"gcn_mean\"").unwrap();
        assert_eq!(preset, GraphNetPreset::GcnMean);
        assert_eq!(preset.spec(&classes()).aggregation, GraphAggregation::Gcn);
    }

    #[test]
    fn test_partial_load_reports_names() {
        let mut store = ParamStore::new();
        store.insert("fc2.bias", arr1(&[2.0f32, -1.0, 0.0, 0.5, 3.0]).into_dyn());
        store.insert("fc2.weight", ArrayD::zeros(IxDyn(&[5, 63])));
        store.insert("extra.weight", ArrayD::zeros(IxDyn(&[1])));
        store.insert("edge_index", ArrayD::zeros(IxDyn(&[2, 30])));
        store.insert("cnn.bn1.num_batches_tracked", ArrayD::zeros(IxDyn(&[])));

        let spec = GraphNetSpec::gcn_mean(&classes());
        let expected = spec.parameters().len();
        let (net, result) = GraphNet::load(spec, &store).unwrap();
        assert_eq!(result.loaded, vec!["fc2.bias".to_string()]);
        assert_eq!(result.missing.len(), expected - 1);
        assert!(result.missing.contains(&"fc2.weight".to_string()));
        assert_eq!(result.unexpected, vec!["extra.weight".to_string()]);
        assert!(!result.is_complete());

        // Everything upstream of the final bias is zero, so the logits are that bias.
        let graph = LeadGraphBuilder::new(GraphTopology::FullyConnected).build(LEAD_COUNT);
        let classifier = GraphNetClassifier::new(net, true);
        let probs = classifier.classify(&signal(200), &graph).unwrap();
        assert!((probs.get("NORM").unwrap() - sigmoid(2.0)).abs() < 1e-6);
        assert!((probs.get("CD").unwrap() - sigmoid(3.0)).abs() < 1e-6);
        assert!(classifier.is_degraded());
    }

    #[test]
    fn test_empty_store_yields_half_probabilities() {
        let spec = GraphNetSpec::sage_concat(&classes());
        let (net, result) = GraphNet::load(spec, &ParamStore::new()).unwrap();
        assert!(result.loaded.is_empty());
        let graph = LeadGraphBuilder::new(GraphTopology::AnatomicalTriads).build(LEAD_COUNT);
        let logits = net.forward(&signal(1000), &graph).unwrap();
        assert_eq!(logits.len(), 5);
        assert!(logits.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_load_from_safetensors_file() {
        let bytes = safetensors_bytes(&[
            ("fc.3.bias", vec![5], vec![1.0, 1.0, 1.0, 1.0, -1.0]),
            ("edge_index", vec![2, 1], vec![0.0, 1.0]),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multilabel.safetensors");
        std::fs::write(&path, bytes).unwrap();

        let store = ParamStore::from_safetensors(&path).unwrap();
        let (net, result) = GraphNet::load(GraphNetSpec::sage_concat(&classes()), &store).unwrap();
        assert_eq!(result.loaded, vec!["fc.3.bias".to_string()]);
        assert!(result.unexpected.is_empty());

        let graph = LeadGraphBuilder::new(GraphTopology::AnatomicalTriads).build(LEAD_COUNT);
        let logits = net.forward(&signal(300), &graph).unwrap();
        assert_eq!(logits, vec![1.0, 1.0, 1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_forward_keeps_lead_order() {
        // Identity CNN, no graph mixing, concatenation and an identity head: the
        // logits are the per-lead means in canonical order.
        let leads = 4;
        let names: Vec<String> = (0..leads).map(|l| format!("L{}", l)).collect();
        let spec = GraphNetSpec {
            convs: vec![conv("c", (1, 1), 1, 1, None)],
            aggregation: GraphAggregation::Gcn,
            graph_layers: vec![],
            pooling: NodePooling::Concat,
            head: vec![linear("fc", (leads, leads), false)],
            class_names: names,
            lead_count: leads,
        };
        let mut store = ParamStore::new();
        store.insert("c.weight", Array::from_elem(IxDyn(&[1, 1, 1]), 1.0f32));
        store.insert("fc.weight", Array2::<f32>::eye(leads).into_dyn());
        let (net, result) = GraphNet::load(spec, &store).unwrap();
        assert_eq!(result.missing, vec!["c.bias".to_string(), "fc.bias".to_string()]);

        let data = Array2::from_shape_fn((50, leads), |(_, l)| l as f32);
        let signal = DigitizedSignal::from_array(data, 50, leads).unwrap();
        let graph = LeadGraphBuilder::new(GraphTopology::FullyConnected).build(leads);
        let logits = net.forward(&signal, &graph).unwrap();
        assert_eq!(logits, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_forward_rejects_wrong_lead_count() {
        let spec = GraphNetSpec::gcn_mean(&classes());
        let (net, _) = GraphNet::load(spec, &ParamStore::new()).unwrap();
        let signal = DigitizedSignal::from_array(Array2::zeros((100, 6)), 100, 6).unwrap();
        let graph = LeadGraphBuilder::new(GraphTopology::FullyConnected).build(6);
        assert!(net.forward(&signal, &graph).is_err());
    }
}
