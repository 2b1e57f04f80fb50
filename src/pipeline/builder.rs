//! Builds a [`CascadeOrchestrator`] from a [`CascadeConfig`].

use std::path::Path;
use std::sync::Arc;

use super::cascade::{CascadeContext, CascadeOrchestrator};
use super::gates::{BinaryScreen, ImageValidator};
use crate::core::config::{CascadeConfig, ConfigValidator};
use crate::core::errors::EcgError;
use crate::core::traits::{ImageScorer, MultiLabelClassifier};
use crate::digitizer::LeadDigitizer;
use crate::domain::{LeadGraphBuilder, ThresholdTable};
use crate::models::classification::OnnxImageScorerBuilder;
use crate::models::graph::{GraphNet, GraphNetClassifier, OnnxGraphClassifier, ParamStore};

/// Number of parameter names listed when reporting a partial weight load.
const LOAD_REPORT_LIMIT: usize = 5;

/// Assembles the cascade context, loading every model named by the configuration.
///
/// Components can be replaced before building, which skips loading that model.
///
/// ```rust,no_run
/// use ecg_cascade::core::config::CascadeConfig;
/// use ecg_cascade::pipeline::CascadeBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CascadeConfig::default().with_model_dir("models");
/// let cascade = CascadeBuilder::new(config).build()?;
/// let result = cascade.classify(std::path::Path::new("ecg.png"));
/// println!("{}", result.to_json()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CascadeBuilder {
    config: CascadeConfig,
    validator: Option<Option<Arc<dyn ImageScorer>>>,
    binary: Option<Arc<dyn ImageScorer>>,
    classifier: Option<Arc<dyn MultiLabelClassifier>>,
}

impl CascadeBuilder {
    pub fn new(config: CascadeConfig) -> Self {
        Self {
            config,
            validator: None,
            binary: None,
            classifier: None,
        }
    }

    /// Uses the given validator scorer; `None` runs without a validator.
    pub fn validator_scorer(mut self, scorer: Option<Arc<dyn ImageScorer>>) -> Self {
        self.validator = Some(scorer);
        self
    }

    pub fn binary_scorer(mut self, scorer: Arc<dyn ImageScorer>) -> Self {
        self.binary = Some(scorer);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn MultiLabelClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Builds the shared context.
    pub fn build_context(self) -> Result<CascadeContext, EcgError> {
        let config = &self.config;
        config.validate()?;

        let validator_scorer = match self.validator {
            Some(scorer) => scorer,
            None => load_validator(config),
        };
        let validator = ImageValidator::new(
            validator_scorer,
            config.validation_threshold,
            config.missing_model_confidence,
            config.error_confidence,
        );

        let binary_scorer = match self.binary {
            Some(scorer) => scorer,
            None => load_scorer(config, "binary_screen", &config.binary_model)?,
        };
        let screen = BinaryScreen::new(binary_scorer, config.abnormal_threshold);

        let digitizer = LeadDigitizer::new(config.digitizer.clone())?;

        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => load_classifier(config)?,
        };
        if classifier.class_names() != config.class_names.as_slice() {
            return Err(EcgError::config_error(format!(
                "classifier emits classes {:?}, configuration expects {:?}",
                classifier.class_names(),
                config.class_names
            )));
        }

        let graph = LeadGraphBuilder::new(config.graph.topology).build(config.digitizer.lead_count);
        tracing::debug!(
            "Lead graph: {:?} with {} edges",
            graph.topology(),
            graph.edges().len()
        );

        let thresholds = load_thresholds(config)?;

        Ok(CascadeContext {
            validator,
            screen,
            digitizer,
            classifier,
            graph: Arc::new(graph),
            thresholds,
            risk_levels: config.risk_levels.clone(),
            max_image_bytes: config.max_image_bytes,
        })
    }

    /// Builds the orchestrator.
    pub fn build(self) -> Result<CascadeOrchestrator, EcgError> {
        let context = self.build_context()?;
        tracing::info!(
            "Cascade ready (validator: {}, classifier degraded: {})",
            if context.validator.has_model() {
                "loaded"
            } else {
                "absent"
            },
            context.classifier.is_degraded()
        );
        Ok(CascadeOrchestrator::new(Arc::new(context)))
    }
}

fn load_scorer(
    config: &CascadeConfig,
    name: &str,
    model: &Path,
) -> Result<Arc<dyn ImageScorer>, EcgError> {
    let path = config.resolve_model_path(model);
    let scorer = OnnxImageScorerBuilder::new(name)
        .input_size(config.input_size)
        .session_pool_size(config.session_pool_size)
        .with_ort_config(config.ort_session.clone())
        .build(&path)?;
    tracing::debug!("Loaded {} from {}", name, path.display());
    Ok(Arc::new(scorer))
}

/// The validator is optional: a disabled, missing or unloadable model leaves it absent.
fn load_validator(config: &CascadeConfig) -> Option<Arc<dyn ImageScorer>> {
    if !config.validator_enabled {
        tracing::info!("ECG validator disabled by configuration");
        return None;
    }
    let path = config.resolve_model_path(&config.validator_model);
    if !path.exists() {
        tracing::warn!(
            "ECG validator not found at {}; every image is accepted with confidence {}",
            path.display(),
            config.missing_model_confidence
        );
        return None;
    }
    match load_scorer(config, "ecg_validator", &config.validator_model) {
        Ok(scorer) => Some(scorer),
        Err(e) => {
            tracing::warn!(
                "ECG validator could not be loaded ({}); every image is accepted with confidence {}",
                e,
                config.missing_model_confidence
            );
            None
        }
    }
}

fn load_classifier(config: &CascadeConfig) -> Result<Arc<dyn MultiLabelClassifier>, EcgError> {
    let path = config.resolve_model_path(&config.multilabel_model);
    if config.multilabel_is_onnx() {
        let classifier = OnnxGraphClassifier::new(
            &path,
            config.class_names.clone(),
            config.ort_session.as_ref(),
            config.session_pool_size,
        )?;
        return Ok(Arc::new(classifier));
    }

    let spec = config.network.preset.spec(&config.class_names);
    if spec.lead_count != config.digitizer.lead_count {
        return Err(EcgError::config_error(format!(
            "network {:?} expects {} leads, digitizer produces {}",
            config.network.preset, spec.lead_count, config.digitizer.lead_count
        )));
    }

    let store = if path.exists() {
        ParamStore::from_safetensors(&path)?
    } else if config.allow_partial_weights {
        tracing::warn!(
            "Multi-label weights not found at {}; running with zeroed parameters",
            path.display()
        );
        ParamStore::new()
    } else {
        return Err(EcgError::model_load_error(
            &path,
            "weight file not found",
            Some("set multilabel_model to an existing safetensors file"),
            None::<std::io::Error>,
        ));
    };

    let (net, report) = GraphNet::load(spec, &store)?;
    if !report.unexpected.is_empty() {
        tracing::debug!(
            "Ignoring {} unused tensors in {}",
            report.unexpected.len(),
            path.display()
        );
    }
    let degraded = !report.is_complete();
    if degraded {
        if !config.allow_partial_weights {
            return Err(EcgError::ModelLoadIncomplete {
                model_path: path.display().to_string(),
                missing: report.missing,
            });
        }
        tracing::warn!(
            "Partial weight load from {}: {}",
            path.display(),
            report.summary(LOAD_REPORT_LIMIT)
        );
    } else {
        tracing::info!(
            "Loaded {} parameters from {}",
            report.loaded.len(),
            path.display()
        );
    }
    Ok(Arc::new(GraphNetClassifier::new(net, degraded)))
}

/// Inline thresholds win over a threshold file; with neither every class uses the
/// default.
fn load_thresholds(config: &CascadeConfig) -> Result<ThresholdTable, EcgError> {
    if let Some(map) = &config.thresholds {
        return ThresholdTable::new(map.clone(), config.default_threshold);
    }
    match &config.thresholds_path {
        Some(path) => ThresholdTable::from_npy(
            config.resolve_model_path(path),
            &config.class_names,
            config.default_threshold,
        ),
        None => Ok(ThresholdTable::uniform(config.default_threshold)),
    }
}
