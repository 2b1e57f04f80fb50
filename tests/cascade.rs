//! End-to-end cascade behavior with scripted models.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ecg_cascade::core::config::CascadeConfig;
use ecg_cascade::core::errors::{EcgError, SimpleError};
use ecg_cascade::core::traits::{ImageScorer, MultiLabelClassifier};
use ecg_cascade::domain::{ClassProbabilities, ClassificationResult, DigitizedSignal, LeadGraph};
use ecg_cascade::pipeline::{CascadeBuilder, CascadeOrchestrator};
use image::{Rgb, RgbImage};
use safetensors::tensor::{Dtype, TensorView};
use serde_json::{Value, json};

#[derive(Debug)]
struct ScriptedScorer {
    probability: Option<f32>,
    calls: AtomicUsize,
}

impl ScriptedScorer {
    fn returning(p: f32) -> Arc<Self> {
        Arc::new(Self {
            probability: Some(p),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            probability: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageScorer for ScriptedScorer {
    fn score(&self, _image: &RgbImage) -> Result<f32, EcgError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.probability.ok_or_else(|| {
            EcgError::inference_error("scripted", "scripted failure", SimpleError::new("boom"))
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Debug)]
struct ScriptedClassifier {
    class_names: Vec<String>,
    probabilities: Vec<f32>,
    calls: AtomicUsize,
    last_signal_range: std::sync::Mutex<Option<(f32, f32)>>,
}

impl ScriptedClassifier {
    fn new(probabilities: &[f32]) -> Arc<Self> {
        Arc::new(Self {
            class_names: CascadeConfig::default().class_names,
            probabilities: probabilities.to_vec(),
            calls: AtomicUsize::new(0),
            last_signal_range: std::sync::Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MultiLabelClassifier for ScriptedClassifier {
    fn classify(
        &self,
        signal: &DigitizedSignal,
        graph: &LeadGraph,
    ) -> Result<ClassProbabilities, EcgError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(signal.view().dim(), (1000, 12));
        assert_eq!(graph.lead_count(), 12);
        *self.last_signal_range.lock().unwrap() = Some(signal.range());
        ClassProbabilities::new(&self.class_names, &self.probabilities)
    }

    fn class_names(&self) -> &[String] {
        &self.class_names
    }
}

struct Harness {
    cascade: CascadeOrchestrator,
    validator: Arc<ScriptedScorer>,
    screen: Arc<ScriptedScorer>,
    classifier: Arc<ScriptedClassifier>,
    _dir: tempfile::TempDir,
}

fn harness(
    validator: Arc<ScriptedScorer>,
    screen: Arc<ScriptedScorer>,
    classifier: Arc<ScriptedClassifier>,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = CascadeConfig::default().with_model_dir(dir.path());
    let cascade = CascadeBuilder::new(config)
        .validator_scorer(Some(validator.clone() as Arc<dyn ImageScorer>))
        .binary_scorer(screen.clone())
        .classifier(classifier.clone())
        .build()
        .unwrap();
    Harness {
        cascade,
        validator,
        screen,
        classifier,
        _dir: dir,
    }
}

fn ecg_like_image() -> RgbImage {
    let mut img = RgbImage::from_pixel(400, 360, Rgb([255, 255, 255]));
    for band in 0..12u32 {
        let base = band * 30 + 15;
        for x in 0..400u32 {
            let y = base as f32 + 8.0 * ((x as f32) * 0.1).sin();
            img.put_pixel(x, y as u32, Rgb([0, 0, 0]));
        }
    }
    img
}

fn to_value(result: &ClassificationResult) -> Value {
    serde_json::from_str(&result.to_json().unwrap()).unwrap()
}

#[test]
fn test_normal_screen_skips_multilabel_stage() {
    let h = harness(
        ScriptedScorer::returning(0.99),
        ScriptedScorer::returning(0.35),
        ScriptedClassifier::new(&[0.9; 5]),
    );
    let result = h.cascade.classify_image(&ecg_like_image());

    match &result {
        ClassificationResult::NormalByScreen { confidence } => {
            assert!((confidence - 0.65).abs() < 1e-6)
        }
        other => panic!("expected NormalByScreen, got {:?}", other),
    }
    assert_eq!(h.classifier.calls(), 0);
    assert_eq!(to_value(&result)["confidence"], json!(0.65));
    assert_eq!(to_value(&result)["prediction"], json!("NORMAL"));
}

#[test]
fn test_abnormal_screen_runs_multilabel_stage() {
    let h = harness(
        ScriptedScorer::returning(0.99),
        ScriptedScorer::returning(0.4),
        ScriptedClassifier::new(&[0.1, 0.8, 0.55, 0.2, 0.49]),
    );
    let result = h.cascade.classify_image(&ecg_like_image());
    assert_eq!(h.classifier.calls(), 1);

    let value = to_value(&result);
    assert_eq!(value["stage"], json!("MULTI"));
    assert_eq!(value["prediction"], json!(["MI", "HYP"]));
    assert_eq!(value["risk_level"], json!("High"));
    assert_eq!(value["binary_abnormal_prob"], json!(0.4));
    assert_eq!(value["degraded"], json!(false));
    assert_eq!(
        value["probabilities"],
        json!({"NORM": 0.1, "MI": 0.8, "HYP": 0.55, "STTC": 0.2, "CD": 0.49})
    );
}

#[test]
fn test_nothing_above_threshold_yields_sentinel() {
    let h = harness(
        ScriptedScorer::returning(0.99),
        ScriptedScorer::returning(0.9),
        ScriptedClassifier::new(&[0.1; 5]),
    );
    let value = to_value(&h.cascade.classify_image(&ecg_like_image()));
    assert_eq!(value["prediction"], json!(["ABNORMAL"]));
    assert_eq!(value["risk_level"], json!("Moderate"));
}

#[test]
fn test_validator_rejection_stops_cascade() {
    let h = harness(
        ScriptedScorer::returning(0.2),
        ScriptedScorer::returning(0.9),
        ScriptedClassifier::new(&[0.9; 5]),
    );
    let result = h.cascade.classify_image(&ecg_like_image());
    assert_eq!(
        result,
        ClassificationResult::Rejected {
            validation_confidence: 0.2
        }
    );
    assert_eq!(h.validator.calls(), 1);
    assert_eq!(h.screen.calls(), 0);
    assert_eq!(to_value(&result)["validation_confidence"], json!(20.0));
}

#[test]
fn test_validator_failure_accepts_image() {
    let h = harness(
        ScriptedScorer::failing(),
        ScriptedScorer::returning(0.1),
        ScriptedClassifier::new(&[0.9; 5]),
    );
    let result = h.cascade.classify_image(&ecg_like_image());
    assert!(matches!(result, ClassificationResult::NormalByScreen { .. }));
    assert_eq!(h.screen.calls(), 1);
}

#[test]
fn test_screen_failure_is_failed_result() {
    let h = harness(
        ScriptedScorer::returning(0.99),
        ScriptedScorer::failing(),
        ScriptedClassifier::new(&[0.9; 5]),
    );
    let result = h.cascade.classify_image(&ecg_like_image());
    let value = to_value(&result);
    assert_eq!(value["success"], json!(false));
    assert!(
        value["message"]
            .as_str()
            .unwrap()
            .starts_with("Prediction failed: ")
    );
    assert_eq!(h.classifier.calls(), 0);
    assert_eq!(h.cascade.stats().failed, 1);
}

#[test]
fn test_all_black_image_digitizes_to_zero() {
    let h = harness(
        ScriptedScorer::returning(0.99),
        ScriptedScorer::returning(0.9),
        ScriptedClassifier::new(&[0.9; 5]),
    );
    let black = RgbImage::new(320, 240);
    let result = h.cascade.classify_image(&black);
    assert!(matches!(result, ClassificationResult::MultiLabel { .. }));
    assert_eq!(
        *h.classifier.last_signal_range.lock().unwrap(),
        Some((0.0, 0.0))
    );
}

#[test]
fn test_classify_from_file_and_bad_paths() {
    let h = harness(
        ScriptedScorer::returning(0.99),
        ScriptedScorer::returning(0.7),
        ScriptedClassifier::new(&[0.9; 5]),
    );
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ecg.png");
    ecg_like_image().save(&path).unwrap();

    let result = h.cascade.classify(&path);
    assert!(matches!(result, ClassificationResult::MultiLabel { .. }));

    let missing = h.cascade.classify(Path::new("/nonexistent/ecg.png"));
    assert!(matches!(missing, ClassificationResult::Failed { .. }));

    let stats = h.cascade.stats();
    assert_eq!(stats.total_processed, 2);
    assert_eq!(stats.multi_label, 1);
    assert_eq!(stats.failed, 1);
}

#[test]
fn test_orchestrator_is_shareable_across_threads() {
    let h = harness(
        ScriptedScorer::returning(0.99),
        ScriptedScorer::returning(0.1),
        ScriptedClassifier::new(&[0.9; 5]),
    );
    let image = ecg_like_image();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let result = h.cascade.classify_image(&image);
                assert!(result.is_success());
            });
        }
    });
    assert_eq!(h.cascade.stats().total_processed, 4);
}

#[test]
fn test_partial_native_weights_mark_result_degraded() {
    let dir = tempfile::tempdir().unwrap();
    // Only the output bias is present; every other parameter stays zero.
    let bias: Vec<u8> = [0.0f32, 3.0, -3.0, 0.0, 0.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let views: HashMap<String, TensorView<'_>> = [(
        "fc.3.bias".to_string(),
        TensorView::new(Dtype::F32, vec![5], &bias).unwrap(),
    )]
    .into_iter()
    .collect();
    std::fs::write(
        dir.path().join("multilabel.safetensors"),
        safetensors::serialize(&views, &None).unwrap(),
    )
    .unwrap();

    let mut config = CascadeConfig::default().with_model_dir(dir.path());
    config.allow_partial_weights = true;
    let cascade = CascadeBuilder::new(config)
        .validator_scorer(None)
        .binary_scorer(ScriptedScorer::returning(0.8))
        .build()
        .unwrap();
    assert!(cascade.context().classifier.is_degraded());

    let value = to_value(&cascade.classify_image(&ecg_like_image()));
    assert_eq!(value["stage"], json!("MULTI"));
    assert_eq!(value["degraded"], json!(true));
    assert_eq!(value["probabilities"]["MI"], json!(0.953));
    assert_eq!(value["probabilities"]["HYP"], json!(0.047));
    assert_eq!(value["prediction"], json!(["NORM", "MI", "STTC", "CD"]));
    assert_eq!(cascade.stats().degraded, 1);
}
