//! Mortality classifier inference

use crate::feature_extractor::{FeatureExtractor, FeatureVector};
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::types::assessment::{RiskAssessment, RiskLabel};
use crate::types::patient::ClinicalInputs;
use anyhow::{anyhow, Context, Result};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// A pre-trained binary classifier.
///
/// The model is opaque: only its class label and positive-class
/// probability are used.
pub trait RiskClassifier {
    /// Predicted class (0 = low risk, 1 = high risk)
    fn predict(&self, features: &FeatureVector) -> Result<i64>;

    /// Probability of class 1
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64>;
}

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    /// `Session::run` needs exclusive access
    model: Mutex<LoadedModel>,
}

impl OnnxClassifier {
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let model = ModelLoader::with_threads(onnx_threads).load(path)?;
        Ok(Self {
            model: Mutex::new(model),
        })
    }

    /// Run the session once and hand the outputs to `extract`
    fn run<T>(
        &self,
        features: &FeatureVector,
        extract: impl FnOnce(&ort::session::SessionOutputs, &LoadedNames) -> Result<T>,
    ) -> Result<T> {
        let row = features.to_f32();
        let shape = vec![1_i64, row.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, row)).context("Failed to create input tensor")?;

        let mut model = self
            .model
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;

        let names = LoadedNames {
            label: model.label_name.clone(),
            probability: model.probability_name.clone(),
        };
        let input_name = model.input_name.clone();

        let outputs = model
            .session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .context("Model inference failed")?;

        extract(&outputs, &names)
    }
}

struct LoadedNames {
    label: String,
    probability: String,
}

impl RiskClassifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        self.run(features, |outputs, names| {
            let output = outputs
                .get(names.label.as_str())
                .ok_or_else(|| anyhow!("Model has no '{}' output", names.label))?;
            let (_, data) = output
                .try_extract_tensor::<i64>()
                .context("Label output is not an int64 tensor")?;
            data.first()
                .copied()
                .ok_or_else(|| anyhow!("Empty label output"))
        })
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        self.run(features, |outputs, names| extract_probability(outputs, &names.probability))
    }
}

/// Extract the class-1 probability from model output.
/// Handles both tensor outputs and seq(map) outputs (sklearn ZipMap).
fn extract_probability(outputs: &ort::session::SessionOutputs, output_name: &str) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        let dtype = output.dtype();

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return probability_from_tensor(&dims, data);
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            return probability_from_sequence_map(output);
        }
    }

    // Fallback: first non-label output that yields a probability
    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            debug!(output = %name, "Probability extracted from fallback output");
            return probability_from_tensor(&dims, data);
        }
        if DynSequenceValueType::can_downcast(&output.dtype()) {
            if let Ok(prob) = probability_from_sequence_map(&output) {
                return Ok(prob);
            }
        }
    }

    Err(anyhow!("Could not extract a probability from model outputs"))
}

/// seq(map(int64, float)), the sklearn-onnx ZipMap layout
fn probability_from_sequence_map(output: &ort::value::DynValue) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let first = maps.first().ok_or_else(|| anyhow!("Empty sequence"))?;

    let kv_pairs = first.try_extract_key_values::<i64, f32>()?;
    class_one_probability(&kv_pairs)
}

fn class_one_probability(kv_pairs: &[(i64, f32)]) -> Result<f64> {
    if let Some((_, prob)) = kv_pairs.iter().find(|(class, _)| *class == 1) {
        return Ok(*prob as f64);
    }
    if let Some((_, prob)) = kv_pairs.iter().find(|(class, _)| *class == 0) {
        return Ok(1.0 - *prob as f64);
    }
    Err(anyhow!("No class probability found in map"))
}

/// `[1, n_classes]`, `[n_classes]` or a single probability
fn probability_from_tensor(dims: &[i64], data: &[f32]) -> Result<f64> {
    let classes = dims.last().copied().unwrap_or(0);
    match (classes, data) {
        (c, [_, p1, ..]) if c >= 2 => Ok(*p1 as f64),
        (1, [p]) => Ok(*p as f64),
        _ => {
            warn!(dims = ?dims, "Unexpected probability tensor shape");
            data.last()
                .map(|&v| v as f64)
                .ok_or_else(|| anyhow!("Empty probability output"))
        }
    }
}

/// Runs one submission through normalization and the classifier
pub struct InferenceEngine<C> {
    extractor: FeatureExtractor,
    classifier: C,
}

impl InferenceEngine<OnnxClassifier> {
    /// Load the cached ONNX model
    pub fn from_model_file<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        Ok(Self::new(OnnxClassifier::load(path, onnx_threads)?))
    }
}

impl<C: RiskClassifier> InferenceEngine<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            classifier,
        }
    }

    /// Normalize the submission, classify it and build the assessment
    pub fn assess(&self, inputs: &ClinicalInputs) -> Result<RiskAssessment> {
        let features = self.extractor.extract(inputs);
        debug!(features = ?features.values(), "Feature vector built");

        let class = self.classifier.predict(&features)?;
        let probability = self.classifier.predict_proba(&features)?;
        let assessment = RiskAssessment::new(RiskLabel::from_class(class), probability, inputs.clone());

        info!(
            assessment_id = %assessment.assessment_id,
            label = ?assessment.label,
            probability = assessment.probability,
            "Risk assessment complete"
        );

        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::default_inputs;

    /// Logistic model over the feature sum, thresholded at 0.5
    struct StubClassifier;

    impl StubClassifier {
        fn score(features: &FeatureVector) -> f64 {
            let z: f64 = features.values().iter().sum::<f64>() - 2.0;
            1.0 / (1.0 + (-z).exp())
        }
    }

    impl RiskClassifier for StubClassifier {
        fn predict(&self, features: &FeatureVector) -> Result<i64> {
            Ok(if Self::score(features) >= 0.5 { 1 } else { 0 })
        }

        fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
            Ok(Self::score(features))
        }
    }

    struct FailingClassifier;

    impl RiskClassifier for FailingClassifier {
        fn predict(&self, _: &FeatureVector) -> Result<i64> {
            Err(anyhow!("corrupt model"))
        }

        fn predict_proba(&self, _: &FeatureVector) -> Result<f64> {
            Err(anyhow!("corrupt model"))
        }
    }

    fn is_percentage(s: &str) -> bool {
        let Some(number) = s.strip_suffix(" %") else {
            return false;
        };
        let Some((whole, frac)) = number.split_once('.') else {
            return false;
        };
        !whole.is_empty()
            && whole.chars().all(|c| c.is_ascii_digit())
            && frac.len() == 2
            && frac.chars().all(|c| c.is_ascii_digit())
    }

    #[test]
    fn test_default_inputs_are_deterministic() {
        let engine = InferenceEngine::new(StubClassifier);
        let first = engine.assess(&default_inputs()).unwrap();
        let second = engine.assess(&default_inputs()).unwrap();

        assert_eq!(first.label, second.label);
        assert_eq!(first.probability_display, second.probability_display);
        assert!(is_percentage(&first.probability_display));
    }

    #[test]
    fn test_high_risk_inputs() {
        let mut inputs = default_inputs();
        inputs.saps_ii = 152.0;
        inputs.lactate = 12.46;
        inputs.bun = 145.33;

        let assessment = InferenceEngine::new(StubClassifier).assess(&inputs).unwrap();
        assert_eq!(assessment.label, RiskLabel::High);
        assert!(assessment.message().ends_with('!'));
    }

    #[test]
    fn test_classifier_errors_propagate() {
        let engine = InferenceEngine::new(FailingClassifier);
        assert!(engine.assess(&default_inputs()).is_err());
    }

    #[test]
    fn test_probability_from_tensor_shapes() {
        assert_eq!(probability_from_tensor(&[1, 2], &[0.25, 0.75]).unwrap(), 0.75);
        assert_eq!(probability_from_tensor(&[2], &[0.4, 0.6]).unwrap(), 0.6f32 as f64);
        assert_eq!(probability_from_tensor(&[1, 1], &[0.3]).unwrap(), 0.3f32 as f64);
        assert!(probability_from_tensor(&[0], &[]).is_err());
    }

    #[test]
    fn test_class_one_probability() {
        assert_eq!(class_one_probability(&[(0, 0.25), (1, 0.75)]).unwrap(), 0.75);
        assert_eq!(class_one_probability(&[(0, 0.25)]).unwrap(), 0.75);
        assert!(class_one_probability(&[]).is_err());
    }

    #[test]
    fn test_is_percentage() {
        assert!(is_percentage("12.34 %"));
        assert!(is_percentage("5.00 %"));
        assert!(!is_percentage("12.3 %"));
        assert!(!is_percentage("12.34%"));
    }
}
