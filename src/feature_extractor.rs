//! Feature extraction for mortality model inference.
//!
//! Raw form values are min-max scaled with constants fixed at training
//! time. The constants are independent of the form bounds and the result
//! is not clamped, so a value at a form bound may land slightly outside
//! `[0, 1]` (e.g. HCO3- = 42 scales to ~1.02).

use crate::types::patient::ClinicalInputs;

/// Min-max scaling range of one feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

impl ScaleRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn apply(&self, x: f64) -> f64 {
        norm(x, self.min, self.max)
    }
}

/// Linear min-max rescaling
pub fn norm(x: f64, xmin: f64, xmax: f64) -> f64 {
    (x - xmin) / (xmax - xmin)
}

/// Model columns in order, with the scaling applied to each.
/// `None` columns are passed through unchanged.
pub const COLUMNS: [(&str, Option<ScaleRange>); 20] = [
    ("Charlson comorbidity index", Some(ScaleRange::new(0.0, 13.0))),
    ("Age", Some(ScaleRange::new(18.10, 98.65))),
    ("PT", Some(ScaleRange::new(8.7, 144.63))),
    ("INR", Some(ScaleRange::new(0.7, 12.63))),
    ("Severe liver disease", None),
    ("Temperature", Some(ScaleRange::new(33.19, 39.67))),
    ("Na+", Some(ScaleRange::new(107.33, 158.75))),
    ("SAPS II", Some(ScaleRange::new(11.0, 152.0))),
    ("RBC", Some(ScaleRange::new(1.33, 6.12))),
    ("CV", Some(ScaleRange::new(1.25, 143.73))),
    ("BUN", Some(ScaleRange::new(2.0, 145.33))),
    ("MBP", Some(ScaleRange::new(50.69, 130.19))),
    ("Aniongap", Some(ScaleRange::new(5.5, 32.33))),
    ("DBP", Some(ScaleRange::new(55.59, 105.83))),
    ("HCO3-", Some(ScaleRange::new(9.0, 41.33))),
    ("Glucose", Some(ScaleRange::new(52.5, 419.5))),
    ("SBP", Some(ScaleRange::new(72.64, 178.93))),
    ("Cl-", Some(ScaleRange::new(75.17, 132.0))),
    ("Hematocrit", Some(ScaleRange::new(13.0, 54.6))),
    ("Lactate", Some(ScaleRange::new(-0.1, 12.46))),
];

/// Single-row model input
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of a column by name
    pub fn get(&self, name: &str) -> Option<f64> {
        COLUMNS
            .iter()
            .position(|(column, _)| *column == name)
            .and_then(|i| self.values.get(i).copied())
    }

    /// Row as `f32`, the element type of the ONNX input tensor
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Transforms a form submission into model input features.
///
/// Features are produced in the exact column order the classifier was
/// trained on.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Scale a submission into a feature vector
    pub fn extract(&self, inputs: &ClinicalInputs) -> FeatureVector {
        let values = inputs
            .to_row()
            .iter()
            .zip(COLUMNS.iter())
            .map(|(&raw, (_, scale))| match scale {
                Some(range) => range.apply(raw),
                None => raw,
            })
            .collect();

        FeatureVector { values }
    }

    pub fn feature_count(&self) -> usize {
        COLUMNS.len()
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        COLUMNS.iter().map(|(name, _)| *name).collect()
    }

    /// Scaling range for a column, `None` for pass-through columns
    pub fn scale_range(&self, name: &str) -> Option<ScaleRange> {
        COLUMNS
            .iter()
            .find(|(column, _)| *column == name)
            .and_then(|(_, scale)| *scale)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{default_inputs, FIELDS};
    use crate::types::patient::SevereLiverDisease;

    #[test]
    fn test_columns_match_form_order() {
        let extractor = FeatureExtractor::new();
        let form_names: Vec<&str> = FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(extractor.feature_names(), form_names);
        assert_eq!(extractor.feature_count(), 20);
    }

    #[test]
    fn test_only_liver_disease_passes_through() {
        let scaled = COLUMNS.iter().filter(|(_, s)| s.is_some()).count();
        assert_eq!(scaled, 19);
        assert_eq!(FeatureExtractor::new().scale_range("Severe liver disease"), None);
    }

    #[test]
    fn test_scaling_constants() {
        let expected: [(&str, Option<(f64, f64)>); 20] = [
            ("Charlson comorbidity index", Some((0.0, 13.0))),
            ("Age", Some((18.10, 98.65))),
            ("PT", Some((8.7, 144.63))),
            ("INR", Some((0.7, 12.63))),
            ("Severe liver disease", None),
            ("Temperature", Some((33.19, 39.67))),
            ("Na+", Some((107.33, 158.75))),
            ("SAPS II", Some((11.0, 152.0))),
            ("RBC", Some((1.33, 6.12))),
            ("CV", Some((1.25, 143.73))),
            ("BUN", Some((2.0, 145.33))),
            ("MBP", Some((50.69, 130.19))),
            ("Aniongap", Some((5.5, 32.33))),
            ("DBP", Some((55.59, 105.83))),
            ("HCO3-", Some((9.0, 41.33))),
            ("Glucose", Some((52.5, 419.5))),
            ("SBP", Some((72.64, 178.93))),
            ("Cl-", Some((75.17, 132.0))),
            ("Hematocrit", Some((13.0, 54.6))),
            ("Lactate", Some((-0.1, 12.46))),
        ];

        for (i, (name, range)) in expected.iter().enumerate() {
            let (column, scale) = COLUMNS[i];
            assert_eq!(column, *name, "column {}", i);
            assert_eq!(scale.map(|r| (r.min, r.max)), *range, "{}", name);
        }
    }

    #[test]
    fn test_hand_computed_values() {
        let mut inputs = default_inputs();
        inputs.age = 50.0;
        inputs.cv = 72.49;
        inputs.bicarbonate = 25.165;
        inputs.lactate = 6.18;
        inputs.sodium = 140.0;

        let features = FeatureExtractor::new().extract(&inputs);

        let close = |name: &str, expected: f64| {
            let actual = features.get(name).unwrap();
            assert!((actual - expected).abs() < 1e-12, "{}: {} != {}", name, actual, expected);
        };
        close("Age", (50.0 - 18.1) / 80.55);
        close("CV", (72.49 - 1.25) / 142.48);
        close("HCO3-", (25.165 - 9.0) / 32.33);
        close("Lactate", (6.18 + 0.1) / 12.56);
        close("Na+", (140.0 - 107.33) / 51.42);
        // Roughly mid-range for the values chosen near the middle
        assert!((features.get("Age").unwrap() - 0.396).abs() < 1e-3);
        assert!((features.get("HCO3-").unwrap() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_norm_formula() {
        for (name, scale) in COLUMNS.iter() {
            if let Some(r) = scale {
                let x = (r.min + r.max) / 3.0;
                assert_eq!(r.apply(x), (x - r.min) / (r.max - r.min), "{}", name);
            }
        }
    }

    #[test]
    fn test_norm_endpoints() {
        for (name, scale) in COLUMNS.iter() {
            if let Some(r) = scale {
                assert_eq!(r.apply(r.min), 0.0, "{}", name);
                assert_eq!(r.apply(r.max), 1.0, "{}", name);
            }
        }
    }

    #[test]
    fn test_extract_values() {
        let mut inputs = default_inputs();
        inputs.age = 98.65;
        inputs.severe_liver_disease = SevereLiverDisease::Yes;

        let features = FeatureExtractor::new().extract(&inputs);

        assert_eq!(features.len(), 20);
        assert_eq!(features.get("Age"), Some(1.0));
        assert_eq!(features.get("Severe liver disease"), Some(1.0));
        assert_eq!(features.get("Charlson comorbidity index"), Some(0.0));
        assert_eq!(features.get("Unknown"), None);
    }

    #[test]
    fn test_not_clamped() {
        let mut inputs = default_inputs();
        inputs.bicarbonate = 42.0;
        inputs.age = 19.0;

        let features = FeatureExtractor::new().extract(&inputs);

        assert!(features.get("HCO3-").unwrap() > 1.0);
        // Age lower form bound sits above the scaling minimum
        assert!(features.get("Age").unwrap() > 0.0);
        // Lactate = 0 sits above the scaling minimum of -0.1
        assert_eq!(features.get("Lactate"), Some(norm(0.0, -0.1, 12.46)));
    }

    #[test]
    fn test_extract_is_pure() {
        let extractor = FeatureExtractor::new();
        let inputs = default_inputs();
        let first = extractor.extract(&inputs);
        let second = extractor.extract(&inputs);
        assert_eq!(first, second);
        assert_eq!(first.to_f32().len(), 20);
    }
}
