//! Risk assessment produced for one form submission

use crate::types::patient::ClinicalInputs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicted mortality risk class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    Low,
    High,
}

impl RiskLabel {
    /// Map the classifier's class label (0 = survived, otherwise died)
    pub fn from_class(class: i64) -> Self {
        if class == 0 {
            RiskLabel::Low
        } else {
            RiskLabel::High
        }
    }
}

/// How the result panel is styled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Alert,
}

/// Shown in the result panel when the form was not submitted
pub const NO_SUBMISSION_WARNING: &str =
    "Please enter the relevant information and then press Predict.";

/// Positive-class probability as a percentage with two decimals, e.g. `12.34 %`
pub fn format_probability(probability: f64) -> String {
    format!("{:.2} %", probability * 100.0)
}

/// Outcome of running the classifier on one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Unique assessment identifier
    pub assessment_id: String,

    /// Predicted risk class
    pub label: RiskLabel,

    /// Probability of 28-day death (0.0 - 1.0)
    pub probability: f64,

    /// Probability rendered for display
    pub probability_display: String,

    /// Raw inputs the prediction was made from
    pub inputs: ClinicalInputs,

    /// Assessment timestamp
    pub timestamp: DateTime<Utc>,
}

impl RiskAssessment {
    pub fn new(label: RiskLabel, probability: f64, inputs: ClinicalInputs) -> Self {
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            label,
            probability,
            probability_display: format_probability(probability),
            inputs,
            timestamp: Utc::now(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self.label {
            RiskLabel::Low => Severity::Info,
            RiskLabel::High => Severity::Alert,
        }
    }

    /// Message shown in the result panel
    pub fn message(&self) -> String {
        match self.label {
            RiskLabel::Low => format!(
                "This patient has a low death risk with probability of {}.",
                self.probability_display
            ),
            RiskLabel::High => format!(
                "This patient is at high death risk with probability of {}!",
                self.probability_display
            ),
        }
    }
}

impl fmt::Display for RiskAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity() {
            Severity::Info => "[info]",
            Severity::Alert => "[ALERT]",
        };
        write!(f, "{} {}", tag, self.message())
    }
}
