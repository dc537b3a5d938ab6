//! 28-day all-cause mortality risk prediction.
//!
//! Collects clinical indicators through a bounded input form, min-max
//! normalizes them and scores them with a pre-trained ONNX classifier
//! that is downloaded on first use.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod form;
pub mod models;
pub mod session;
pub mod types;

pub use config::AppConfig;
pub use error::FormError;
pub use feature_extractor::{FeatureExtractor, FeatureVector};
pub use form::Form;
pub use models::inference::InferenceEngine;
pub use models::provisioner::ModelProvisioner;
pub use session::{run_session, SubmissionSource};
pub use types::{assessment::RiskAssessment, patient::ClinicalInputs};
