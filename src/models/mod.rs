//! Model provisioning and inference components

pub mod inference;
pub mod loader;
pub mod provisioner;

pub use inference::{InferenceEngine, OnnxClassifier, RiskClassifier};
pub use loader::ModelLoader;
pub use provisioner::{ModelProvisioner, Provisioned};
