//! Type definitions for the mortality risk predictor

pub mod assessment;
pub mod patient;

pub use assessment::{RiskAssessment, RiskLabel, Severity};
pub use patient::{ClinicalInputs, SevereLiverDisease};
