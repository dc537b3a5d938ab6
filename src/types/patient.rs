//! Clinical input record collected by the prediction form

use crate::error::FormError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary "Severe liver disease" choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SevereLiverDisease {
    #[default]
    No,
    Yes,
}

impl SevereLiverDisease {
    /// Model encoding: Yes = 1, No = 0
    pub fn encode(self) -> f64 {
        match self {
            SevereLiverDisease::No => 0.0,
            SevereLiverDisease::Yes => 1.0,
        }
    }

    /// Parse a form answer (case-insensitive "yes"/"no", or "1"/"0")
    pub fn parse(input: &str) -> Result<Self, FormError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "no" | "n" | "0" => Ok(SevereLiverDisease::No),
            "yes" | "y" | "1" => Ok(SevereLiverDisease::Yes),
            _ => Err(FormError::InvalidChoice {
                field: ClinicalInputs::SEVERE_LIVER_DISEASE,
                input: input.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for SevereLiverDisease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SevereLiverDisease::No => write!(f, "No"),
            SevereLiverDisease::Yes => write!(f, "Yes"),
        }
    }
}

/// Raw (unnormalized) values of one form submission.
///
/// Field names serialize to the clinical labels shown on the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalInputs {
    #[serde(rename = "Charlson comorbidity index")]
    pub charlson_comorbidity_index: f64,
    #[serde(rename = "Age")]
    pub age: f64,
    #[serde(rename = "PT")]
    pub pt: f64,
    #[serde(rename = "INR")]
    pub inr: f64,
    #[serde(rename = "Severe liver disease")]
    pub severe_liver_disease: SevereLiverDisease,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Na+")]
    pub sodium: f64,
    #[serde(rename = "SAPS II")]
    pub saps_ii: f64,
    #[serde(rename = "RBC")]
    pub rbc: f64,
    #[serde(rename = "CV")]
    pub cv: f64,
    #[serde(rename = "BUN")]
    pub bun: f64,
    #[serde(rename = "MBP")]
    pub mbp: f64,
    #[serde(rename = "Aniongap")]
    pub anion_gap: f64,
    #[serde(rename = "DBP")]
    pub dbp: f64,
    #[serde(rename = "HCO3-")]
    pub bicarbonate: f64,
    #[serde(rename = "Glucose")]
    pub glucose: f64,
    #[serde(rename = "SBP")]
    pub sbp: f64,
    #[serde(rename = "Cl-")]
    pub chloride: f64,
    #[serde(rename = "Hematocrit")]
    pub hematocrit: f64,
    #[serde(rename = "Lactate")]
    pub lactate: f64,
}

impl ClinicalInputs {
    pub const SEVERE_LIVER_DISEASE: &'static str = "Severe liver disease";

    /// Raw values in model column order, with the liver disease choice encoded
    pub fn to_row(&self) -> [f64; 20] {
        [
            self.charlson_comorbidity_index,
            self.age,
            self.pt,
            self.inr,
            self.severe_liver_disease.encode(),
            self.temperature,
            self.sodium,
            self.saps_ii,
            self.rbc,
            self.cv,
            self.bun,
            self.mbp,
            self.anion_gap,
            self.dbp,
            self.bicarbonate,
            self.glucose,
            self.sbp,
            self.chloride,
            self.hematocrit,
            self.lactate,
        ]
    }

    /// Mutable access to a numeric field by its form label
    pub fn numeric_mut(&mut self, name: &str) -> Result<&mut f64, FormError> {
        let slot = match name {
            "Charlson comorbidity index" => &mut self.charlson_comorbidity_index,
            "Age" => &mut self.age,
            "PT" => &mut self.pt,
            "INR" => &mut self.inr,
            "Temperature" => &mut self.temperature,
            "Na+" => &mut self.sodium,
            "SAPS II" => &mut self.saps_ii,
            "RBC" => &mut self.rbc,
            "CV" => &mut self.cv,
            "BUN" => &mut self.bun,
            "MBP" => &mut self.mbp,
            "Aniongap" => &mut self.anion_gap,
            "DBP" => &mut self.dbp,
            "HCO3-" => &mut self.bicarbonate,
            "Glucose" => &mut self.glucose,
            "SBP" => &mut self.sbp,
            "Cl-" => &mut self.chloride,
            "Hematocrit" => &mut self.hematocrit,
            "Lactate" => &mut self.lactate,
            other => return Err(FormError::UnknownField(other.to_string())),
        };
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liver_disease_encoding() {
        assert_eq!(SevereLiverDisease::Yes.encode(), 1.0);
        assert_eq!(SevereLiverDisease::No.encode(), 0.0);
        assert_eq!(SevereLiverDisease::default(), SevereLiverDisease::No);
    }

    #[test]
    fn test_liver_disease_parse() {
        assert_eq!(SevereLiverDisease::parse("Yes").unwrap(), SevereLiverDisease::Yes);
        assert_eq!(SevereLiverDisease::parse(" no ").unwrap(), SevereLiverDisease::No);
        assert!(matches!(
            SevereLiverDisease::parse("maybe"),
            Err(FormError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn test_serializes_with_form_labels() {
        let inputs = crate::form::default_inputs();
        let json = serde_json::to_value(&inputs).unwrap();
        assert_eq!(json["Na+"], 107.0);
        assert_eq!(json["Severe liver disease"], "No");
        assert_eq!(json.as_object().unwrap().len(), 20);
    }

    #[test]
    fn test_numeric_mut_rejects_choice_and_unknown() {
        let mut inputs = crate::form::default_inputs();
        *inputs.numeric_mut("HCO3-").unwrap() = 24.0;
        assert_eq!(inputs.bicarbonate, 24.0);
        assert!(inputs.numeric_mut("Severe liver disease").is_err());
        assert_eq!(
            inputs.numeric_mut("Weight"),
            Err(FormError::UnknownField("Weight".to_string()))
        );
    }
}
