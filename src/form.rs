//! Input form for the clinical indicators.
//!
//! Every numeric widget is bounded: values outside `[min, max]` are
//! rejected at entry, so anything that reaches the feature extractor is
//! within the form bounds. The form bounds are independent of the scaling
//! ranges used for normalization.

use crate::error::FormError;
use crate::types::patient::{ClinicalInputs, SevereLiverDisease};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::io::{BufRead, Write};
use tracing::debug;

/// Widget kind of a form field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Number { min: f64, max: f64, step: f64 },
    YesNo,
}

/// One form widget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn number(name: &'static str, min: f64, max: f64) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Number { min, max, step: 0.1 },
    }
}

/// Form widgets in display order, which is also the model column order
pub static FIELDS: [FieldSpec; 20] = [
    number("Charlson comorbidity index", 0.0, 13.0),
    number("Age", 19.0, 99.0),
    number("PT", 8.0, 145.0),
    number("INR", 0.7, 13.0),
    FieldSpec {
        name: ClinicalInputs::SEVERE_LIVER_DISEASE,
        kind: FieldKind::YesNo,
    },
    number("Temperature", 33.0, 40.0),
    number("Na+", 107.0, 159.0),
    number("SAPS II", 11.0, 152.0),
    number("RBC", 1.3, 6.1),
    number("CV", 1.2, 144.0),
    number("BUN", 2.0, 145.0),
    number("MBP", 50.0, 130.0),
    number("Aniongap", 5.5, 32.0),
    number("DBP", 55.0, 106.0),
    number("HCO3-", 19.0, 42.0),
    number("Glucose", 52.5, 419.5),
    number("SBP", 72.0, 179.0),
    number("Cl-", 75.0, 132.0),
    number("Hematocrit", 13.0, 55.0),
    number("Lactate", 0.0, 12.5),
];

impl FieldSpec {
    /// Look up a field by its form label
    pub fn find(name: &str) -> Option<&'static FieldSpec> {
        FIELDS.iter().find(|f| f.name == name)
    }

    /// Check a numeric entry against the widget bounds
    pub fn check(&self, value: f64) -> Result<f64, FormError> {
        match self.kind {
            FieldKind::Number { min, max, .. } => {
                if value.is_finite() && value >= min && value <= max {
                    Ok(value)
                } else {
                    Err(FormError::OutOfRange {
                        field: self.name,
                        value,
                        min,
                        max,
                    })
                }
            }
            FieldKind::YesNo => Err(FormError::InvalidChoice {
                field: self.name,
                input: value.to_string(),
            }),
        }
    }

    /// Parse typed text for this field and apply it to `inputs`
    pub fn apply_text(&self, inputs: &mut ClinicalInputs, text: &str) -> Result<(), FormError> {
        match self.kind {
            FieldKind::YesNo => {
                inputs.severe_liver_disease = SevereLiverDisease::parse(text)?;
            }
            FieldKind::Number { .. } => {
                let value: f64 = text.trim().parse().map_err(|_| FormError::NotANumber {
                    field: self.name,
                    input: text.trim().to_string(),
                })?;
                *inputs.numeric_mut(self.name)? = self.check(value)?;
            }
        }
        Ok(())
    }

    fn prompt_line(&self, inputs: &ClinicalInputs) -> String {
        match self.kind {
            FieldKind::Number { min, max, step } => {
                let current = inputs.to_row()[self.column()];
                format!("{} [{}..{}, step {}] ({:.2}): ", self.name, min, max, step, current)
            }
            FieldKind::YesNo => format!(
                "{} [No/Yes] ({}): ",
                self.name, inputs.severe_liver_disease
            ),
        }
    }

    fn column(&self) -> usize {
        FIELDS
            .iter()
            .position(|f| f.name == self.name)
            .unwrap_or_default()
    }
}

/// Values the form starts with: each number at its lower bound, "No" for the choice
pub fn default_inputs() -> ClinicalInputs {
    ClinicalInputs {
        charlson_comorbidity_index: 0.0,
        age: 19.0,
        pt: 8.0,
        inr: 0.7,
        severe_liver_disease: SevereLiverDisease::No,
        temperature: 33.0,
        sodium: 107.0,
        saps_ii: 11.0,
        rbc: 1.3,
        cv: 1.2,
        bun: 2.0,
        mbp: 50.0,
        anion_gap: 5.5,
        dbp: 55.0,
        bicarbonate: 19.0,
        glucose: 52.5,
        sbp: 72.0,
        chloride: 75.0,
        hematocrit: 13.0,
        lactate: 0.0,
    }
}

/// Build a submission from a JSON object keyed by form label.
///
/// Missing fields keep their form default.
pub fn from_json(value: &Value) -> Result<ClinicalInputs> {
    let object: &Map<String, Value> = value
        .as_object()
        .context("Submission must be a JSON object keyed by field name")?;

    let mut inputs = default_inputs();
    for (name, raw) in object {
        let spec = FieldSpec::find(name).ok_or_else(|| FormError::UnknownField(name.clone()))?;
        let text = match raw {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        spec.apply_text(&mut inputs, &text)?;
    }

    debug!(fields = object.len(), "Submission parsed from JSON");
    Ok(inputs)
}

/// Interactive terminal form.
///
/// Prompts every field in order; an empty answer keeps the current value
/// and invalid answers are re-prompted. Returns `None` when the user does
/// not submit (declines the final confirmation or input ends early).
pub struct Form<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Form<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn run(&mut self) -> Result<Option<ClinicalInputs>> {
        let mut inputs = default_inputs();
        writeln!(
            self.writer,
            "Please enter the following clinical indicators for prediction."
        )?;

        for spec in FIELDS.iter() {
            loop {
                write!(self.writer, "{}", spec.prompt_line(&inputs))?;
                self.writer.flush()?;

                let Some(line) = self.read_line()? else {
                    return Ok(None);
                };
                if line.is_empty() {
                    break;
                }
                match spec.apply_text(&mut inputs, &line) {
                    Ok(()) => break,
                    Err(e) => writeln!(self.writer, "  {}", e)?,
                }
            }
        }

        write!(self.writer, "Predict? [Y/n]: ")?;
        self.writer.flush()?;
        match self.read_line()? {
            Some(answer) if answer.is_empty() || answer.eq_ignore_ascii_case("y") => {
                Ok(Some(inputs))
            }
            Some(answer) if answer.eq_ignore_ascii_case("yes") => Ok(Some(inputs)),
            _ => Ok(None),
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .context("Failed to read form input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
