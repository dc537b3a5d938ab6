//! One prediction session: provisioning gate, submission, assessment.
//!
//! The form is only reached once the model file is in place. A failed
//! download writes the author-contact message and returns before any
//! input is collected.

use crate::form::{self, Form};
use crate::models::inference::{InferenceEngine, RiskClassifier};
use crate::models::provisioner::{ModelProvisioner, PROVISION_FAILED, PROVISION_OK};
use crate::types::assessment::{RiskAssessment, NO_SUBMISSION_WARNING};
use anyhow::Result;
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{error, info};

/// Where the submission comes from
pub enum SubmissionSource<R> {
    /// Interactive form read from `R`
    Form(R),
    /// Pre-filled JSON object keyed by field name
    Json(Value),
}

/// Run the gate, collect the submission and assess it.
///
/// `load` builds the classifier from the provisioned model path and is only
/// called when there is a submission. Returns `Ok(None)` when the form was
/// not submitted.
pub async fn run_session<R, W, C, L>(
    provisioner: &ModelProvisioner,
    source: SubmissionSource<R>,
    mut writer: W,
    load: L,
) -> Result<Option<RiskAssessment>>
where
    R: BufRead,
    W: Write,
    C: RiskClassifier,
    L: FnOnce(&Path) -> Result<C>,
{
    match provisioner.ensure().await {
        Ok(outcome) => {
            info!(outcome = ?outcome, "Model ready");
            writeln!(writer, "{}", PROVISION_OK)?;
        }
        Err(e) => {
            error!(error = %e, path = %provisioner.path().display(), "Model provisioning failed");
            writeln!(writer, "{}", PROVISION_FAILED)?;
            return Err(e);
        }
    }

    let submission = match source {
        SubmissionSource::Form(reader) => Form::new(reader, &mut writer).run()?,
        SubmissionSource::Json(value) => Some(form::from_json(&value)?),
    };

    let Some(inputs) = submission else {
        info!("Form not submitted");
        return Ok(None);
    };

    let engine = InferenceEngine::new(load(provisioner.path())?);
    Ok(Some(engine.assess(&inputs)?))
}

/// Text of the result panel, or a JSON document when `json` is set
pub fn render_result(result: Option<&RiskAssessment>, json: bool) -> Result<String> {
    let rendered = match (result, json) {
        (Some(assessment), true) => serde_json::to_string_pretty(assessment)?,
        (Some(assessment), false) => assessment.to_string(),
        (None, true) => serde_json::to_string_pretty(&json!({ "warning": NO_SUBMISSION_WARNING }))?,
        (None, false) => format!("[warning] {}", NO_SUBMISSION_WARNING),
    };
    Ok(rendered)
}
