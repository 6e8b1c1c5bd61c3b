//! JSON-lines log of generated runs.

use std::{
    fs::OpenOptions,
    io::Write,
    path::Path,
};

use {
    anyhow::Context,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use crate::pipeline::{QaPair, RunOutput};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub prompt: String,
    pub response: String,
    pub questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qa_pairs: Vec<QaPair>,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

impl RunRecord {
    pub fn from_output(output: &RunOutput) -> Self {
        Self {
            prompt: output.prompt.clone(),
            response: output.response.clone(),
            questions: output.questions.clone(),
            qa_pairs: output.qa_pairs.clone(),
            model: output.model.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Append one record as a single JSON line, creating the file if needed.
pub fn append_record(path: &Path, record: &RunRecord) -> anyhow::Result<()> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::debug!(path = %path.display(), "saved run record");
    Ok(())
}
