//! Domain types shared by the encoder and the batch driver.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One input unit read from the documents file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub text: String,
}

/// One output unit: the source document plus its pooled embedding.
///
/// Records are created only after a successful encode, one per
/// `Document`, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub id: i64,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl OutputRecord {
    pub fn new(doc: &Document, embedding: Vec<f32>) -> Self {
        Self { id: doc.id, text: doc.text.clone(), embedding }
    }
}

/// How per-token hidden states collapse into one sequence embedding.
///
/// `None` means the model exposes no pooled embedding at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pooling {
    None,
    Mean,
    Cls,
    Last,
}

impl Pooling {
    /// Map the numeric pooling type stored in model metadata.
    pub fn from_model_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Pooling::None),
            1 => Some(Pooling::Mean),
            2 => Some(Pooling::Cls),
            3 => Some(Pooling::Last),
            _ => None,
        }
    }
}

/// Outcome of a successful batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub output: PathBuf,
}
