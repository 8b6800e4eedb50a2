use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Could not open {}", path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed documents in {}", path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not open {} for writing", path.display())]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to load model from: {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("Failed to create context: {0}")]
    Context(String),

    #[error("Failed to tokenize text: {0}")]
    Tokenize(String),

    #[error("Input of {tokens} tokens exceeds the context window of {n_ctx}")]
    ContextOverflow { tokens: usize, n_ctx: usize },

    #[error("Failed to encode batch: {0}")]
    Encode(String),

    #[error("Failed to get embeddings: {0}")]
    EmbeddingUnavailable(String),

    #[error("Failed on document {id}")]
    Document {
        id: i64,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn in_document(self, id: i64) -> Self {
        Error::Document { id, source: Box::new(self) }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
