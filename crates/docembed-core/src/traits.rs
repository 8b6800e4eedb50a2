use crate::error::Result;

pub trait Embedder {
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Maximum number of tokens accepted in one forward pass.
    fn max_len(&self) -> usize;
    fn embed_text(&self, text: &str) -> Result<Vec<f32>>;
}
