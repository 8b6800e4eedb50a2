//! Batch driver: documents in, one embedding per document, records out.
//!
//! `Init → Loading → Processing(i) → Writing → Done`. Any error short-circuits
//! straight out of `run`; nothing is written unless every document encoded.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::info;

use crate::config::Config;
use crate::documents::{read_documents, write_records};
use crate::error::Result;
use crate::traits::Embedder;
use crate::types::{Document, OutputRecord, RunSummary};

/// Run the whole batch described by `config`.
///
/// `load_embedder` is called once, after the documents have been read and
/// validated, so a bad input file never pays for a model load.
pub fn run<F>(config: &Config, load_embedder: F) -> Result<RunSummary>
where
    F: FnOnce() -> Result<Box<dyn Embedder>>,
{
    let input = config.input_path();
    let output = config.output_path();

    info!("Loading documents from {}...", input.display());
    let docs = read_documents(&input)?;
    info!("Found {} documents", docs.len());

    info!("Loading model from {}...", config.model_path().display());
    let embedder = load_embedder()?;
    info!("Encoder ready (dim={}, max_len={})", embedder.dim(), embedder.max_len());

    let progress = if config.progress_bar { progress_bar(docs.len()) } else { ProgressBar::hidden() };
    let records = encode_documents(embedder.as_ref(), &docs, config.progress_every, &progress)?;
    progress.finish_and_clear();

    info!("Writing results to {}...", output.display());
    write_records(&output, &records)?;

    info!("✅ Successfully processed {} documents", records.len());
    info!("Output saved to {}", output.display());
    Ok(RunSummary { processed: records.len(), output })
}

/// Encode every document in order, stopping at the first failure.
///
/// A progress line is logged for every document whose index is a multiple of
/// `progress_every`, starting with the first.
pub fn encode_documents(
    embedder: &dyn Embedder,
    docs: &[Document],
    progress_every: usize,
    progress: &ProgressBar,
) -> Result<Vec<OutputRecord>> {
    let total = docs.len();
    let mut records = Vec::with_capacity(total);
    for (i, doc) in docs.iter().enumerate() {
        if progress_every > 0 && i % progress_every == 0 {
            info!("Processing document {}/{}...", i, total);
        }
        let embedding = embedder.embed_text(&doc.text).map_err(|e| e.in_document(doc.id))?;
        records.push(OutputRecord::new(doc, embedding));
        progress.inc(1);
    }
    Ok(records)
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(len as u64), ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
