use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device};
use candle_transformers::models::bert::BertModel;
use docembed_core::config::{Config, EncoderConfig};
use docembed_core::error::{Error, Result};
use docembed_core::traits::Embedder;
use docembed_core::types::Pooling;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

pub mod device;
pub mod gguf;
pub mod pool;
pub mod tokenize;

pub use device::select_device;
pub use gguf::{Hparams, ModelFile};
pub use pool::{l2_normalize, masked_mean, pool};
pub use tokenize::{build_tokenizer, tokenize_on_device};

/// BGE-style BERT encoder loaded from a single GGUF file.
pub struct BgeEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    n_embd: usize,
    n_ctx: usize,
    pooling: Pooling,
    normalize: bool,
}

impl BgeEncoder {
    pub fn load(model_path: &Path, opts: &EncoderConfig) -> Result<Self> {
        let device = select_device();
        let mut file = ModelFile::open(model_path)?;
        let hp = file.hparams()?;

        info!("Model loaded. Embedding dimension: {}", hp.n_embd);
        if hp.n_embd != opts.expected_dim {
            warn!("Expected embedding dimension {}, got {}", opts.expected_dim, hp.n_embd);
        }
        if hp.causal {
            warn!("Model does not appear to be an encoder model");
        }

        info!("📥 Loading tokenizer...");
        let vocab = file.vocab()?;
        let tokenizer = build_tokenizer(&vocab).map_err(|e| Error::ModelLoad {
            path: model_path.to_path_buf(),
            reason: format!("tokenizer: {e}"),
        })?;
        let pad_token_id = vocab
            .iter()
            .position(|t| t == "[PAD]")
            .map_or(Ok(0), u32::try_from)
            .map_err(|e| Error::ModelLoad { path: model_path.to_path_buf(), reason: format!("[PAD] token id: {e}") })?;

        info!("🔧 Loading model weights...");
        let model = file.load_bert(&hp, pad_token_id, &device)?;

        let pooling = opts.pooling.unwrap_or(hp.pooling);
        let n_ctx = opts.context_size.min(hp.n_ctx_train);
        info!(
            "✅ {} encoder ready: {} layers, {} heads, context {}, pooling {:?}",
            hp.arch, hp.n_layer, hp.n_head, n_ctx, pooling
        );
        Ok(Self { model, tokenizer, device, n_embd: hp.n_embd, n_ctx, pooling, normalize: opts.normalize })
    }

    pub fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let encode_err = |e: candle_core::Error| Error::Encode(e.to_string());
        let unavailable = |e: candle_core::Error| Error::EmbeddingUnavailable(e.to_string());

        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.n_ctx, &self.device)?;
        let token_type_ids = input_ids.zeros_like().map_err(|e| Error::Context(e.to_string()))?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask)).map_err(encode_err)?;

        let mut emb = pool(&hidden, &attention_mask, self.pooling)
            .map_err(unavailable)?
            .ok_or_else(|| Error::EmbeddingUnavailable("model has no pooled sequence embedding".into()))?;
        if self.normalize {
            emb = l2_normalize(&emb).map_err(unavailable)?;
        }
        let emb: Vec<f32> = emb
            .to_device(&Device::Cpu)
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1())
            .map_err(unavailable)?;
        if emb.len() != self.n_embd {
            return Err(Error::EmbeddingUnavailable(format!("expected {} values, got {}", self.n_embd, emb.len())));
        }
        debug!(tokens = input_ids.dims()[1], elapsed_ms = start.elapsed().as_millis() as u64, "encoded");
        Ok(emb)
    }
}

impl Embedder for BgeEncoder {
    fn dim(&self) -> usize { self.n_embd }
    fn max_len(&self) -> usize { self.n_ctx }
    fn embed_text(&self, text: &str) -> Result<Vec<f32>> { self.encode(text) }
}

/// Deterministic bag-of-words hashing embedder; needs no model file.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder { pub fn new(dim: usize) -> Self { Self { dim } } }

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        Ok(v)
    }
}

pub fn get_default_embedder(config: &Config) -> Result<Box<dyn Embedder>> {
    if config.use_fake_embeddings {
        info!("🧪 Using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(config.encoder.expected_dim)));
    }
    Ok(Box::new(BgeEncoder::load(&config.model_path(), &config.encoder)?))
}
