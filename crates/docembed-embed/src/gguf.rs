//! GGUF model container: header metadata, vocabulary and BERT weights.
//!
//! llama.cpp-style BERT exports keep hyperparameters under `bert.*` keys,
//! the WordPiece vocabulary under `tokenizer.ggml.tokens`, and weights under
//! `token_embd.*` / `blk.N.*` names. Weights are dequantized to f32 and
//! renamed to the layout `candle_transformers::models::bert` expects.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use candle_core::quantized::gguf_file::{Content, Value};
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use docembed_core::error::{Error, Result};
use docembed_core::types::Pooling;
use tracing::debug;

/// Hyperparameters read from the model header.
#[derive(Debug, Clone, PartialEq)]
pub struct Hparams {
    pub arch: String,
    pub n_embd: usize,
    pub n_layer: usize,
    pub n_head: usize,
    pub n_ff: usize,
    pub n_ctx_train: usize,
    pub layer_norm_eps: f64,
    pub causal: bool,
    pub pooling: Pooling,
}

pub struct ModelFile {
    path: PathBuf,
    reader: BufReader<File>,
    content: Content,
}

impl ModelFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| load_error(path, e))?;
        let mut reader = BufReader::new(file);
        let content = Content::read(&mut reader).map_err(|e| load_error(path, e))?;
        debug!(tensors = content.tensor_infos.len(), keys = content.metadata.len(), "read gguf header");
        Ok(Self { path: path.to_path_buf(), reader, content })
    }

    pub fn hparams(&self) -> Result<Hparams> {
        let arch = self.get_str("general.architecture")?.to_string();
        if arch != "bert" {
            return Err(self.error(format!("unsupported architecture '{arch}'")));
        }
        let key = |k: &str| format!("{arch}.{k}");
        let pooling = match self.content.metadata.get(&key("pooling_type")) {
            Some(v) => {
                let code = as_u64(v).ok_or_else(|| self.error("pooling_type is not an integer"))?;
                Pooling::from_model_code(code).ok_or_else(|| self.error(format!("unsupported pooling type {code}")))?
            }
            None => Pooling::None,
        };
        Ok(Hparams {
            n_embd: self.get_usize(&key("embedding_length"))?,
            n_layer: self.get_usize(&key("block_count"))?,
            n_head: self.get_usize(&key("attention.head_count"))?,
            n_ff: self.get_usize(&key("feed_forward_length"))?,
            n_ctx_train: self.get_usize(&key("context_length"))?,
            layer_norm_eps: self
                .content
                .metadata
                .get(&key("attention.layer_norm_epsilon"))
                .and_then(as_f64)
                .unwrap_or(1e-12),
            causal: matches!(self.content.metadata.get(&key("attention.causal")), Some(Value::Bool(true))),
            pooling,
            arch: arch.clone(),
        })
    }

    /// Raw vocabulary in GGUF (phantom-space) form, indexed by token id.
    pub fn vocab(&self) -> Result<Vec<String>> {
        let model = self.get_str("tokenizer.ggml.model")?;
        if model != "bert" {
            return Err(self.error(format!("unsupported tokenizer model '{model}'")));
        }
        match self.get("tokenizer.ggml.tokens")? {
            Value::Array(items) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s.clone()),
                    _ => Err(self.error("tokenizer.ggml.tokens holds a non-string entry")),
                })
                .collect(),
            _ => Err(self.error("tokenizer.ggml.tokens is not an array")),
        }
    }

    /// Dequantize every recognised tensor and build the BERT encoder.
    pub fn load_bert(&mut self, hp: &Hparams, pad_token_id: u32, device: &Device) -> Result<BertModel> {
        let mut tensors = HashMap::new();
        let names: Vec<String> = self.content.tensor_infos.keys().cloned().collect();
        for name in names {
            let Some(target) = candle_tensor_name(&name) else {
                debug!("skipping tensor {}", name);
                continue;
            };
            let tensor = self
                .content
                .tensor(&mut self.reader, &name, device)
                .and_then(|q| q.dequantize(device))
                .map_err(|e| load_error(&self.path, format!("tensor {name}: {e}")))?;
            tensors.insert(target, tensor);
        }

        let rows = |name: &str| -> Result<usize> {
            tensors
                .get(name)
                .and_then(|t| t.dims().first().copied())
                .ok_or_else(|| load_error(&self.path, format!("missing tensor {name}")))
        };
        let config: BertConfig = serde_json::from_value(serde_json::json!({
            "vocab_size": rows("embeddings.word_embeddings.weight")?,
            "hidden_size": hp.n_embd,
            "num_hidden_layers": hp.n_layer,
            "num_attention_heads": hp.n_head,
            "intermediate_size": hp.n_ff,
            "hidden_act": "gelu",
            "hidden_dropout_prob": 0.0,
            "max_position_embeddings": rows("embeddings.position_embeddings.weight")?,
            "type_vocab_size": rows("embeddings.token_type_embeddings.weight")?,
            "initializer_range": 0.02,
            "layer_norm_eps": hp.layer_norm_eps,
            "pad_token_id": pad_token_id,
            "position_embedding_type": "absolute",
            "use_cache": false,
            "classifier_dropout": null,
            "model_type": null,
        }))
        .map_err(|e| self.error(format!("model config: {e}")))?;

        let vb = VarBuilder::from_tensors(tensors, DType::F32, device);
        BertModel::load(vb, &config).map_err(|e| self.error(e))
    }

    fn get(&self, key: &str) -> Result<&Value> {
        self.content.metadata.get(key).ok_or_else(|| self.error(format!("missing metadata key {key}")))
    }

    fn get_str(&self, key: &str) -> Result<&str> {
        match self.get(key)? {
            Value::String(s) => Ok(s),
            _ => Err(self.error(format!("{key} is not a string"))),
        }
    }

    fn get_usize(&self, key: &str) -> Result<usize> {
        as_u64(self.get(key)?)
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| self.error(format!("{key} is not an unsigned integer")))
    }

    fn error(&self, reason: impl std::fmt::Display) -> Error { load_error(&self.path, reason) }
}

/// Map a llama.cpp BERT tensor name onto the candle BERT layout.
pub fn candle_tensor_name(gguf_name: &str) -> Option<String> {
    let fixed = match gguf_name {
        "token_embd.weight" => Some("embeddings.word_embeddings.weight"),
        "token_types.weight" => Some("embeddings.token_type_embeddings.weight"),
        "position_embd.weight" => Some("embeddings.position_embeddings.weight"),
        "token_embd_norm.weight" => Some("embeddings.LayerNorm.weight"),
        "token_embd_norm.bias" => Some("embeddings.LayerNorm.bias"),
        _ => None,
    };
    if let Some(name) = fixed {
        return Some(name.to_string());
    }

    let (layer, rest) = gguf_name.strip_prefix("blk.")?.split_once('.')?;
    let layer: usize = layer.parse().ok()?;
    let (module, param) = rest.rsplit_once('.')?;
    let module = match module {
        "attn_q" => "attention.self.query",
        "attn_k" => "attention.self.key",
        "attn_v" => "attention.self.value",
        "attn_output" => "attention.output.dense",
        "attn_output_norm" => "attention.output.LayerNorm",
        "ffn_up" => "intermediate.dense",
        "ffn_down" => "output.dense",
        "layer_output_norm" => "output.LayerNorm",
        _ => return None,
    };
    Some(format!("encoder.layer.{layer}.{module}.{param}"))
}

fn load_error(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::ModelLoad { path: path.to_path_buf(), reason: reason.to_string() }
}

fn as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::U8(x) => Some(u64::from(*x)),
        Value::U16(x) => Some(u64::from(*x)),
        Value::U32(x) => Some(u64::from(*x)),
        Value::U64(x) => Some(*x),
        Value::I8(x) => u64::try_from(*x).ok(),
        Value::I16(x) => u64::try_from(*x).ok(),
        Value::I32(x) => u64::try_from(*x).ok(),
        Value::I64(x) => u64::try_from(*x).ok(),
        _ => None,
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::F32(x) => Some(f64::from(*x)),
        Value::F64(x) => Some(*x),
        _ => None,
    }
}
